//! End-to-end plans through the engine with the default test config
//! (window 11:30-23:00, 3h minimum, "server" at 20.0/h).

use chrono::NaiveDate;
use staffplan_core::{
    engine::PlanEngine,
    error::PlanError,
    event::PlanEvent,
    profile::{ForecastBook, RevenueProfile},
    types::SLOTS_PER_DAY,
    window::StaffingWindow,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 14).expect("valid date")
}

/// Equal share in every slot of the default window, zero elsewhere.
fn uniform_in_window() -> Vec<f64> {
    let window = StaffingWindow::parse("11:30", "23:00").expect("window");
    (0..SLOTS_PER_DAY)
        .map(|s| if window.contains(s) { 1.0 } else { 0.0 })
        .collect()
}

fn engine_with(profile: RevenueProfile) -> PlanEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut book = ForecastBook::new();
    book.insert(profile);
    PlanEngine::build_test("pipeline-test".into(), book).expect("engine")
}

fn events(engine: &PlanEngine) -> Vec<PlanEvent> {
    engine
        .store_events()
        .expect("read events")
        .iter()
        .map(|e| serde_json::from_str(&e.payload).expect("payload parses"))
        .collect()
}

#[test]
fn uniform_eight_hour_day_plans_eight_hours() {
    // 0.23 * revenue / 20.0 == 8.0
    let revenue = 8.0 * 20.0 / 0.23;
    let engine = engine_with(RevenueProfile::new(date(), Some(revenue), uniform_in_window()));

    let outcome = engine.optimize(date(), "server").expect("plan");

    assert!((outcome.kpi.target_hours - 8.0).abs() < 1e-9);
    assert!((outcome.demand.total_heads() - 32.0).abs() < 1e-9);
    assert_eq!(outcome.integer_demand.total_heads(), 32);
    assert!(outcome.integer_demand.points.iter().all(|p| p.required_heads <= 1));

    // Late bias puts the 32 heads on the last 32 window slots.
    assert_eq!(outcome.integer_demand.required_at(59), 0);
    assert_eq!(outcome.integer_demand.required_at(60), 1);
    assert_eq!(outcome.integer_demand.required_at(91), 1);

    let clamped_short: Vec<_> = outcome
        .shifts
        .iter()
        .filter(|s| s.clamped_at_day_end && s.duration_hours() < 3.0)
        .collect();
    assert!(clamped_short.len() <= 1);
    assert!((outcome.kpi.planned_hours - 8.0).abs() < 1e-9);
    assert!((outcome.kpi.planned_cost - 160.0).abs() < 1e-9);
    let pct = outcome.kpi.planned_cost_pct.expect("revenue is positive");
    assert!((pct - 23.0).abs() < 1e-9);
}

#[test]
fn every_stage_reports_in_order() {
    let engine = engine_with(RevenueProfile::new(date(), Some(4000.0), uniform_in_window()));
    engine.optimize(date(), "server").expect("plan");

    let stages: Vec<String> = engine
        .store_events()
        .expect("events")
        .into_iter()
        .map(|e| e.stage)
        .collect();
    assert_eq!(
        stages,
        vec![
            "engine",
            "engine",
            "labor_budget",
            "demand_curve",
            "integerizer",
            "shift_synthesis",
            "kpi",
        ]
    );
}

#[test]
fn no_share_inside_window_is_an_empty_plan() {
    // Breakfast-only trade, entirely before 11:30.
    let mut shares = vec![0.0; SLOTS_PER_DAY];
    for share in &mut shares[28..40] {
        *share = 1.0;
    }
    let engine = engine_with(RevenueProfile::new(date(), Some(1500.0), shares));

    let outcome = engine.optimize(date(), "server").expect("empty plan is not an error");

    assert!(outcome.shifts.is_empty());
    assert_eq!(outcome.integer_demand.total_heads(), 0);
    assert_eq!(outcome.kpi.planned_hours, 0.0);
    assert_eq!(outcome.kpi.planned_cost_pct, Some(0.0));
    assert!(events(&engine)
        .iter()
        .any(|e| matches!(e, PlanEvent::EmptyDemandDetected { .. })));
    assert_eq!(engine.store.demand_curve(date(), "server").expect("rows").len(), 96);
}

#[test]
fn missing_forecast_is_rejected_without_plan_rows() {
    let engine = engine_with(RevenueProfile::new(date(), Some(4000.0), uniform_in_window()));
    let other_day = date().succ_opt().expect("next day");

    let err = engine.optimize(other_day, "server").unwrap_err();
    assert!(matches!(err, PlanError::InvalidForecast { .. }));

    assert!(engine.store.demand_curve(other_day, "server").expect("rows").is_empty());
    assert!(engine.store.shifts_for(other_day, "server").expect("rows").is_empty());
    assert!(engine.store.plan_kpi(other_day, "server").expect("row").is_none());
    assert!(matches!(
        events(&engine).last(),
        Some(PlanEvent::PlanRejected { .. })
    ));
}

#[test]
fn runaway_revenue_is_rejected_before_rounding() {
    let engine = engine_with(RevenueProfile::new(date(), Some(1.0e15), uniform_in_window()));

    let err = engine.optimize(date(), "server").unwrap_err();
    assert!(matches!(err, PlanError::InvalidForecast { .. }));
    assert!(engine.store.demand_curve(date(), "server").expect("rows").is_empty());
}

#[test]
fn unknown_role_is_rejected_as_invalid_rate() {
    let engine = engine_with(RevenueProfile::new(date(), Some(4000.0), uniform_in_window()));

    let err = engine.optimize(date(), "sommelier").unwrap_err();
    assert!(matches!(err, PlanError::InvalidRate { .. }));
    assert!(engine.store.plan_kpi(date(), "sommelier").expect("row").is_none());
}

#[test]
fn short_profile_is_rejected_as_invalid() {
    let engine = engine_with(RevenueProfile::new(date(), Some(4000.0), vec![1.0; 48]));

    let err = engine.optimize(date(), "server").unwrap_err();
    assert!(matches!(err, PlanError::InvalidProfile { .. }));
    assert!(engine.store.shifts_for(date(), "server").expect("rows").is_empty());
}

#[test]
fn batch_skips_rejections_and_plans_the_rest() {
    let engine = engine_with(RevenueProfile::new(date(), Some(4000.0), uniform_in_window()));
    let dates = [date(), date().succ_opt().expect("next day")];

    let results = engine
        .optimize_all(&dates, &["server".to_string()])
        .expect("no storage failure");

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(PlanError::InvalidForecast { .. })));
}

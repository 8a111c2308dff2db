//! Plan persistence: one generation of auto rows per (date, role),
//! manual shifts untouched, file stores survive a reopen.

use chrono::NaiveDate;
use staffplan_core::{
    config::{PlannerConfig, RoleConfig},
    engine::PlanEngine,
    profile::{ForecastBook, RevenueProfile},
    store::{PlanStore, ShiftSource},
    types::SLOTS_PER_DAY,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date")
}

/// Lunch and dinner peaks inside the default window.
fn two_peak_shares() -> Vec<f64> {
    (0..SLOTS_PER_DAY)
        .map(|s| match s {
            48..=56 => 3.0,
            57..=71 => 1.0,
            72..=84 => 4.0,
            85..=91 => 1.0,
            _ => 0.0,
        })
        .collect()
}

fn book() -> ForecastBook {
    let mut book = ForecastBook::new();
    book.insert(RevenueProfile::new(date(), Some(5200.0), two_peak_shares()));
    book
}

fn engine() -> PlanEngine {
    PlanEngine::build_test("store-test".into(), book()).expect("engine")
}

#[test]
fn reoptimizing_keeps_a_single_generation() {
    let engine = engine();
    let first = engine.optimize(date(), "server").expect("first plan");
    let second = engine.optimize(date(), "server").expect("second plan");
    assert_eq!(first, second);

    let stored = engine.store.shifts_for(date(), "server").expect("shifts");
    assert_eq!(stored.len(), second.shifts.len());
    assert!(stored.iter().all(|s| s.source == ShiftSource::Auto));
    assert_eq!(
        engine.store.auto_shift_count(date(), "server").expect("count"),
        second.shifts.len()
    );

    let curve = engine.store.demand_curve(date(), "server").expect("curve");
    assert_eq!(curve.len(), SLOTS_PER_DAY);
    let stored_heads: u32 = curve.iter().map(|s| s.required_heads).sum();
    assert_eq!(stored_heads, second.integer_demand.total_heads());
    assert_eq!(curve[46].slot_time, "11:30");
    assert!(curve[46].within_window);
    assert!(!curve[45].within_window);

    let kpi = engine.store.plan_kpi(date(), "server").expect("kpi");
    assert_eq!(kpi.as_ref(), Some(&second.kpi));
}

#[test]
fn manual_shifts_survive_reoptimization() {
    let engine = engine();
    engine.optimize(date(), "server").expect("plan");
    let auto = engine.store.auto_shift_count(date(), "server").expect("count");

    let manual_id = engine
        .store
        .insert_manual_shift(date(), "server", 44, 60)
        .expect("manual shift");
    engine.optimize(date(), "server").expect("replan");

    let stored = engine.store.shifts_for(date(), "server").expect("shifts");
    assert_eq!(stored.len(), auto + 1);
    let manual: Vec<_> = stored
        .iter()
        .filter(|s| s.source == ShiftSource::Manual)
        .collect();
    assert_eq!(manual.len(), 1);
    assert_eq!(manual[0].id, manual_id);

    let summary = engine.shift_summary(date(), "server").expect("summary");
    assert_eq!(summary.shift_count, auto + 1);
    assert_eq!(summary.first_start, Some(44));
}

#[test]
fn roles_do_not_overwrite_each_other() {
    let mut config = PlannerConfig::default_test();
    config.roles.insert(
        "cook".into(),
        RoleConfig {
            hourly_rate:     24.0,
            staffing_window: None,
        },
    );
    let engine = PlanEngine::build_test_with("roles-test".into(), config, book()).expect("engine");

    let server = engine.optimize(date(), "server").expect("server plan");
    engine.optimize(date(), "cook").expect("cook plan");

    assert_eq!(
        engine.store.auto_shift_count(date(), "server").expect("count"),
        server.shifts.len()
    );
    let server_kpi = engine.store.plan_kpi(date(), "server").expect("kpi");
    assert_eq!(server_kpi.map(|k| k.hourly_rate), Some(20.0));
    let cook_kpi = engine.store.plan_kpi(date(), "cook").expect("kpi");
    assert_eq!(cook_kpi.map(|k| k.hourly_rate), Some(24.0));
}

#[test]
fn file_store_persists_across_reopen() {
    let path = std::env::temp_dir().join(format!("staffplan-{}.db", uuid::Uuid::new_v4()));
    let path_str = path.to_string_lossy().to_string();

    {
        let store = PlanStore::open(&path_str).expect("open");
        store.migrate().expect("migrate");
        store.migrate().expect("migrations are idempotent");
        store
            .insert_manual_shift(date(), "host", 68, 84)
            .expect("manual shift");
    }

    let store = PlanStore::open(&path_str).expect("reopen");
    store.migrate().expect("migrate");
    let shifts = store.shifts_for(date(), "host").expect("shifts");
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].shift.start_label(), "17:00");
    assert_eq!(shifts[0].shift.end_label(), "21:00");

    drop(store);
    let _ = std::fs::remove_file(&path);
}

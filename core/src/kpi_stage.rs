//! KPI stage — realized labor cost of the synthesized plan.
//!
//! REACTIVE: reads the finished shift set, changes nothing upstream.
//!
//!   planned_hours    = sum of shift durations
//!   planned_cost     = planned_hours * hourly_rate
//!   planned_cost_pct = planned_cost / revenue * 100   (None without revenue)

use crate::{
    coverage::coverage_report,
    error::PlanResult,
    event::PlanEvent,
    stage::{need, PlanContext, PlanStage},
    shift_synthesis_stage::ShiftSet,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanKpi {
    // Inputs
    pub forecast_revenue: Option<f64>,
    pub hourly_rate:      f64,
    pub target_hours:     f64,
    // Realized
    pub planned_hours:    f64,
    pub planned_cost:     f64,
    pub planned_cost_pct: Option<f64>,
    pub shift_count:      usize,
    // Fidelity
    pub overcapacity_units:  u32,
    pub undercapacity_units: u32,
}

pub fn aggregate_kpi(
    shifts: &ShiftSet,
    hourly_rate: f64,
    forecast_revenue: Option<f64>,
    target_hours: f64,
) -> PlanKpi {
    let planned_hours = shifts.total_hours();
    let planned_cost = planned_hours * hourly_rate;
    let planned_cost_pct = forecast_revenue
        .filter(|r| *r > 0.0)
        .map(|r| planned_cost / r * 100.0);

    PlanKpi {
        forecast_revenue,
        hourly_rate,
        target_hours,
        planned_hours,
        planned_cost,
        planned_cost_pct,
        shift_count: shifts.len(),
        overcapacity_units: 0,
        undercapacity_units: 0,
    }
}

pub struct KpiStage;

impl PlanStage for KpiStage {
    fn name(&self) -> &'static str {
        "kpi"
    }

    fn run(&self, ctx: &mut PlanContext) -> PlanResult<Vec<PlanEvent>> {
        let shifts = need(ctx.shifts.as_ref(), self.name(), "shifts")?;
        let curve = need(ctx.integer_demand.as_ref(), self.name(), "integer_demand")?;
        let target_hours = need(ctx.target_hours, self.name(), "target_hours")?;
        let hourly_rate = need(ctx.hourly_rate, self.name(), "hourly_rate")?;

        let coverage = coverage_report(curve, shifts);
        let kpi = PlanKpi {
            overcapacity_units: coverage.over_units(),
            undercapacity_units: coverage.under_units(),
            ..aggregate_kpi(shifts, hourly_rate, ctx.profile.revenue, target_hours)
        };

        log::info!(
            "{} {}: {} shift(s) | planned {:.2}h of {:.2}h target | cost {:.2} ({})",
            ctx.request.date,
            ctx.request.role,
            kpi.shift_count,
            kpi.planned_hours,
            kpi.target_hours,
            kpi.planned_cost,
            kpi.planned_cost_pct
                .map_or_else(|| "n/a".to_string(), |p| format!("{p:.1}%"))
        );

        let event = PlanEvent::KpiComputed {
            planned_hours:    kpi.planned_hours,
            planned_cost:     kpi.planned_cost,
            planned_cost_pct: kpi.planned_cost_pct,
        };
        ctx.kpi = Some(kpi);
        Ok(vec![event])
    }
}

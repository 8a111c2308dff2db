//! Labor budget — turns a revenue forecast into allowed labor-hours.
//!
//!   target_hours = target_cost_fraction * revenue / hourly_rate

use crate::{
    error::{PlanError, PlanResult},
    event::PlanEvent,
    stage::{PlanContext, PlanStage},
    types::{MAX_HEAD_UNITS, SLOTS_PER_HOUR},
};

/// Allowed labor-hours for the day.
pub fn translate_budget(
    revenue: Option<f64>,
    target_cost_fraction: f64,
    hourly_rate: Option<f64>,
) -> PlanResult<f64> {
    let revenue = match revenue {
        None => {
            return Err(PlanError::InvalidForecast {
                reason: "no revenue forecast for this date".into(),
            })
        }
        Some(r) if !r.is_finite() || r <= 0.0 => {
            return Err(PlanError::InvalidForecast {
                reason: format!("revenue must be positive, got {r}"),
            })
        }
        Some(r) => r,
    };
    let rate = match hourly_rate {
        None => {
            return Err(PlanError::InvalidRate {
                reason: "no blended hourly rate for this role".into(),
            })
        }
        Some(r) if !r.is_finite() || r <= 0.0 => {
            return Err(PlanError::InvalidRate {
                reason: format!("rate must be positive, got {r}"),
            })
        }
        Some(r) => r,
    };
    let target_hours = target_cost_fraction * revenue / rate;
    if target_hours * SLOTS_PER_HOUR > f64::from(MAX_HEAD_UNITS) {
        return Err(PlanError::InvalidForecast {
            reason: format!(
                "revenue {revenue} implies {target_hours} labor-hours, above the {} per-day limit",
                f64::from(MAX_HEAD_UNITS) / SLOTS_PER_HOUR
            ),
        });
    }
    Ok(target_hours)
}

pub struct LaborBudgetStage;

impl PlanStage for LaborBudgetStage {
    fn name(&self) -> &'static str {
        "labor_budget"
    }

    fn run(&self, ctx: &mut PlanContext) -> PlanResult<Vec<PlanEvent>> {
        let fraction = ctx.params.target_cost_fraction;
        let target_hours = translate_budget(ctx.profile.revenue, fraction, ctx.hourly_rate)?;
        ctx.target_hours = Some(target_hours);

        Ok(vec![PlanEvent::LaborBudgetTranslated {
            revenue: ctx.profile.revenue.unwrap_or_default(),
            target_cost_fraction: fraction,
            hourly_rate: ctx.hourly_rate.unwrap_or_default(),
            target_hours,
        }])
    }
}

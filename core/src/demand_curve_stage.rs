//! Demand curve — spreads the day's labor-hours over in-window slots
//! in proportion to their revenue share.
//!
//!   raw_heads[slot] = share[slot] / W * target_hours * 4
//!
//! where W is the share sum over the staffing window. The x4 turns
//! hours into quarter-hour head-units, so sum(raw_heads) / 4 equals
//! target_hours. W == 0 means "nothing to plan", not an error.

use crate::{
    error::PlanResult,
    event::PlanEvent,
    profile::RevenueProfile,
    stage::{need, PlanContext, PlanStage},
    types::{SlotIndex, SLOTS_PER_HOUR},
    window::StaffingWindow,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPoint {
    pub slot:           SlotIndex,
    pub within_window:  bool,
    pub required_heads: f64,
}

/// Fractional heads for every slot of the day. Out-of-window slots
/// are kept at zero so consumers can render the full day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandCurve {
    pub window:    StaffingWindow,
    pub share_sum: f64,
    pub points:    Vec<DemandPoint>,
}

impl DemandCurve {
    pub fn is_empty_demand(&self) -> bool {
        self.share_sum == 0.0
    }

    /// Required heads of the in-window slots, in slot order.
    pub fn in_window_heads(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.within_window)
            .map(|p| p.required_heads)
            .collect()
    }

    pub fn total_heads(&self) -> f64 {
        self.points.iter().map(|p| p.required_heads).sum()
    }

    pub fn labor_hours(&self) -> f64 {
        self.total_heads() / SLOTS_PER_HOUR
    }
}

pub fn build_demand_curve(
    profile: &RevenueProfile,
    window: StaffingWindow,
    target_hours: f64,
) -> PlanResult<DemandCurve> {
    profile.validate_shares()?;

    let share_sum: f64 = profile.shares[window.slots()].iter().sum();
    let points = profile
        .shares
        .iter()
        .enumerate()
        .map(|(slot, share)| {
            let within_window = window.contains(slot);
            let required_heads = if within_window && share_sum > 0.0 {
                share / share_sum * target_hours * SLOTS_PER_HOUR
            } else {
                0.0
            };
            DemandPoint {
                slot,
                within_window,
                required_heads,
            }
        })
        .collect();

    Ok(DemandCurve {
        window,
        share_sum,
        points,
    })
}

pub struct DemandCurveStage;

impl PlanStage for DemandCurveStage {
    fn name(&self) -> &'static str {
        "demand_curve"
    }

    fn run(&self, ctx: &mut PlanContext) -> PlanResult<Vec<PlanEvent>> {
        let target_hours = need(ctx.target_hours, self.name(), "target_hours")?;
        let curve = build_demand_curve(&ctx.profile, ctx.params.staffing_window, target_hours)?;

        let mut events = vec![PlanEvent::DemandCurveBuilt {
            in_window_slots: curve.window.len(),
            share_sum: curve.share_sum,
            total_heads: curve.total_heads(),
        }];
        if curve.is_empty_demand() {
            log::info!(
                "{} {}: no revenue share inside {}, nothing to plan",
                ctx.request.date,
                ctx.request.role,
                curve.window
            );
            events.push(PlanEvent::EmptyDemandDetected {
                date: ctx.request.date,
                role: ctx.request.role.clone(),
            });
        }

        ctx.demand = Some(curve);
        Ok(events)
    }
}

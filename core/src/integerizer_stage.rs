//! Integerizer — largest-remainder rounding of the demand curve.
//!
//! Output sums to round(sum(input)) exactly:
//!   1. base = max(floor(x), floor_i), frac = x - floor(x) (zero where
//!      the floor lifted the slot), remainder = round(sum x) - sum base
//!   2. remainder > 0: add 1 to the slots with the largest
//!      frac * (1 + late_bias * i / (n - 1)), cycling if needed.
//!   3. remainder < 0: take 1 from the slots with the smallest frac,
//!      never below the slot's floor.
//!
//! Two orthogonal knobs: `late_bias` (tie-break towards later slots)
//! and an optional per-slot baseline floor from a staffing template.
//! When floors make the total unreachable, the loop stops after a pass
//! that removes nothing and the shortfall is reported as `unresolved`.
//!
//! Sorting is stable, so equal keys keep slot order.

use crate::{
    demand_curve_stage::DemandCurve,
    error::{PlanError, PlanResult},
    event::PlanEvent,
    stage::{need, PlanContext, PlanStage},
    types::{SlotIndex, MAX_HEAD_UNITS, SLOTS_PER_DAY},
    window::StaffingWindow,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integerized {
    pub values: Vec<u32>,
    /// round(sum(x)) - sum(base), before any adjustment.
    pub remainder: i64,
    /// Decrements the floors prevented. Non-zero means
    /// sum(values) == round(sum(x)) + unresolved.
    pub unresolved: u32,
}

/// Round `x` to integers preserving the rounded total.
/// Negative and non-finite entries count as zero; entries above
/// `MAX_HEAD_UNITS` count as `MAX_HEAD_UNITS`. `floor`, when given,
/// must be as long as `x`.
pub fn integerize(x: &[f64], late_bias: f64, floor: Option<&[u32]>) -> Integerized {
    let n = x.len();
    let floor_at = |i: usize| floor.map_or(0, |f| f[i]);

    let clean: Vec<f64> = x
        .iter()
        .map(|v| if v.is_finite() { v.clamp(0.0, f64::from(MAX_HEAD_UNITS)) } else { 0.0 })
        .collect();

    let mut values: Vec<u32> = clean
        .iter()
        .enumerate()
        .map(|(i, v)| (v.floor() as u32).max(floor_at(i)))
        .collect();
    // A slot the floor lifted is already at or above its share.
    let fracs: Vec<f64> = clean
        .iter()
        .zip(&values)
        .map(|(v, &base)| if f64::from(base) > v.floor() { 0.0 } else { v - v.floor() })
        .collect();

    let target = clean.iter().sum::<f64>().round() as i64;
    let base_sum: i64 = values.iter().map(|&v| v as i64).sum();
    let remainder = target - base_sum;

    let mut order: Vec<SlotIndex> = (0..n).collect();
    let mut unresolved = 0;

    if remainder > 0 {
        let weight = |i: usize| {
            if n > 1 {
                1.0 + late_bias * (i as f64 / (n - 1) as f64)
            } else {
                1.0
            }
        };
        order.sort_by(|&a, &b| (fracs[b] * weight(b)).total_cmp(&(fracs[a] * weight(a))));
        for &i in order.iter().cycle().take(remainder as usize) {
            values[i] = values[i].saturating_add(1);
        }
    } else if remainder < 0 {
        order.sort_by(|&a, &b| fracs[a].total_cmp(&fracs[b]));
        let mut to_remove = remainder.unsigned_abs();
        while to_remove > 0 {
            let mut removed_this_pass = false;
            for &i in &order {
                if to_remove == 0 {
                    break;
                }
                if values[i] > floor_at(i) {
                    values[i] -= 1;
                    to_remove -= 1;
                    removed_this_pass = true;
                }
            }
            if !removed_this_pass {
                break;
            }
        }
        unresolved = to_remove as u32;
    }

    Integerized {
        values,
        remainder,
        unresolved,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerDemandPoint {
    pub slot:           SlotIndex,
    pub within_window:  bool,
    pub required_heads: u32,
}

/// Integer heads for every slot of the day, zero outside the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerDemandCurve {
    pub window: StaffingWindow,
    pub points: Vec<IntegerDemandPoint>,
}

impl IntegerDemandCurve {
    /// Place in-window `values` onto the shape of `demand`.
    pub fn from_demand(demand: &DemandCurve, values: &[u32]) -> Self {
        let start = demand.window.start_slot();
        let points = demand
            .points
            .iter()
            .map(|p| IntegerDemandPoint {
                slot:           p.slot,
                within_window:  p.within_window,
                required_heads: if p.within_window { values[p.slot - start] } else { 0 },
            })
            .collect();
        Self {
            window: demand.window,
            points,
        }
    }

    /// Build directly from in-window heads, one per window slot.
    /// Used where no fractional curve exists (templates, tests).
    pub fn from_window_heads(window: StaffingWindow, heads: &[u32]) -> PlanResult<Self> {
        if heads.len() != window.len() {
            return Err(PlanError::InvalidProfile {
                reason: format!(
                    "window {window} has {} slots, got {} head counts",
                    window.len(),
                    heads.len()
                ),
            });
        }
        let points = (0..SLOTS_PER_DAY)
            .map(|slot| IntegerDemandPoint {
                slot,
                within_window:  window.contains(slot),
                required_heads: if window.contains(slot) {
                    heads[slot - window.start_slot()]
                } else {
                    0
                },
            })
            .collect();
        Ok(Self { window, points })
    }

    /// `(slot, heads)` for the in-window slots, in slot order.
    pub fn in_window(&self) -> impl Iterator<Item = (SlotIndex, u32)> + '_ {
        self.points
            .iter()
            .filter(|p| p.within_window)
            .map(|p| (p.slot, p.required_heads))
    }

    pub fn required_at(&self, slot: SlotIndex) -> u32 {
        self.points.get(slot).map_or(0, |p| p.required_heads)
    }

    pub fn total_heads(&self) -> u32 {
        self.points.iter().map(|p| p.required_heads).sum()
    }
}

pub struct IntegerizerStage;

impl PlanStage for IntegerizerStage {
    fn name(&self) -> &'static str {
        "integerizer"
    }

    fn run(&self, ctx: &mut PlanContext) -> PlanResult<Vec<PlanEvent>> {
        let demand = need(ctx.demand.as_ref(), self.name(), "demand")?;

        let result = if demand.is_empty_demand() {
            Integerized {
                values:     vec![0; demand.window.len()],
                remainder:  0,
                unresolved: 0,
            }
        } else {
            integerize(
                &demand.in_window_heads(),
                ctx.params.late_bias,
                ctx.params.window_floor(),
            )
        };

        if result.unresolved > 0 {
            log::warn!(
                "{} {}: baseline floor keeps {} head-unit(s) above the rounded total",
                ctx.request.date,
                ctx.request.role,
                result.unresolved
            );
        }

        let curve = IntegerDemandCurve::from_demand(demand, &result.values);
        let event = PlanEvent::CurveIntegerized {
            total_heads: curve.total_heads(),
            remainder:   result.remainder,
            unresolved:  result.unresolved,
        };
        ctx.integer_demand = Some(curve);
        Ok(vec![event])
    }
}

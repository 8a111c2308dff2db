//! Shift synthesis — the greedy allocator at the heart of the planner.
//!
//! Walks the in-window slots in order, carrying:
//!   - `active`:  start slots of currently open shifts, oldest first
//!   - `backlog`: opens deferred by the per-slot start limit
//!
//! Per slot t with requirement k:
//!   1. OPEN.  delta = k + backlog - |active|. If positive, open
//!      min(delta, max_starts) shifts at t and carry the rest as backlog;
//!      otherwise clear the backlog.
//!   2. CLOSE. While |active| > k, close the OLDEST open shift that has
//!      run at least min_shift (end = t). If none has, stop: the slot
//!      runs over capacity rather than cutting a shift short.
//!
//! At day end every open shift closes at the window end. A shift that
//! started too late to reach its minimum is cut there and flagged
//! `clamped_at_day_end`; no shift ever crosses the window end.
//!
//! RULES:
//!   - Total on valid input: never fails, always terminates.
//!   - Deterministic: the close scan order is oldest start first.

use crate::{
    clock::{format_boundary, slots_to_hours},
    coverage::coverage_report,
    error::PlanResult,
    event::PlanEvent,
    integerizer_stage::IntegerDemandCurve,
    stage::{need, PlanContext, PlanStage},
    types::{Role, SlotIndex},
};
use serde::{Deserialize, Serialize};

/// One emitted shift, `[start_slot, end_slot)`. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub role:               Role,
    pub start_slot:         SlotIndex,
    pub end_slot:           SlotIndex,
    /// Cut at the window end below the minimum duration.
    pub clamped_at_day_end: bool,
}

impl Shift {
    pub fn duration_slots(&self) -> usize {
        self.end_slot - self.start_slot
    }

    pub fn duration_hours(&self) -> f64 {
        slots_to_hours(self.duration_slots())
    }

    pub fn covers(&self, slot: SlotIndex) -> bool {
        self.start_slot <= slot && slot < self.end_slot
    }

    pub fn start_label(&self) -> String {
        format_boundary(self.start_slot)
    }

    pub fn end_label(&self) -> String {
        format_boundary(self.end_slot)
    }
}

/// The synthesizer's output for one (date, role), in emission order.
/// Shifts overlap freely; coverage per slot is what matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftSet {
    pub shifts: Vec<Shift>,
}

impl ShiftSet {
    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shift> {
        self.shifts.iter()
    }

    pub fn total_hours(&self) -> f64 {
        self.shifts.iter().map(Shift::duration_hours).sum()
    }

    pub fn clamped_count(&self) -> usize {
        self.shifts.iter().filter(|s| s.clamped_at_day_end).count()
    }

    pub fn summary(&self) -> ShiftSummary {
        ShiftSummary::from_shifts(&self.shifts)
    }
}

/// Read-back summary served to query clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub shift_count: usize,
    pub total_hours: f64,
    pub first_start: Option<SlotIndex>,
    pub last_end:    Option<SlotIndex>,
}

impl ShiftSummary {
    pub fn from_shifts(shifts: &[Shift]) -> Self {
        Self {
            shift_count: shifts.len(),
            total_hours: shifts.iter().map(Shift::duration_hours).sum(),
            first_start: shifts.iter().map(|s| s.start_slot).min(),
            last_end:    shifts.iter().map(|s| s.end_slot).max(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisParams {
    pub min_shift_slots:     usize,
    /// None = open every required shift at once.
    pub max_starts_per_slot: Option<usize>,
}

pub fn synthesize_shifts(curve: &IntegerDemandCurve, role: &str, params: SynthesisParams) -> ShiftSet {
    let min = params.min_shift_slots;
    let window_end = curve.window.end_slot();

    let mut shifts = Vec::new();
    let mut active: Vec<SlotIndex> = Vec::new();
    let mut backlog: usize = 0;

    let emit = |start: SlotIndex, end: SlotIndex, clamped: bool| Shift {
        role:               role.to_string(),
        start_slot:         start,
        end_slot:           end,
        clamped_at_day_end: clamped,
    };

    for (t, k) in curve.in_window() {
        let k = k as usize;

        // ── Open ───────────────────────────────────────────────
        let required = k + backlog;
        if required > active.len() {
            let delta = required - active.len();
            let opened = params.max_starts_per_slot.map_or(delta, |m| delta.min(m));
            active.extend(std::iter::repeat(t).take(opened));
            backlog = delta - opened;
        } else {
            backlog = 0;
        }

        // ── Close ──────────────────────────────────────────────
        let mut to_close = active.len().saturating_sub(k);
        while to_close > 0 {
            let Some(pos) = active.iter().position(|&start| t - start >= min) else {
                break;
            };
            let start = active.remove(pos);
            shifts.push(emit(start, t, false));
            to_close -= 1;
        }
    }

    // ── Day end ────────────────────────────────────────────────
    for start in active {
        let end = (start + min).max(window_end).min(window_end);
        shifts.push(emit(start, end, end - start < min));
    }

    ShiftSet { shifts }
}

pub struct ShiftSynthesisStage;

impl PlanStage for ShiftSynthesisStage {
    fn name(&self) -> &'static str {
        "shift_synthesis"
    }

    fn run(&self, ctx: &mut PlanContext) -> PlanResult<Vec<PlanEvent>> {
        let curve = need(ctx.integer_demand.as_ref(), self.name(), "integer_demand")?;

        let shifts = if ctx.is_empty_demand() {
            ShiftSet::default()
        } else {
            let params = SynthesisParams {
                min_shift_slots:     ctx.params.min_shift_slots(),
                max_starts_per_slot: ctx.params.max_starts(),
            };
            synthesize_shifts(curve, &ctx.request.role, params)
        };

        let coverage = coverage_report(curve, &shifts);
        if coverage.over_units() > 0 {
            log::warn!(
                "{} {}: {} slot-head(s) of tolerated overcapacity",
                ctx.request.date,
                ctx.request.role,
                coverage.over_units()
            );
        }
        log::debug!(
            "{} {}: {} shift(s), {:.2}h",
            ctx.request.date,
            ctx.request.role,
            shifts.len(),
            shifts.total_hours()
        );

        let event = PlanEvent::ShiftsSynthesized {
            shift_count:         shifts.len(),
            clamped_count:       shifts.clamped_count(),
            overcapacity_units:  coverage.over_units(),
            undercapacity_units: coverage.under_units(),
        };
        ctx.shifts = Some(shifts);
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::StaffingWindow;

    fn curve(heads: &[u32]) -> IntegerDemandCurve {
        let window = StaffingWindow::from_slots(40, 40 + heads.len()).unwrap();
        IntegerDemandCurve::from_window_heads(window, heads).unwrap()
    }

    fn unbounded(min_shift_slots: usize) -> SynthesisParams {
        SynthesisParams {
            min_shift_slots,
            max_starts_per_slot: None,
        }
    }

    #[test]
    fn flat_curve_is_one_shift_per_head() {
        let set = synthesize_shifts(&curve(&[2; 16]), "server", unbounded(12));
        assert_eq!(set.len(), 2);
        for shift in set.iter() {
            assert_eq!((shift.start_slot, shift.end_slot), (40, 56));
            assert!(!shift.clamped_at_day_end);
        }
    }

    #[test]
    fn zero_curve_produces_no_shifts() {
        let set = synthesize_shifts(&curve(&[0; 20]), "server", unbounded(4));
        assert!(set.is_empty());
    }

    #[test]
    fn closes_oldest_qualifying_shift_first() {
        // Two staggered opens, one close once both qualify.
        let heads = [1, 1, 2, 2, 2, 2, 1, 1];
        let set = synthesize_shifts(&curve(&heads), "server", unbounded(2));
        assert_eq!(set.shifts[0].start_slot, 40);
        assert_eq!(set.shifts[0].end_slot, 46);
        assert_eq!(set.shifts[1].start_slot, 42);
        assert_eq!(set.shifts[1].end_slot, 48);
    }

    #[test]
    fn late_open_is_clamped_at_window_end() {
        let mut heads = vec![1; 12];
        heads[10] = 2;
        heads[11] = 2;
        let set = synthesize_shifts(&curve(&heads), "server", unbounded(8));
        let clamped: Vec<_> = set.iter().filter(|s| s.clamped_at_day_end).collect();
        assert_eq!(clamped.len(), 1);
        assert_eq!((clamped[0].start_slot, clamped[0].end_slot), (50, 52));
    }

    #[test]
    fn start_limit_defers_opens_to_later_slots() {
        let params = SynthesisParams {
            min_shift_slots:     4,
            max_starts_per_slot: Some(1),
        };
        let set = synthesize_shifts(&curve(&[3; 8]), "server", params);
        let starts: Vec<_> = set.iter().map(|s| s.start_slot).collect();
        let mut per_slot = std::collections::BTreeMap::new();
        for s in &starts {
            *per_slot.entry(*s).or_insert(0) += 1;
        }
        assert!(per_slot.values().all(|&n| n <= 1));
        assert_eq!(starts[..3], [40, 41, 42]);
    }

    #[test]
    fn summary_reports_span_and_hours() {
        let set = synthesize_shifts(&curve(&[1; 16]), "server", unbounded(12));
        let summary = set.summary();
        assert_eq!(summary.shift_count, 1);
        assert_eq!(summary.total_hours, 4.0);
        assert_eq!(summary.first_start, Some(40));
        assert_eq!(summary.last_end, Some(56));
    }
}

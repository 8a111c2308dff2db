//! Coverage: how many shifts are on the floor at each slot, against
//! what the integer curve asked for.

use crate::{
    integerizer_stage::IntegerDemandCurve,
    shift_synthesis_stage::ShiftSet,
    types::SlotIndex,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCoverage {
    pub slot:     SlotIndex,
    pub required: u32,
    pub covered:  u32,
}

impl SlotCoverage {
    pub fn over(&self) -> u32 {
        self.covered.saturating_sub(self.required)
    }

    pub fn under(&self) -> u32 {
        self.required.saturating_sub(self.covered)
    }
}

/// Per-slot coverage over the staffing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub slots: Vec<SlotCoverage>,
}

impl CoverageReport {
    /// Slot-heads of coverage beyond the requirement.
    pub fn over_units(&self) -> u32 {
        self.slots.iter().map(SlotCoverage::over).sum()
    }

    /// Slot-heads of requirement left uncovered.
    pub fn under_units(&self) -> u32 {
        self.slots.iter().map(SlotCoverage::under).sum()
    }

    pub fn is_exact(&self) -> bool {
        self.slots.iter().all(|s| s.covered == s.required)
    }

    pub fn at(&self, slot: SlotIndex) -> Option<&SlotCoverage> {
        self.slots.iter().find(|s| s.slot == slot)
    }
}

/// A shift covers slot t when start <= t < end.
pub fn coverage_report(curve: &IntegerDemandCurve, shifts: &ShiftSet) -> CoverageReport {
    let slots = curve
        .in_window()
        .map(|(slot, required)| SlotCoverage {
            slot,
            required,
            covered: shifts.iter().filter(|s| s.covers(slot)).count() as u32,
        })
        .collect();
    CoverageReport { slots }
}

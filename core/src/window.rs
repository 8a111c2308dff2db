//! Staffing window — the part of the day during which shifts may exist.

use crate::{
    clock::{format_boundary, parse_boundary},
    error::{PlanError, PlanResult},
    types::{SlotIndex, SLOTS_PER_DAY},
};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Immutable `[start, end)` window on slot boundaries.
/// Invariant: `start_slot < end_slot <= SLOTS_PER_DAY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowSpec", into = "WindowSpec")]
pub struct StaffingWindow {
    start_slot: SlotIndex,
    end_slot:   SlotIndex,
}

/// Wire form of a window: `{"start": "11:30", "end": "23:00"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSpec {
    pub start: String,
    pub end:   String,
}

impl StaffingWindow {
    /// Build a window from "HH:MM" times of day.
    pub fn parse(start: &str, end: &str) -> PlanResult<Self> {
        let malformed = |reason: String| PlanError::MalformedWindow {
            start: start.to_string(),
            end: end.to_string(),
            reason,
        };
        let start_slot = parse_boundary(start).map_err(|e| malformed(e.to_string()))?;
        let end_slot = parse_boundary(end).map_err(|e| malformed(e.to_string()))?;
        Self::from_slots(start_slot, end_slot)
    }

    pub fn from_slots(start_slot: SlotIndex, end_slot: SlotIndex) -> PlanResult<Self> {
        if start_slot >= end_slot || end_slot > SLOTS_PER_DAY {
            return Err(PlanError::MalformedWindow {
                start: format_boundary(start_slot),
                end: format_boundary(end_slot),
                reason: "start must be before end, within one day".into(),
            });
        }
        Ok(Self { start_slot, end_slot })
    }

    pub fn start_slot(&self) -> SlotIndex {
        self.start_slot
    }

    /// Exclusive end boundary.
    pub fn end_slot(&self) -> SlotIndex {
        self.end_slot
    }

    pub fn slots(&self) -> Range<SlotIndex> {
        self.start_slot..self.end_slot
    }

    pub fn len(&self) -> usize {
        self.end_slot - self.start_slot
    }

    pub fn contains(&self, slot: SlotIndex) -> bool {
        self.slots().contains(&slot)
    }

    pub fn start_label(&self) -> String {
        format_boundary(self.start_slot)
    }

    pub fn end_label(&self) -> String {
        format_boundary(self.end_slot)
    }
}

impl TryFrom<WindowSpec> for StaffingWindow {
    type Error = PlanError;

    fn try_from(spec: WindowSpec) -> PlanResult<Self> {
        Self::parse(&spec.start, &spec.end)
    }
}

impl From<StaffingWindow> for WindowSpec {
    fn from(window: StaffingWindow) -> Self {
        Self {
            start: window.start_label(),
            end:   window.end_label(),
        }
    }
}

impl std::fmt::Display for StaffingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_label(), self.end_label())
    }
}

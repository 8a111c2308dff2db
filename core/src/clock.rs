//! Slot clock — converts between times of day and quarter-hour slots.
//!
//! A day is SLOTS_PER_DAY slots of SLOT_MINUTES each. Slot `i` covers
//! `[i * 15min, (i + 1) * 15min)`. Boundaries run `0..=SLOTS_PER_DAY`;
//! the final boundary is written "24:00".

use crate::types::{SlotIndex, SLOTS_PER_DAY, SLOTS_PER_HOUR, SLOT_MINUTES};
use chrono::{NaiveTime, Timelike};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("'{0}' is not a HH:MM time of day")]
    Unparseable(String),

    #[error("{0} is not on a 15-minute slot boundary")]
    NotSlotAligned(String),
}

/// Parse a "HH:MM" time of day into a slot boundary.
/// "24:00" is accepted and maps to SLOTS_PER_DAY.
pub fn parse_boundary(text: &str) -> Result<SlotIndex, BoundaryError> {
    let text = text.trim();
    if text == "24:00" {
        return Ok(SLOTS_PER_DAY);
    }
    let time = NaiveTime::parse_from_str(text, "%H:%M")
        .map_err(|_| BoundaryError::Unparseable(text.to_string()))?;
    boundary_of(time).ok_or_else(|| BoundaryError::NotSlotAligned(text.to_string()))
}

/// The slot boundary at `time`, or None if `time` falls inside a slot.
pub fn boundary_of(time: NaiveTime) -> Option<SlotIndex> {
    if time.second() != 0 || time.nanosecond() != 0 || time.minute() % SLOT_MINUTES != 0 {
        return None;
    }
    Some((time.hour() * 60 / SLOT_MINUTES + time.minute() / SLOT_MINUTES) as SlotIndex)
}

/// Render a slot boundary as "HH:MM" ("24:00" for the end of day).
pub fn format_boundary(boundary: SlotIndex) -> String {
    let minutes = boundary as u32 * SLOT_MINUTES;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn slots_to_hours(slots: usize) -> f64 {
    slots as f64 / SLOTS_PER_HOUR
}

/// Number of whole slots in `minutes`, or None if `minutes` is not a
/// multiple of the slot length.
pub fn minutes_to_slots(minutes: u32) -> Option<usize> {
    if minutes % SLOT_MINUTES == 0 {
        Some((minutes / SLOT_MINUTES) as usize)
    } else {
        None
    }
}

//! Shared primitive types used across the entire planner.

/// Index of a 15-minute slot within a day, `0..SLOTS_PER_DAY`.
/// A slot boundary (window end, shift end) may equal `SLOTS_PER_DAY`.
pub type SlotIndex = usize;

/// A staffing role, e.g. "server" or "cook".
pub type Role = String;

/// The canonical run identifier.
pub type RunId = String;

/// Fixed slot granularity.
pub const SLOT_MINUTES: u32 = 15;

/// Number of slots in one calendar day.
pub const SLOTS_PER_DAY: usize = 96;

/// Quarter-hour head-units per labor hour.
pub const SLOTS_PER_HOUR: f64 = 4.0;

/// Most quarter-hour head-units one (date, role) plan may ask for.
pub const MAX_HEAD_UNITS: u32 = 1_000_000;

//! Stored demand curve queries.

use super::PlanStore;
use crate::{error::PlanResult, types::SlotIndex};
use chrono::NaiveDate;
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// One persisted slot: the fractional requirement next to its integer
/// rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDemandSlot {
    pub slot:           SlotIndex,
    pub slot_time:      String,
    pub within_window:  bool,
    pub raw_heads:      f64,
    pub required_heads: u32,
}

impl PlanStore {
    /// The stored curve for (date, role), all 96 slots in order, or an
    /// empty Vec when no plan exists.
    pub fn demand_curve(&self, date: NaiveDate, role: &str) -> PlanResult<Vec<StoredDemandSlot>> {
        let mut stmt = self.conn.prepare(
            "SELECT slot, slot_time, within_window, raw_heads, required_heads
             FROM demand_slot WHERE plan_date = ?1 AND role = ?2
             ORDER BY slot ASC",
        )?;
        let rows = stmt.query_map(params![date, role], |r| {
            Ok(StoredDemandSlot {
                slot:           r.get::<_, i64>(0)? as usize,
                slot_time:      r.get(1)?,
                within_window:  r.get(2)?,
                raw_heads:      r.get(3)?,
                required_heads: r.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

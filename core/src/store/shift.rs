//! Shift table queries.

use super::PlanStore;
use crate::{
    clock::format_boundary,
    error::{PlanError, PlanResult},
    shift_synthesis_stage::{Shift, ShiftSummary},
    types::SLOTS_PER_DAY,
};
use chrono::NaiveDate;
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Who put a shift on the schedule. Only `Auto` rows are replaced by
/// a new optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftSource {
    Auto,
    Manual,
}

impl ShiftSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftSource::Auto => "auto",
            ShiftSource::Manual => "manual",
        }
    }

    fn from_column(s: &str) -> Self {
        if s == "manual" {
            ShiftSource::Manual
        } else {
            ShiftSource::Auto
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredShift {
    pub id:     i64,
    pub source: ShiftSource,
    #[serde(flatten)]
    pub shift:  Shift,
}

impl PlanStore {
    /// All shifts for (date, role), auto and manual, by start then id.
    pub fn shifts_for(&self, date: NaiveDate, role: &str) -> PlanResult<Vec<StoredShift>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source, role, start_slot, end_slot, clamped_at_day_end
             FROM shift WHERE plan_date = ?1 AND role = ?2
             ORDER BY start_slot ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![date, role], |r| {
            Ok(StoredShift {
                id:     r.get(0)?,
                source: ShiftSource::from_column(&r.get::<_, String>(1)?),
                shift:  Shift {
                    role:               r.get(2)?,
                    start_slot:         r.get::<_, i64>(3)? as usize,
                    end_slot:           r.get::<_, i64>(4)? as usize,
                    clamped_at_day_end: r.get(5)?,
                },
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Record a hand-placed shift. Returns its row id.
    pub fn insert_manual_shift(
        &self,
        date: NaiveDate,
        role: &str,
        start_slot: usize,
        end_slot: usize,
    ) -> PlanResult<i64> {
        if start_slot >= end_slot || end_slot > SLOTS_PER_DAY {
            return Err(PlanError::InvalidParameter {
                name:   "shift",
                reason: format!(
                    "slots {start_slot}..{end_slot} are not a non-empty range within the day"
                ),
            });
        }
        if role.trim().is_empty() {
            return Err(PlanError::InvalidParameter {
                name:   "role",
                reason: "must not be empty".into(),
            });
        }
        self.conn.execute(
            "INSERT INTO shift (
                plan_date, role, start_slot, end_slot, start_time, end_time,
                clamped_at_day_end, source, run_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, NULL)",
            params![
                date,
                role,
                start_slot as i64,
                end_slot as i64,
                format_boundary(start_slot),
                format_boundary(end_slot),
                ShiftSource::Manual.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn auto_shift_count(&self, date: NaiveDate, role: &str) -> PlanResult<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM shift
             WHERE plan_date = ?1 AND role = ?2 AND source = 'auto'",
            params![date, role],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }

    /// Summary over every stored shift, manual ones included.
    pub fn shift_summary(&self, date: NaiveDate, role: &str) -> PlanResult<ShiftSummary> {
        let shifts: Vec<Shift> = self
            .shifts_for(date, role)?
            .into_iter()
            .map(|s| s.shift)
            .collect();
        Ok(ShiftSummary::from_shifts(&shifts))
    }
}

//! Whole-plan writes. One call replaces the auto-generated generation
//! for a (date, role); manual shifts are left alone.

use super::{insert_event, PlanStore, ShiftSource};
use crate::{
    clock::format_boundary,
    error::PlanResult,
    event::EventLogEntry,
    stage::PlanOutcome,
};
use rusqlite::params;

impl PlanStore {
    pub fn replace_plan(
        &self,
        run_id: &str,
        outcome: &PlanOutcome,
        events: &[EventLogEntry],
    ) -> PlanResult<()> {
        let date = outcome.date;
        let role = outcome.role.as_str();
        let tx = self.conn.unchecked_transaction()?;

        // ── Clear previous generation ──────────────────────────
        tx.execute(
            "DELETE FROM demand_slot WHERE plan_date = ?1 AND role = ?2",
            params![date, role],
        )?;
        tx.execute(
            "DELETE FROM shift WHERE plan_date = ?1 AND role = ?2 AND source = 'auto'",
            params![date, role],
        )?;
        tx.execute(
            "DELETE FROM plan_kpi WHERE plan_date = ?1 AND role = ?2",
            params![date, role],
        )?;

        // ── Demand ─────────────────────────────────────────────
        {
            let mut stmt = tx.prepare(
                "INSERT INTO demand_slot (
                    plan_date, role, slot, slot_time, within_window,
                    raw_heads, required_heads, run_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for (raw, int) in outcome
                .demand
                .points
                .iter()
                .zip(&outcome.integer_demand.points)
            {
                stmt.execute(params![
                    date,
                    role,
                    raw.slot as i64,
                    format_boundary(raw.slot),
                    raw.within_window,
                    raw.required_heads,
                    int.required_heads,
                    run_id,
                ])?;
            }
        }

        // ── Shifts ─────────────────────────────────────────────
        {
            let mut stmt = tx.prepare(
                "INSERT INTO shift (
                    plan_date, role, start_slot, end_slot, start_time, end_time,
                    clamped_at_day_end, source, run_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for shift in outcome.shifts.iter() {
                stmt.execute(params![
                    date,
                    role,
                    shift.start_slot as i64,
                    shift.end_slot as i64,
                    shift.start_label(),
                    shift.end_label(),
                    shift.clamped_at_day_end,
                    ShiftSource::Auto.as_str(),
                    run_id,
                ])?;
            }
        }

        // ── KPI ────────────────────────────────────────────────
        let kpi = &outcome.kpi;
        tx.execute(
            "INSERT INTO plan_kpi (
                plan_date, role, forecast_revenue, hourly_rate, target_hours,
                planned_hours, planned_cost, planned_cost_pct, shift_count,
                overcapacity_units, undercapacity_units, run_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                date,
                role,
                kpi.forecast_revenue,
                kpi.hourly_rate,
                kpi.target_hours,
                kpi.planned_hours,
                kpi.planned_cost,
                kpi.planned_cost_pct,
                kpi.shift_count as i64,
                kpi.overcapacity_units,
                kpi.undercapacity_units,
                run_id,
            ],
        )?;

        for entry in events {
            insert_event(&tx, entry)?;
        }

        tx.commit()?;
        log::debug!(
            "{date} {role}: stored {} demand slot(s), {} shift(s)",
            outcome.demand.points.len(),
            outcome.shifts.len()
        );
        Ok(())
    }
}

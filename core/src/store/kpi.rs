//! Plan KPI queries.

use super::PlanStore;
use crate::{error::PlanResult, kpi_stage::PlanKpi};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

impl PlanStore {
    pub fn plan_kpi(&self, date: NaiveDate, role: &str) -> PlanResult<Option<PlanKpi>> {
        let kpi = self
            .conn
            .query_row(
                "SELECT forecast_revenue, hourly_rate, target_hours, planned_hours,
                        planned_cost, planned_cost_pct, shift_count,
                        overcapacity_units, undercapacity_units
                 FROM plan_kpi WHERE plan_date = ?1 AND role = ?2",
                params![date, role],
                |r| {
                    Ok(PlanKpi {
                        forecast_revenue:    r.get(0)?,
                        hourly_rate:         r.get(1)?,
                        target_hours:        r.get(2)?,
                        planned_hours:       r.get(3)?,
                        planned_cost:        r.get(4)?,
                        planned_cost_pct:    r.get(5)?,
                        shift_count:         r.get::<_, i64>(6)? as usize,
                        overcapacity_units:  r.get(7)?,
                        undercapacity_units: r.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(kpi)
    }
}

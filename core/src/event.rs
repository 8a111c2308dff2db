//! The plan event log.
//!
//! RULE: Stages report what they did ONLY through events.
//! The engine persists every event, in emission order, in the same
//! transaction as the plan rows it describes.

use crate::types::{Role, RunId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Every event emitted while planning.
/// Variants are only ever added, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        run_id:  RunId,
        version: String,
    },
    PlanRequested {
        date:   NaiveDate,
        role:   Role,
        window: String,
    },
    PlanRejected {
        date:   NaiveDate,
        role:   Role,
        reason: String,
    },

    // ── Stage events ───────────────────────────────
    LaborBudgetTranslated {
        revenue:              f64,
        target_cost_fraction: f64,
        hourly_rate:          f64,
        target_hours:         f64,
    },
    DemandCurveBuilt {
        in_window_slots: usize,
        share_sum:       f64,
        total_heads:     f64,
    },
    EmptyDemandDetected {
        date: NaiveDate,
        role: Role,
    },
    CurveIntegerized {
        total_heads: u32,
        remainder:   i64,
        unresolved:  u32,
    },
    ShiftsSynthesized {
        shift_count:         usize,
        clamped_count:       usize,
        overcapacity_units:  u32,
        undercapacity_units: u32,
    },
    KpiComputed {
        planned_hours:    f64,
        planned_cost:     f64,
        planned_cost_pct: Option<f64>,
    },
}

impl PlanEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            PlanEvent::RunInitialized { .. }        => "run_initialized",
            PlanEvent::PlanRequested { .. }         => "plan_requested",
            PlanEvent::PlanRejected { .. }          => "plan_rejected",
            PlanEvent::LaborBudgetTranslated { .. } => "labor_budget_translated",
            PlanEvent::DemandCurveBuilt { .. }      => "demand_curve_built",
            PlanEvent::EmptyDemandDetected { .. }   => "empty_demand_detected",
            PlanEvent::CurveIntegerized { .. }      => "curve_integerized",
            PlanEvent::ShiftsSynthesized { .. }     => "shifts_synthesized",
            PlanEvent::KpiComputed { .. }           => "kpi_computed",
        }
    }
}

/// A single row in the persistent event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    /// None for run-level events.
    pub plan_date:  Option<NaiveDate>,
    pub role:       Option<Role>,
    pub stage:      String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized PlanEvent
}

//! Stage trait and the per-request context stages share.
//!
//! RULE: Every pipeline step implements PlanStage.
//! The engine calls run() on each registered stage in registration
//! order, once per (date, role) request.
//! A stage reads only what earlier stages left in the context.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    config::PlannerParams,
    demand_curve_stage::DemandCurve,
    error::{PlanError, PlanResult},
    event::PlanEvent,
    integerizer_stage::IntegerDemandCurve,
    kpi_stage::PlanKpi,
    profile::RevenueProfile,
    shift_synthesis_stage::ShiftSet,
    types::Role,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The contract every pipeline stage must fulfill.
pub trait PlanStage: Send {
    /// Unique stable name for this stage.
    fn name(&self) -> &'static str;

    /// Consume earlier outputs from `ctx`, store this stage's output
    /// back into it, and return the events describing the step.
    fn run(&self, ctx: &mut PlanContext) -> PlanResult<Vec<PlanEvent>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub date: NaiveDate,
    pub role: Role,
}

/// Working state of one request. Inputs are set by the engine; each
/// `Option` is filled by exactly one stage.
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub request:        PlanRequest,
    pub params:         PlannerParams,
    pub profile:        RevenueProfile,
    pub hourly_rate:    Option<f64>,
    pub target_hours:   Option<f64>,
    pub demand:         Option<DemandCurve>,
    pub integer_demand: Option<IntegerDemandCurve>,
    pub shifts:         Option<ShiftSet>,
    pub kpi:            Option<PlanKpi>,
}

impl PlanContext {
    pub fn new(
        request: PlanRequest,
        params: PlannerParams,
        profile: RevenueProfile,
        hourly_rate: Option<f64>,
    ) -> Self {
        Self {
            request,
            params,
            profile,
            hourly_rate,
            target_hours:   None,
            demand:         None,
            integer_demand: None,
            shifts:         None,
            kpi:            None,
        }
    }

    /// True once the demand stage has found nothing to plan.
    pub fn is_empty_demand(&self) -> bool {
        self.demand.as_ref().is_some_and(DemandCurve::is_empty_demand)
    }

    /// Collapse a fully run context into its outcome.
    pub fn into_outcome(self) -> PlanResult<PlanOutcome> {
        let stage = "engine";
        let hourly_rate = need(self.hourly_rate, stage, "hourly_rate")?;
        let demand = need(self.demand, stage, "demand")?;
        let integer_demand = need(self.integer_demand, stage, "integer_demand")?;
        let shifts = need(self.shifts, stage, "shifts")?;
        let kpi = need(self.kpi, stage, "kpi")?;
        Ok(PlanOutcome {
            date: self.request.date,
            role: self.request.role,
            hourly_rate,
            demand,
            integer_demand,
            shifts,
            kpi,
        })
    }
}

/// Unwrap an earlier stage's output or report the wiring error.
pub fn need<T>(slot: Option<T>, stage: &'static str, needs: &'static str) -> PlanResult<T> {
    slot.ok_or(PlanError::MissingStageOutput { stage, needs })
}

/// Everything one optimization run produces for a (date, role).
/// This is the unit the store replaces wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub date:           NaiveDate,
    pub role:           Role,
    pub hourly_rate:    f64,
    pub demand:         DemandCurve,
    pub integer_demand: IntegerDemandCurve,
    pub shifts:         ShiftSet,
    pub kpi:            PlanKpi,
}

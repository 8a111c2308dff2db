//! The plan engine — drives one (date, role) request through the pipeline.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Labor budget    revenue → target labor-hours
//!   2. Demand curve    target hours → fractional heads per slot
//!   3. Integerizer     fractional → integer heads, total preserved
//!   4. Shift synthesis integer heads → shifts
//!   5. KPI             shifts → planned hours / cost / cost %
//!
//! RULES:
//!   - Stages execute in registration order, once per request.
//!   - Each stage reads ONLY the outputs of earlier stages.
//!   - All-or-nothing: a plan is persisted only after every stage
//!     succeeded, in one transaction that replaces the previous
//!     auto-generated plan for the same (date, role).
//!   - A rejected request leaves the plan tables untouched.
//!   - Same inputs, same outputs: no stage reads a clock or an RNG.

use crate::{
    config::{PlannerConfig, RateSource},
    demand_curve_stage::DemandCurveStage,
    error::PlanResult,
    event::{EventLogEntry, PlanEvent},
    integerizer_stage::IntegerizerStage,
    kpi_stage::KpiStage,
    labor_budget_stage::LaborBudgetStage,
    profile::{ForecastBook, ForecastSource},
    shift_synthesis_stage::{ShiftSummary, ShiftSynthesisStage},
    stage::{PlanContext, PlanOutcome, PlanRequest, PlanStage},
    store::PlanStore,
    types::{Role, RunId},
};
use chrono::NaiveDate;

/// A computed plan plus the events that describe how it was reached.
#[derive(Debug, Clone)]
pub struct CompiledPlan {
    pub outcome: PlanOutcome,
    pub events:  Vec<(&'static str, PlanEvent)>,
}

pub struct PlanEngine {
    pub run_id: RunId,
    pub config: PlannerConfig,
    forecasts:  Box<dyn ForecastSource>,
    stages:     Vec<Box<dyn PlanStage>>,
    pub store:  PlanStore,
}

impl PlanEngine {
    /// Unvalidated and without stages; outside the crate use build().
    pub(crate) fn new(
        run_id: RunId,
        config: PlannerConfig,
        forecasts: Box<dyn ForecastSource>,
        store: PlanStore,
    ) -> Self {
        Self {
            run_id,
            config,
            forecasts,
            stages: Vec::new(),
            store,
        }
    }

    /// Build a fully wired engine with all stages registered.
    pub fn build(
        run_id: RunId,
        config: PlannerConfig,
        forecasts: Box<dyn ForecastSource>,
        store: PlanStore,
    ) -> PlanResult<Self> {
        config.validate()?;
        let mut engine = PlanEngine::new(run_id, config, forecasts, store);

        // EXECUTION ORDER: fixed, never reordered.
        engine.register(Box::new(LaborBudgetStage));
        engine.register(Box::new(DemandCurveStage));
        engine.register(Box::new(IntegerizerStage));
        engine.register(Box::new(ShiftSynthesisStage));
        engine.register(Box::new(KpiStage));
        Ok(engine)
    }

    /// Engine over a migrated in-memory store with the default test
    /// config. The run row is created and initialized.
    pub fn build_test(run_id: RunId, forecasts: ForecastBook) -> PlanResult<Self> {
        Self::build_test_with(run_id, PlannerConfig::default_test(), forecasts)
    }

    pub fn build_test_with(
        run_id: RunId,
        config: PlannerConfig,
        forecasts: ForecastBook,
    ) -> PlanResult<Self> {
        let store = PlanStore::in_memory()?;
        store.migrate()?;
        let engine = Self::build(run_id, config, Box::new(forecasts), store)?;
        engine.start_run("0.1.0-test")?;
        Ok(engine)
    }

    /// Fresh, globally unique run identifier.
    pub fn new_run_id() -> RunId {
        format!("run-{}", uuid::Uuid::new_v4())
    }

    /// Register a stage. Call in the documented execution order.
    pub fn register(&mut self, stage: Box<dyn PlanStage>) {
        self.stages.push(stage);
    }

    /// Create the run row and log RunInitialized.
    pub fn start_run(&self, version: &str) -> PlanResult<()> {
        self.store.insert_run(&self.run_id, version)?;
        let event = PlanEvent::RunInitialized {
            run_id:  self.run_id.clone(),
            version: version.to_string(),
        };
        let entry = self.log_entry(None, None, "engine", &event)?;
        self.store.append_event(&entry)
    }

    /// Run every stage for (date, role) without touching the store.
    pub fn compile(&self, date: NaiveDate, role: &str) -> PlanResult<CompiledPlan> {
        let params = self.config.params_for(role);
        let profile = self.forecasts.profile(date)?;
        let request = PlanRequest {
            date,
            role: role.to_string(),
        };

        let mut events = vec![(
            "engine",
            PlanEvent::PlanRequested {
                date,
                role:   role.to_string(),
                window: params.staffing_window.to_string(),
            },
        )];

        let hourly_rate = self.config.hourly_rate(role);
        let mut ctx = PlanContext::new(request, params, profile, hourly_rate);
        for stage in &self.stages {
            let new_events = stage.run(&mut ctx)?;
            log::debug!("{date} {role}: stage '{}' done", stage.name());
            events.extend(new_events.into_iter().map(|e| (stage.name(), e)));
        }

        Ok(CompiledPlan {
            outcome: ctx.into_outcome()?,
            events,
        })
    }

    /// Compile and persist, replacing any earlier auto-generated plan
    /// for (date, role). On rejection nothing but a PlanRejected event
    /// is written, and the error is returned.
    pub fn optimize(&self, date: NaiveDate, role: &str) -> PlanResult<PlanOutcome> {
        let compiled = match self.compile(date, role) {
            Ok(c) => c,
            Err(e) => {
                if e.is_rejection() {
                    log::warn!("{date} {role}: plan rejected: {e}");
                    let event = PlanEvent::PlanRejected {
                        date,
                        role:   role.to_string(),
                        reason: e.to_string(),
                    };
                    let entry = self.log_entry(Some(date), Some(role), "engine", &event)?;
                    self.store.append_event(&entry)?;
                }
                return Err(e);
            }
        };

        let entries = compiled
            .events
            .iter()
            .map(|(stage, event)| self.log_entry(Some(date), Some(role), stage, event))
            .collect::<PlanResult<Vec<_>>>()?;
        self.store.replace_plan(&self.run_id, &compiled.outcome, &entries)?;
        Ok(compiled.outcome)
    }

    /// Optimize every (date, role) pair, stopping at the first storage
    /// failure. Rejected requests are reported and skipped.
    pub fn optimize_all(
        &self,
        dates: &[NaiveDate],
        roles: &[Role],
    ) -> PlanResult<Vec<PlanResult<PlanOutcome>>> {
        let mut results = Vec::with_capacity(dates.len() * roles.len());
        for &date in dates {
            for role in roles {
                match self.optimize(date, role) {
                    Err(e) if !e.is_rejection() => return Err(e),
                    result => results.push(result),
                }
            }
        }
        Ok(results)
    }

    /// Read-back: persisted shift summary for (date, role).
    pub fn shift_summary(&self, date: NaiveDate, role: &str) -> PlanResult<ShiftSummary> {
        self.store.shift_summary(date, role)
    }

    /// Event log of this run, in write order.
    pub fn store_events(&self) -> PlanResult<Vec<EventLogEntry>> {
        self.store.events_for_run(&self.run_id)
    }

    fn log_entry(
        &self,
        date: Option<NaiveDate>,
        role: Option<&str>,
        stage: &str,
        event: &PlanEvent,
    ) -> PlanResult<EventLogEntry> {
        Ok(EventLogEntry {
            id:         None,
            run_id:     self.run_id.clone(),
            plan_date:  date,
            role:       role.map(str::to_string),
            stage:      stage.to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        })
    }
}

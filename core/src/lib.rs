//! Demand-to-shift staffing compiler.
//!
//! Turns a daily revenue forecast and its 96-slot intraday shape into
//! a concrete list of shifts for one role, plus the labor-cost KPIs of
//! that plan. See `engine` for the stage order.

pub mod clock;
pub mod config;
pub mod coverage;
pub mod demand_curve_stage;
pub mod engine;
pub mod error;
pub mod event;
pub mod integerizer_stage;
pub mod kpi_stage;
pub mod labor_budget_stage;
pub mod profile;
pub mod shift_synthesis_stage;
pub mod stage;
pub mod store;
pub mod types;
pub mod window;

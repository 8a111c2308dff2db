use crate::{
    clock::minutes_to_slots,
    error::{PlanError, PlanResult},
    types::{Role, SLOTS_PER_DAY, SLOT_MINUTES},
    window::StaffingWindow,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Algorithm parameters for one (date, role) plan.
/// Every knob the pipeline reads lives here; nothing is hardcoded in
/// the stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerParams {
    pub staffing_window: StaffingWindow,
    #[serde(default = "default_min_shift_minutes")]
    pub min_shift_minutes: u32,
    /// Staggering limit. `None` opens every required shift immediately.
    #[serde(default = "default_max_starts_per_slot")]
    pub max_starts_per_slot: Option<u32>,
    /// 0..=1. Breaks rounding ties in favour of later slots.
    #[serde(default = "default_late_bias")]
    pub late_bias: f64,
    #[serde(default = "default_target_cost_fraction")]
    pub target_cost_fraction: f64,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
    /// Per-slot minimum headcount from a staffing template, indexed by
    /// slot of day (SLOTS_PER_DAY entries).
    #[serde(default)]
    pub baseline_floor: Option<Vec<u32>>,
}

fn default_min_shift_minutes() -> u32 {
    180
}

fn default_max_starts_per_slot() -> Option<u32> {
    Some(1)
}

fn default_late_bias() -> f64 {
    0.25
}

fn default_target_cost_fraction() -> f64 {
    0.23
}

fn default_slot_minutes() -> u32 {
    SLOT_MINUTES
}

impl PlannerParams {
    /// Documented defaults with the given window.
    pub fn with_window(staffing_window: StaffingWindow) -> Self {
        Self {
            staffing_window,
            min_shift_minutes:    default_min_shift_minutes(),
            max_starts_per_slot:  default_max_starts_per_slot(),
            late_bias:            default_late_bias(),
            target_cost_fraction: default_target_cost_fraction(),
            slot_minutes:         default_slot_minutes(),
            baseline_floor:       None,
        }
    }

    /// Minimum shift duration in slots. Only meaningful after validate().
    pub fn min_shift_slots(&self) -> usize {
        minutes_to_slots(self.min_shift_minutes).unwrap_or(0)
    }

    pub fn max_starts(&self) -> Option<usize> {
        self.max_starts_per_slot.map(|m| m as usize)
    }

    /// Baseline floor restricted to the staffing window. `None` when
    /// unset or too short to cover the window.
    pub fn window_floor(&self) -> Option<&[u32]> {
        self.baseline_floor
            .as_deref()
            .and_then(|floor| floor.get(self.staffing_window.slots()))
    }

    pub fn validate(&self) -> PlanResult<()> {
        if self.slot_minutes != SLOT_MINUTES {
            return Err(PlanError::InvalidParameter {
                name: "slot_minutes",
                reason: format!("slot granularity is fixed at {SLOT_MINUTES}, got {}", self.slot_minutes),
            });
        }
        match minutes_to_slots(self.min_shift_minutes) {
            Some(0) | None => {
                return Err(PlanError::InvalidParameter {
                    name: "min_shift_minutes",
                    reason: format!(
                        "must be a positive multiple of {SLOT_MINUTES}, got {}",
                        self.min_shift_minutes
                    ),
                })
            }
            Some(_) => {}
        }
        if self.max_starts_per_slot == Some(0) {
            return Err(PlanError::InvalidParameter {
                name: "max_starts_per_slot",
                reason: "must be at least 1, or null for unbounded".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.late_bias) {
            return Err(PlanError::InvalidParameter {
                name: "late_bias",
                reason: format!("must be within 0..=1, got {}", self.late_bias),
            });
        }
        if !(self.target_cost_fraction > 0.0 && self.target_cost_fraction <= 1.0) {
            return Err(PlanError::InvalidParameter {
                name: "target_cost_fraction",
                reason: format!("must be within (0, 1], got {}", self.target_cost_fraction),
            });
        }
        if let Some(floor) = &self.baseline_floor {
            if floor.len() != SLOTS_PER_DAY {
                return Err(PlanError::InvalidParameter {
                    name: "baseline_floor",
                    reason: format!("expected {SLOTS_PER_DAY} entries, got {}", floor.len()),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Blended, fully loaded hourly labor cost.
    pub hourly_rate: f64,
    /// Overrides the planner-wide window for this role.
    #[serde(default)]
    pub staffing_window: Option<StaffingWindow>,
}

/// Source of blended hourly rates, one per role.
pub trait RateSource {
    fn hourly_rate(&self, role: &str) -> Option<f64>;
}

#[derive(Debug, Clone, Deserialize)]
struct PlannerFile {
    params: PlannerParams,
    roles:  BTreeMap<Role, RoleConfig>,
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub params: PlannerParams,
    pub roles:  BTreeMap<Role, RoleConfig>,
}

impl PlannerConfig {
    /// Load from the data/ directory and validate.
    /// In tests, use PlannerConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/planner.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: PlannerFile = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        let config = Self {
            params: file.params,
            roles:  file.roles,
        };
        config.validate()?;
        log::info!(
            "Loaded planner config: window {} | {} role(s)",
            config.params.staffing_window,
            config.roles.len()
        );
        Ok(config)
    }

    /// Checked once at configuration time, never per request.
    pub fn validate(&self) -> PlanResult<()> {
        self.params.validate()?;
        for role in self.roles.keys() {
            self.params_for(role).validate()?;
        }
        Ok(())
    }

    /// Planner parameters with the role's window override applied.
    pub fn params_for(&self, role: &str) -> PlannerParams {
        let mut params = self.params.clone();
        if let Some(window) = self.roles.get(role).and_then(|r| r.staffing_window) {
            params.staffing_window = window;
        }
        params
    }

    /// Config with hardcoded defaults for use in tests:
    /// window 11:30-23:00, one "server" role at 20.0/h.
    pub fn default_test() -> Self {
        let window = StaffingWindow::parse("11:30", "23:00")
            .unwrap_or_else(|e| panic!("default test window: {e}"));
        let mut roles = BTreeMap::new();
        roles.insert(
            "server".to_string(),
            RoleConfig {
                hourly_rate:     20.0,
                staffing_window: None,
            },
        );
        Self {
            params: PlannerParams::with_window(window),
            roles,
        }
    }
}

impl RateSource for PlannerConfig {
    fn hourly_rate(&self, role: &str) -> Option<f64> {
        self.roles.get(role).map(|r| r.hourly_rate)
    }
}

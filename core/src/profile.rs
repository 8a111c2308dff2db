//! Revenue forecasts, the read-only input of every plan.
//!
//! Forecast aggregation from history lives outside the planner. This
//! module defines the boundary (`ForecastSource`) and a date-keyed
//! book loaded from the data/ directory.

use crate::{
    error::{PlanError, PlanResult},
    types::SLOTS_PER_DAY,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Day-level revenue forecast plus its intraday share profile.
/// Shares need not sum to 1; the demand builder renormalizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueProfile {
    pub date: NaiveDate,
    /// None when the forecaster has nothing for this date.
    pub revenue: Option<f64>,
    pub shares: Vec<f64>,
}

impl RevenueProfile {
    pub fn new(date: NaiveDate, revenue: Option<f64>, shares: Vec<f64>) -> Self {
        Self { date, revenue, shares }
    }

    /// Placeholder for a date with no forecast: absent revenue, zero shares.
    pub fn absent(date: NaiveDate) -> Self {
        Self::new(date, None, vec![0.0; SLOTS_PER_DAY])
    }

    /// Check shape and sign of the share profile.
    pub fn validate_shares(&self) -> PlanResult<()> {
        if self.shares.len() != SLOTS_PER_DAY {
            return Err(PlanError::InvalidProfile {
                reason: format!(
                    "{}: expected {SLOTS_PER_DAY} slot shares, got {}",
                    self.date,
                    self.shares.len()
                ),
            });
        }
        if let Some((slot, share)) = self
            .shares
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s < 0.0)
        {
            return Err(PlanError::InvalidProfile {
                reason: format!("{}: slot {slot} has share {share}", self.date),
            });
        }
        Ok(())
    }
}

/// The forecast collaborator.
pub trait ForecastSource {
    /// Profile for `date`. Dates without a forecast come back with
    /// absent revenue rather than an error; the budget stage rejects them.
    fn profile(&self, date: NaiveDate) -> PlanResult<RevenueProfile>;
}

#[derive(Debug, Clone, Deserialize)]
struct ForecastFile {
    forecasts: Vec<RevenueProfile>,
}

/// In-memory, date-keyed forecast store.
#[derive(Debug, Clone, Default)]
pub struct ForecastBook {
    profiles: BTreeMap<NaiveDate, RevenueProfile>,
}

impl ForecastBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{data_dir}/forecasts/forecasts.json`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/forecasts/forecasts.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: ForecastFile = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        let mut book = Self::new();
        for profile in file.forecasts {
            book.insert(profile);
        }
        log::info!("Loaded {} forecast day(s) from {path}", book.len());
        Ok(book)
    }

    /// Insert or replace the profile for its date.
    pub fn insert(&mut self, profile: RevenueProfile) {
        self.profiles.insert(profile.date, profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.profiles.keys().copied()
    }
}

impl ForecastSource for ForecastBook {
    fn profile(&self, date: NaiveDate) -> PlanResult<RevenueProfile> {
        Ok(self
            .profiles
            .get(&date)
            .cloned()
            .unwrap_or_else(|| RevenueProfile::absent(date)))
    }
}

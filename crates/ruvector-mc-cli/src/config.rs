//! Configuration file for the command-line driver.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ruvector_mc_solver::merge::{MergeConfig, PerComponentCredit};
use ruvector_mc_solver::types::DEFAULT_WALKS;
use ruvector_mc_solver::validation::MAX_WALKS;
use ruvector_mc_solver::walk::WalkParams;
use serde::{Deserialize, Serialize};

/// Everything a run can be tuned with.
///
/// Every section is optional in the file:
///
/// ```json
/// {
///   "walk": { "termination_prob": 0.1, "max_steps": 10000 },
///   "merge": { "tolerance": 0.01, "magnitude_floor": 1e-10 },
///   "credit": { "reward_per_component": 10.0 },
///   "default_walks": 100000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McConfig {
    /// Random-walk parameters.
    pub walk: WalkParams,
    /// Merge tolerances.
    pub merge: MergeConfig,
    /// Credit per accepted component.
    pub credit: PerComponentCredit,
    /// Walks per component for generated work units and demos.
    pub default_walks: u64,
}

impl Default for McConfig {
    fn default() -> Self {
        Self {
            walk: WalkParams::default(),
            merge: MergeConfig::default(),
            credit: PerComponentCredit::default(),
            default_walks: DEFAULT_WALKS,
        }
    }
}

impl McConfig {
    /// Load from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_json(&content)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reject out-of-range values before any work starts.
    pub fn validate(&self) -> Result<()> {
        self.walk.validate().context("Invalid walk parameters")?;
        self.merge.validate().context("Invalid merge parameters")?;
        let reward = self.credit.reward_per_component;
        if !reward.is_finite() || reward < 0.0 {
            anyhow::bail!("reward_per_component must be finite and non-negative, got {reward}");
        }
        if self.default_walks == 0 || self.default_walks > MAX_WALKS {
            anyhow::bail!(
                "default_walks must be in [1, {MAX_WALKS}], got {}",
                self.default_walks
            );
        }
        Ok(())
    }

    /// `walks`, or [`default_walks`](Self::default_walks) when not given.
    pub fn walks_or_default(&self, walks: Option<u64>) -> u64 {
        walks.unwrap_or(self.default_walks)
    }
}

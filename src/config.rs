//! Learner configuration.
//!
//! One explicit value threaded into every learning run; nothing here is
//! process-global, so parallel runs and parameter sweeps do not interfere.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read learner config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse learner config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Configuration for the online ranking learners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// Number of learning trials to run.
    pub trials: usize,

    // -- Initial ranking values ----------------------------------------------
    // A high markedness default imposes the M >> F bias at the start of learning.

    /// Seed for constraints declared as Markedness.
    pub initial_markedness: f64,
    /// Seed for constraints declared as Faithfulness.
    pub initial_faithfulness: f64,
    /// Seed for constraints with no (or an unknown) declared type.
    pub initial_default: f64,

    // -- Plasticity schedule -------------------------------------------------

    /// Step size at the start of learning.
    pub initial_plasticity: f64,
    /// Per-trial multiplicative decay: plasticity *= (1 - decrement).
    pub plasticity_decrement: f64,

    /// Record the full ranking state every this many completed trials.
    pub snapshot_interval: usize,

    /// Added to the winner-preferrer count when sizing a promotion
    /// (convergent promotion/demotion rule only). Must be positive.
    pub promotion_margin: f64,

    /// RNG seed for seeding, corpus sampling, tie shuffles and MaxEnt draws.
    pub rng_seed: u64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            trials: 5000,
            initial_markedness: 10.0,
            initial_faithfulness: 0.0,
            initial_default: 0.0,
            initial_plasticity: 0.1,
            plasticity_decrement: 0.0,
            snapshot_interval: 10,
            promotion_margin: 1.0,
            rng_seed: 1337,
        }
    }
}

impl LearnerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("initial_markedness", self.initial_markedness),
            ("initial_faithfulness", self.initial_faithfulness),
            ("initial_default", self.initial_default),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("must be finite, got {value}"),
                });
            }
        }
        if !(self.initial_plasticity.is_finite() && self.initial_plasticity >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "initial_plasticity",
                message: format!("must be >= 0, got {}", self.initial_plasticity),
            });
        }
        if !(0.0..1.0).contains(&self.plasticity_decrement) {
            return Err(ConfigError::Invalid {
                field: "plasticity_decrement",
                message: format!("must lie in [0, 1), got {}", self.plasticity_decrement),
            });
        }
        if self.snapshot_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "snapshot_interval",
                message: "must be >= 1".to_string(),
            });
        }
        if !(self.promotion_margin.is_finite() && self.promotion_margin > 0.0) {
            return Err(ConfigError::Invalid {
                field: "promotion_margin",
                message: format!("must be > 0, got {}", self.promotion_margin),
            });
        }
        Ok(())
    }
}

/// Read a JSON config file; omitted fields take their defaults.
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<LearnerConfig, ConfigError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let config: LearnerConfig = serde_json::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}

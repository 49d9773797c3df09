//! Training configuration
//!
//! Parameters can be built in code or read from a TOML file. Keys are
//! accepted in camelCase (`maxTrees`) or snake_case (`max_trees`); unknown
//! keys are rejected so that typos do not silently fall back to defaults.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::errors::{Result, TrainerError};

/// Boosting parameters
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TrainingParams {
    /// Number of boosting rounds, one tree per round
    #[serde(alias = "max_trees")]
    pub max_trees: usize,

    /// Maximum tree depth, the root is at depth 0
    #[serde(alias = "max_depth")]
    pub max_depth: usize,

    /// L2 regularization on leaf weights
    pub lambda: f64,

    /// Minimum gain a split has to exceed
    pub gamma: f64,

    /// Shrinkage applied to each tree's contribution
    #[serde(alias = "learning_rate")]
    pub learning_rate: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            max_trees: 10,
            max_depth: 6,
            lambda: 1.0,
            gamma: 0.0,
            learning_rate: 1.0,
        }
    }
}

impl TrainingParams {
    /// Reject parameters that make training meaningless
    pub fn validate(&self) -> Result<()> {
        if self.max_trees == 0 {
            return Err(TrainerError::Configuration(
                "maxTrees must be positive".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(TrainerError::Configuration(
                "maxDepth must be positive".to_string(),
            ));
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(TrainerError::Configuration(format!(
                "lambda must be a finite value >= 0, got {}",
                self.lambda
            )));
        }
        if !(self.gamma.is_finite() && self.gamma >= 0.0) {
            return Err(TrainerError::Configuration(format!(
                "gamma must be a finite value >= 0, got {}",
                self.gamma
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainerError::Configuration(format!(
                "learningRate must be a finite value > 0, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// Parse and validate parameters from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let params: TrainingParams = toml::from_str(content)
            .map_err(|e| TrainerError::Configuration(format!("failed to parse config: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    /// Load and validate parameters from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TrainerError::Configuration(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }
}

//! Dense dataset loading and validation
//!
//! Reads CSV files with one instance per line, features first and the label
//! in the last column. The matrix is immutable once built.

use anyhow::{Context, Result};
use std::path::Path;

use crate::errors::TrainerError;

/// Training dataset with a dense feature matrix and one label per row
#[derive(Clone, Debug)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
    pub feature_count: usize,
}

impl Dataset {
    /// Build a dataset and check its shape
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<f64>) -> Result<Self, TrainerError> {
        let feature_count = features.first().map_or(0, Vec::len);
        let dataset = Self {
            features,
            labels,
            feature_count,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Check that rows and labels line up, rows are not ragged and every
    /// value is finite
    pub fn validate(&self) -> Result<(), TrainerError> {
        if self.features.is_empty() {
            return Err(TrainerError::Dataset("dataset has no instances".to_string()));
        }
        if self.feature_count == 0 {
            return Err(TrainerError::Dataset("dataset has no features".to_string()));
        }
        if self.labels.len() != self.features.len() {
            return Err(TrainerError::DimensionMismatch {
                what: "labels",
                expected: self.features.len(),
                found: self.labels.len(),
            });
        }

        for (row, values) in self.features.iter().enumerate() {
            if values.len() != self.feature_count {
                return Err(TrainerError::DimensionMismatch {
                    what: "features per row",
                    expected: self.feature_count,
                    found: values.len(),
                });
            }
            if let Some(feature) = values.iter().position(|v| !v.is_finite()) {
                return Err(TrainerError::InvalidFeature { row, feature });
            }
        }

        if let Some(row) = self.labels.iter().position(|v| !v.is_finite()) {
            return Err(TrainerError::InvalidLabel { row });
        }

        Ok(())
    }

    /// Load dataset from CSV file
    /// Expected format: feature1,feature2,...,label
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read CSV file {}", path.as_ref().display()))?;

        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut feature_count = 0;

        for (line_idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
            if parts.len() < 2 {
                anyhow::bail!("Line {}: expected at least 2 columns", line_idx + 1);
            }

            if feature_count == 0 {
                feature_count = parts.len() - 1;
            } else if parts.len() - 1 != feature_count {
                anyhow::bail!(
                    "Line {}: expected {} features, got {}",
                    line_idx + 1,
                    feature_count,
                    parts.len() - 1
                );
            }

            let row = parts[..feature_count]
                .iter()
                .enumerate()
                .map(|(i, part)| {
                    part.parse::<f64>().with_context(|| {
                        format!("Line {}, column {}: invalid number", line_idx + 1, i + 1)
                    })
                })
                .collect::<Result<Vec<f64>>>()?;

            let label = parts[feature_count]
                .parse::<f64>()
                .with_context(|| format!("Line {}: invalid label", line_idx + 1))?;

            features.push(row);
            labels.push(label);
        }

        if features.is_empty() {
            anyhow::bail!("Dataset is empty");
        }

        Ok(Self::new(features, labels)?)
    }

    /// Get number of instances
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Value of one feature for one instance
    #[inline]
    pub fn value(&self, instance: usize, feature: usize) -> f64 {
        self.features[instance][feature]
    }

    /// Per-feature (min, max)
    pub fn feature_stats(&self) -> Vec<(f64, f64)> {
        let mut stats = vec![(f64::INFINITY, f64::NEG_INFINITY); self.feature_count];

        for row in &self.features {
            for (i, &val) in row.iter().enumerate() {
                stats[i].0 = stats[i].0.min(val);
                stats[i].1 = stats[i].1.max(val);
            }
        }

        stats
    }
}

//! Boosted tree ensemble
//!
//! The ensemble is the artifact produced by training:
//! - Append-only list of trees, one per boosting round
//! - Inference sums `tree.weight * leaf` over all trees
//! - Canonical JSON serialization and blake3 model hashing

use super::tree::Tree;
use crate::serde_canon::{hash_canonical, hash_canonical_hex, to_canonical_json, CanonicalError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while exporting or loading a model
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Model validation failed: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),
}

/// Model file format version
pub const FORMAT_VERSION: u32 = 1;

/// Ordered sequence of regression trees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ensemble {
    /// Model format version
    pub version: u32,

    /// Number of features every instance must provide
    pub feature_count: usize,

    /// Trees in boosting order
    pub trees: Vec<Tree>,
}

impl Ensemble {
    /// Create an empty ensemble
    pub fn new(feature_count: usize) -> Self {
        Self {
            version: FORMAT_VERSION,
            feature_count,
            trees: Vec::new(),
        }
    }

    /// Append a completed tree
    pub fn push(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Get number of trees in the ensemble
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Sum of weighted leaf outputs over all trees
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .map(|tree| tree.weight * tree.evaluate(features))
            .sum()
    }

    /// Predict every row of a dense matrix
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Validate ensemble structure
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.version != FORMAT_VERSION {
            return Err(ExportError::Validation(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| {
                ExportError::Validation(format!("Tree {} validation failed: {}", i, e))
            })?;

            for node in &tree.nodes {
                if let Some((feature, _)) = node.split_on() {
                    if feature as usize >= self.feature_count {
                        return Err(ExportError::Validation(format!(
                            "Tree {} node {} splits on feature {} but the model has {} features",
                            i, node.id, feature, self.feature_count
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Serialize model to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String, ExportError> {
        Ok(to_canonical_json(self)?)
    }

    /// Compute Blake3 hash of canonical JSON representation
    pub fn hash(&self) -> Result<[u8; 32], ExportError> {
        Ok(hash_canonical(self)?)
    }

    /// Compute model hash as hex string
    pub fn hash_hex(&self) -> Result<String, ExportError> {
        Ok(hash_canonical_hex(self)?)
    }

    /// Save model to JSON file with canonical serialization
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        let json = self.to_canonical_json()?;
        fs::write(path.as_ref(), json)?;
        tracing::debug!(
            "Wrote {} trees to {}",
            self.trees.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Load model from JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let json = fs::read_to_string(path)?;
        let model: Ensemble = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Node, NodeRole};

    fn create_test_model() -> Ensemble {
        let tree1 = Tree::new(
            vec![
                Node::split(0, 0, 50.0, 1, 2),
                Node::leaf(1, 100.0).placed(0, NodeRole::Left, 1),
                Node::leaf(2, 200.0).placed(0, NodeRole::Right, 1),
            ],
            1.0,
        );

        let tree2 = Tree::new(
            vec![
                Node::split(0, 1, 30.0, 1, 2),
                Node::leaf(1, -50.0).placed(0, NodeRole::Left, 1),
                Node::leaf(2, 50.0).placed(0, NodeRole::Right, 1),
            ],
            0.5,
        );

        let mut model = Ensemble::new(2);
        model.push(tree1);
        model.push(tree2);
        model
    }

    #[test]
    fn test_model_creation() {
        let model = create_test_model();
        assert_eq!(model.version, FORMAT_VERSION);
        assert_eq!(model.num_trees(), 2);
        assert!(!model.is_empty());
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_model_inference() {
        let model = create_test_model();

        // Tree 1 goes left (100), tree 2 goes left (-50) at weight 0.5
        assert_eq!(model.predict(&[30.0, 20.0]), 75.0);
        // Tree 1 goes right (200), tree 2 goes right (50) at weight 0.5
        assert_eq!(model.predict(&[60.0, 40.0]), 225.0);

        let batch = model.predict_batch(&[vec![30.0, 20.0], vec![60.0, 40.0]]);
        assert_eq!(batch, vec![75.0, 225.0]);
    }

    #[test]
    fn test_empty_model_predicts_zero() {
        assert_eq!(Ensemble::new(3).predict(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_canonical_json() {
        let model = create_test_model();
        let json = model.to_canonical_json().unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_object());
        assert!(json.starts_with(r#"{"feature_count":2,"trees":"#));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_hash_changes_with_model() {
        let model1 = create_test_model();
        let mut model2 = create_test_model();
        model2.trees[0].nodes[1] = Node::leaf(1, 999.0).placed(0, NodeRole::Left, 1);

        assert_eq!(model1.hash_hex().unwrap(), create_test_model().hash_hex().unwrap());
        assert_ne!(model1.hash_hex().unwrap(), model2.hash_hex().unwrap());
        assert_eq!(model1.hash().unwrap().len(), 32);
    }

    #[test]
    fn test_save_load_json() {
        use tempfile::NamedTempFile;

        let model = create_test_model();
        let temp_file = NamedTempFile::new().unwrap();

        model.save_json(temp_file.path()).unwrap();
        let loaded = Ensemble::load_json(temp_file.path()).unwrap();

        assert_eq!(model, loaded);
        assert_eq!(model.hash_hex().unwrap(), loaded.hash_hex().unwrap());
    }

    #[test]
    fn test_model_validation() {
        let mut invalid = create_test_model();
        invalid.version = 999;
        assert!(matches!(invalid.validate(), Err(ExportError::Validation(_))));

        // Feature 1 is out of range for a one-feature model
        let mut invalid = create_test_model();
        invalid.feature_count = 1;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_load_rejects_orphan_node() {
        let mut model = create_test_model();
        // Extra node claiming the root as parent, not listed by the root
        model.trees[1]
            .nodes
            .push(Node::leaf(3, 1.0).placed(0, NodeRole::Left, 1));

        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), model.to_canonical_json().unwrap()).unwrap();

        assert!(matches!(
            Ensemble::load_json(temp_file.path()),
            Err(ExportError::Validation(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Ensemble::load_json(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}

//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Runs boosting rounds over a validated dataset. Each round computes
//! gradients from the prediction buffer as the previous round left it,
//! grows one tree and only then adds that tree's output to the buffer.

use gbtrain_model::Ensemble;
use tracing::info;

use crate::config::TrainingParams;
use crate::dataset::Dataset;
use crate::errors::Result;
use crate::gradients::{compute_gradients, mean_loss, mean_squared_error, Loss, SquaredError};
use crate::grower::TreeGrower;
use crate::sorted_index::SortedFeatureIndex;

/// Shape and training error after one boosting round
#[derive(Clone, Debug, PartialEq)]
pub struct RoundSummary {
    pub round: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub depth: u32,
    /// Mean squared error of the prediction buffer after this round
    pub train_mse: f64,
    /// Mean of the trainer's loss over the prediction buffer after this round
    pub train_loss: f64,
}

/// Everything a training run produces
#[derive(Clone, Debug)]
pub struct TrainingOutcome {
    pub ensemble: Ensemble,
    /// Running sum of tree outputs for every training instance
    pub predictions: Vec<f64>,
    pub history: Vec<RoundSummary>,
}

/// GBDT trainer
pub struct GbdtTrainer<L: Loss = SquaredError> {
    params: TrainingParams,
    loss: L,
}

impl GbdtTrainer<SquaredError> {
    pub fn new(params: TrainingParams) -> Result<Self> {
        Self::with_loss(params, SquaredError)
    }
}

impl<L: Loss> GbdtTrainer<L> {
    pub fn with_loss(params: TrainingParams, loss: L) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, loss })
    }

    /// Train a GBDT model on the given dataset
    pub fn train(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        dataset.validate()?;

        let index = SortedFeatureIndex::build(dataset);
        let grower = TreeGrower::new(dataset, &index, &self.params)?;

        let mut predictions = vec![0.0; dataset.len()];
        let mut ensemble = Ensemble::new(dataset.feature_count);
        let mut history = Vec::with_capacity(self.params.max_trees);

        for round in 0..self.params.max_trees {
            let pairs = compute_gradients(&self.loss, &predictions, &dataset.labels)?;
            let grown = grower.grow(&pairs, self.params.learning_rate)?;

            for (instance, prediction) in predictions.iter_mut().enumerate() {
                *prediction += grown.contribution(instance);
            }

            let summary = RoundSummary {
                round,
                nodes: grown.tree.nodes.len(),
                leaves: grown.tree.leaf_count(),
                depth: grown.tree.depth(),
                train_mse: mean_squared_error(&predictions, &dataset.labels),
                train_loss: mean_loss(&self.loss, &predictions, &dataset.labels),
            };
            info!(
                "Tree {}/{}: {} leaves, depth {}, train loss {:.6}, train mse {:.6}",
                round + 1,
                self.params.max_trees,
                summary.leaves,
                summary.depth,
                summary.train_loss,
                summary.train_mse
            );

            ensemble.push(grown.tree);
            history.push(summary);
        }

        Ok(TrainingOutcome {
            ensemble,
            predictions,
            history,
        })
    }
}

//! gbtrain trainer - exact-greedy gradient boosted regression trees
//!
//! Fits an additive ensemble of regression trees with second-order
//! (gradient and Hessian) statistics. Every round recomputes per-instance
//! gradients from the running predictions, grows one tree breadth-first over
//! a per-feature sorted index and adds its output to the predictions.

pub mod config;
pub mod dataset;
pub mod errors;
pub mod gradients;
pub mod grower;
pub mod partition;
pub mod sorted_index;
pub mod split;
pub mod stats;
pub mod trainer;

use std::path::Path;

pub use config::TrainingParams;
pub use dataset::Dataset;
pub use errors::TrainerError;
pub use gradients::{
    compute_gradients, mean_loss, mean_squared_error, GradientPair, Loss, SquaredError,
};
pub use grower::{GrownTree, TreeGrower};
pub use partition::{Partitioner, SplitNodes};
pub use sorted_index::SortedFeatureIndex;
pub use split::{SplitCandidate, SplitSearch};
pub use stats::{split_gain, NodeStats};
pub use trainer::{GbdtTrainer, RoundSummary, TrainingOutcome};

/// Train a model directly from a CSV file using the provided parameters.
pub fn train_model_from_csv(path: &Path, params: TrainingParams) -> Result<TrainingOutcome, TrainerError> {
    let dataset = Dataset::from_csv(path).map_err(|err| TrainerError::Dataset(format!("{err:#}")))?;
    GbdtTrainer::new(params)?.train(&dataset)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use gbtrain_model::NodeId;
use thiserror::Error;

/// Errors returned by the trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("dimension mismatch: expected {expected} {what}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("non-finite value for feature {feature} at row {row}")]
    InvalidFeature { row: usize, feature: usize },

    #[error("non-finite label at row {row}")]
    InvalidLabel { row: usize },

    #[error("inconsistent partition: instance {instance} is owned by node {owner} while node {expected} is being split")]
    InconsistentPartition {
        instance: usize,
        owner: NodeId,
        expected: NodeId,
    },

    #[error("dataset error: {0}")]
    Dataset(String),
}

pub type Result<T> = std::result::Result<T, TrainerError>;

//! Per-instance gradient/Hessian computation
//!
//! The tree learner only sees `GradientPair`s, so any twice-differentiable
//! loss can drive it through the `Loss` trait.

use rayon::prelude::*;

use crate::errors::{Result, TrainerError};

/// First and second derivative of the loss for one instance
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GradientPair {
    pub gradient: f64,
    pub hessian: f64,
}

impl GradientPair {
    pub fn new(gradient: f64, hessian: f64) -> Self {
        Self { gradient, hessian }
    }
}

/// Twice-differentiable loss
pub trait Loss: Sync {
    /// Derivatives with respect to the prediction
    fn gradient_pair(&self, prediction: f64, label: f64) -> GradientPair;

    fn loss(&self, prediction: f64, label: f64) -> f64;
}

/// `½ (prediction - label)²`
#[derive(Clone, Copy, Debug, Default)]
pub struct SquaredError;

impl Loss for SquaredError {
    #[inline]
    fn gradient_pair(&self, prediction: f64, label: f64) -> GradientPair {
        GradientPair::new(prediction - label, 1.0)
    }

    #[inline]
    fn loss(&self, prediction: f64, label: f64) -> f64 {
        let diff = prediction - label;
        0.5 * diff * diff
    }
}

/// Compute one gradient pair per instance from the current predictions
///
/// Does not touch `predictions`; calling it twice on the same buffer gives
/// identical pairs.
pub fn compute_gradients<L: Loss + ?Sized>(
    loss: &L,
    predictions: &[f64],
    labels: &[f64],
) -> Result<Vec<GradientPair>> {
    if predictions.len() != labels.len() {
        return Err(TrainerError::DimensionMismatch {
            what: "predictions",
            expected: labels.len(),
            found: predictions.len(),
        });
    }

    Ok(predictions
        .par_iter()
        .zip(labels.par_iter())
        .map(|(&prediction, &label)| loss.gradient_pair(prediction, label))
        .collect())
}

/// Average of `loss` over all instances
pub fn mean_loss<L: Loss + ?Sized>(loss: &L, predictions: &[f64], labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let sum: f64 = predictions
        .iter()
        .zip(labels)
        .map(|(&prediction, &label)| loss.loss(prediction, label))
        .sum();
    sum / labels.len() as f64
}

/// Mean squared error between predictions and labels
pub fn mean_squared_error(predictions: &[f64], labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let sum: f64 = predictions
        .iter()
        .zip(labels)
        .map(|(p, y)| (p - y) * (p - y))
        .sum();
    sum / labels.len() as f64
}

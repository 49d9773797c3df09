//! Aggregate gradient statistics of a node

use gbtrain_model::NodeSummary;
use std::ops::Add;

use crate::gradients::GradientPair;

/// Sum of gradients and Hessians over a node's instances
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeStats {
    pub sum_gradients: f64,
    pub sum_hessians: f64,
}

impl NodeStats {
    pub fn new(sum_gradients: f64, sum_hessians: f64) -> Self {
        Self {
            sum_gradients,
            sum_hessians,
        }
    }

    /// Sum the pairs of the given instances
    pub fn from_instances(instances: &[usize], pairs: &[GradientPair]) -> Self {
        let mut stats = Self::default();
        for &instance in instances {
            stats.push(pairs[instance]);
        }
        stats
    }

    /// Sum every pair
    pub fn from_pairs(pairs: &[GradientPair]) -> Self {
        let mut stats = Self::default();
        for &pair in pairs {
            stats.push(pair);
        }
        stats
    }

    #[inline]
    pub fn push(&mut self, pair: GradientPair) {
        self.sum_gradients += pair.gradient;
        self.sum_hessians += pair.hessian;
    }

    /// Statistics of one child given its parent and its sibling
    #[inline]
    pub fn subtract(parent: &NodeStats, sibling: &NodeStats) -> NodeStats {
        NodeStats {
            sum_gradients: parent.sum_gradients - sibling.sum_gradients,
            sum_hessians: parent.sum_hessians - sibling.sum_hessians,
        }
    }

    /// `G² / (H + λ)`, zero when the denominator is not positive
    #[inline]
    pub fn score(&self, lambda: f64) -> f64 {
        let denominator = self.sum_hessians + lambda;
        if denominator <= 0.0 {
            return 0.0;
        }
        self.sum_gradients * self.sum_gradients / denominator
    }

    /// Optimal constant output `-G / (H + λ)`, zero when the denominator is
    /// not positive
    #[inline]
    pub fn leaf_weight(&self, lambda: f64) -> f64 {
        let denominator = self.sum_hessians + lambda;
        if denominator <= 0.0 {
            return 0.0;
        }
        -self.sum_gradients / denominator
    }

    pub fn summary(&self, instances: usize) -> NodeSummary {
        NodeSummary {
            sum_gradients: self.sum_gradients,
            sum_hessians: self.sum_hessians,
            instances: instances as u64,
        }
    }
}

impl Add for NodeStats {
    type Output = NodeStats;

    fn add(self, other: NodeStats) -> NodeStats {
        NodeStats {
            sum_gradients: self.sum_gradients + other.sum_gradients,
            sum_hessians: self.sum_hessians + other.sum_hessians,
        }
    }
}

/// Regularized second-order gain of splitting `parent` into `left` and `right`
///
/// `½ · [ L_g²/(L_h+λ) + R_g²/(R_h+λ) − P_g²/(P_h+λ) ]`
#[inline]
pub fn split_gain(parent: &NodeStats, left: &NodeStats, right: &NodeStats, lambda: f64) -> f64 {
    0.5 * (left.score(lambda) + right.score(lambda) - parent.score(lambda))
}

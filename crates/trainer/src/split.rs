//! Exact-greedy split search
//!
//! Every feature is scanned over the node's sorted range with a running left
//! aggregate; the right aggregate comes from the parent by subtraction.
//! Features are scanned in parallel and reduced in feature order, so the
//! result does not depend on scheduling.

use rayon::prelude::*;
use std::ops::Range;

use crate::dataset::Dataset;
use crate::gradients::GradientPair;
use crate::sorted_index::SortedFeatureIndex;
use crate::stats::{split_gain, NodeStats};

/// Best split found so far for a node
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitCandidate {
    pub gain: f64,
    /// Instances with `value <= threshold` go left
    pub threshold: f64,
    pub feature: usize,
    /// Statistics of the left child as accumulated by the scan
    pub left: NodeStats,
    /// Number of instances sent left
    pub left_count: usize,
}

impl SplitCandidate {
    /// Whether `self` replaces `current`: strictly greater gain, or equal
    /// gain on the same feature with a different threshold. Equal gain on
    /// another feature keeps `current`.
    pub fn improves(&self, current: &SplitCandidate) -> bool {
        self.gain > current.gain
            || (self.gain == current.gain
                && self.feature == current.feature
                && self.threshold != current.threshold)
    }
}

/// Fold step applying `SplitCandidate::improves`
pub fn keep_best(current: Option<SplitCandidate>, candidate: SplitCandidate) -> Option<SplitCandidate> {
    match current {
        Some(current) if !candidate.improves(&current) => Some(current),
        _ => Some(candidate),
    }
}

/// Threshold between two distinct consecutive values such that
/// `lo <= threshold < hi`
fn threshold_between(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid < hi {
        mid
    } else {
        lo
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SplitSearch {
    lambda: f64,
    gamma: f64,
}

impl SplitSearch {
    pub fn new(lambda: f64, gamma: f64) -> Self {
        Self { lambda, gamma }
    }

    /// Best split of the node owning `range`, or `None` when no threshold
    /// gains more than gamma
    pub fn find_best_split(
        &self,
        dataset: &Dataset,
        index: &SortedFeatureIndex,
        range: Range<usize>,
        pairs: &[GradientPair],
        parent: &NodeStats,
    ) -> Option<SplitCandidate> {
        let per_feature: Vec<Option<SplitCandidate>> = (0..index.feature_count())
            .into_par_iter()
            .map(|feature| {
                self.best_for_feature(
                    dataset,
                    feature,
                    index.range(feature, range.clone()),
                    pairs,
                    parent,
                )
            })
            .collect();

        per_feature.into_iter().flatten().fold(None, keep_best)
    }

    /// Best threshold of one feature given the node's instances in sorted
    /// order
    pub fn best_for_feature(
        &self,
        dataset: &Dataset,
        feature: usize,
        order: &[usize],
        pairs: &[GradientPair],
        parent: &NodeStats,
    ) -> Option<SplitCandidate> {
        let mut left = NodeStats::default();
        let mut best = None;

        for (position, window) in order.windows(2).enumerate() {
            let (current, next) = (window[0], window[1]);
            left.push(pairs[current]);

            let lo = dataset.value(current, feature);
            let hi = dataset.value(next, feature);
            // Never split inside a run of equal values.
            if hi <= lo {
                continue;
            }

            let right = NodeStats::subtract(parent, &left);
            let gain = split_gain(parent, &left, &right, self.lambda);
            if gain <= self.gamma {
                continue;
            }

            best = keep_best(
                best,
                SplitCandidate {
                    gain,
                    threshold: threshold_between(lo, hi),
                    feature,
                    left,
                    left_count: position + 1,
                },
            );
        }

        best
    }
}

//! In-place instance partitioning
//!
//! Splitting a node reassigns its instances to the two children and then
//! stably partitions the node's range in every feature column, left child
//! first. Each child ends up owning a contiguous sub-range that is still
//! sorted by every feature. Positions outside the node's range are never
//! touched.

use gbtrain_model::NodeId;
use rayon::prelude::*;
use std::ops::Range;

use crate::dataset::Dataset;
use crate::errors::{Result, TrainerError};
use crate::sorted_index::SortedFeatureIndex;
use crate::split::SplitCandidate;

const MIN_INSTANCES_TO_PARALLELIZE: usize = 1024;

/// Nodes taking part in one split
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitNodes {
    pub parent: NodeId,
    pub left: NodeId,
    pub right: NodeId,
}

pub struct Partitioner<'a> {
    dataset: &'a Dataset,
}

impl<'a> Partitioner<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    /// Move the instances of `nodes.parent` at `range` to its children and
    /// return the first position owned by the right child
    pub fn partition(
        &self,
        index: &mut SortedFeatureIndex,
        assignment: &mut [NodeId],
        range: Range<usize>,
        split: &SplitCandidate,
        nodes: SplitNodes,
    ) -> Result<usize> {
        let mut n_left = 0;
        for &instance in index.range(split.feature, range.clone()) {
            let owner = assignment[instance];
            if owner != nodes.parent {
                return Err(TrainerError::InconsistentPartition {
                    instance,
                    owner,
                    expected: nodes.parent,
                });
            }
            if self.dataset.value(instance, split.feature) <= split.threshold {
                assignment[instance] = nodes.left;
                n_left += 1;
            } else {
                assignment[instance] = nodes.right;
            }
        }

        let assignment: &[NodeId] = assignment;
        let columns = index.columns_mut();
        if range.len() < MIN_INSTANCES_TO_PARALLELIZE {
            for column in columns.iter_mut() {
                stable_partition(&mut column[range.clone()], assignment, nodes)?;
            }
        } else {
            columns.par_iter_mut().try_for_each(|column| {
                stable_partition(&mut column[range.clone()], assignment, nodes).map(|_| ())
            })?;
        }

        Ok(range.start + n_left)
    }
}

/// Stable partition of one column's slice: left child's instances first
fn stable_partition(slice: &mut [usize], assignment: &[NodeId], nodes: SplitNodes) -> Result<usize> {
    let mut right = Vec::with_capacity(slice.len());
    let mut write = 0;

    for read in 0..slice.len() {
        let instance = slice[read];
        let owner = assignment[instance];
        if owner == nodes.left {
            slice[write] = instance;
            write += 1;
        } else if owner == nodes.right {
            right.push(instance);
        } else {
            return Err(TrainerError::InconsistentPartition {
                instance,
                owner,
                expected: nodes.parent,
            });
        }
    }

    slice[write..].copy_from_slice(&right);
    Ok(write)
}

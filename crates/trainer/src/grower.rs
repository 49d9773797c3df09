//! Tree growth over a splittable-node frontier
//!
//! Every node is created as a provisional leaf carrying the weight it would
//! output if it were never split. Popping a node from the frontier either
//! keeps it as a leaf (depth limit or no valid split) or turns it into a
//! split node whose two children join the frontier one level deeper.

use gbtrain_model::{Node, NodeId, NodeKind, NodeRole, Tree};
use std::collections::VecDeque;
use std::ops::Range;
use tracing::{debug, trace};

use crate::config::TrainingParams;
use crate::dataset::Dataset;
use crate::errors::{Result, TrainerError};
use crate::gradients::GradientPair;
use crate::partition::{Partitioner, SplitNodes};
use crate::sorted_index::SortedFeatureIndex;
use crate::split::SplitSearch;
use crate::stats::NodeStats;

/// A node waiting for a split decision
#[derive(Clone, Debug)]
struct FrontierNode {
    id: NodeId,
    range: Range<usize>,
    stats: NodeStats,
    depth: usize,
}

/// Nodes of the tree under construction, ids issued in creation order
#[derive(Default)]
struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    fn create(
        &mut self,
        parent: Option<(NodeId, NodeRole)>,
        depth: usize,
        stats: NodeStats,
        instances: usize,
        lambda: f64,
    ) -> NodeId {
        let id = self.nodes.len() as NodeId;
        let mut node =
            Node::leaf(id, stats.leaf_weight(lambda)).with_summary(stats.summary(instances));
        if let Some((parent, role)) = parent {
            node = node.placed(parent, role, depth as u32);
        }
        self.nodes.push(node);
        id
    }

    fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id as usize].kind = kind;
    }
}

/// Feature index as stored in a model split node
fn feature_id(feature: usize) -> Result<u32> {
    u32::try_from(feature).map_err(|_| {
        TrainerError::Configuration(format!(
            "feature index {feature} does not fit a model split node"
        ))
    })
}

/// A finished tree plus the leaf every training instance ended up in
#[derive(Clone, Debug)]
pub struct GrownTree {
    pub tree: Tree,
    pub leaf_of: Vec<NodeId>,
}

impl GrownTree {
    /// Output of the tree for one training instance, scaled by the tree weight
    pub fn contribution(&self, instance: usize) -> f64 {
        let leaf = &self.tree.nodes[self.leaf_of[instance] as usize];
        self.tree.weight * leaf.leaf_weight().unwrap_or(0.0)
    }
}

pub struct TreeGrower<'a> {
    dataset: &'a Dataset,
    index: &'a SortedFeatureIndex,
    search: SplitSearch,
    max_depth: usize,
    lambda: f64,
}

impl<'a> TreeGrower<'a> {
    /// `index` must be built from `dataset`; it is cloned for every tree
    pub fn new(
        dataset: &'a Dataset,
        index: &'a SortedFeatureIndex,
        params: &TrainingParams,
    ) -> Result<Self> {
        params.validate()?;
        if index.feature_count() != dataset.feature_count {
            return Err(TrainerError::DimensionMismatch {
                what: "sorted feature columns",
                expected: dataset.feature_count,
                found: index.feature_count(),
            });
        }
        feature_id(dataset.feature_count.saturating_sub(1))?;
        if index.instance_count() != dataset.len() {
            return Err(TrainerError::DimensionMismatch {
                what: "sorted instances",
                expected: dataset.len(),
                found: index.instance_count(),
            });
        }

        Ok(Self {
            dataset,
            index,
            search: SplitSearch::new(params.lambda, params.gamma),
            max_depth: params.max_depth,
            lambda: params.lambda,
        })
    }

    /// Grow one tree from a root owning every instance
    pub fn grow(&self, pairs: &[GradientPair], tree_weight: f64) -> Result<GrownTree> {
        let n = self.dataset.len();
        if pairs.len() != n {
            return Err(TrainerError::DimensionMismatch {
                what: "gradient pairs",
                expected: n,
                found: pairs.len(),
            });
        }

        let mut index = self.index.clone();
        let mut assignment: Vec<NodeId> = vec![0; n];
        let partitioner = Partitioner::new(self.dataset);
        let mut arena = NodeArena::default();

        let root_stats = NodeStats::from_pairs(pairs);
        let root = arena.create(None, 0, root_stats, n, self.lambda);
        let mut frontier = VecDeque::from([FrontierNode {
            id: root,
            range: 0..n,
            stats: root_stats,
            depth: 0,
        }]);

        while let Some(node) = frontier.pop_front() {
            if node.depth >= self.max_depth {
                trace!("node {} stays a leaf at depth limit", node.id);
                continue;
            }

            let Some(split) = self.search.find_best_split(
                self.dataset,
                &index,
                node.range.clone(),
                pairs,
                &node.stats,
            ) else {
                trace!("node {} has no valid split", node.id);
                continue;
            };

            let feature_idx = feature_id(split.feature)?;
            let left_stats = split.left;
            let right_stats = NodeStats::subtract(&node.stats, &left_stats);
            let right_count = node.range.len() - split.left_count;
            let depth = node.depth + 1;
            let left = arena.create(
                Some((node.id, NodeRole::Left)),
                depth,
                left_stats,
                split.left_count,
                self.lambda,
            );
            let right = arena.create(
                Some((node.id, NodeRole::Right)),
                depth,
                right_stats,
                right_count,
                self.lambda,
            );

            let mid = partitioner.partition(
                &mut index,
                &mut assignment,
                node.range.clone(),
                &split,
                SplitNodes {
                    parent: node.id,
                    left,
                    right,
                },
            )?;
            debug_assert_eq!(mid - node.range.start, split.left_count);

            arena.set_kind(
                node.id,
                NodeKind::Split {
                    feature_idx,
                    threshold: split.threshold,
                    left,
                    right,
                },
            );
            debug!(
                "node {} split on f{} <= {} (gain {:.6}, {} | {})",
                node.id, split.feature, split.threshold, split.gain, split.left_count, right_count
            );

            frontier.push_back(FrontierNode {
                id: left,
                range: node.range.start..mid,
                stats: left_stats,
                depth,
            });
            frontier.push_back(FrontierNode {
                id: right,
                range: mid..node.range.end,
                stats: right_stats,
                depth,
            });
        }

        Ok(GrownTree {
            tree: Tree::new(arena.nodes, tree_weight),
            leaf_of: assignment,
        })
    }
}

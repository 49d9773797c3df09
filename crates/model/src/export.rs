//! Read-only walk over a finished ensemble
//!
//! Serializers that need their own layout consume `NodeRecord`s instead of
//! reaching into the tree structs.

use crate::ensemble::Ensemble;
use crate::tree::{NodeId, NodeKind, NodeRole};
use serde::Serialize;

/// One node of one tree, in ensemble order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeRecord {
    /// Index of the tree in the ensemble
    pub tree: usize,
    pub node: NodeId,
    pub role: NodeRole,
    pub kind: NodeKind,
}

impl Ensemble {
    /// Visit every node of every tree, trees in boosting order and nodes in
    /// id order
    pub fn walk(&self) -> impl Iterator<Item = NodeRecord> + '_ {
        self.trees.iter().enumerate().flat_map(|(tree_idx, tree)| {
            tree.nodes.iter().map(move |node| NodeRecord {
                tree: tree_idx,
                node: node.id,
                role: node.role,
                kind: node.kind,
            })
        })
    }
}

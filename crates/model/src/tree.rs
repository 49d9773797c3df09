//! Regression tree structures
//!
//! Trees are stored as a flat vector of nodes. A node's `id` is its index in
//! that vector and ids grow monotonically in creation order, so the root is
//! always node 0 and children always come after their parent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node inside one tree
pub type NodeId = u32;

/// Position of a node relative to its parent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Root,
    Left,
    Right,
}

/// What a node does when an instance reaches it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Instances with `value <= threshold` on `feature_idx` go to `left`,
    /// everything else goes to `right`.
    Split {
        feature_idx: u32,
        threshold: f64,
        left: NodeId,
        right: NodeId,
    },
    /// Terminal node holding the closed-form output weight.
    Leaf { weight: f64 },
}

/// Training statistics of the instances that reached a node
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeSummary {
    pub sum_gradients: f64,
    pub sum_hessians: f64,
    pub instances: u64,
}

/// A regression tree node (internal or leaf)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID, equal to the node's index in `Tree::nodes`
    pub id: NodeId,

    /// Parent node (None for the root)
    pub parent: Option<NodeId>,

    pub role: NodeRole,

    /// Distance from the root (root is depth 0)
    pub depth: u32,

    pub kind: NodeKind,

    pub summary: NodeSummary,
}

impl Node {
    /// Create a new internal (split) node placed at the root
    pub fn split(id: NodeId, feature_idx: u32, threshold: f64, left: NodeId, right: NodeId) -> Self {
        Self {
            id,
            parent: None,
            role: NodeRole::Root,
            depth: 0,
            kind: NodeKind::Split {
                feature_idx,
                threshold,
                left,
                right,
            },
            summary: NodeSummary::default(),
        }
    }

    /// Create a new leaf node placed at the root
    pub fn leaf(id: NodeId, weight: f64) -> Self {
        Self {
            id,
            parent: None,
            role: NodeRole::Root,
            depth: 0,
            kind: NodeKind::Leaf { weight },
            summary: NodeSummary::default(),
        }
    }

    /// Attach the node below `parent`
    pub fn placed(mut self, parent: NodeId, role: NodeRole, depth: u32) -> Self {
        self.parent = Some(parent);
        self.role = role;
        self.depth = depth;
        self
    }

    pub fn with_summary(mut self, summary: NodeSummary) -> Self {
        self.summary = summary;
        self
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Get the leaf weight if this is a leaf node
    pub fn leaf_weight(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Leaf { weight } => Some(weight),
            NodeKind::Split { .. } => None,
        }
    }

    /// Feature and threshold of a split node
    pub fn split_on(&self) -> Option<(u32, f64)> {
        match self.kind {
            NodeKind::Split {
                feature_idx,
                threshold,
                ..
            } => Some((feature_idx, threshold)),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Child ids of a split node
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Split { left, right, .. } => Some((left, right)),
            NodeKind::Leaf { .. } => None,
        }
    }
}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,

    /// Multiplier applied to every leaf output of this tree when it is summed
    /// into an ensemble prediction
    pub weight: f64,
}

impl Tree {
    /// Create a new tree with the given nodes and weight
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Evaluate this tree on a feature vector and return the raw leaf weight
    ///
    /// Missing features or broken links evaluate to 0.0; `validate` rejects
    /// such trees before they are loaded.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        match self.leaf_for(features) {
            Some(idx) => self.nodes[idx].leaf_weight().unwrap_or(0.0),
            None => 0.0,
        }
    }

    /// Index of the leaf a feature vector lands in
    pub fn leaf_for(&self, features: &[f64]) -> Option<usize> {
        let mut idx = 0usize;

        // A valid path visits at most every node once.
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(idx)?;
            match node.kind {
                NodeKind::Leaf { .. } => return Some(idx),
                NodeKind::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    let value = *features.get(feature_idx as usize)?;
                    let next = if value <= threshold { left } else { right };
                    idx = next as usize;
                }
            }
        }

        None
    }

    /// Get the root node
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Depth of the deepest node
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        let Some(root) = self.nodes.first() else {
            return Err("Tree has no nodes".to_string());
        };

        if root.parent.is_some() || root.role != NodeRole::Root || root.depth != 0 {
            return Err("Node 0 is not a root".to_string());
        }

        if !self.weight.is_finite() {
            return Err(format!("Invalid tree weight: {}", self.weight));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.id as usize != i {
                return Err(format!("Node at index {} has id {}", i, node.id));
            }
            if i > 0 {
                self.check_parent(node)?;
            }

            match node.kind {
                NodeKind::Split {
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if !threshold.is_finite() {
                        return Err(format!("Node {i} has non-finite threshold"));
                    }
                    self.check_child(node, left, NodeRole::Left)?;
                    self.check_child(node, right, NodeRole::Right)?;
                }
                NodeKind::Leaf { weight } => {
                    if !weight.is_finite() {
                        return Err(format!("Leaf node {i} has non-finite weight"));
                    }
                }
            }
        }

        Ok(())
    }

    /// Every non-root node must be listed by its parent under its own role
    fn check_parent(&self, node: &Node) -> Result<(), String> {
        let Some(parent) = node.parent else {
            return Err(format!("Node {} is not attached to a parent", node.id));
        };

        let linked = match self.nodes.get(parent as usize).map(|p| p.kind) {
            Some(NodeKind::Split { left, right, .. }) => match node.role {
                NodeRole::Left => left == node.id,
                NodeRole::Right => right == node.id,
                NodeRole::Root => false,
            },
            _ => false,
        };

        if !linked {
            return Err(format!(
                "Node {} is not a {:?} child of node {}",
                node.id, node.role, parent
            ));
        }

        Ok(())
    }

    fn check_child(&self, parent: &Node, child: NodeId, role: NodeRole) -> Result<(), String> {
        // Children are created after their parent, which also rules out cycles.
        if child <= parent.id {
            return Err(format!(
                "Node {} has child {} that does not come after it",
                parent.id, child
            ));
        }

        let node = self
            .nodes
            .get(child as usize)
            .ok_or_else(|| format!("Node {} has invalid child: {}", parent.id, child))?;

        if node.parent != Some(parent.id) || node.role != role || node.depth != parent.depth + 1 {
            return Err(format!(
                "Node {} does not link back to parent {} as {:?}",
                child, parent.id, role
            ));
        }

        Ok(())
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, idx: usize) -> fmt::Result {
        let Some(node) = self.nodes.get(idx) else {
            return Ok(());
        };
        let indent = "  ".repeat(node.depth as usize);
        match node.kind {
            NodeKind::Split {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                writeln!(
                    f,
                    "{indent}[{}] f{} <= {} (n={})",
                    node.id, feature_idx, threshold, node.summary.instances
                )?;
                for child in [left, right] {
                    if child > node.id {
                        self.fmt_node(f, child as usize)?;
                    }
                }
                Ok(())
            }
            NodeKind::Leaf { weight } => writeln!(
                f,
                "{indent}[{}] leaf {} (n={})",
                node.id, weight, node.summary.instances
            ),
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, 0)
    }
}

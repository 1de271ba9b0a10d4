use std::fmt;

use serde::{Deserialize, Serialize};

/// Index into the node arena of a decision tree
///
/// The root of every tree is stored at index zero, children always come after their parent.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        NodeIndex(index)
    }

    /// The root node of a tree
    pub fn root() -> Self {
        NodeIndex(0)
    }

    /// Position in the node arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Child position below a split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// A node in the decision tree
///
/// Nodes live in a flat arena owned by their [`DecisionTree`](crate::DecisionTree) and refer to
/// their children by [`NodeIndex`]. They are never modified once the tree is built.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum TreeNode<F, L> {
    /// An internal node; rows with `row[feature_idx] <= threshold` continue in `left`, all other
    /// rows in `right`
    Split {
        feature_idx: usize,
        threshold: F,
        /// Decrease of impurity obtained by applying the split
        impurity_decrease: f64,
        /// Number of training samples which reached the node
        n_samples: usize,
        left: NodeIndex,
        right: NodeIndex,
    },
    /// A terminal node
    Leaf {
        /// Most common label of the training samples which reached the leaf
        prediction: L,
        /// Number of training samples per label, in the order the labels were first seen
        class_distribution: Vec<(L, usize)>,
        n_samples: usize,
    },
}

impl<F, L> TreeNode<F, L> {
    /// Points the `side` child of a split at `child`, leaves are left unchanged
    pub(crate) fn set_child(&mut self, side: Side, child: NodeIndex) {
        if let TreeNode::Split { left, right, .. } = self {
            match side {
                Side::Left => *left = child,
                Side::Right => *right = child,
            }
        }
    }
}

impl<F: Copy, L> TreeNode<F, L> {
    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    /// Returns `Some(prediction)` for leaf nodes and `None` for internal nodes.
    pub fn prediction(&self) -> Option<&L> {
        match self {
            TreeNode::Leaf { prediction, .. } => Some(prediction),
            TreeNode::Split { .. } => None,
        }
    }

    /// Returns the (feature index, threshold) of internal nodes
    pub fn split(&self) -> Option<(usize, F)> {
        match self {
            TreeNode::Split {
                feature_idx,
                threshold,
                ..
            } => Some((*feature_idx, *threshold)),
            TreeNode::Leaf { .. } => None,
        }
    }

    /// Returns both children of internal nodes, first left then right
    pub fn children(&self) -> Option<(NodeIndex, NodeIndex)> {
        match self {
            TreeNode::Split { left, right, .. } => Some((*left, *right)),
            TreeNode::Leaf { .. } => None,
        }
    }

    /// Number of training samples which reached this node
    pub fn n_samples(&self) -> usize {
        match self {
            TreeNode::Split { n_samples, .. } | TreeNode::Leaf { n_samples, .. } => *n_samples,
        }
    }
}

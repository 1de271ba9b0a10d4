//! Plain snapshots of fitted decision trees
//!
//! The node arena is written as a nested structure in which every node carries a `type` tag and
//! owns its children. Restoring walks the nested structure depth first and rebuilds the arena
//! with the root at index zero, so a restored tree predicts exactly like the tree it was taken
//! from.
use grove::error::{Error, Result};
use grove::traits::{Checkpoint, FeatureCount};
use grove::{Float, Label};
use serde::{Deserialize, Serialize};

use super::node::Side;
use super::{DecisionTree, NodeIndex, TreeNode};

/// A node and, for splits, both of its subtrees
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeCheckpoint<F, L> {
    Split {
        feature_index: usize,
        threshold: F,
        #[serde(default)]
        impurity_decrease: f64,
        #[serde(default)]
        n_samples: usize,
        left: Box<NodeCheckpoint<F, L>>,
        right: Box<NodeCheckpoint<F, L>>,
    },
    Leaf {
        prediction: L,
        #[serde(default = "Vec::new")]
        class_distribution: Vec<(L, usize)>,
    },
}

/// Snapshot of a fitted [`DecisionTree`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TreeCheckpoint<F, L> {
    pub n_features: usize,
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub randomize: bool,
    pub root: NodeCheckpoint<F, L>,
}

impl<F: Float, L: Label> Checkpoint for DecisionTree<F, L> {
    type State = TreeCheckpoint<F, L>;

    fn to_checkpoint(&self) -> Result<TreeCheckpoint<F, L>> {
        Ok(TreeCheckpoint {
            n_features: self.nfeatures(),
            feature_names: self.feature_names().to_vec(),
            seed: self.seed(),
            randomize: self.randomized(),
            root: nest(self)?,
        })
    }

    fn from_checkpoint(state: TreeCheckpoint<F, L>) -> Result<Self> {
        if state.n_features == 0 {
            return Err(Error::Restore(
                "a tree checkpoint needs at least one feature".into(),
            ));
        }
        if !state.feature_names.is_empty() && state.feature_names.len() != state.n_features {
            return Err(Error::Restore(format!(
                "checkpoint names {} features, but expects {}",
                state.feature_names.len(),
                state.n_features
            )));
        }

        let nodes = flatten(state.root, state.n_features)?;

        Ok(DecisionTree::from_parts(
            nodes,
            state.n_features,
            state.feature_names,
            state.seed,
            state.randomize,
        ))
    }
}

enum Visit<F> {
    Enter(NodeIndex),
    /// Both subtrees of the split are complete
    Exit {
        feature_index: usize,
        threshold: F,
        impurity_decrease: f64,
        n_samples: usize,
    },
}

/// Converts the arena into nested nodes, walking it in post-order with an explicit stack
fn nest<F: Float, L: Label>(tree: &DecisionTree<F, L>) -> Result<NodeCheckpoint<F, L>> {
    let mut visits = vec![Visit::Enter(NodeIndex::root())];
    let mut done: Vec<NodeCheckpoint<F, L>> = Vec::new();

    while let Some(visit) = visits.pop() {
        match visit {
            Visit::Enter(idx) => match tree.node(idx) {
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    impurity_decrease,
                    n_samples,
                    left,
                    right,
                } => {
                    visits.push(Visit::Exit {
                        feature_index: *feature_idx,
                        threshold: *threshold,
                        impurity_decrease: *impurity_decrease,
                        n_samples: *n_samples,
                    });
                    visits.push(Visit::Enter(*right));
                    visits.push(Visit::Enter(*left));
                }
                TreeNode::Leaf {
                    prediction,
                    class_distribution,
                    ..
                } => done.push(NodeCheckpoint::Leaf {
                    prediction: prediction.clone(),
                    class_distribution: class_distribution.clone(),
                }),
            },
            Visit::Exit {
                feature_index,
                threshold,
                impurity_decrease,
                n_samples,
            } => {
                // the right subtree was completed last
                let (right, left) = match (done.pop(), done.pop()) {
                    (Some(right), Some(left)) => (right, left),
                    _ => {
                        return Err(Error::Checkpoint(format!(
                            "split on feature {} lacks a subtree",
                            feature_index
                        )))
                    }
                };

                done.push(NodeCheckpoint::Split {
                    feature_index,
                    threshold,
                    impurity_decrease,
                    n_samples,
                    left: Box::new(left),
                    right: Box::new(right),
                });
            }
        }
    }

    done.pop()
        .ok_or_else(|| Error::Checkpoint("empty node arena".into()))
}

/// Rebuilds the arena in pre-order from nested nodes
///
/// Nodes are taken apart one level at a time from an explicit stack, so neither the rebuild
/// nor dropping the nested nodes recurses.
fn flatten<F, L>(
    root: NodeCheckpoint<F, L>,
    n_features: usize,
) -> Result<Vec<TreeNode<F, L>>> {
    let mut nodes: Vec<TreeNode<F, L>> = Vec::new();
    let mut pending: Vec<(NodeCheckpoint<F, L>, Option<(NodeIndex, Side)>)> = vec![(root, None)];

    while let Some((node, parent)) = pending.pop() {
        let slot = NodeIndex::new(nodes.len());
        if let Some((parent, side)) = parent {
            nodes[parent.index()].set_child(side, slot);
        }

        match node {
            NodeCheckpoint::Split {
                feature_index,
                threshold,
                impurity_decrease,
                n_samples,
                left,
                right,
            } => {
                if feature_index >= n_features {
                    return Err(Error::Restore(format!(
                        "split on feature {} of a tree with {} features",
                        feature_index, n_features
                    )));
                }

                nodes.push(TreeNode::Split {
                    feature_idx: feature_index,
                    threshold,
                    impurity_decrease,
                    n_samples,
                    left: slot,
                    right: slot,
                });
                pending.push((*right, Some((slot, Side::Right))));
                pending.push((*left, Some((slot, Side::Left))));
            }
            NodeCheckpoint::Leaf {
                prediction,
                class_distribution,
            } => nodes.push(TreeNode::Leaf {
                prediction,
                n_samples: class_distribution.iter().map(|(_, count)| count).sum(),
                class_distribution,
            }),
        }
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove::prelude::*;
    use ndarray::array;
    use serde_json::json;

    fn fitted() -> Result<DecisionTree<f64, usize>> {
        let dataset = Dataset::new(
            array![[1., 20.], [2., 21.], [3., 22.], [4., 22.]],
            array![1usize, 0, 1, 0],
        )
        .with_feature_names(vec!["a", "b"]);

        DecisionTree::params().fit(&dataset)
    }

    #[test]
    fn restored_tree_is_identical() -> Result<()> {
        let tree = fitted()?;

        let restored = DecisionTree::from_checkpoint(tree.to_checkpoint()?)?;

        assert_eq!(restored, tree);
        Ok(())
    }

    #[test]
    fn layout_is_tagged() -> Result<()> {
        let state = serde_json::to_value(fitted()?.to_checkpoint()?)
            .map_err(|err| Error::Checkpoint(err.to_string()))?;

        assert_eq!(state["n_features"], json!(2));
        assert_eq!(state["feature_names"], json!(["a", "b"]));
        assert_eq!(state["seed"], json!(42));
        assert_eq!(state["randomize"], json!(false));
        assert_eq!(state["root"]["type"], json!("split"));
        assert_eq!(state["root"]["feature_index"], json!(0));
        assert_eq!(state["root"]["threshold"], json!(1.0));
        assert_eq!(state["root"]["left"]["type"], json!("leaf"));
        assert_eq!(state["root"]["left"]["prediction"], json!(1));
        assert_eq!(state["root"]["left"]["class_distribution"], json!([[1, 1]]));

        Ok(())
    }

    #[test]
    fn handwritten_checkpoint_predicts() -> Result<()> {
        let state: TreeCheckpoint<f64, String> = serde_json::from_value(json!({
            "n_features": 2,
            "root": {
                "type": "split", "feature_index": 1, "threshold": 1.5,
                "left": { "type": "leaf", "prediction": "low", "class_distribution": [["low", 2]] },
                "right": { "type": "leaf", "prediction": "high" }
            }
        }))
        .map_err(|err| Error::Restore(err.to_string()))?;

        let tree = DecisionTree::from_checkpoint(state)?;

        assert_eq!(
            tree.predict(&array![[0., 1.5], [0., 1.6]]),
            array!["low".to_string(), "high".to_string()]
        );
        assert_eq!(tree.num_nodes(), 3);
        assert_eq!(tree.root_node().n_samples(), 0);
        assert_eq!(tree.node(NodeIndex::new(1)).n_samples(), 2);

        Ok(())
    }

    #[test]
    fn deep_chain_survives_round_trip() -> Result<()> {
        let depth = 1_000;
        let mut root = NodeCheckpoint::Leaf {
            prediction: depth,
            class_distribution: vec![],
        };
        for i in (0..depth).rev() {
            root = NodeCheckpoint::Split {
                feature_index: 0,
                threshold: i as f64,
                impurity_decrease: 0.0,
                n_samples: 0,
                left: Box::new(NodeCheckpoint::Leaf {
                    prediction: i,
                    class_distribution: vec![],
                }),
                right: Box::new(root),
            };
        }
        let state = TreeCheckpoint {
            n_features: 1,
            feature_names: vec![],
            seed: 0,
            randomize: false,
            root,
        };

        let tree = DecisionTree::from_checkpoint(state.clone())?;

        assert_eq!(tree.num_nodes(), 2 * depth + 1);
        assert_eq!(tree.max_depth(), depth);
        assert_eq!(
            tree.predict(&array![[0.], [499.5], [500.], [1e6]]),
            array![0, 500, 500, depth]
        );
        assert_eq!(tree.to_checkpoint()?, state);

        Ok(())
    }

    #[test]
    fn out_of_range_feature_is_rejected() {
        let state = TreeCheckpoint::<f64, usize> {
            n_features: 1,
            feature_names: vec![],
            seed: 0,
            randomize: false,
            root: NodeCheckpoint::Split {
                feature_index: 1,
                threshold: 0.0,
                impurity_decrease: 0.0,
                n_samples: 0,
                left: Box::new(NodeCheckpoint::Leaf {
                    prediction: 0,
                    class_distribution: vec![],
                }),
                right: Box::new(NodeCheckpoint::Leaf {
                    prediction: 1,
                    class_distribution: vec![],
                }),
            },
        };

        assert!(matches!(
            DecisionTree::from_checkpoint(state),
            Err(Error::Restore(_))
        ));
    }
}

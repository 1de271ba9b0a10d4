use std::cmp::Ordering;
use std::collections::HashMap;

use grove::{Float, Label};
use ndarray::{ArrayView1, ArrayView2};
use rand::seq::index::sample;
use rand::Rng;
use tracing::trace;

use super::node::Side;
use super::{DecisionTreeValidParams, NodeIndex, TreeNode};

// Improvements below rounding noise do not justify a split
const IMPURITY_TOLERANCE: f64 = 1e-12;

/// Best split found for a subset of rows
#[derive(Debug, Clone, Copy)]
struct Split<F> {
    feature_idx: usize,
    threshold: F,
    score: f64,
}

/// Rows waiting to become a node, together with the split they hang from
struct Pending {
    rows: Vec<usize>,
    depth: usize,
    parent: Option<(NodeIndex, Side)>,
}

/// Grows the node arena of a single tree
///
/// Labels are mapped to dense class indices once, in the order they are first seen, so that the
/// split search only has to count integers. Rows are referenced by their index in `records`, a
/// row may appear several times when the builder works on a bootstrap sample.
pub(crate) struct TreeBuilder<'a, 'r, F, L, R> {
    records: ArrayView2<'a, F>,
    classes: Vec<L>,
    class_of: Vec<usize>,
    params: &'a DecisionTreeValidParams<F, L>,
    max_features: usize,
    rng: &'r mut R,
    nodes: Vec<TreeNode<F, L>>,
}

impl<'a, 'r, F: Float, L: Label, R: Rng> TreeBuilder<'a, 'r, F, L, R> {
    /// `max_features` is the resolved number of candidate features, it is only used when the
    /// parameters enable randomization.
    pub fn new(
        records: ArrayView2<'a, F>,
        targets: ArrayView1<'_, L>,
        params: &'a DecisionTreeValidParams<F, L>,
        max_features: usize,
        rng: &'r mut R,
    ) -> Self {
        let mut index: HashMap<&L, usize> = HashMap::new();
        let mut classes = Vec::new();
        let class_of = targets
            .iter()
            .map(|label| {
                *index.entry(label).or_insert_with(|| {
                    classes.push(label.clone());
                    classes.len() - 1
                })
            })
            .collect();

        TreeBuilder {
            records,
            classes,
            class_of,
            params,
            max_features,
            rng,
            nodes: Vec::new(),
        }
    }

    /// Builds a tree from every row of the records
    pub fn build(self) -> Vec<TreeNode<F, L>> {
        let rows = (0..self.records.nrows()).collect();
        self.build_from(rows)
    }

    /// Builds a tree from the given rows, duplicates included
    ///
    /// Nodes are grown from a work stack instead of recursively, so the depth of the tree is
    /// only bounded by the data. The left subtree of a split is completed before its right
    /// subtree, which lays the arena out in pre-order.
    pub fn build_from(mut self, rows: Vec<usize>) -> Vec<TreeNode<F, L>> {
        let mut pending = vec![Pending {
            rows,
            depth: 0,
            parent: None,
        }];

        while let Some(Pending {
            rows,
            depth,
            parent,
        }) = pending.pop()
        {
            let slot = NodeIndex::new(self.nodes.len());
            if let Some((parent, side)) = parent {
                self.nodes[parent.index()].set_child(side, slot);
            }

            let (best, impurity_decrease) = match self.choose_split(&rows, depth, slot) {
                Some(found) => found,
                None => {
                    let leaf = self.leaf(&rows);
                    self.nodes.push(leaf);
                    continue;
                }
            };

            let n_samples = rows.len();
            let records = self.records;
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .into_iter()
                .partition(|&row| records[(row, best.feature_idx)] <= best.threshold);

            // children are attached once they are pushed to the arena
            self.nodes.push(TreeNode::Split {
                feature_idx: best.feature_idx,
                threshold: best.threshold,
                impurity_decrease,
                n_samples,
                left: slot,
                right: slot,
            });

            pending.push(Pending {
                rows: right_rows,
                depth: depth + 1,
                parent: Some((slot, Side::Right)),
            });
            pending.push(Pending {
                rows: left_rows,
                depth: depth + 1,
                parent: Some((slot, Side::Left)),
            });
        }

        self.nodes
    }

    /// Returns the split applied to `rows` and its impurity decrease, or `None` for a leaf
    fn choose_split(
        &mut self,
        rows: &[usize],
        depth: usize,
        slot: NodeIndex,
    ) -> Option<(Split<F>, f64)> {
        let counts = self.class_counts(rows);

        if self.is_terminal(rows, &counts, depth) {
            trace!(node = %slot, depth, n_samples = rows.len(), "terminal leaf");
            return None;
        }

        let parent_impurity = self.params.split_quality().impurity(&counts);
        let best = match self.best_split(rows, &counts) {
            Some(best) => best,
            None => {
                trace!(node = %slot, depth, "no candidate split");
                return None;
            }
        };

        let impurity_decrease = parent_impurity - best.score;
        if impurity_decrease <= self.params.min_impurity_decrease() + IMPURITY_TOLERANCE {
            trace!(node = %slot, depth, impurity_decrease, "split does not improve impurity");
            return None;
        }

        trace!(
            node = %slot,
            depth,
            feature = best.feature_idx,
            impurity_decrease,
            "split"
        );

        Some((best, impurity_decrease))
    }

    fn is_terminal(&self, rows: &[usize], counts: &[usize], depth: usize) -> bool {
        let n_labels = counts.iter().filter(|&&count| count > 0).count();
        let depth_reached = self
            .params
            .max_depth()
            .map(|max_depth| depth >= max_depth)
            .unwrap_or(false);

        n_labels <= 1 || rows.len() < self.params.min_samples_split() || depth_reached
    }

    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.classes.len()];
        for &row in rows {
            counts[self.class_of[row]] += 1;
        }
        counts
    }

    /// Creates a leaf predicting the most common label of `rows`
    ///
    /// Labels are listed in the order they first occur in `rows`. A tie goes to the label seen
    /// first.
    fn leaf(&self, rows: &[usize]) -> TreeNode<F, L> {
        let mut order = Vec::new();
        let mut counts = vec![0; self.classes.len()];
        for &row in rows {
            let class = self.class_of[row];
            if counts[class] == 0 {
                order.push(class);
            }
            counts[class] += 1;
        }

        let mut majority: Option<usize> = None;
        for &class in &order {
            if majority.map(|best| counts[class] > counts[best]).unwrap_or(true) {
                majority = Some(class);
            }
        }

        let class_distribution = order
            .iter()
            .map(|&class| (self.classes[class].clone(), counts[class]))
            .collect();
        // an empty subset is never grown, fall back to the first class anyway
        let prediction = self.classes[majority.unwrap_or(0)].clone();

        TreeNode::Leaf {
            prediction,
            class_distribution,
            n_samples: rows.len(),
        }
    }

    /// Features searched at the current node, in ascending order
    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.records.ncols();

        if self.params.randomize() && self.max_features < n_features {
            let mut features = sample(&mut *self.rng, n_features, self.max_features).into_vec();
            features.sort_unstable();
            features
        } else {
            (0..n_features).collect()
        }
    }

    /// Searches the split with the lowest score
    ///
    /// Every distinct value of a candidate feature is tried as threshold. Features are visited in
    /// ascending order and thresholds from small to large, only a strictly lower score replaces
    /// the current best.
    fn best_split(&mut self, rows: &[usize], counts: &[usize]) -> Option<Split<F>> {
        let quality = self.params.split_quality();
        let min_samples_leaf = self.params.min_samples_leaf();
        let n_samples = rows.len();

        let mut best: Option<Split<F>> = None;
        let mut column: Vec<(F, usize)> = Vec::with_capacity(n_samples);

        for feature_idx in self.candidate_features() {
            column.clear();
            column.extend(
                rows.iter()
                    .map(|&row| (self.records[(row, feature_idx)], self.class_of[row])),
            );
            column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            let mut left = vec![0; counts.len()];
            let mut right = counts.to_vec();

            // the largest value would leave the right side empty, so it is never a threshold
            for i in 0..n_samples.saturating_sub(1) {
                let (value, class) = column[i];
                left[class] += 1;
                right[class] -= 1;

                if column[i + 1].0 == value {
                    continue;
                }

                let n_left = i + 1;
                if n_left < min_samples_leaf || n_samples - n_left < min_samples_leaf {
                    continue;
                }

                let score = quality.split_score(&left, &right);
                if best.map(|best| score < best.score).unwrap_or(true) {
                    best = Some(Split {
                        feature_idx,
                        threshold: value,
                        score,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecisionTree, MaxFeatures};
    use grove::ParamGuard;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn grow<'a>(
        records: ArrayView2<'a, f64>,
        targets: ArrayView1<'_, usize>,
        params: &'a DecisionTreeValidParams<f64, usize>,
    ) -> Vec<TreeNode<f64, usize>> {
        let mut rng = Xoshiro256Plus::seed_from_u64(params.seed());
        TreeBuilder::new(records, targets, params, records.ncols(), &mut rng).build()
    }

    #[test]
    fn pure_subset_becomes_single_leaf() {
        let records = array![[1., 2.], [3., 4.], [5., 6.]];
        let targets = array![4usize, 4, 4];
        let params = DecisionTree::params().check().unwrap();

        let nodes = grow(records.view(), targets.view(), &params);

        assert_eq!(
            nodes,
            vec![TreeNode::Leaf {
                prediction: 4,
                class_distribution: vec![(4, 3)],
                n_samples: 3,
            }]
        );
    }

    #[test]
    fn leaf_majority_prefers_first_seen_label() {
        // a constant feature never produces a split
        let records = array![[1.], [1.], [1.], [1.]];
        let targets = array![9usize, 2, 2, 9];
        let params = DecisionTree::params().check().unwrap();

        let nodes = grow(records.view(), targets.view(), &params);

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].prediction(), Some(&9));
        match &nodes[0] {
            TreeNode::Leaf {
                class_distribution, ..
            } => assert_eq!(class_distribution, &vec![(9, 2), (2, 2)]),
            _ => panic!("expected a leaf"),
        }
    }

    #[test]
    fn ties_keep_first_feature_and_smallest_threshold() {
        // both features separate the labels perfectly
        let records = array![[1., 10.], [2., 20.], [3., 30.], [4., 40.]];
        let targets = array![0usize, 0, 1, 1];
        let params = DecisionTree::params().check().unwrap();

        let nodes = grow(records.view(), targets.view(), &params);

        assert_eq!(nodes[0].split(), Some((0, 2.)));
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn distinct_values_are_thresholds() {
        let records = array![[1., 20.], [2., 21.], [3., 22.], [4., 22.]];
        let targets = array![1usize, 0, 1, 0];
        let params = DecisionTree::params().check().unwrap();

        let nodes = grow(records.view(), targets.view(), &params);

        // the first feature isolates the first row at the lowest threshold
        assert_eq!(nodes[0].split(), Some((0, 1.)));
        assert_eq!(nodes[1].prediction(), Some(&1));
        // every leaf is pure
        for node in nodes.iter().filter(|node| node.is_leaf()) {
            match node {
                TreeNode::Leaf {
                    class_distribution, ..
                } => assert_eq!(class_distribution.len(), 1),
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn arena_children_follow_parent() {
        let records = array![[0., 0.], [1., 1.], [2., 1.], [1., 5.], [3., 2.]];
        let targets = array![0usize, 1, 2, 3, 7];
        let params = DecisionTree::params().check().unwrap();

        let nodes = grow(records.view(), targets.view(), &params);

        for (idx, node) in nodes.iter().enumerate() {
            if let Some((left, right)) = node.children() {
                // pre-order: the left child directly follows its parent
                assert_eq!(left.index(), idx + 1);
                assert!(right.index() > left.index());
                assert!(right.index() < nodes.len());
            }
        }
        assert_eq!(nodes.iter().filter(|node| node.is_leaf()).count(), 5);
    }

    #[test]
    fn max_depth_limits_growth() {
        let records = array![[0.], [1.], [2.], [3.], [4.], [5.]];
        let targets = array![0usize, 1, 0, 1, 0, 1];
        let params = DecisionTree::params().max_depth(Some(1)).check().unwrap();

        let nodes = grow(records.view(), targets.view(), &params);

        assert_eq!(nodes.len(), 3);
        assert!(nodes[1].is_leaf() && nodes[2].is_leaf());
    }

    #[test]
    fn bootstrap_rows_are_counted_twice() {
        let records = array![[0.], [1.]];
        let targets = array![5usize, 6];
        let params = DecisionTree::params().check().unwrap();
        let mut rng = Xoshiro256Plus::seed_from_u64(0);

        let nodes = TreeBuilder::new(records.view(), targets.view(), &params, 1, &mut rng)
            .build_from(vec![1, 1]);

        assert_eq!(
            nodes,
            vec![TreeNode::Leaf {
                prediction: 6,
                class_distribution: vec![(6, 2)],
                n_samples: 2,
            }]
        );
    }

    #[test]
    fn same_seed_draws_same_features() {
        let records = array![
            [0., 3., 1., 0.],
            [1., 2., 0., 1.],
            [2., 1., 1., 0.],
            [3., 0., 0., 1.],
            [4., 1., 1., 1.]
        ];
        let targets = array![0usize, 1, 0, 1, 1];
        let params = DecisionTree::params()
            .randomize(true)
            .max_features(MaxFeatures::Fixed(2))
            .seed(7)
            .check()
            .unwrap();

        let a = grow(records.view(), targets.view(), &params);
        let b = grow(records.view(), targets.view(), &params);

        assert_eq!(a, b);
    }
}

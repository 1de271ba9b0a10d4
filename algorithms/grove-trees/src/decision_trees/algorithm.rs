//! Decision trees
//!
use std::collections::BTreeSet;

use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use tracing::{debug, instrument};

use super::builder::TreeBuilder;
use super::{DecisionTreeValidParams, NodeIndex, NodeIter, Tikz, TreeNode};
use grove::{
    dataset::AsTargets,
    error::{Error, Result},
    traits::*,
    DatasetBase, Float, Label,
};

/// A fitted decision tree model for classification.
///
/// ### Structure
/// A decision tree structure is a binary tree where:
/// * Each internal node specifies a decision, represented by a choice of a feature and a "split value" such that all observations for which
///   `feature <= split value` is true fall in the left subtree, while the others fall in the right subtree.
///
/// * leaf nodes make predictions, and their prediction is the most popular label in the node
///
/// The nodes are stored in a flat arena with the root at index zero; internal nodes refer to
/// their children by [`NodeIndex`].
///
/// ### Algorithm
///
/// Starting with a single root node, decision trees are trained recursively by applying the following rule to every
/// node considered:
///
/// * Find the best split value for each feature of the observations belonging in the node. Every distinct value of a
///   feature is a candidate split value;
/// * Select the feature (and its best split value) that maximizes the quality of the split;
/// * If the score of the split is strictly better than the impurity of the node, split the node and apply the rule
///   to both children;
/// * Otherwise, the node becomes a leaf.
///
/// When feature randomization is enabled, only a random subset of the features is searched at
/// every node. The subset is drawn from a generator seeded with the seed of the tree, so fitting
/// twice with the same seed and data gives the same tree.
///
/// ### Predictions
///
/// To predict the label of a sample, the tree is traversed from the root to a leaf, choosing between left and right children according to
/// the values of the features of the sample. The final prediction for the sample is the prediction of the reached leaf.
///
/// ### Example
///
/// ```rust
/// use grove::prelude::*;
/// use grove_trees::{DecisionTree, SplitQuality};
/// use ndarray::array;
///
/// let dataset = Dataset::new(
///     array![[0., 0.], [1., 1.], [2., 1.], [1., 5.], [3., 2.]],
///     array![0usize, 1, 2, 3, 7],
/// );
///
/// let tree = DecisionTree::params()
///     .split_quality(SplitQuality::Gini)
///     .fit(&dataset)?;
///
/// assert_eq!(tree.predict(dataset.records()), array![0, 1, 2, 3, 7]);
/// assert_eq!(tree.num_leaves(), 5);
/// # Result::Ok(())
/// ```
///
/// Fitted models are persisted through [`Checkpoint`], which validates a snapshot before it
/// becomes a model.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree<F, L> {
    nodes: Vec<TreeNode<F, L>>,
    num_features: usize,
    feature_names: Vec<String>,
    seed: u64,
    randomize: bool,
}

impl<F: Float, L: Label, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<L>>
    for DecisionTree<F, L>
{
    /// Make predictions for each row of a matrix of features `x`.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            x.ncols(),
            self.num_features,
            "The number of features must match the number of features seen during fitting."
        );

        for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
            *target = self.predict_row(&row).clone();
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<L> {
        Array1::default(x.nrows())
    }
}

impl<F: Float, L: Label, D, T> Fit<ArrayBase<D, Ix2>, T, Error> for DecisionTreeValidParams<F, L>
where
    D: Data<Elem = F>,
    T: AsTargets<Elem = L>,
{
    type Object = DecisionTree<F, L>;

    /// Fit a decision tree using `hyperparamters` on the dataset consisting of
    /// a matrix of features `x` and an array of labels `y`.
    #[instrument(skip_all, fields(nsamples = dataset.nsamples(), nfeatures = dataset.nfeatures()))]
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        dataset.check_shape()?;

        let records = dataset.records().view();
        let targets = dataset.targets().as_targets();
        let max_features = self.max_features().resolve(records.ncols())?;

        let mut rng = Xoshiro256Plus::seed_from_u64(self.seed());
        let nodes = TreeBuilder::new(records, targets, self, max_features, &mut rng).build();

        let tree = DecisionTree::from_parts(
            nodes,
            records.ncols(),
            dataset.feature_names(),
            self.seed(),
            self.randomize(),
        );
        debug!(
            nodes = tree.num_nodes(),
            depth = tree.max_depth(),
            "decision tree fitted"
        );

        Ok(tree)
    }
}

impl<F, L> FeatureCount for DecisionTree<F, L> {
    fn nfeatures(&self) -> usize {
        self.num_features
    }
}

impl<F, L> DecisionTree<F, L> {
    pub(crate) fn from_parts(
        nodes: Vec<TreeNode<F, L>>,
        num_features: usize,
        feature_names: Vec<String>,
        seed: u64,
        randomize: bool,
    ) -> Self {
        DecisionTree {
            nodes,
            num_features,
            feature_names,
            seed,
            randomize,
        }
    }
}

impl<F: Float, L: Label> DecisionTree<F, L> {
    /// Routes a single sample from the root to a leaf and returns the label of the leaf
    pub fn predict_row<S: Data<Elem = F>>(&self, row: &ArrayBase<S, Ix1>) -> &L {
        let mut node = self.root_node();

        loop {
            match node {
                TreeNode::Leaf { prediction, .. } => return prediction,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let next = if row[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                    node = self.node(*next);
                }
            }
        }
    }

    /// Create a node iterator in level-order (BFT)
    pub fn iter_nodes(&self) -> NodeIter<'_, F, L> {
        NodeIter::new(&self.nodes)
    }

    /// Return the node stored at `idx`
    ///
    /// Panics if `idx` does not belong to this tree.
    pub fn node(&self, idx: NodeIndex) -> &TreeNode<F, L> {
        &self.nodes[idx.index()]
    }

    /// Return all nodes of the tree in arena order
    pub fn nodes(&self) -> &[TreeNode<F, L>] {
        &self.nodes
    }

    /// Return root node of the tree
    pub fn root_node(&self) -> &TreeNode<F, L> {
        self.node(NodeIndex::root())
    }

    /// Return the sorted indices of the features used by splits of this tree
    pub fn features(&self) -> Vec<usize> {
        self.iter_nodes()
            .filter_map(|node| node.split().map(|(feature_idx, _)| feature_idx))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Return the mean impurity decrease for each feature
    pub fn mean_impurity_decrease(&self) -> Vec<f64> {
        // total impurity decrease for each feature
        let mut impurity_decrease = vec![0.0; self.num_features];
        let mut num_nodes = vec![0; self.num_features];

        for node in self.iter_nodes() {
            if let TreeNode::Split {
                feature_idx,
                impurity_decrease: decrease,
                ..
            } = node
            {
                impurity_decrease[*feature_idx] += decrease;
                num_nodes[*feature_idx] += 1;
            }
        }

        impurity_decrease
            .into_iter()
            .zip(num_nodes.into_iter())
            .map(|(val, n)| if n == 0 { 0.0 } else { val / n as f64 })
            .collect()
    }

    /// Return the relative impurity decrease for each feature
    ///
    /// The values sum up to one, unless the tree is a single leaf. Then every value is zero.
    pub fn relative_impurity_decrease(&self) -> Vec<f64> {
        let mean_impurity_decrease = self.mean_impurity_decrease();
        let sum: f64 = mean_impurity_decrease.iter().sum();

        if sum == 0.0 {
            return mean_impurity_decrease;
        }

        mean_impurity_decrease
            .into_iter()
            .map(|x| x / sum)
            .collect()
    }

    /// Return the feature importance, i.e. the relative impurity decrease, for each feature
    pub fn feature_importance(&self) -> Vec<f64> {
        self.relative_impurity_decrease()
    }

    /// Return max depth of the tree, a single leaf has depth zero
    pub fn max_depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(NodeIndex::root(), 0)];

        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some((left, right)) = self.node(idx).children() {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }

        max_depth
    }

    /// Return the number of leaves in this tree
    pub fn num_leaves(&self) -> usize {
        self.iter_nodes().filter(|node| node.is_leaf()).count()
    }

    /// Return the number of nodes in this tree
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Names of the features seen during fitting
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Seed of the random number generator used while fitting
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether candidate features were drawn at random while fitting
    pub fn randomized(&self) -> bool {
        self.randomize
    }

    /// Generates a [`Tikz`] structure to print the
    /// fitted tree in Tex using tikz and forest, with the following default parameters:
    ///
    /// * `legend=false`
    /// * `complete=true`
    ///
    pub fn export_to_tikz(&self) -> Tikz<'_, F, L> {
        Tikz::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MaxFeatures, SplitQuality};

    use approx::assert_abs_diff_eq;
    use grove::{Dataset, ParamGuard};
    use ndarray::{array, s, Array, Array1, Array2, Axis};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    fn accuracy<L: PartialEq>(prediction: &Array1<L>, truth: &Array1<L>) -> f64 {
        let correct = prediction
            .iter()
            .zip(truth.iter())
            .filter(|(a, b)| a == b)
            .count();
        correct as f64 / truth.len() as f64
    }

    #[test]
    fn prediction_for_rows_example() -> Result<()> {
        let records = array![[1., 20.], [2., 21.], [3., 22.], [4., 22.]];
        let dataset = Dataset::new(records, array![1usize, 0, 1, 0]);

        let model = DecisionTree::params().fit(&dataset)?;

        assert_eq!(model.predict(&array![[1., 20.]]), array![1]);
        assert_eq!(model.predict(dataset.records()), array![1, 0, 1, 0]);
        assert_eq!(model.predict_row(&array![1., 20.]), &1);

        Ok(())
    }

    #[test]
    /// Single feature test
    ///
    /// Generate a dataset where a single feature perfectly correlates
    /// with the target while the remaining features are random gaussian
    /// noise and do not add any information.
    fn single_feature_random_noise_binary() -> Result<()> {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);

        // generate data with 9 white noise and a single correlated feature
        let mut data = Array::random_using((50, 10), Uniform::new(-4., 4.), &mut rng);
        data.slice_mut(s![.., 8]).assign(
            &(0..50)
                .map(|x| if x < 25 { 0.0 } else { 1.0 })
                .collect::<Array1<_>>(),
        );

        let targets = (0..50).map(|x| x < 25).collect::<Array1<_>>();
        let dataset = Dataset::new(data, targets);

        let model = DecisionTree::params().max_depth(Some(2)).fit(&dataset)?;

        // we should only use feature index 8 here
        assert_eq!(&model.features(), &[8]);

        let ground_truth = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];

        for (imp, truth) in model.feature_importance().iter().zip(&ground_truth) {
            assert_abs_diff_eq!(imp, truth, epsilon = 1e-15);
        }

        // check for perfect accuracy
        let prediction = model.predict(dataset.records());
        assert_abs_diff_eq!(accuracy(&prediction, dataset.targets()), 1.0);

        Ok(())
    }

    #[test]
    /// Check that for random data the max depth is used
    fn check_max_depth() -> Result<()> {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);

        // create very sparse data
        let data = Array::random_using((50, 50), Uniform::new(-1., 1.), &mut rng);
        let targets = (0..50).collect::<Array1<usize>>();

        let dataset = Dataset::new(data, targets);

        // check that the provided depth is actually used
        for max_depth in &[1, 5] {
            let model = DecisionTree::params()
                .max_depth(Some(*max_depth))
                .fit(&dataset)?;
            assert_eq!(model.max_depth(), *max_depth);
        }

        Ok(())
    }

    #[test]
    /// Small perfectly separable dataset test
    ///
    /// This dataset of three elements is perfectly using the second feature.
    fn perfectly_separable_small() -> Result<()> {
        let data = array![[1., 2., 3.], [1., 2., 4.], [1., 3., 3.5]];
        let targets = array![0usize, 0, 1];

        let dataset = Dataset::new(data.clone(), targets);
        let model = DecisionTree::params().max_depth(Some(1)).fit(&dataset)?;

        assert_eq!(model.predict(&data), array![0, 0, 1]);
        assert_eq!(model.features(), vec![1]);

        Ok(())
    }

    #[test]
    /// Multilabel classification
    fn multilabel_four_uniform() -> Result<()> {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let mut data = Array2::random_using((40, 2), Uniform::new(-1., 1.), &mut rng);

        data.axis_iter_mut(Axis(0))
            .enumerate()
            .for_each(|(i, mut p)| {
                if i < 10 {
                    p += &array![-2., -2.]
                } else if i < 20 {
                    p += &array![-2., 2.];
                } else if i < 30 {
                    p += &array![2., -2.];
                } else {
                    p += &array![2., 2.];
                }
            });

        let targets = (0..40)
            .map(|x| match x {
                x if x < 10 => 0usize,
                x if x < 20 => 1,
                x if x < 30 => 2,
                _ => 3,
            })
            .collect::<Array1<_>>();

        let dataset = Dataset::new(data.clone(), targets);

        let model = DecisionTree::params()
            .split_quality(SplitQuality::Entropy)
            .fit(&dataset)?;
        let prediction = model.predict(data);

        assert!(accuracy(&prediction, dataset.targets()) > 0.99);
        assert_eq!(model.num_leaves(), 4);

        Ok(())
    }

    #[test]
    fn string_labels() -> Result<()> {
        let dataset = Dataset::new(
            array![[0.5], [0.7], [3.0], [3.5]],
            array!["small", "small", "large", "large"].map(|x| x.to_string()),
        );

        let model = DecisionTree::params().fit(&dataset)?;

        assert_eq!(
            model.predict(&array![[0.1], [10.0]]),
            array!["small".to_string(), "large".to_string()]
        );

        Ok(())
    }

    #[test]
    fn mismatched_dataset_is_rejected() {
        let dataset = Dataset::new(array![[1., 2.], [3., 4.]], array![0usize]);
        let result: Result<DecisionTree<f64, usize>> = DecisionTree::params().fit(&dataset);

        assert!(matches!(result, Err(Error::Shape(_))));
    }

    #[test]
    fn randomized_trees_depend_on_seed() -> Result<()> {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let data = Array::random_using((60, 8), Uniform::new(0., 1.), &mut rng);
        let targets = (0..60).map(|x| x % 3).collect::<Array1<usize>>();
        let dataset = Dataset::new(data, targets);

        let params = DecisionTree::params()
            .randomize(true)
            .max_features(MaxFeatures::Sqrt);

        let a = params.seed(1).fit(&dataset)?;
        let b = params.seed(1).fit(&dataset)?;
        assert_eq!(a, b);
        assert!(a.randomized());
        assert_eq!(a.seed(), 1);

        Ok(())
    }

    #[test]
    fn invalid_params_fail_before_fitting() {
        let dataset = Dataset::new(array![[1.], [2.]], array![true, false]);
        let result: Result<DecisionTree<f64, bool>> = DecisionTree::params()
            .max_features(MaxFeatures::Fixed(2))
            .randomize(true)
            .fit(&dataset);

        assert!(matches!(result, Err(Error::Parameters(_))));
        assert!(DecisionTree::<f64, bool>::params()
            .min_samples_split(0)
            .check()
            .is_err());
    }
}

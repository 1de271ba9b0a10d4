use grove::{
    error::{Error, Result},
    Float, Label, ParamGuard,
};
use serde::{Deserialize, Serialize};

use super::RandomForest;
use crate::{DecisionTreeParams, DecisionTreeValidParams, MaxFeatures, SplitQuality};

/// The set of hyperparameters that can be specified for fitting a
/// [random forest](RandomForest).
///
/// The tree-level settings are shared by every tree of the forest. Feature randomization is
/// always enabled for the trees of a forest, each tree draws its candidate features from its own
/// seed.
///
/// ### Example
///
/// ```rust
/// use grove::prelude::*;
/// use grove_trees::{MaxFeatures, RandomForest};
/// use ndarray::array;
///
/// let dataset = Dataset::new(
///     array![[0., 0.], [1., 1.], [2., 1.], [1., 5.], [3., 2.]],
///     array![0usize, 1, 2, 3, 7],
/// );
///
/// let forest = RandomForest::params()
///     .n_estimators(25)
///     .max_features(MaxFeatures::All)
///     .seed(7)
///     .fit(&dataset)?;
///
/// assert_eq!(forest.trees().len(), 25);
/// assert_eq!(forest.predict(dataset.records()), array![0, 1, 2, 3, 7]);
/// # Result::Ok(())
/// ```
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct RandomForestValidParams<F, L> {
    n_estimators: usize,
    seed: u64,
    bootstrap: bool,
    parallel: bool,
    tree: DecisionTreeValidParams<F, L>,
}

impl<F, L> RandomForestValidParams<F, L> {
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn bootstrap(&self) -> bool {
        self.bootstrap
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Settings shared by every tree of the forest
    pub fn tree_params(&self) -> &DecisionTreeValidParams<F, L> {
        &self.tree
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct RandomForestParams<F, L>(RandomForestValidParams<F, L>);

impl<F: Float, L: Label> RandomForestParams<F, L> {
    pub fn new() -> Self {
        let DecisionTreeParams(tree) = DecisionTreeParams::new()
            .randomize(true)
            .max_features(MaxFeatures::Sqrt);

        Self(RandomForestValidParams {
            n_estimators: 10,
            seed: 42,
            bootstrap: false,
            parallel: false,
            tree,
        })
    }

    /// Sets the number of trees in the forest
    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.0.n_estimators = n_estimators;
        self
    }

    /// Sets the base seed from which the seed of every tree is derived
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }

    /// Fits every tree on a bootstrap sample of the dataset instead of the full dataset
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.0.bootstrap = bootstrap;
        self
    }

    /// Fits the trees on the rayon thread pool
    ///
    /// The fitted forest does not depend on this setting.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.0.parallel = parallel;
        self
    }

    /// Sets the number of candidate features drawn at every node
    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.0.tree.max_features = max_features;
        self
    }

    /// Sets the metric used to decide the feature on which to split a node
    pub fn split_quality(mut self, split_quality: SplitQuality) -> Self {
        self.0.tree.split_quality = split_quality;
        self
    }

    /// Sets the optional limit to the depth of every tree
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.tree.max_depth = max_depth;
        self
    }

    /// Sets the minimum number of samples required to split a node
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.tree.min_samples_split = min_samples_split;
        self
    }

    /// Sets the minimum number of samples that a split has to place in each child
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.tree.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Sets the decrease in impurity that a split has to exceed in order to be applied
    pub fn min_impurity_decrease(mut self, min_impurity_decrease: f64) -> Self {
        self.0.tree.min_impurity_decrease = min_impurity_decrease;
        self
    }
}

impl<F: Float, L: Label> Default for RandomForestParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L: Label> RandomForest<F, L> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `n_estimators = 10`
    /// * `seed = 42`
    /// * `bootstrap = false`
    /// * `parallel = false`
    /// * `max_features = MaxFeatures::Sqrt`
    ///
    /// The remaining tree settings default to the ones of
    /// [`DecisionTree::params`](crate::DecisionTree::params).
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> RandomForestParams<F, L> {
        RandomForestParams::new()
    }
}

impl<F, L> ParamGuard for RandomForestParams<F, L> {
    type Checked = RandomForestValidParams<F, L>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_estimators == 0 {
            return Err(Error::Parameters(
                "a random forest needs at least one estimator".into(),
            ));
        }
        self.0.tree.validate()?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

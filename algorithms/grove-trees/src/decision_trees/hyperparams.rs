use grove::{
    error::{Error, Result},
    Float, Label, ParamGuard,
};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::SplitQuality;
use crate::DecisionTree;

/// Number of features considered when searching the best split of a node
///
/// Only used when feature randomization is enabled, otherwise every feature is a candidate.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum MaxFeatures {
    /// Every feature
    All,
    /// `ceil(sqrt(n_features))`
    Sqrt,
    /// `ceil(log2(n_features))`
    Log2,
    /// `ceil(fraction * n_features)`, the fraction must lie in `(0, 1]`
    Fraction(f64),
    /// A fixed number of features, at most `n_features`
    Fixed(usize),
}

impl MaxFeatures {
    /// Resolves the number of candidate features for a dataset with `n_features` columns
    ///
    /// The result always lies in `[1, n_features]`.
    pub fn resolve(self, n_features: usize) -> Result<usize> {
        if n_features == 0 {
            return Err(Error::Parameters(
                "cannot select features of records without columns".into(),
            ));
        }

        let count = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fraction(fraction) => {
                if !(fraction > 0.0 && fraction <= 1.0) {
                    return Err(Error::Parameters(format!(
                        "max features fraction should lie in (0, 1], but was {}",
                        fraction
                    )));
                }
                (fraction * n_features as f64).ceil() as usize
            }
            MaxFeatures::Fixed(count) => {
                if count == 0 || count > n_features {
                    return Err(Error::Parameters(format!(
                        "max features should lie in [1, {}], but was {}",
                        n_features, count
                    )));
                }
                count
            }
        };

        Ok(count.max(1).min(n_features))
    }

    fn check(self) -> Result<()> {
        match self {
            MaxFeatures::Fraction(fraction) if !(fraction > 0.0 && fraction <= 1.0) => {
                Err(Error::Parameters(format!(
                    "max features fraction should lie in (0, 1], but was {}",
                    fraction
                )))
            }
            MaxFeatures::Fixed(0) => Err(Error::Parameters(
                "max features should be at least one".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// The set of hyperparameters that can be specified for fitting a
/// [decision tree](DecisionTree).
///
/// ### Example
///
/// ```rust
/// use grove_trees::{DecisionTree, SplitQuality};
/// use grove::prelude::*;
/// use ndarray::array;
///
/// // Initialize the default set of parameters
/// let params = DecisionTree::params();
/// // Set the parameters to the desired values
/// let params = params.split_quality(SplitQuality::Entropy).max_depth(Some(5));
///
/// let train = Dataset::new(
///     array![[1., 20.], [2., 21.], [3., 22.], [4., 22.]],
///     array![1usize, 0, 1, 0],
/// );
/// // Fit the decision tree on the training data
/// let tree = params.fit(&train)?;
/// // Predict on unseen records
/// let prediction = tree.predict(&array![[1., 20.]]);
/// assert_eq!(prediction, array![1]);
/// # Result::Ok(())
/// ```
///
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DecisionTreeValidParams<F, L> {
    pub(crate) split_quality: SplitQuality,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) min_impurity_decrease: f64,
    pub(crate) randomize: bool,
    pub(crate) max_features: MaxFeatures,
    pub(crate) seed: u64,

    label_marker: PhantomData<(F, L)>,
}

impl<F, L> DecisionTreeValidParams<F, L> {
    pub fn split_quality(&self) -> SplitQuality {
        self.split_quality
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    pub fn min_impurity_decrease(&self) -> f64 {
        self.min_impurity_decrease
    }

    pub fn randomize(&self) -> bool {
        self.randomize
    }

    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Validates every setting which does not depend on the training data
    pub(crate) fn validate(&self) -> Result<()> {
        if self.min_samples_split < 2 {
            return Err(Error::Parameters(format!(
                "minimum samples per split should be at least two, but was {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf < 1 {
            return Err(Error::Parameters(
                "minimum samples per leaf should be at least one".into(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(Error::Parameters(
                "maximum depth should be at least one".into(),
            ));
        }
        if !(self.min_impurity_decrease >= 0.0) || !self.min_impurity_decrease.is_finite() {
            return Err(Error::Parameters(format!(
                "minimum impurity decrease should be a non-negative number, but was {}",
                self.min_impurity_decrease
            )));
        }

        self.max_features.check()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DecisionTreeParams<F, L>(pub(crate) DecisionTreeValidParams<F, L>);

impl<F: Float, L: Label> DecisionTreeParams<F, L> {
    pub fn new() -> Self {
        Self(DecisionTreeValidParams {
            split_quality: SplitQuality::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_impurity_decrease: 0.0,
            randomize: false,
            max_features: MaxFeatures::All,
            seed: 42,
            label_marker: PhantomData,
        })
    }

    /// Sets the metric used to decide the feature on which to split a node
    pub fn split_quality(mut self, split_quality: SplitQuality) -> Self {
        self.0.split_quality = split_quality;
        self
    }

    /// Sets the optional limit to the depth of the decision tree
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Sets the minimum number of samples required to split a node
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.min_samples_split = min_samples_split;
        self
    }

    /// Sets the minimum number of samples that a split has to place in each child
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Sets the decrease in impurity that a split has to exceed in order to be applied
    pub fn min_impurity_decrease(mut self, min_impurity_decrease: f64) -> Self {
        self.0.min_impurity_decrease = min_impurity_decrease;
        self
    }

    /// Enables the random selection of candidate features at every node
    pub fn randomize(mut self, randomize: bool) -> Self {
        self.0.randomize = randomize;
        self
    }

    /// Sets the number of candidate features drawn at every node when randomization is enabled
    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.0.max_features = max_features;
        self
    }

    /// Sets the seed of the random number generator
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float, L: Label> Default for DecisionTreeParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L: Label> DecisionTree<F, L> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `split_quality = SplitQuality::Gini`
    /// * `max_depth = None`
    /// * `min_samples_split = 2`
    /// * `min_samples_leaf = 1`
    /// * `min_impurity_decrease = 0.0`
    /// * `randomize = false`
    /// * `max_features = MaxFeatures::All`
    /// * `seed = 42`
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> DecisionTreeParams<F, L> {
        DecisionTreeParams::new()
    }
}

impl<F, L> ParamGuard for DecisionTreeParams<F, L> {
    type Checked = DecisionTreeValidParams<F, L>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        self.0.validate()?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = DecisionTreeParams::<f64, usize>::new();
        let checked = params.check_ref().unwrap();

        assert_eq!(checked.split_quality(), SplitQuality::Gini);
        assert_eq!(checked.max_depth(), None);
        assert_eq!(checked.min_samples_split(), 2);
        assert_eq!(checked.max_features(), MaxFeatures::All);
        assert!(!checked.randomize());
        assert_eq!(checked.seed(), 42);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let params = DecisionTreeParams::<f64, usize>::new();

        assert!(params.min_samples_split(1).check().is_err());
        assert!(params.min_samples_leaf(0).check().is_err());
        assert!(params.max_depth(Some(0)).check().is_err());
        assert!(params.min_impurity_decrease(-1.0).check().is_err());
        assert!(params.min_impurity_decrease(f64::NAN).check().is_err());
        assert!(params.max_features(MaxFeatures::Fraction(0.0)).check().is_err());
        assert!(params.max_features(MaxFeatures::Fraction(1.5)).check().is_err());
        assert!(params.max_features(MaxFeatures::Fixed(0)).check().is_err());
    }

    #[test]
    fn max_features_resolves_into_range() -> Result<()> {
        assert_eq!(MaxFeatures::All.resolve(10)?, 10);
        assert_eq!(MaxFeatures::Sqrt.resolve(10)?, 4);
        assert_eq!(MaxFeatures::Sqrt.resolve(1)?, 1);
        assert_eq!(MaxFeatures::Log2.resolve(8)?, 3);
        assert_eq!(MaxFeatures::Log2.resolve(1)?, 1);
        assert_eq!(MaxFeatures::Fraction(0.25).resolve(10)?, 3);
        assert_eq!(MaxFeatures::Fixed(2).resolve(5)?, 2);

        assert!(MaxFeatures::Fixed(6).resolve(5).is_err());
        assert!(MaxFeatures::All.resolve(0).is_err());

        Ok(())
    }
}

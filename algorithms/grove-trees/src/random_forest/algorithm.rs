//! Random Forest Classifier
//!
//! An ensemble of decision trees whose nodes search randomly drawn subsets of the features.
use std::collections::HashMap;

use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use super::RandomForestValidParams;
use crate::decision_trees::builder::TreeBuilder;
use crate::DecisionTree;
use grove::{
    dataset::AsTargets,
    error::{Error, Result},
    traits::*,
    DatasetBase, Float, Label,
};

const SEED_MULTIPLIER: u64 = 1_000_003;

/// Seed of the tree at `index` in a forest with base seed `seed`
pub fn tree_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_mul(SEED_MULTIPLIER)
        .wrapping_add(index as u64)
}

/// Draw `n_samples` row indices with replacement
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Returns the label with the most votes
///
/// A tie goes to the label whose first vote comes first. Returns `None` if there are no votes.
pub fn plurality_vote<'a, L, I>(votes: I) -> Option<&'a L>
where
    L: Label + 'a,
    I: IntoIterator<Item = &'a L>,
{
    let mut position: HashMap<&L, usize> = HashMap::new();
    let mut tally: Vec<(&L, usize)> = Vec::new();

    for label in votes {
        match position.get(label) {
            Some(&idx) => tally[idx].1 += 1,
            None => {
                position.insert(label, tally.len());
                tally.push((label, 1));
            }
        }
    }

    let mut winner: Option<(&L, usize)> = None;
    for (label, count) in tally {
        if winner.map(|(_, best)| count > best).unwrap_or(true) {
            winner = Some((label, count));
        }
    }

    winner.map(|(label, _)| label)
}

/// A fitted random forest for classification
///
/// Every tree is fitted on the full dataset (or a bootstrap sample of it, if requested) with
/// randomized feature selection. The tree at position `i` uses the seed
/// `seed * 1_000_003 + i` (wrapping), so a forest is reproducible from its base seed no matter
/// whether the trees were fitted sequentially or in parallel.
///
/// Predictions are made by plurality vote over all trees.
///
/// Fitted models are persisted through [`Checkpoint`], which validates a snapshot before it
/// becomes a model.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest<F, L> {
    trees: Vec<DecisionTree<F, L>>,
    n_estimators: usize,
    seed: u64,
}

impl<F: Float, L: Label, D, T> Fit<ArrayBase<D, Ix2>, T, Error> for RandomForestValidParams<F, L>
where
    D: Data<Elem = F>,
    T: AsTargets<Elem = L>,
{
    type Object = RandomForest<F, L>;

    #[instrument(skip_all, fields(n_estimators = self.n_estimators(), nsamples = dataset.nsamples()))]
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        dataset.check_shape()?;

        let records = dataset.records().view();
        let targets = dataset.targets().as_targets();
        let feature_names = dataset.feature_names();
        let (n_samples, n_features) = records.dim();
        let tree_params = self.tree_params();
        let max_features = tree_params.max_features().resolve(n_features)?;

        info!(
            n_estimators = self.n_estimators(),
            n_samples,
            n_features,
            max_features,
            bootstrap = self.bootstrap(),
            parallel = self.parallel(),
            "fitting random forest"
        );

        let fit_tree = |index: usize| {
            let seed = tree_seed(self.seed(), index);
            let mut rng = Xoshiro256Plus::seed_from_u64(seed);
            let rows = if self.bootstrap() {
                bootstrap_sample(n_samples, &mut rng)
            } else {
                (0..n_samples).collect()
            };

            let nodes = TreeBuilder::new(records, targets, tree_params, max_features, &mut rng)
                .build_from(rows);
            let tree =
                DecisionTree::from_parts(nodes, n_features, feature_names.clone(), seed, true);
            debug!(index, seed, nodes = tree.num_nodes(), "tree fitted");

            tree
        };

        let trees: Vec<DecisionTree<F, L>> = if self.parallel() {
            (0..self.n_estimators()).into_par_iter().map(fit_tree).collect()
        } else {
            (0..self.n_estimators()).map(fit_tree).collect()
        };

        info!(n_trees = trees.len(), "random forest fitted");

        Ok(RandomForest {
            trees,
            n_estimators: self.n_estimators(),
            seed: self.seed(),
        })
    }
}

impl<F: Float, L: Label, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<L>>
    for RandomForest<F, L>
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            x.ncols(),
            self.nfeatures(),
            "The number of features must match the number of features seen during fitting."
        );

        for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
            if let Some(label) = self.vote(&row) {
                *target = label.clone();
            }
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<L> {
        Array1::default(x.nrows())
    }
}

impl<F, L> FeatureCount for RandomForest<F, L> {
    fn nfeatures(&self) -> usize {
        self.trees.first().map(|tree| tree.nfeatures()).unwrap_or(0)
    }
}

impl<F, L> RandomForest<F, L> {
    pub(crate) fn from_parts(trees: Vec<DecisionTree<F, L>>, n_estimators: usize, seed: u64) -> Self {
        RandomForest {
            trees,
            n_estimators,
            seed,
        }
    }

    /// The fitted trees, in the order they were fitted
    pub fn trees(&self) -> &[DecisionTree<F, L>] {
        &self.trees
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Base seed of the forest
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl<F: Float, L: Label> RandomForest<F, L> {
    /// Plurality vote of all trees for a single sample
    pub fn vote<S: Data<Elem = F>>(&self, row: &ArrayBase<S, Ix1>) -> Option<&L> {
        plurality_vote(self.trees.iter().map(|tree| tree.predict_row(row)))
    }

    /// Number of votes per label for every sample, labels in the order of their first vote
    pub fn votes<S: Data<Elem = F>>(&self, x: &ArrayBase<S, Ix2>) -> Vec<Vec<(L, usize)>> {
        x.rows()
            .into_iter()
            .map(|row| {
                let mut tally: Vec<(L, usize)> = Vec::new();
                for label in self.trees.iter().map(|tree| tree.predict_row(&row)) {
                    match tally.iter_mut().find(|(known, _)| known == label) {
                        Some((_, count)) => *count += 1,
                        None => tally.push((label.clone(), 1)),
                    }
                }
                tally
            })
            .collect()
    }

    /// Mean feature importance over all trees
    pub fn feature_importance(&self) -> Vec<f64> {
        let mut importance = vec![0.0; self.nfeatures()];
        for tree in &self.trees {
            for (total, value) in importance.iter_mut().zip(tree.feature_importance()) {
                *total += value;
            }
        }

        let n_trees = self.trees.len().max(1) as f64;
        importance.into_iter().map(|x| x / n_trees).collect()
    }
}

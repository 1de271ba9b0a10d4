use grove::error::{Error, Result};
use grove::traits::{Checkpoint, FeatureCount};
use grove::{Float, Label};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::RandomForest;
use crate::{DecisionTree, TreeCheckpoint};

/// Snapshot of a fitted [`RandomForest`]
///
/// `trees` is optional while decoding so that a snapshot without trees is reported as a restore
/// error instead of a generic decoding error.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ForestCheckpoint<F, L> {
    #[serde(default)]
    pub n_estimators: Option<usize>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub trees: Option<Vec<TreeCheckpoint<F, L>>>,
}

impl<F: Float, L: Label> Checkpoint for RandomForest<F, L> {
    type State = ForestCheckpoint<F, L>;

    fn to_checkpoint(&self) -> Result<ForestCheckpoint<F, L>> {
        let trees = self
            .trees()
            .iter()
            .map(Checkpoint::to_checkpoint)
            .collect::<Result<Vec<_>>>()?;

        Ok(ForestCheckpoint {
            n_estimators: Some(self.n_estimators()),
            seed: self.seed(),
            trees: Some(trees),
        })
    }

    fn from_checkpoint(state: ForestCheckpoint<F, L>) -> Result<Self> {
        let trees = state
            .trees
            .ok_or_else(|| Error::Restore("checkpoint lacks the list of trees".into()))?;
        if trees.is_empty() {
            return Err(Error::Restore("checkpoint contains no trees".into()));
        }

        let n_estimators = state.n_estimators.unwrap_or(trees.len());
        if n_estimators != trees.len() {
            return Err(Error::Restore(format!(
                "checkpoint declares {} estimators, but contains {} trees",
                n_estimators,
                trees.len()
            )));
        }

        let trees = trees
            .into_iter()
            .map(DecisionTree::from_checkpoint)
            .collect::<Result<Vec<_>>>()?;

        let n_features = trees[0].nfeatures();
        if let Some(tree) = trees.iter().find(|tree| tree.nfeatures() != n_features) {
            return Err(Error::Restore(format!(
                "trees disagree on the number of features, {} and {}",
                n_features,
                tree.nfeatures()
            )));
        }

        debug!(n_estimators, n_features, "random forest restored");

        Ok(RandomForest::from_parts(trees, n_estimators, state.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove::prelude::*;
    use ndarray::array;
    use serde_json::json;

    fn fitted() -> Result<RandomForest<f64, usize>> {
        let dataset = Dataset::new(
            array![[0., 0.], [1., 1.], [2., 1.], [1., 5.], [3., 2.]],
            array![0usize, 1, 2, 3, 7],
        );

        RandomForest::params().n_estimators(3).fit(&dataset)
    }

    #[test]
    fn restored_forest_is_identical() -> Result<()> {
        let forest = fitted()?;

        let restored = RandomForest::from_checkpoint(forest.to_checkpoint()?)?;

        assert_eq!(restored, forest);
        Ok(())
    }

    #[test]
    fn layout_lists_trees() -> Result<()> {
        let state = serde_json::to_value(fitted()?.to_checkpoint()?)
            .map_err(|err| Error::Checkpoint(err.to_string()))?;

        assert_eq!(state["n_estimators"], json!(3));
        assert_eq!(state["seed"], json!(42));
        assert_eq!(state["trees"].as_array().map(|trees| trees.len()), Some(3));
        assert_eq!(state["trees"][0]["randomize"], json!(true));

        Ok(())
    }

    #[test]
    fn missing_trees_are_rejected() {
        let state = ForestCheckpoint::<f64, usize> {
            n_estimators: Some(2),
            seed: 0,
            trees: None,
        };

        assert!(matches!(
            RandomForest::from_checkpoint(state),
            Err(Error::Restore(_))
        ));
    }

    #[test]
    fn tree_count_must_match() -> Result<()> {
        let mut state = fitted()?.to_checkpoint()?;
        state.n_estimators = Some(4);

        assert!(matches!(
            RandomForest::from_checkpoint(state),
            Err(Error::Restore(_))
        ));

        Ok(())
    }

    #[test]
    fn estimator_count_defaults_to_tree_count() -> Result<()> {
        let mut state = fitted()?.to_checkpoint()?;
        state.n_estimators = None;

        let forest = RandomForest::from_checkpoint(state)?;
        assert_eq!(forest.n_estimators(), 3);

        Ok(())
    }
}

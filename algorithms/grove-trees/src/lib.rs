//!
//! # Decision tree learning
//! `grove-trees` provides pure Rust implementations of decision tree classifiers and of random
//! forests built from them.
//!
//! # The big picture
//!
//! `grove-trees` is a crate in the `grove` toolkit. Models are fitted from validated
//! hyperparameters through the [`Fit`](grove::traits::Fit) trait, predict through
//! [`Predict`](grove::traits::Predict) and can be written to and restored from plain snapshots
//! through [`Checkpoint`](grove::traits::Checkpoint).
//!
//! Decision Trees (DTs) are a non-parametric supervised learning method used for classification.
//! The goal is to create a model that predicts the value of a target variable by learning simple
//! decision rules inferred from the data features. A random forest fits many trees, every one
//! of them searching random subsets of the features, and lets them vote.
//!
//! # Current state
//!
//! `grove-trees` provides
//! * an [implementation](DecisionTree) of single-tree fitting for classification,
//! * a [random forest](RandomForest) with plurality voting and optional bagging,
//! * the stateful [`DecisionTreeClassifier`] and [`RandomForestClassifier`], which follow the
//!   uniform [`Model`](grove::Model) contract of `fit`, `predict`, `to_checkpoint` and
//!   `from_checkpoint`.
//!
//! ```rust
//! use grove::{Dataset, Estimator, Model, Result};
//! use grove_trees::{RandomForest, RandomForestClassifier};
//! use ndarray::{array, Array1};
//!
//! let dataset = Dataset::new(
//!     array![[0., 0.], [1., 1.], [2., 1.], [1., 5.], [3., 2.]],
//!     array![0usize, 1, 2, 3, 7],
//! );
//!
//! let mut model: RandomForestClassifier<f64, usize> = Estimator::new(RandomForest::params());
//! model.fit(&dataset)?;
//! let predictions: Array1<usize> = model.predict(&array![[0., 0.], [3., 2.]])?;
//!
//! // a restored model predicts exactly like the original one
//! let mut restored: RandomForestClassifier<f64, usize> = Estimator::new(RandomForest::params());
//! restored.from_checkpoint(model.to_checkpoint()?)?;
//! let restored_predictions: Array1<usize> = restored.predict(&array![[0., 0.], [3., 2.]])?;
//! assert_eq!(predictions, restored_predictions);
//! # Result::Ok(())
//! ```

mod decision_trees;
mod random_forest;

pub use decision_trees::*;
pub use random_forest::*;

use grove::Estimator;

/// Stateful decision tree classifier
pub type DecisionTreeClassifier<F, L> = Estimator<DecisionTreeParams<F, L>, DecisionTree<F, L>>;

/// Stateful random forest classifier
pub type RandomForestClassifier<F, L> = Estimator<RandomForestParams<F, L>, RandomForest<F, L>>;

// Re-export the common Result alias for convenience
pub use grove::error::Result;

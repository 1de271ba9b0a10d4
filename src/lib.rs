//! `grove` provides the shared building blocks of a small toolkit of classical Machine
//! Learning estimators.
//!
//! Every estimator in the toolkit is driven through the same contract:
//!
//! * hyperparameters are assembled with a builder and validated through [`ParamGuard`];
//! * validated hyperparameters implement [`Fit`](traits::Fit) and produce a fitted model;
//! * fitted models implement [`Predict`](traits::Predict) and
//!   [`Checkpoint`](traits::Checkpoint), the latter giving a plain serializable snapshot
//!   that restores identical predictive behaviour.
//!
//! For callers that prefer a single mutable object with a `fit`/`predict`/`to_checkpoint`/
//! `from_checkpoint` life cycle, [`Estimator`] wraps any pair of hyperparameters and
//! fitted model and implements the stateful [`Model`] trait on top of them.
//!
//! The tree based algorithms live in the `grove-trees` crate of this workspace.
//!

pub mod dataset;
pub mod error;
pub mod model;
mod param_guard;
pub mod prelude;
pub mod traits;

#[cfg(feature = "benchmarks")]
pub mod benchmarks;

pub use dataset::{Dataset, DatasetBase, DatasetView, Float, Label};
pub use error::{Error, Result, ShapeError};
pub use model::{Estimator, Model};
pub use param_guard::ParamGuard;

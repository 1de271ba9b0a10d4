//! Provide traits for different classes of algorithms
//!

use crate::dataset::{DatasetBase, Records};
use crate::error::Result;
use ndarray::{ArrayBase, Data, Ix2};
use serde::{de::DeserializeOwned, Serialize};

/// Fittable algorithms
///
/// A fittable algorithm takes a dataset and creates a concept of some kind about it. For example
/// in *KMeans* this would be the mean values for each class, or in *DecisionTree* the fitted
/// node arena. The `Object` type contains this concept and is produced from validated
/// hyperparameters, so a model only exists once fitting succeeded.
pub trait Fit<R: Records, T, E: std::error::Error + From<crate::error::Error>> {
    type Object;

    fn fit(&self, dataset: &DatasetBase<R, T>) -> std::result::Result<Self::Object, E>;
}

/// Predict with model into a mutable reference of targets.
pub trait PredictInplace<R: Records, T> {
    /// Predict something in place
    fn predict_inplace<'a>(&'a self, x: &'a R, y: &mut T);

    /// Create targets that `predict_inplace` works with.
    fn default_target(&self, x: &R) -> T;
}

/// Predict with model
///
/// This trait assumes the `PredictInplace` implementation and provides additional input/output
/// combinations.
///
/// # Provided implementation
///
/// * Array2 -> Targets
/// * &Array2 -> Targets
pub trait Predict<R, T> {
    fn predict(&self, x: R) -> T;
}

impl<F, D, T, O> Predict<ArrayBase<D, Ix2>, T> for O
where
    D: Data<Elem = F>,
    O: PredictInplace<ArrayBase<D, Ix2>, T>,
{
    fn predict(&self, records: ArrayBase<D, Ix2>) -> T {
        let mut targets = self.default_target(&records);
        self.predict_inplace(&records, &mut targets);
        targets
    }
}

impl<'a, F, D, T, O> Predict<&'a ArrayBase<D, Ix2>, T> for O
where
    D: Data<Elem = F>,
    O: PredictInplace<ArrayBase<D, Ix2>, T>,
{
    fn predict(&self, records: &'a ArrayBase<D, Ix2>) -> T {
        let mut targets = self.default_target(records);
        self.predict_inplace(records, &mut targets);
        targets
    }
}

/// Models which can be written to and restored from a plain snapshot
///
/// The `State` is a structure without live handles which serializes to JSON (or any other
/// serde format). Restoring a model from the state of another model must give a model with
/// identical predictions for any input.
pub trait Checkpoint: Sized {
    type State: Serialize + DeserializeOwned;

    /// Takes a snapshot of the fitted model
    fn to_checkpoint(&self) -> Result<Self::State>;

    /// Rebuilds a fitted model, validating the snapshot on the way
    fn from_checkpoint(state: Self::State) -> Result<Self>;
}

/// Number of features a fitted model expects in every record
pub trait FeatureCount {
    fn nfeatures(&self) -> usize;
}

//! Uniform model contract
//!
//! Fitting through [`Fit`] consumes validated hyperparameters and hands back a separate
//! fitted object. Many callers instead want one long-lived model value that starts out unfit,
//! is trained (and retrained) in place and can be persisted and restored. The [`Model`] trait
//! describes that life cycle and [`Estimator`] implements it for any combination of
//! hyperparameters and fitted model:
//!
//! ```text
//! Unfit --fit / from_checkpoint--> Fit --fit / from_checkpoint--> Fit
//! ```
//!
//! There is no way back to `Unfit`. A failed `fit` or `from_checkpoint` leaves the previous
//! state untouched.
use ndarray::{Array1, Array2};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{Error, Result, ShapeError};
use crate::traits::{Checkpoint, FeatureCount, Fit, PredictInplace};

/// Stateful `fit`/`predict`/`to_checkpoint`/`from_checkpoint` contract shared by every
/// estimator
///
/// Records are a matrix of `F` with one sample per row, targets hold one `L` per sample.
pub trait Model<F, L> {
    /// Trains the model on `dataset`, discarding any previously fitted state
    fn fit(&mut self, dataset: &Dataset<F, L>) -> Result<()>;

    /// Predicts one target per record, in the order of the records
    ///
    /// Fails with [`Error::NotFitted`] if the model was neither fitted nor restored.
    fn predict(&self, records: &Array2<F>) -> Result<Array1<L>>;

    /// Returns a JSON snapshot of the fitted model
    fn to_checkpoint(&self) -> Result<Value>;

    /// Replaces the state of the model with a snapshot produced by `to_checkpoint`
    fn from_checkpoint(&mut self, state: Value) -> Result<()>;

    /// Returns true once `fit` or `from_checkpoint` succeeded
    fn is_fitted(&self) -> bool;
}

/// Hyperparameters together with an optional fitted model
///
/// ### Example
///
/// ```rust
/// use grove::{Dataset, Estimator, Model, Result};
/// use grove::traits::{Checkpoint, FeatureCount, Fit, PredictInplace};
/// use ndarray::{array, Array1, Array2};
///
/// // A toy model which always predicts the first training label
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct First { label: usize, nfeatures: usize }
///
/// struct FirstParams;
///
/// impl Fit<Array2<f64>, Array1<usize>, grove::Error> for FirstParams {
///     type Object = First;
///
///     fn fit(&self, dataset: &Dataset<f64, usize>) -> Result<First> {
///         Ok(First { label: dataset.targets()[0], nfeatures: dataset.nfeatures() })
///     }
/// }
///
/// impl PredictInplace<Array2<f64>, Array1<usize>> for First {
///     fn predict_inplace(&self, _x: &Array2<f64>, y: &mut Array1<usize>) {
///         y.fill(self.label);
///     }
///
///     fn default_target(&self, x: &Array2<f64>) -> Array1<usize> {
///         Array1::zeros(x.nrows())
///     }
/// }
///
/// impl FeatureCount for First {
///     fn nfeatures(&self) -> usize {
///         self.nfeatures
///     }
/// }
///
/// impl Checkpoint for First {
///     type State = First;
///
///     fn to_checkpoint(&self) -> Result<First> {
///         Ok(First { label: self.label, nfeatures: self.nfeatures })
///     }
///
///     fn from_checkpoint(state: First) -> Result<First> {
///         Ok(state)
///     }
/// }
///
/// let mut model: Estimator<FirstParams, First> = Estimator::new(FirstParams);
/// let unfit: Result<Array1<usize>> = model.predict(&array![[1.0]]);
/// assert!(unfit.is_err());
///
/// model.fit(&Dataset::new(array![[1.0], [2.0]], array![7usize, 3]))?;
/// let prediction: Array1<usize> = model.predict(&array![[5.0]])?;
/// assert_eq!(prediction, array![7]);
/// # Result::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct Estimator<P, M> {
    params: P,
    fitted: Option<M>,
}

impl<P, M> Estimator<P, M> {
    /// Creates an unfit estimator
    pub fn new(params: P) -> Self {
        Estimator {
            params,
            fitted: None,
        }
    }

    /// Returns the hyperparameters used by `fit`
    pub fn params(&self) -> &P {
        &self.params
    }

    /// Returns the fitted model, if any
    pub fn fitted(&self) -> Option<&M> {
        self.fitted.as_ref()
    }

    /// Consumes the estimator and returns the fitted model, if any
    pub fn into_fitted(self) -> Option<M> {
        self.fitted
    }

    /// Returns true once `fit` or `from_checkpoint` succeeded
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn fitted_or_err(&self) -> Result<&M> {
        self.fitted.as_ref().ok_or(Error::NotFitted)
    }
}

impl<P, M: Checkpoint> Estimator<P, M> {
    /// Returns a JSON snapshot of the fitted model
    ///
    /// Fails with [`Error::NotFitted`] if there is nothing to snapshot.
    pub fn to_checkpoint(&self) -> Result<Value> {
        let state = self.fitted_or_err()?.to_checkpoint()?;

        serde_json::to_value(state).map_err(|err| Error::Checkpoint(err.to_string()))
    }

    /// Replaces the fitted model with one restored from `state`
    ///
    /// Fails with [`Error::Restore`] if `state` is not a valid snapshot, the current model is
    /// kept in that case.
    pub fn from_checkpoint(&mut self, state: Value) -> Result<()> {
        let state: M::State =
            serde_json::from_value(state).map_err(|err| Error::Restore(err.to_string()))?;
        let model = M::from_checkpoint(state)?;
        debug!("model restored from checkpoint");

        self.fitted = Some(model);

        Ok(())
    }

    /// Returns the snapshot of the fitted model as JSON text
    pub fn to_checkpoint_string(&self) -> Result<String> {
        let state = self.fitted_or_err()?.to_checkpoint()?;

        serde_json::to_string(&state).map_err(|err| Error::Checkpoint(err.to_string()))
    }

    /// Replaces the fitted model with one restored from JSON text
    ///
    /// Snapshots of deep trees nest far beyond the default recursion limit of `serde_json`, so
    /// the limit is lifted and the stack is grown on demand while reading.
    pub fn from_checkpoint_str(&mut self, text: &str) -> Result<()> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        deserializer.disable_recursion_limit();

        let stacked = serde_stacker::Deserializer::new(&mut deserializer);
        let state = <M::State as Deserialize>::deserialize(stacked)
            .map_err(|err| Error::Restore(err.to_string()))?;
        deserializer
            .end()
            .map_err(|err| Error::Restore(err.to_string()))?;

        let model = M::from_checkpoint(state)?;
        debug!(bytes = text.len(), "model restored from checkpoint text");

        self.fitted = Some(model);

        Ok(())
    }
}

impl<F, L, P, M> Model<F, L> for Estimator<P, M>
where
    P: Fit<Array2<F>, Array1<L>, Error, Object = M>,
    M: PredictInplace<Array2<F>, Array1<L>> + Checkpoint + FeatureCount,
{
    fn fit(&mut self, dataset: &Dataset<F, L>) -> Result<()> {
        let model = self.params.fit(dataset)?;
        self.fitted = Some(model);

        Ok(())
    }

    fn predict(&self, records: &Array2<F>) -> Result<Array1<L>> {
        let model = self.fitted_or_err()?;

        if records.ncols() != model.nfeatures() {
            return Err(ShapeError::FeatureMismatch {
                expected: model.nfeatures(),
                found: records.ncols(),
            }
            .into());
        }

        let mut targets = model.default_target(records);
        model.predict_inplace(records, &mut targets);

        Ok(targets)
    }

    fn to_checkpoint(&self) -> Result<Value> {
        Estimator::to_checkpoint(self)
    }

    fn from_checkpoint(&mut self, state: Value) -> Result<()> {
        Estimator::from_checkpoint(self, state)
    }

    fn is_fitted(&self) -> bool {
        Estimator::is_fitted(self)
    }
}

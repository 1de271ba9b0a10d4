//! Datasets
//!
//! This module implements the dataset struct and various helper traits to extend its
//! functionality.
use ndarray::{ArrayBase, ArrayView, ArrayView1, Ix1, Ix2, OwnedRepr};
use num_traits::FromPrimitive;
use serde::{de::DeserializeOwned, Serialize};

use std::fmt;
use std::hash::Hash;
use std::iter::Sum;

mod impl_dataset;
mod impl_records;
mod impl_targets;

pub use impl_dataset::records_from_rows;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in the records of a dataset
/// and as thresholds of fitted models.
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Sum
    + Serialize
    + DeserializeOwned
    + approx::AbsDiffEq
    + 'static
{
}

impl Float for f32 {}

impl Float for f64 {}

/// Discrete labels
///
/// Labels are countable, comparable, hashable and serializable, so that a fitted classifier can
/// be written to a checkpoint together with the labels it predicts. Booleans (binary tasks),
/// integers and strings (multi-class tasks) are supported. The default value only fills
/// prediction buffers before they are written.
pub trait Label:
    PartialEq + Eq + Hash + Clone + Default + fmt::Debug + Send + Sync + Serialize + DeserializeOwned
{
}

impl Label for bool {}
impl Label for usize {}
impl Label for u8 {}
impl Label for u32 {}
impl Label for u64 {}
impl Label for i32 {}
impl Label for i64 {}
impl Label for String {}

/// DatasetBase
///
/// This is the fundamental structure of a dataset. It contains a number of records about the data
/// and may contain targets and feature names. In order to keep the type complexity low the
/// dataset base is only generic over the records and targets and introduces a trait bound on
/// the records. `feature_names` are always owned and copied when views are created.
///
/// # Fields
///
/// * `records`: a two-dimensional matrix with dimensionality (nsamples, nfeatures)
/// * `targets`: a one-dimensional array with one label per record
/// * `feature_names`: optional descriptive feature names with dimensionality (nfeatures)
#[derive(Debug, Clone)]
pub struct DatasetBase<R, T>
where
    R: Records,
{
    pub records: R,
    pub targets: T,

    feature_names: Vec<String>,
}

/// Dataset
///
/// The most commonly used typed of dataset. It contains a number of records
/// stored as an `Array2` and a single label per record stored as an `Array1`.
pub type Dataset<D, L> = DatasetBase<ArrayBase<OwnedRepr<D>, Ix2>, ArrayBase<OwnedRepr<L>, Ix1>>;

/// DatasetView
///
/// A read only view of a Dataset
pub type DatasetView<'a, D, L> = DatasetBase<ArrayView<'a, D, Ix2>, ArrayView<'a, L, Ix1>>;

/// Record trait
pub trait Records: Sized {
    type Elem;

    fn nsamples(&self) -> usize;
    fn nfeatures(&self) -> usize;
}

/// Return a reference to the single target variable of a dataset
pub trait AsTargets {
    type Elem;

    /// Returns a view on the targets
    fn as_targets(&self) -> ArrayView1<'_, Self::Elem>;

    /// Number of targets, one per record
    fn ntargets(&self) -> usize {
        self.as_targets().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result, ShapeError};
    use ndarray::array;

    #[test]
    fn dataset_implements_required_methods() {
        let dataset = Dataset::new(array![[1., 2.], [3., 4.], [5., 6.]], array![0usize, 1, 1]);

        assert_eq!(dataset.nsamples(), 3);
        assert_eq!(dataset.nfeatures(), 2);
        assert_eq!(dataset.targets().len(), 3);
        assert_eq!(dataset.feature_names(), vec!["feature-0", "feature-1"]);
        assert!(dataset.check_shape().is_ok());

        let view = dataset.view();
        assert_eq!(view.nsamples(), 3);
        assert_eq!(view.records()[(2, 1)], 6.);
    }

    #[test]
    fn feature_names_are_kept() {
        let dataset = Dataset::new(array![[1., 2.]], array![true])
            .with_feature_names(vec!["height", "width"]);

        assert_eq!(dataset.feature_names(), vec!["height", "width"]);
        assert_eq!(dataset.view().feature_names(), vec!["height", "width"]);
    }

    #[test]
    fn check_shape_reports_mismatch() {
        let dataset = Dataset::new(array![[1., 2.], [3., 4.]], array![0usize]);

        assert_eq!(
            dataset.check_shape(),
            Err(ShapeError::LengthMismatch {
                records: 2,
                targets: 1
            })
        );

        let empty = Dataset::<f64, usize>::new(ndarray::Array2::zeros((0, 2)), array![]);
        assert_eq!(empty.check_shape(), Err(ShapeError::EmptyDataset));
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let rows = vec![vec![1., 2.], vec![3.], vec![4., 5.]];
        let err = Dataset::from_rows(rows, vec![0usize, 1, 2]).unwrap_err();

        assert!(matches!(
            err,
            Error::Shape(ShapeError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn from_rows_builds_matrix() -> Result<()> {
        let dataset = Dataset::from_rows(
            vec![vec![1., 20.], vec![2., 21.]],
            vec![String::from("a"), String::from("b")],
        )?;

        assert_eq!(dataset.records(), &array![[1., 20.], [2., 21.]]);
        assert_eq!(dataset.targets()[1], "b");

        Ok(())
    }
}

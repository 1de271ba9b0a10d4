use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};

use super::{AsTargets, Dataset, DatasetBase, DatasetView, Float, Label, Records};
use crate::error::{Result, ShapeError};

impl<R: Records, T> DatasetBase<R, T> {
    /// Create a new dataset from records and targets
    ///
    /// Shapes are not checked here; estimators verify them with
    /// [`check_shape`](DatasetBase::check_shape) before fitting.
    pub fn new(records: R, targets: T) -> DatasetBase<R, T> {
        DatasetBase {
            records,
            targets,
            feature_names: Vec::new(),
        }
    }

    /// Returns reference to targets
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// Returns reference to records
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Number of samples in the dataset
    pub fn nsamples(&self) -> usize {
        self.records.nsamples()
    }

    /// Number of features of every record
    pub fn nfeatures(&self) -> usize {
        self.records.nfeatures()
    }

    /// Returns feature names
    ///
    /// A feature name gives a human-readable string describing the purpose of a single feature.
    /// If no names were attached, `feature-{idx}` is generated for every column.
    pub fn feature_names(&self) -> Vec<String> {
        if !self.feature_names.is_empty() {
            self.feature_names.clone()
        } else {
            (0..self.records.nfeatures())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }

    /// Updates the feature names of a dataset
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> DatasetBase<R, T> {
        self.feature_names = names.into_iter().map(|x| x.into()).collect();

        self
    }
}

impl<R: Records, T: AsTargets> DatasetBase<R, T> {
    /// Verifies that the dataset can be used for training
    ///
    /// Fails when there are no samples or when the number of records differs from the number
    /// of targets.
    pub fn check_shape(&self) -> std::result::Result<(), ShapeError> {
        let (records, targets) = (self.records.nsamples(), self.targets.ntargets());

        if records != targets {
            return Err(ShapeError::LengthMismatch { records, targets });
        }
        if records == 0 {
            return Err(ShapeError::EmptyDataset);
        }

        Ok(())
    }
}

impl<F, L, D, S> DatasetBase<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>>
where
    D: Data<Elem = F>,
    S: Data<Elem = L>,
{
    /// Creates a view of a dataset
    pub fn view(&self) -> DatasetView<'_, F, L> {
        DatasetBase {
            records: self.records.view(),
            targets: self.targets.view(),
            feature_names: self.feature_names.clone(),
        }
    }
}

impl<F: Float, L: Label> Dataset<F, L> {
    /// Creates a dataset from row-oriented records
    ///
    /// Every row must have the length of the first row, otherwise a
    /// [`ShapeError::RaggedRow`] is returned.
    pub fn from_rows(rows: Vec<Vec<F>>, targets: Vec<L>) -> Result<Dataset<F, L>> {
        let records = records_from_rows(rows)?;

        Ok(Dataset::new(records, Array1::from(targets)))
    }
}

/// Converts row-oriented records into a feature matrix
///
/// Fails with [`ShapeError::RaggedRow`] for the first row whose length differs from the length
/// of the first row.
pub fn records_from_rows<F: Float>(rows: Vec<Vec<F>>) -> Result<Array2<F>> {
    let nfeatures = rows.first().map(|row| row.len()).unwrap_or(0);

    if let Some((row, found)) = rows
        .iter()
        .map(|row| row.len())
        .enumerate()
        .find(|(_, len)| *len != nfeatures)
    {
        return Err(ShapeError::RaggedRow {
            row,
            expected: nfeatures,
            found,
        }
        .into());
    }

    let nsamples = rows.len();
    let flat = rows.into_iter().flatten().collect::<Vec<_>>();

    Ok(Array2::from_shape_vec((nsamples, nfeatures), flat)?)
}

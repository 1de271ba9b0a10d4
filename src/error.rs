//! Error types in grove
//!

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Inconsistencies between the records, the targets and a fitted model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("the training set contains no samples")]
    EmptyDataset,
    #[error("{records} records but {targets} targets")]
    LengthMismatch { records: usize, targets: usize },
    #[error("row {row} has {found} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("records have {found} features, but the model was fitted with {expected}")]
    FeatureMismatch { expected: usize, found: usize },
}

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("invalid dataset shape: {0}")]
    Shape(#[from] ShapeError),
    #[error("the model has not been fitted")]
    NotFitted,
    #[error("could not restore model from checkpoint: {0}")]
    Restore(String),
    #[error("could not serialize checkpoint: {0}")]
    Checkpoint(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ndarray::ShapeError),
}

// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the preprocessed .npz
// file all the way to device-ready tensor batches.
//
// The pipeline flows in this order:
//
//   dataset.npz (+ optional dataset.labels.json)
//       │
//       ▼
//   NpzLoader         → reads X, y_env, y_node into RawSeries
//       │
//       ▼
//   splitter          → random or group-holdout index split
//       │
//       ▼
//   SeriesDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   SeriesBatcher     → stacks samples into [B, C, T] tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// TimeSeriesDataModule (module.rs) wires the steps together
// and exposes the three datasets plus the input/output sizes
// the classifier is built from.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use thiserror::Error;

/// Loads the preprocessed .npz corpus
pub mod loader;

/// Implements Burn's Dataset trait for labelled series
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Random and group-holdout train/val/test splits
pub mod splitter;

/// Data module: load + split + expose datasets
pub mod module;

/// Errors raised while loading or splitting the corpus.
#[derive(Debug, Error)]
pub enum DataError {
    /// The .npz archive could not be read or lacks an array
    #[error("cannot read array '{name}' from '{path}': {reason}")]
    MissingArray {
        path:   String,
        name:   String,
        reason: String,
    },

    /// Arrays disagree on the number of samples
    #[error("'{name}' has {found} entries but X has {expected} samples")]
    LengthMismatch {
        name:     String,
        expected: usize,
        found:    usize,
    },

    /// A label value is negative
    #[error("'{name}' contains negative label {value}")]
    NegativeLabel { name: String, value: i64 },

    /// The requested holdout group does not exist
    #[error("unknown holdout group '{0}'")]
    UnknownHoldout(String),

    /// A split produced no training samples
    #[error("split left no training samples ({0})")]
    EmptySplit(String),
}

//! I/O error types for canopy-io.

use std::path::PathBuf;

/// Errors from example file loading and report writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the tab-delimited parser encounters a malformed record.
    #[error("parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the input file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the file yields zero accepted examples.
    #[error("empty dataset (no usable example rows) in {path}")]
    EmptyDataset {
        /// Path to the input file.
        path: PathBuf,
    },

    /// Returned when the header has no column after the label column.
    #[error("no feature columns in header of {path}: found {n_columns} column(s), need at least 2")]
    NoFeatureColumns {
        /// Path to the input file.
        path: PathBuf,
        /// Number of header columns found.
        n_columns: usize,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the input file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a feature cell is not `true` or `false`.
    #[error("invalid boolean in {path}: row {row_index}, feature {feature_index}, raw value \"{raw}\"")]
    InvalidBoolean {
        /// Path to the input file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Zero-based feature index (excluding the label column).
        feature_index: usize,
        /// The raw token that failed to parse.
        raw: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a report file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a report cannot be encoded as JSON.
    #[error("cannot serialize report")]
    SerializeReport {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

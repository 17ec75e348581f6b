//! Tab-delimited example reader with full input validation.

use std::path::{Path, PathBuf};

use canopy_rf::Example;
use tracing::{debug, info, instrument, warn};

use crate::IoError;
use crate::domain::{ExampleSet, SkippedRow};

const POSITIVE: &str = "positive";
const NEGATIVE: &str = "negative";

/// Reads labelled boolean examples from a tab-delimited file.
///
/// Expected format:
/// - Header row required: a label column followed by one column per feature
/// - `label\tf0\tf1\t...\tfn`
/// - Each data row: `positive` or `negative`, then one `true`/`false` token
///   per feature (case-insensitive)
///
/// Rows whose label token is neither `positive` nor `negative` are skipped
/// and reported in [`ExampleSet::skipped`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed record |
/// | [`IoError::NoFeatureColumns`] | Header has fewer than two columns |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::InvalidBoolean`] | Feature cell is not `true`/`false` |
/// | [`IoError::EmptyDataset`] | Zero accepted rows after header |
pub struct ExampleReader {
    path: PathBuf,
}

impl ExampleReader {
    /// Create a new reader for the given file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the file, returning an [`ExampleSet`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<ExampleSet, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets our own InconsistentRowLength check fire instead
        // of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.parse_error(e))?;
        let expected_cols = header.len();
        if expected_cols < 2 {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
                n_columns: expected_cols,
            });
        }
        let feature_names: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
        debug!(n_features = feature_names.len(), "read header");

        let mut examples = Vec::new();
        let mut skipped = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.parse_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let token = record.get(0).unwrap_or("").trim();
            let label = match token {
                POSITIVE => true,
                NEGATIVE => false,
                _ => {
                    warn!(row_index, token, "skipping row with unrecognized label");
                    skipped.push(SkippedRow {
                        row_index,
                        token: token.to_string(),
                    });
                    continue;
                }
            };

            let features = record
                .iter()
                .skip(1)
                .enumerate()
                .map(|(feature_index, raw)| self.parse_bool(raw, row_index, feature_index))
                .collect::<Result<Vec<bool>, IoError>>()?;

            examples.push(Example::new(features, label));
        }

        if examples.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let set = ExampleSet::new(feature_names, examples, skipped);
        info!(
            n_examples = set.n_examples(),
            n_positives = set.positives().count(),
            n_features = set.n_features(),
            n_skipped = set.skipped().len(),
            "dataset loaded"
        );
        Ok(set)
    }

    fn parse_bool(&self, raw: &str, row_index: usize, feature_index: usize) -> Result<bool, IoError> {
        let token = raw.trim();
        if token.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if token.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(IoError::InvalidBoolean {
                path: self.path.clone(),
                row_index,
                feature_index,
                raw: raw.to_string(),
            })
        }
    }

    fn parse_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

//! JSON report of a training and evaluation run.

use std::fs;
use std::path::{Path, PathBuf};

use canopy_rf::{ConfusionMatrix, OobError, RandomForestResult};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExampleSet;

/// Summary of a trained forest and, optionally, its held-out evaluation.
///
/// Feature importances are reported by header name.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// Number of trees in the forest.
    pub n_trees: usize,
    /// Features per example.
    pub n_features: usize,
    /// Features sampled per split.
    pub features_per_split: usize,
    /// Training examples used.
    pub n_train_examples: usize,
    /// Positive training examples.
    pub n_train_positives: usize,
    /// Mean per-tree OOB error, `None` if every OOB set was empty.
    pub mean_oob_error: Option<f64>,
    /// Ensemble OOB accuracy, `None` if no example was ever out-of-bag.
    pub oob_accuracy: Option<f64>,
    /// Per-tree OOB errors in training order.
    pub tree_oob_errors: Vec<OobError>,
    /// Held-out evaluation, when a test set was supplied.
    pub test: Option<TestSummary>,
    /// Features ranked by importance.
    pub feature_importances: Vec<FeatureEntry>,
}

/// Held-out accuracy figures.
#[derive(Debug, Clone, Serialize)]
pub struct TestSummary {
    /// Positive examples classified positive.
    pub positive_correct: usize,
    /// Positive examples in the test set.
    pub n_positives: usize,
    /// `positive_correct / n_positives`.
    pub positive_accuracy: f64,
    /// Negative examples classified negative.
    pub negative_correct: usize,
    /// Negative examples in the test set.
    pub n_negatives: usize,
    /// `negative_correct / n_negatives`.
    pub negative_accuracy: f64,
    /// Overall accuracy.
    pub accuracy: f64,
    /// Full confusion matrix.
    pub confusion: ConfusionMatrix,
}

impl From<&ConfusionMatrix> for TestSummary {
    fn from(cm: &ConfusionMatrix) -> Self {
        Self {
            positive_correct: cm.true_positives,
            n_positives: cm.n_positives(),
            positive_accuracy: cm.positive_accuracy(),
            negative_correct: cm.true_negatives,
            n_negatives: cm.n_negatives(),
            negative_accuracy: cm.negative_accuracy(),
            accuracy: cm.accuracy(),
            confusion: *cm,
        }
    }
}

/// One ranked feature.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureEntry {
    /// Header name of the feature.
    pub name: String,
    /// Column index among the features.
    pub index: usize,
    /// Normalized importance.
    pub importance: f64,
    /// 1-based rank.
    pub rank: usize,
}

impl EvaluationReport {
    /// Build a report from a training result, the training set it came
    /// from, and an optional held-out confusion matrix.
    #[must_use]
    pub fn new(
        result: &RandomForestResult,
        train: &ExampleSet,
        test: Option<&ConfusionMatrix>,
    ) -> Self {
        let forest = result.forest();
        let metadata = result.metadata();
        let feature_importances = result
            .importances()
            .iter()
            .map(|f| FeatureEntry {
                name: train.feature_name(f.feature.index()),
                index: f.feature.index(),
                importance: f.importance,
                rank: f.rank,
            })
            .collect();

        Self {
            n_trees: metadata.n_trees,
            n_features: metadata.n_features,
            features_per_split: metadata.features_per_split,
            n_train_examples: metadata.n_examples,
            n_train_positives: metadata.n_positives,
            mean_oob_error: forest.mean_oob_error().ok(),
            oob_accuracy: result.oob_score().map(|s| s.accuracy),
            tree_oob_errors: forest.oob_errors().to_vec(),
            test: test.map(TestSummary::from),
            feature_importances,
        }
    }

    /// Encode the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::SerializeReport`] if encoding fails.
    pub fn to_json(&self) -> Result<String, IoError> {
        serde_json::to_string_pretty(self).map_err(|e| IoError::SerializeReport { source: e })
    }
}

/// Writes [`EvaluationReport`]s to a JSON file.
///
/// Creates the parent directory on construction if it does not exist.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    /// Create a new writer targeting `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the parent directory cannot be created.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn new(path: &Path) -> Result<Self, IoError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| IoError::OutputDirCreate {
                path: dir.to_path_buf(),
                source: e,
            })?;
            debug!("output directory ready");
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Write `report` to the target path, replacing any existing file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeReport`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn write(&self, report: &EvaluationReport) -> Result<(), IoError> {
        let json = report.to_json()?;
        fs::write(&self.path, json).map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;
        info!("evaluation report written");
        Ok(())
    }
}

//! Training result types for Random Forest.

use serde::Serialize;

use crate::forest::RandomForest;
use crate::importance::RankedFeature;
use crate::oob::OobScore;

/// Metadata about the training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingMetadata {
    /// Number of trees trained.
    pub n_trees: usize,
    /// Number of features per example.
    pub n_features: usize,
    /// Number of training examples.
    pub n_examples: usize,
    /// Number of positive training examples.
    pub n_positives: usize,
    /// Resolved features-per-split value used.
    pub features_per_split: usize,
}

/// Result of Random Forest training.
///
/// Contains the fitted forest, feature importances, the ensemble OOB score,
/// per-tree OOB indices, and training metadata.
#[derive(Debug)]
pub struct RandomForestResult {
    forest: RandomForest,
    importances: Vec<RankedFeature>,
    oob_score: Option<OobScore>,
    oob_indices_per_tree: Vec<Vec<usize>>,
    metadata: TrainingMetadata,
}

impl RandomForestResult {
    pub(crate) fn new(
        forest: RandomForest,
        importances: Vec<RankedFeature>,
        oob_score: Option<OobScore>,
        oob_indices_per_tree: Vec<Vec<usize>>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            forest,
            importances,
            oob_score,
            oob_indices_per_tree,
            metadata,
        }
    }

    /// Borrow the fitted forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Consume the result and return the fitted forest.
    #[must_use]
    pub fn into_forest(self) -> RandomForest {
        self.forest
    }

    /// Return the ranked feature importances.
    #[must_use]
    pub fn importances(&self) -> &[RankedFeature] {
        &self.importances
    }

    /// Return the ensemble OOB score, `None` if no example was ever out-of-bag.
    #[must_use]
    pub fn oob_score(&self) -> Option<&OobScore> {
        self.oob_score.as_ref()
    }

    /// Return training metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }

    /// Return the per-tree OOB row indices into the training examples.
    #[must_use]
    pub fn oob_indices_per_tree(&self) -> &[Vec<usize>] {
        &self.oob_indices_per_tree
    }
}

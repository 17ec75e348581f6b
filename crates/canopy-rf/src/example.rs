//! Labelled boolean feature vectors.

use crate::error::RfError;
use crate::node::FeatureIndex;

/// A single training or test example: a fixed-length boolean feature vector
/// and a boolean label.
///
/// Immutable once constructed. Equality and hashing compare the full content
/// (features and label), which is what value-based OOB membership relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Example {
    features: Vec<bool>,
    label: bool,
}

impl Example {
    /// Create a new example from its feature values and label.
    #[must_use]
    pub fn new(features: Vec<bool>, label: bool) -> Self {
        Self { features, label }
    }

    /// Return the value of feature `feature`.
    ///
    /// # Panics
    ///
    /// Panics if `feature` is out of range. Callers inside the crate only
    /// read features after checking [`Example::n_features`].
    #[must_use]
    pub fn feature(&self, feature: FeatureIndex) -> bool {
        self.features[feature.index()]
    }

    /// Return all feature values.
    #[must_use]
    pub fn features(&self) -> &[bool] {
        &self.features
    }

    /// Return the number of features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Return the label (`true` = positive).
    #[must_use]
    pub fn label(&self) -> bool {
        self.label
    }
}

/// Check that `examples` is non-empty and every example has `n_features` features.
pub(crate) fn check_examples(examples: &[Example], n_features: usize) -> Result<(), RfError> {
    if examples.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    for (sample_index, ex) in examples.iter().enumerate() {
        if ex.n_features() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: ex.n_features(),
                sample_index,
            });
        }
    }
    Ok(())
}

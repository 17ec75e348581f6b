//! Prediction methods for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;

use crate::error::RfError;
use crate::example::Example;
use crate::forest::RandomForest;
use crate::oob::{OobError, mean_oob_error};
use crate::tree::DecisionTree;

/// Tree votes cast for a single example.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Votes {
    /// Trees classifying the example positive.
    pub n_true: usize,
    /// Trees classifying the example negative.
    pub n_false: usize,
}

impl Votes {
    /// The ensemble decision: `false` only when false votes strictly
    /// outnumber true votes.
    #[must_use]
    pub fn decision(&self) -> bool {
        self.n_false <= self.n_true
    }
}

impl RandomForest {
    /// Count each tree's classification of `example`.
    ///
    /// # Errors
    ///
    /// | Variant                                | When                               |
    /// |----------------------------------------|------------------------------------|
    /// | [`RfError::PredictionFeatureMismatch`] | `example.n_features() != n_features` |
    /// | [`RfError::MalformedTree`]             | a tree cannot route the example     |
    pub fn votes(&self, example: &Example) -> Result<Votes, RfError> {
        if example.n_features() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: example.n_features(),
            });
        }

        let mut votes = Votes::default();
        for tree in &self.trees {
            if tree.classify(example)? {
                votes.n_true += 1;
            } else {
                votes.n_false += 1;
            }
        }
        Ok(votes)
    }

    /// Classify a single example by majority vote; ties resolve to `true`.
    ///
    /// # Errors
    ///
    /// See [`RandomForest::votes`].
    pub fn evaluate_example(&self, example: &Example) -> Result<bool, RfError> {
        Ok(self.votes(example)?.decision())
    }

    /// Classify a batch of examples in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first error hit by any example; see [`RandomForest::votes`].
    pub fn predict_batch(&self, examples: &[Example]) -> Result<Vec<bool>, RfError> {
        examples
            .into_par_iter()
            .map(|example| self.evaluate_example(example))
            .collect()
    }

    /// Mean of the per-tree OOB error rates.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::OobEvaluationFailed`] if every tree's OOB set was empty.
    pub fn mean_oob_error(&self) -> Result<f64, RfError> {
        mean_oob_error(&self.oob_errors)
    }

    /// Return the per-tree OOB errors, aligned with [`RandomForest::trees`].
    #[must_use]
    pub fn oob_errors(&self) -> &[OobError] {
        &self.oob_errors
    }

    /// Return the trees in training order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

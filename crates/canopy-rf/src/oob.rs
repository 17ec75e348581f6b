//! Out-of-bag (OOB) evaluation for Random Forest.

use serde::Serialize;

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;
use crate::example::Example;
use crate::tree::DecisionTree;

/// Out-of-bag error of a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OobError {
    /// OOB examples the tree misclassified.
    pub misclassified: usize,
    /// Size of the tree's OOB set.
    pub n_oob: usize,
}

impl OobError {
    /// Misclassification rate, `None` when the OOB set is empty.
    #[must_use]
    pub fn rate(&self) -> Option<f64> {
        (self.n_oob > 0).then(|| self.misclassified as f64 / self.n_oob as f64)
    }
}

/// Classify every OOB row of `examples` with `tree` and count the errors.
pub(crate) fn tree_oob_error(
    tree: &DecisionTree,
    examples: &[Example],
    oob_indices: &[usize],
) -> Result<OobError, RfError> {
    let mut misclassified = 0;
    for &row in oob_indices {
        let ex = &examples[row];
        if tree.classify(ex)? != ex.label() {
            misclassified += 1;
        }
    }
    Ok(OobError {
        misclassified,
        n_oob: oob_indices.len(),
    })
}

/// Arithmetic mean of the per-tree OOB error rates.
///
/// Trees with an empty OOB set have no rate and are left out of the mean.
///
/// # Errors
///
/// Returns [`RfError::OobEvaluationFailed`] if no tree has a non-empty OOB set.
pub fn mean_oob_error(errors: &[OobError]) -> Result<f64, RfError> {
    let rates: Vec<f64> = errors.iter().filter_map(OobError::rate).collect();
    if rates.is_empty() {
        return Err(RfError::OobEvaluationFailed {
            reason: format!("none of {} trees has a non-empty OOB set", errors.len()),
        });
    }
    Ok(rates.iter().sum::<f64>() / rates.len() as f64)
}

/// Ensemble out-of-bag evaluation result.
#[derive(Debug, Clone, Serialize)]
pub struct OobScore {
    /// OOB accuracy (fraction of correctly predicted OOB examples).
    pub accuracy: f64,
    /// Outcomes of the OOB majority votes.
    pub confusion: ConfusionMatrix,
    /// Number of examples that were out-of-bag for at least one tree.
    pub n_oob_examples: usize,
}

/// Compute ensemble out-of-bag predictions and accuracy.
///
/// Each example is classified by majority vote of only the trees for which
/// it was OOB (ties go to `true`). Examples with no OOB tree are skipped;
/// returns `None` if that leaves nothing to score.
pub(crate) fn compute_oob(
    trees: &[DecisionTree],
    examples: &[Example],
    oob_indices_per_tree: &[Vec<usize>],
) -> Result<Option<OobScore>, RfError> {
    // (true votes, false votes) per example.
    let mut votes = vec![(0usize, 0usize); examples.len()];

    for (tree, oob_indices) in trees.iter().zip(oob_indices_per_tree) {
        for &row in oob_indices {
            if tree.classify(&examples[row])? {
                votes[row].0 += 1;
            } else {
                votes[row].1 += 1;
            }
        }
    }

    let confusion = ConfusionMatrix::from_pairs(
        votes
            .iter()
            .zip(examples)
            .filter(|&(&(t, f), _)| t + f > 0)
            .map(|(&(t, f), ex)| (ex.label(), f <= t)),
    );

    let n_oob_examples = confusion.total();
    if n_oob_examples == 0 {
        return Ok(None);
    }

    Ok(Some(OobScore {
        accuracy: confusion.accuracy(),
        confusion,
        n_oob_examples,
    }))
}

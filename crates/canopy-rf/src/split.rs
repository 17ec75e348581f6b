//! Binary entropy and information-gain split search.

use crate::example::Example;
use crate::node::{FeatureIndex, FeaturePool};

/// Binary Shannon entropy, in bits, of a node holding `n_pos` positive and
/// `n_neg` negative examples.
///
/// An empty node has entropy `0.0`, as does a pure one.
#[must_use]
pub fn entropy(n_pos: usize, n_neg: usize) -> f64 {
    let total = (n_pos + n_neg) as f64;
    if total == 0.0 {
        return 0.0;
    }
    [n_pos, n_neg]
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Label counts on each side of a candidate split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SplitCounts {
    pub(crate) true_pos: usize,
    pub(crate) true_neg: usize,
    pub(crate) false_pos: usize,
    pub(crate) false_neg: usize,
}

impl SplitCounts {
    fn tally(sample: &[Example], pos: &[usize], neg: &[usize], feature: FeatureIndex) -> Self {
        let true_pos = pos.iter().filter(|&&row| sample[row].feature(feature)).count();
        let true_neg = neg.iter().filter(|&&row| sample[row].feature(feature)).count();
        Self {
            true_pos,
            true_neg,
            false_pos: pos.len() - true_pos,
            false_neg: neg.len() - true_neg,
        }
    }

    /// Example-count-weighted average entropy of the two sides.
    pub(crate) fn remaining_entropy(&self) -> f64 {
        let n_true = self.true_pos + self.true_neg;
        let n_false = self.false_pos + self.false_neg;
        let total = (n_true + n_false) as f64;
        if total == 0.0 {
            return 0.0;
        }
        (n_true as f64 / total) * entropy(self.true_pos, self.true_neg)
            + (n_false as f64 / total) * entropy(self.false_pos, self.false_neg)
    }
}

/// Rows of a node partitioned by a split feature, each side keeping its
/// positive/negative division.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Partition {
    pub(crate) true_pos: Vec<usize>,
    pub(crate) true_neg: Vec<usize>,
    pub(crate) false_pos: Vec<usize>,
    pub(crate) false_neg: Vec<usize>,
}

impl Partition {
    pub(crate) fn by_feature(
        sample: &[Example],
        pos: &[usize],
        neg: &[usize],
        feature: FeatureIndex,
    ) -> Self {
        let (true_pos, false_pos) = pos.iter().copied().partition(|&row| sample[row].feature(feature));
        let (true_neg, false_neg) = neg.iter().copied().partition(|&row| sample[row].feature(feature));
        Self {
            true_pos,
            true_neg,
            false_pos,
            false_neg,
        }
    }
}

/// Information gain from splitting the rows `pos`/`neg` on `feature`.
#[must_use]
pub(crate) fn information_gain(
    sample: &[Example],
    pos: &[usize],
    neg: &[usize],
    feature: FeatureIndex,
) -> f64 {
    entropy(pos.len(), neg.len()) - SplitCounts::tally(sample, pos, neg, feature).remaining_entropy()
}

/// The winning feature of a split search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SplitCandidate {
    pub(crate) feature: FeatureIndex,
    pub(crate) gain: f64,
}

/// Find the candidate with the highest strictly positive information gain.
///
/// Candidates are scanned in ascending feature order. The running maximum
/// starts at zero and is only replaced by a strictly larger gain, so ties keep
/// the first feature seen and a split with zero gain is never chosen.
pub(crate) fn best_split(
    sample: &[Example],
    pos: &[usize],
    neg: &[usize],
    pool: &FeaturePool,
) -> Option<SplitCandidate> {
    let mut best: Option<SplitCandidate> = None;
    let mut max_gain = 0.0;

    for feature in pool.iter() {
        let gain = information_gain(sample, pos, neg, feature);
        if gain > max_gain {
            max_gain = gain;
            best = Some(SplitCandidate { feature, gain });
        }
    }

    best
}

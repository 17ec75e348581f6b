//! Binary confusion matrix and per-label accuracy.

use std::fmt;

use serde::Serialize;

/// A 2x2 confusion matrix for positive/negative classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// Positive examples classified positive.
    pub true_positives: usize,
    /// Positive examples classified negative.
    pub false_negatives: usize,
    /// Negative examples classified negative.
    pub true_negatives: usize,
    /// Negative examples classified positive.
    pub false_positives: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from `(actual, predicted)` label pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (bool, bool)>) -> Self {
        let mut cm = Self::default();
        for (actual, predicted) in pairs {
            cm.record(actual, predicted);
        }
        cm
    }

    /// Count one classification outcome.
    pub fn record(&mut self, actual: bool, predicted: bool) {
        match (actual, predicted) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_negatives += 1,
            (false, false) => self.true_negatives += 1,
            (false, true) => self.false_positives += 1,
        }
    }

    /// Number of positive examples seen.
    #[must_use]
    pub fn n_positives(&self) -> usize {
        self.true_positives + self.false_negatives
    }

    /// Number of negative examples seen.
    #[must_use]
    pub fn n_negatives(&self) -> usize {
        self.true_negatives + self.false_positives
    }

    /// Total number of examples seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.n_positives() + self.n_negatives()
    }

    /// Correctly classified examples.
    #[must_use]
    pub fn correct(&self) -> usize {
        self.true_positives + self.true_negatives
    }

    /// Fraction of positives classified positive. 0.0 if there are none.
    #[must_use]
    pub fn positive_accuracy(&self) -> f64 {
        ratio(self.true_positives, self.n_positives())
    }

    /// Fraction of negatives classified negative. 0.0 if there are none.
    #[must_use]
    pub fn negative_accuracy(&self) -> f64 {
        ratio(self.true_negatives, self.n_negatives())
    }

    /// Fraction of all examples classified correctly. 0.0 if empty.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>10} {:>9} {:>9}", "", "pred_pos", "pred_neg")?;
        writeln!(
            f,
            "{:>10} {:>9} {:>9}",
            "true_pos", self.true_positives, self.false_negatives
        )?;
        writeln!(
            f,
            "{:>10} {:>9} {:>9}",
            "true_neg", self.false_positives, self.true_negatives
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let cm = ConfusionMatrix::from_pairs([(true, true), (false, false), (true, true)]);
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        assert!((cm.positive_accuracy() - 1.0).abs() < f64::EPSILON);
        assert!((cm.negative_accuracy() - 1.0).abs() < f64::EPSILON);
        assert_eq!(cm.total(), 3);
    }

    #[test]
    fn known_confusion_matrix() {
        // 3 positives (2 right), 4 negatives (1 right).
        let cm = ConfusionMatrix::from_pairs([
            (true, true),
            (true, true),
            (true, false),
            (false, false),
            (false, true),
            (false, true),
            (false, true),
        ]);
        assert_eq!(cm.true_positives, 2);
        assert_eq!(cm.false_negatives, 1);
        assert_eq!(cm.true_negatives, 1);
        assert_eq!(cm.false_positives, 3);
        assert!((cm.positive_accuracy() - 2.0 / 3.0).abs() < 1e-10);
        assert!((cm.negative_accuracy() - 0.25).abs() < 1e-10);
        assert!((cm.accuracy() - 3.0 / 7.0).abs() < 1e-10);
    }

    #[test]
    fn empty_class_reports_zero() {
        let cm = ConfusionMatrix::from_pairs([(true, true)]);
        assert_eq!(cm.n_negatives(), 0);
        assert_eq!(cm.negative_accuracy(), 0.0);
        assert_eq!(ConfusionMatrix::default().accuracy(), 0.0);
    }

    #[test]
    fn display_formatting() {
        let output = format!("{}", ConfusionMatrix::from_pairs([(true, false)]));
        assert!(output.contains("pred_pos"));
        assert!(output.contains("true_neg"));
    }
}

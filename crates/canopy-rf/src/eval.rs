//! Held-out evaluation of a trained forest.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;
use crate::example::Example;
use crate::forest::RandomForest;

impl RandomForest {
    /// Classify every example and tally the outcomes against the labels.
    ///
    /// An empty slice yields an empty matrix.
    ///
    /// # Errors
    ///
    /// | Variant                                | When                                  |
    /// |----------------------------------------|---------------------------------------|
    /// | [`RfError::PredictionFeatureMismatch`] | an example has the wrong feature count |
    /// | [`RfError::MalformedTree`]             | a tree cannot route an example         |
    #[instrument(skip_all, fields(n_examples = examples.len()))]
    pub fn evaluate(&self, examples: &[Example]) -> Result<ConfusionMatrix, RfError> {
        let outcomes: Vec<(bool, bool)> = examples
            .into_par_iter()
            .map(|ex| Ok::<_, RfError>((ex.label(), self.evaluate_example(ex)?)))
            .collect::<Result<_, RfError>>()?;

        let cm = ConfusionMatrix::from_pairs(outcomes);
        debug!(
            positive_accuracy = cm.positive_accuracy(),
            negative_accuracy = cm.negative_accuracy(),
            accuracy = cm.accuracy(),
            "evaluation complete"
        );
        Ok(cm)
    }
}

//! Domain types for canopy-io.

use canopy_rf::Example;

/// A data row dropped during loading because its label token was not
/// recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Zero-based row index (excluding header).
    pub row_index: usize,
    /// The unrecognized label token.
    pub token: String,
}

/// Examples loaded from a single file, with the header's feature names.
///
/// Produced by [`ExampleReader`](crate::ExampleReader). Every example has
/// exactly `feature_names.len()` features.
#[derive(Debug)]
pub struct ExampleSet {
    feature_names: Vec<String>,
    examples: Vec<Example>,
    skipped: Vec<SkippedRow>,
}

impl ExampleSet {
    pub(crate) fn new(
        feature_names: Vec<String>,
        examples: Vec<Example>,
        skipped: Vec<SkippedRow>,
    ) -> Self {
        Self {
            feature_names,
            examples,
            skipped,
        }
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the examples in file order.
    #[must_use]
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Return the rows skipped for an unrecognized label.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    /// Iterate over the positive examples.
    pub fn positives(&self) -> impl Iterator<Item = &Example> {
        self.examples.iter().filter(|ex| ex.label())
    }

    /// Iterate over the negative examples.
    pub fn negatives(&self) -> impl Iterator<Item = &Example> {
        self.examples.iter().filter(|ex| !ex.label())
    }

    /// Return the number of features per example.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Return the number of loaded examples.
    #[must_use]
    pub fn n_examples(&self) -> usize {
        self.examples.len()
    }

    /// Return the name of feature `index`, or `f{index}` if out of range.
    #[must_use]
    pub fn feature_name(&self, index: usize) -> String {
        self.feature_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("f{index}"))
    }
}

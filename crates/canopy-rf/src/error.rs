use crate::node::NodeIndex;

/// Errors from decision tree and random forest operations.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when the configured total feature count is zero.
    #[error("total feature count must be at least 1")]
    ZeroFeatures,

    /// Returned when features_per_split resolves to 0 or exceeds n_features.
    #[error("features_per_split resolved to {features_per_split}, but must be in [1, {n_features}]")]
    InvalidFeaturesPerSplit {
        /// The resolved features_per_split value.
        features_per_split: usize,
        /// The total number of features.
        n_features: usize,
    },

    /// Returned when the training dataset has zero examples.
    #[error("training dataset has zero examples")]
    EmptyDataset,

    /// Returned when a training example has a different number of features than configured.
    #[error("example {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The configured number of features.
        expected: usize,
        /// The actual number of features in the example.
        got: usize,
        /// The zero-based index of the offending example.
        sample_index: usize,
    },

    /// Returned when an example has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when classification reaches an internal node without children,
    /// or a leaf without a decision.
    #[error("malformed tree: node {node} cannot route or decide")]
    MalformedTree {
        /// The arena index of the offending node.
        node: NodeIndex,
    },

    /// Returned when OOB evaluation fails (no tree has any OOB example).
    #[error("OOB evaluation failed: {reason}")]
    OobEvaluationFailed {
        /// Human-readable description of why OOB evaluation failed.
        reason: String,
    },
}

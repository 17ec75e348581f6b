//! Configuration builder for Random Forest training.

use crate::error::RfError;
use crate::example::Example;
use crate::result::RandomForestResult;

/// Strategy for determining the number of features sampled at each split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeaturesPerSplit {
    /// Square root of total features, rounded up.
    Sqrt,
    /// Log base 2 of total features, rounded up (at least 1).
    Log2,
    /// A fraction of total features (must be in (0.0, 1.0]).
    Fraction(f64),
    /// A fixed count.
    Fixed(usize),
    /// All features (no subsampling).
    All,
}

impl FeaturesPerSplit {
    /// Resolve to a concrete count for `n_features` total features.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidFeaturesPerSplit`] if the count is 0 or
    /// exceeds `n_features`.
    pub fn resolve(self, n_features: usize) -> Result<usize, RfError> {
        let resolved = match self {
            FeaturesPerSplit::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            FeaturesPerSplit::Log2 => (n_features as f64).log2().ceil().max(1.0) as usize,
            FeaturesPerSplit::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            FeaturesPerSplit::Fixed(n) => n,
            FeaturesPerSplit::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(RfError::InvalidFeaturesPerSplit {
                features_per_split: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// How a tree's out-of-bag set is determined from its bootstrap sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OobMembership {
    /// An original example is OOB when its row was never drawn.
    #[default]
    ByIndex,
    /// An original example is OOB when no drawn example has equal content.
    ///
    /// Duplicate-valued examples share membership, so a row that was never
    /// drawn is still treated as in-bag if a copy of it was.
    ByValue,
}

/// Configuration for Random Forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter            | Default     |
/// |----------------------|-------------|
/// | `features_per_split` | `Sqrt`      |
/// | `max_depth`          | `None`      |
/// | `min_samples_split`  | 2           |
/// | `seed`               | 42          |
/// | `oob_membership`     | `ByIndex`   |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) n_features: usize,
    pub(crate) features_per_split: FeaturesPerSplit,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) seed: u64,
    pub(crate) oob_membership: OobMembership,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees and total features.
    ///
    /// # Errors
    ///
    /// | Variant                       | When                 |
    /// |-------------------------------|----------------------|
    /// | [`RfError::InvalidTreeCount`] | `n_trees` is zero    |
    /// | [`RfError::ZeroFeatures`]     | `n_features` is zero |
    pub fn new(n_trees: usize, n_features: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        if n_features == 0 {
            return Err(RfError::ZeroFeatures);
        }
        Ok(Self {
            n_trees,
            n_features,
            features_per_split: FeaturesPerSplit::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
            oob_membership: OobMembership::ByIndex,
        })
    }

    // --- Setters ---

    /// Set the features-per-split strategy.
    #[must_use]
    pub fn with_features_per_split(mut self, features_per_split: FeaturesPerSplit) -> Self {
        self.features_per_split = features_per_split;
        self
    }

    /// Set the maximum tree depth. `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of examples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set how out-of-bag membership is decided.
    #[must_use]
    pub fn with_oob_membership(mut self, oob_membership: OobMembership) -> Self {
        self.oob_membership = oob_membership;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the total number of features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the features-per-split strategy.
    #[must_use]
    pub fn features_per_split(&self) -> FeaturesPerSplit {
        self.features_per_split
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum examples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the OOB membership policy.
    #[must_use]
    pub fn oob_membership(&self) -> OobMembership {
        self.oob_membership
    }

    /// Check the configuration and return the resolved features per split.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidFeaturesPerSplit`] if the strategy resolves
    /// outside `[1, n_features]`.
    pub fn validate(&self) -> Result<usize, RfError> {
        self.features_per_split.resolve(self.n_features)
    }

    /// Train a Random Forest on the provided examples.
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                           |
    /// |---------------------------------------|------------------------------------------------|
    /// | [`RfError::InvalidFeaturesPerSplit`]  | features per split is outside [1, n_features]  |
    /// | [`RfError::EmptyDataset`]             | `examples` is empty                            |
    /// | [`RfError::FeatureCountMismatch`]     | an example's length differs from `n_features`  |
    pub fn fit(&self, examples: &[Example]) -> Result<RandomForestResult, RfError> {
        crate::forest::train(self, examples)
    }
}

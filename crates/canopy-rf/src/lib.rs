//! Random Forest classification over boolean features: train, evaluate, predict.
//!
//! Provides entropy-driven decision trees with per-node random feature
//! subsets, bootstrap-aggregated forests trained in parallel via rayon,
//! per-tree and ensemble out-of-bag estimates, and feature importance.

mod config;
mod confusion;
mod error;
mod eval;
mod example;
mod forest;
mod importance;
mod node;
mod oob;
mod predict;
mod result;
mod split;
mod tree;

pub use config::{FeaturesPerSplit, OobMembership, RandomForestConfig};
pub use confusion::ConfusionMatrix;
pub use error::RfError;
pub use example::Example;
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use node::{FeatureIndex, FeaturePool, NodeIndex, TreeNode};
pub use oob::{OobError, OobScore, mean_oob_error};
pub use predict::Votes;
pub use result::{RandomForestResult, TrainingMetadata};
pub use split::entropy;
pub use tree::{DecisionTree, DecisionTreeConfig};

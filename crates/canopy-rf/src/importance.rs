//! Feature importance aggregation across trees.

use serde::Serialize;

use crate::node::FeatureIndex;

/// A ranked feature with its importance score and rank.
#[derive(Debug, Clone, Serialize)]
pub struct RankedFeature {
    /// Feature column.
    pub feature: FeatureIndex,
    /// Normalized importance score (sums to 1.0 across all features).
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Aggregate per-tree feature importances into ranked features.
///
/// Sums importances across all trees, normalizes to sum to 1.0,
/// sorts descending by importance, and assigns 1-based ranks. Equal scores
/// keep ascending feature order.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], n_features: usize) -> Vec<RankedFeature> {
    if per_tree.is_empty() || n_features == 0 {
        return vec![];
    }

    let mut totals = vec![0.0f64; n_features];
    for tree_imp in per_tree {
        for (total, &val) in totals.iter_mut().zip(tree_imp) {
            *total += val;
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut features: Vec<RankedFeature> = totals
        .into_iter()
        .enumerate()
        .map(|(i, importance)| RankedFeature {
            feature: FeatureIndex::new(i),
            importance,
            rank: 0,
        })
        .collect();

    // Stable sort keeps ascending index among ties.
    features.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feat) in features.iter_mut().enumerate() {
        feat.rank = i + 1;
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_summed_importance() {
        let per_tree = vec![vec![0.2, 0.8, 0.0], vec![0.6, 0.4, 0.0]];
        let ranked = aggregate_importances(&per_tree, 3);
        assert_eq!(ranked[0].feature, FeatureIndex::new(1));
        assert!((ranked[0].importance - 0.6).abs() < 1e-12);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].feature, FeatureIndex::new(0));
        assert_eq!(ranked[2].feature, FeatureIndex::new(2));
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn all_zero_stays_zero() {
        let ranked = aggregate_importances(&[vec![0.0, 0.0]], 2);
        assert!(ranked.iter().all(|f| f.importance == 0.0));
        assert_eq!(ranked[0].feature, FeatureIndex::new(0));
    }

    #[test]
    fn no_trees_yields_empty() {
        assert!(aggregate_importances(&[], 4).is_empty());
    }
}

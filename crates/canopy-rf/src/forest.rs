//! Random Forest training with parallel tree construction.

use std::collections::HashSet;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument, warn};

use crate::config::{OobMembership, RandomForestConfig};
use crate::error::RfError;
use crate::example::{Example, check_examples};
use crate::importance::aggregate_importances;
use crate::oob::{OobError, compute_oob, tree_oob_error};
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// A fitted Random Forest ensemble.
///
/// `trees[i]` and `oob_errors[i]` describe the same training round.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) oob_errors: Vec<OobError>,
    pub(crate) n_features: usize,
}

/// One bootstrap draw: the drawn rows and the rows left out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bootstrap {
    pub(crate) in_bag: Vec<usize>,
    pub(crate) oob: Vec<usize>,
}

/// Draw `examples.len()` rows uniformly with replacement.
///
/// The OOB set is computed per `membership`: by row position, or by
/// comparing example content against the drawn examples.
pub(crate) fn bootstrap_sample(
    examples: &[Example],
    membership: OobMembership,
    rng: &mut impl Rng,
) -> Bootstrap {
    let n = examples.len();
    let in_bag: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

    let oob = match membership {
        OobMembership::ByIndex => {
            let mut drawn = vec![false; n];
            for &row in &in_bag {
                drawn[row] = true;
            }
            (0..n).filter(|&row| !drawn[row]).collect()
        }
        OobMembership::ByValue => {
            let drawn: HashSet<&Example> = in_bag.iter().map(|&row| &examples[row]).collect();
            (0..n).filter(|&row| !drawn.contains(&examples[row])).collect()
        }
    };

    Bootstrap { in_bag, oob }
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_examples = examples.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    examples: &[Example],
) -> Result<RandomForestResult, RfError> {
    let features_per_split = config.validate()?;
    check_examples(examples, config.n_features)?;

    let n_examples = examples.len();
    let n_features = config.n_features;
    let n_positives = examples.iter().filter(|ex| ex.label()).count();

    info!(
        n_trees = config.n_trees,
        n_examples,
        n_positives,
        n_features,
        features_per_split,
        oob_membership = ?config.oob_membership,
        "training random forest"
    );

    // Per-tree seeds from the master RNG keep results independent of scheduling.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let tree_config = DecisionTreeConfig::new(n_features)
        .with_features_per_split(Some(features_per_split))
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split);
    let membership = config.oob_membership;

    let rounds: Vec<(DecisionTree, OobError, Vec<usize>)> = tree_seeds
        .into_par_iter()
        .enumerate()
        .map(|(round, seed)| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let Bootstrap { in_bag, oob } = bootstrap_sample(examples, membership, &mut rng);
            let sample: Vec<Example> = in_bag.iter().map(|&row| examples[row].clone()).collect();

            let mut tree = DecisionTree::new(tree_config.clone().with_seed(seed));
            tree.train(&sample, &mut rng)?;
            let oob_error = tree_oob_error(&tree, examples, &oob)?;

            debug!(
                round,
                n_nodes = tree.n_nodes(),
                depth = tree.depth(),
                n_oob = oob_error.n_oob,
                oob_error = oob_error.rate(),
                "tree trained"
            );
            Ok::<_, RfError>((tree, oob_error, oob))
        })
        .collect::<Result<_, RfError>>()?;

    let mut trees = Vec::with_capacity(config.n_trees);
    let mut oob_errors = Vec::with_capacity(config.n_trees);
    let mut oob_indices_per_tree = Vec::with_capacity(config.n_trees);
    for (tree, oob_error, oob) in rounds {
        trees.push(tree);
        oob_errors.push(oob_error);
        oob_indices_per_tree.push(oob);
    }

    let per_tree_importances: Vec<Vec<f64>> =
        trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree_importances, n_features);

    let oob_score = compute_oob(&trees, examples, &oob_indices_per_tree)?;

    let forest = RandomForest {
        trees,
        oob_errors,
        n_features,
    };

    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_features,
        n_examples,
        n_positives,
        features_per_split,
    };

    match forest.mean_oob_error() {
        Ok(mean_oob_error) => info!(
            mean_oob_error,
            oob_accuracy = oob_score.as_ref().map(|s| s.accuracy),
            "random forest training complete"
        ),
        Err(err) => warn!(%err, "random forest trained without an OOB estimate"),
    }

    Ok(RandomForestResult::new(
        forest,
        importances,
        oob_score,
        oob_indices_per_tree,
        metadata,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeaturesPerSplit;

    /// Random 8-feature examples labelled by the majority of features 0-2.
    fn make_majority_data(n: usize, seed: u64) -> Vec<Example> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let features: Vec<bool> = (0..8).map(|_| rng.r#gen()).collect();
                let votes = features[..3].iter().filter(|&&b| b).count();
                Example::new(features, votes >= 2)
            })
            .collect()
    }

    #[test]
    fn bootstrap_draws_n_rows_in_range() {
        let examples = make_majority_data(50, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let boot = bootstrap_sample(&examples, OobMembership::ByIndex, &mut rng);
        assert_eq!(boot.in_bag.len(), 50);
        assert!(boot.in_bag.iter().all(|&row| row < 50));
        for row in &boot.oob {
            assert!(!boot.in_bag.contains(row));
        }
        for row in 0..50 {
            assert!(boot.in_bag.contains(&row) || boot.oob.contains(&row));
        }
    }

    #[test]
    fn bootstrap_oob_fraction_matches_expectation() {
        // Expected OOB fraction is (1 - 1/N)^N, about 0.3677 for N = 1000.
        let n = 1000;
        let examples: Vec<Example> = (0..n)
            .map(|i| Example::new(vec![i % 2 == 0], i % 3 == 0))
            .collect();
        let expected = (1.0 - 1.0 / n as f64).powi(n as i32);
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let rounds = 200;
        let total_oob: usize = (0..rounds)
            .map(|_| bootstrap_sample(&examples, OobMembership::ByIndex, &mut rng).oob.len())
            .sum();
        let observed = total_oob as f64 / (rounds * n) as f64;
        assert!(
            (observed - expected).abs() < 0.01,
            "observed = {observed}, expected = {expected}"
        );
    }

    #[test]
    fn value_membership_merges_duplicates() {
        // Every example has identical content: any draw puts all of them in-bag.
        let examples = vec![Example::new(vec![true, false], true); 20];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let by_value = bootstrap_sample(&examples, OobMembership::ByValue, &mut rng);
        assert!(by_value.oob.is_empty());

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let by_index = bootstrap_sample(&examples, OobMembership::ByIndex, &mut rng);
        assert_eq!(by_value.in_bag, by_index.in_bag);
        assert!(!by_index.oob.is_empty());
    }

    #[test]
    fn value_membership_matches_index_for_distinct_examples() {
        let examples: Vec<Example> = (0..16u32)
            .map(|bits| Example::new((0..4).map(|f| bits & (1 << f) != 0).collect(), bits % 2 == 0))
            .collect();
        let mut a = ChaCha8Rng::seed_from_u64(11);
        let mut b = ChaCha8Rng::seed_from_u64(11);
        assert_eq!(
            bootstrap_sample(&examples, OobMembership::ByIndex, &mut a),
            bootstrap_sample(&examples, OobMembership::ByValue, &mut b)
        );
    }

    #[test]
    fn trains_accurate_forest() {
        let examples = make_majority_data(300, 42);
        let result = RandomForestConfig::new(30, 8)
            .unwrap()
            .with_seed(42)
            .fit(&examples)
            .unwrap();
        let forest = result.forest();
        assert_eq!(forest.n_trees(), 30);
        assert_eq!(forest.oob_errors().len(), 30);

        let cm = forest.evaluate(&examples).unwrap();
        assert!(cm.accuracy() > 0.9, "accuracy = {}", cm.accuracy());
    }

    #[test]
    fn oob_estimates_are_computed() {
        let examples = make_majority_data(300, 5);
        let result = RandomForestConfig::new(30, 8)
            .unwrap()
            .with_features_per_split(FeaturesPerSplit::All)
            .fit(&examples)
            .unwrap();
        let mean = result.forest().mean_oob_error().unwrap();
        assert!((0.0..0.2).contains(&mean), "mean oob error = {mean}");
        let score = result.oob_score().expect("OOB examples exist");
        assert!(score.accuracy > 0.8, "oob accuracy = {}", score.accuracy);
        assert!(score.n_oob_examples > 0);
        for (oob, err) in result.oob_indices_per_tree().iter().zip(result.forest().oob_errors()) {
            assert_eq!(oob.len(), err.n_oob);
        }
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let examples = make_majority_data(200, 9);
        let result = RandomForestConfig::new(20, 8).unwrap().fit(&examples).unwrap();
        let total: f64 = result.importances().iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        // The three informative features outrank the noise.
        let top: Vec<usize> = result.importances()[..3].iter().map(|f| f.feature.index()).collect();
        for f in 0..3 {
            assert!(top.contains(&f), "top = {top:?}");
        }
    }

    #[test]
    fn deterministic_with_same_seed() {
        let examples = make_majority_data(100, 3);
        let fit = || {
            RandomForestConfig::new(10, 8)
                .unwrap()
                .with_seed(99)
                .fit(&examples)
                .unwrap()
        };
        let (a, b) = (fit(), fit());
        assert_eq!(a.forest().oob_errors(), b.forest().oob_errors());
        assert_eq!(
            a.forest().predict_batch(&examples).unwrap(),
            b.forest().predict_batch(&examples).unwrap()
        );
    }

    #[test]
    fn empty_dataset_error() {
        let config = RandomForestConfig::new(10, 3).unwrap();
        assert!(matches!(config.fit(&[]), Err(RfError::EmptyDataset)));
    }

    #[test]
    fn wrong_example_length_error() {
        let config = RandomForestConfig::new(3, 3).unwrap();
        let examples = vec![
            Example::new(vec![true, false, true], true),
            Example::new(vec![true], false),
        ];
        assert!(matches!(
            config.fit(&examples),
            Err(RfError::FeatureCountMismatch { expected: 3, got: 1, sample_index: 1 })
        ));
    }

    #[test]
    fn single_example_has_no_oob() {
        // One example is always drawn, so every OOB set is empty.
        let config = RandomForestConfig::new(5, 2).unwrap();
        let examples = vec![Example::new(vec![true, false], true)];
        let result = config.fit(&examples).unwrap();
        assert!(result.oob_score().is_none());
        assert!(result.forest().oob_errors().iter().all(|e| e.n_oob == 0));
        assert!(matches!(
            result.forest().mean_oob_error(),
            Err(RfError::OobEvaluationFailed { .. })
        ));
        assert!(result.forest().evaluate_example(&examples[0]).unwrap());
    }
}

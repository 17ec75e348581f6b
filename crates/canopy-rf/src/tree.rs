use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    example::{Example, check_examples},
    node::{NodeIndex, TreeNode},
    split::{Partition, best_split},
};

/// Configuration for a single entropy-driven decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter            | Default               |
/// |----------------------|-----------------------|
/// | `features_per_split` | `None` (all features) |
/// | `max_depth`          | `None` (unlimited)    |
/// | `min_samples_split`  | 2                     |
/// | `seed`               | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) n_features: usize,
    pub(crate) features_per_split: Option<usize>,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a new config for examples with `n_features` features.
    #[must_use]
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            features_per_split: None,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }

    /// Set the number of features sampled as split candidates at each node.
    ///
    /// `None` means consider all features.
    #[must_use]
    pub fn with_features_per_split(mut self, features_per_split: Option<usize>) -> Self {
        self.features_per_split = features_per_split;
        self
    }

    /// Set the maximum tree depth.
    ///
    /// A node whose depth exceeds `max_depth` becomes a leaf, so `Some(d)`
    /// still lets nodes at depth `d` split (root is depth 0). `None` grows
    /// until the other stopping rules fire.
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

    /// Set the random seed used by [`DecisionTreeConfig::fit`].
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the total number of features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the features sampled per split, if set.
    #[must_use]
    pub fn features_per_split(&self) -> Option<usize> {
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

    /// Resolve `features_per_split` and check it against `n_features`.
    pub(crate) fn resolved_features_per_split(&self) -> Result<usize, RfError> {
        if self.n_features == 0 {
            return Err(RfError::ZeroFeatures);
        }
        let k = self.features_per_split.unwrap_or(self.n_features);
        if k == 0 || k > self.n_features {
            return Err(RfError::InvalidFeaturesPerSplit {
                features_per_split: k,
                n_features: self.n_features,
            });
        }
        Ok(k)
    }

    /// Train a decision tree with a generator seeded from this config.
    ///
    /// # Errors
    ///
    /// See [`DecisionTree::train`].
    pub fn fit(&self, examples: &[Example]) -> Result<DecisionTree, RfError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut tree = DecisionTree::new(self.clone());
        tree.train(examples, &mut rng)?;
        Ok(tree)
    }
}

/// A binary decision tree over boolean features.
///
/// Stored as an arena `Vec<TreeNode>` with the root at [`NodeIndex::ROOT`].
#[derive(Debug, Clone)]
pub struct DecisionTree {
    config: DecisionTreeConfig,
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Create an untrained tree.
    #[must_use]
    pub fn new(config: DecisionTreeConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
        }
    }

    /// Build the tree from scratch on `examples`, replacing any previous tree.
    ///
    /// Examples are divided by label into the root's partitions, then nodes
    /// are grown depth-first. `rng` drives the per-node feature sampling.
    ///
    /// # Errors
    ///
    /// | Variant                             | When                                          |
    /// |-------------------------------------|-----------------------------------------------|
    /// | [`RfError::ZeroFeatures`]           | the config has zero features                  |
    /// | [`RfError::InvalidFeaturesPerSplit`]| features per split is 0 or above `n_features` |
    /// | [`RfError::EmptyDataset`]           | `examples` is empty                           |
    /// | [`RfError::FeatureCountMismatch`]   | an example has the wrong length               |
    #[instrument(skip_all, fields(n_examples = examples.len()))]
    pub fn train<R: Rng>(
        &mut self,
        examples: &[Example],
        rng: &mut R,
    ) -> Result<(), RfError> {
        let features_per_split = self.config.resolved_features_per_split()?;
        check_examples(examples, self.config.n_features)?;

        let (pos, neg): (Vec<usize>, Vec<usize>) =
            (0..examples.len()).partition(|&row| examples[row].label());

        debug!(
            n_pos = pos.len(),
            n_neg = neg.len(),
            features_per_split,
            "fitting decision tree"
        );

        self.nodes.clear();
        self.nodes.push(TreeNode::new(None, pos, neg));
        self.grow(examples, NodeIndex::ROOT, features_per_split, rng)?;

        debug!(
            n_nodes = self.nodes.len(),
            depth = self.depth(),
            "decision tree built"
        );
        Ok(())
    }

    /// Apply the stopping rules at `idx`, or split it and recurse into both children.
    fn grow<R: Rng>(
        &mut self,
        sample: &[Example],
        idx: NodeIndex,
        features_per_split: usize,
        rng: &mut R,
    ) -> Result<(), RfError> {
        let node = &self.nodes[idx.index()];
        let n_pos = node.pos().len();
        let n_neg = node.neg().len();
        let n_examples = n_pos + n_neg;

        // Stopping rules, first match wins.
        let leaf_decision = if n_neg == 0 && n_pos > 0 {
            Some(true)
        } else if n_pos == 0 && n_neg > 0 {
            Some(false)
        } else if n_examples == 0 {
            Some(
                node.parent()
                    .is_some_and(|parent| self.nodes[parent.index()].majority()),
            )
        } else if n_examples < self.config.min_samples_split
            || self.config.max_depth.is_some_and(|max| node.depth() > max)
        {
            Some(node.majority())
        } else {
            None
        };

        if let Some(decision) = leaf_decision {
            self.nodes[idx.index()].make_leaf(decision);
            return Ok(());
        }

        self.nodes[idx.index()].choose_features(self.config.n_features, features_per_split, rng)?;

        let node = &self.nodes[idx.index()];
        let Some(split) = best_split(sample, node.pos(), node.neg(), node.eligible_features())
        else {
            // No candidate improves on zero gain.
            let decision = node.majority();
            self.nodes[idx.index()].make_leaf(decision);
            return Ok(());
        };

        let partition = Partition::by_feature(sample, node.pos(), node.neg(), split.feature);
        let true_node = TreeNode::new(Some((idx, node)), partition.true_pos, partition.true_neg);
        let false_node = TreeNode::new(Some((idx, node)), partition.false_pos, partition.false_neg);

        let true_idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(true_node);
        let false_idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(false_node);

        let parent = &mut self.nodes[idx.index()];
        parent.set_split_feature(split.feature, split.gain);
        parent.set_children(true_idx, false_idx);

        self.grow(sample, true_idx, features_per_split, rng)?;
        self.grow(sample, false_idx, features_per_split, rng)
    }

    /// Classify a single example by walking from the root to a leaf.
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                            |
    /// |---------------------------------------|-------------------------------------------------|
    /// | [`RfError::PredictionFeatureMismatch`]| `example.n_features() != n_features`            |
    /// | [`RfError::MalformedTree`]            | the tree is untrained, or a node cannot route   |
    pub fn classify(&self, example: &Example) -> Result<bool, RfError> {
        if example.n_features() != self.config.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.config.n_features,
                got: example.n_features(),
            });
        }

        let mut idx = NodeIndex::ROOT;
        loop {
            let node = self
                .nodes
                .get(idx.index())
                .ok_or(RfError::MalformedTree { node: idx })?;
            if node.is_leaf() {
                return node.decision().ok_or(RfError::MalformedTree { node: idx });
            }
            let next = match node.split_feature() {
                Some(feature) if example.feature(feature) => node.true_child(),
                Some(_) => node.false_child(),
                None => None,
            };
            idx = next.ok_or(RfError::MalformedTree { node: idx })?;
        }
    }

    /// Compute information-gain feature importances.
    ///
    /// Each internal node contributes `gain * n_examples` to its split
    /// feature; totals are normalized to sum to 1.0. Returns a `Vec` of
    /// length `n_features`, all zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.config.n_features];
        for node in &self.nodes {
            if let Some(feature) = node.split_feature() {
                totals[feature.index()] += node.split_gain() * node.n_examples() as f64;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the config this tree was built with.
    #[must_use]
    pub fn config(&self) -> &DecisionTreeConfig {
        &self.config
    }

    /// Return the root node, `None` before training.
    #[must_use]
    pub fn root(&self) -> Option<&TreeNode> {
        self.nodes.first()
    }

    /// Return the node at `idx`, if it exists.
    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(idx.index())
    }

    /// Return all nodes in arena order.
    #[must_use]
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Return the total number of nodes in the tree (both internal and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of any leaf.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(TreeNode::depth)
            .max()
            .unwrap_or(0)
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, idx: NodeIndex, indent: usize) -> fmt::Result {
        let node = &self.nodes[idx.index()];
        match (node.split_feature(), node.true_child(), node.false_child()) {
            (Some(feature), Some(true_child), Some(false_child)) if !node.is_leaf() => {
                writeln!(f)?;
                let pad = "\t".repeat(indent);
                write!(f, "{pad}Feature {feature} = True:")?;
                self.fmt_node(f, true_child, indent + 1)?;
                write!(f, "{pad}Feature {feature} = False:")?;
                self.fmt_node(f, false_child, indent + 1)
            }
            _ => match node.decision() {
                Some(true) => writeln!(f, "Positive"),
                Some(false) => writeln!(f, "Negative"),
                None => writeln!(f, "?"),
            },
        }
    }
}

impl fmt::Display for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return writeln!(f, "(untrained)");
        }
        self.fmt_node(f, NodeIndex::ROOT, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FeatureIndex;

    /// Every combination of 5 features; the label is the majority of
    /// features 0-2, features 3-4 are noise.
    fn majority_of_three() -> Vec<Example> {
        (0..32u32)
            .map(|bits| {
                let features: Vec<bool> = (0..5).map(|f| bits & (1 << f) != 0).collect();
                let votes = features[..3].iter().filter(|&&b| b).count();
                Example::new(features, votes >= 2)
            })
            .collect()
    }

    fn four_examples() -> Vec<Example> {
        vec![
            Example::new(vec![true, true], true),
            Example::new(vec![true, false], true),
            Example::new(vec![false, true], false),
            Example::new(vec![false, false], false),
        ]
    }

    #[test]
    fn empty_dataset_error() {
        let err = DecisionTreeConfig::new(3).fit(&[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn pure_dataset_single_leaf() {
        let examples = vec![
            Example::new(vec![true, false], true),
            Example::new(vec![false, true], true),
        ];
        let tree = DecisionTreeConfig::new(2).fit(&examples).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.root().and_then(TreeNode::decision), Some(true));
        assert!(tree.classify(&Example::new(vec![false, false], false)).unwrap());
    }

    #[test]
    fn four_examples_split_on_feature_zero() {
        let examples = four_examples();
        let tree = DecisionTreeConfig::new(2)
            .with_features_per_split(Some(2))
            .with_max_depth(Some(1))
            .with_min_samples_split(1)
            .fit(&examples)
            .unwrap();

        let root = tree.root().unwrap();
        assert_eq!(root.split_feature(), Some(FeatureIndex::new(0)));
        assert!((root.split_gain() - 1.0).abs() < 1e-9);
        assert_eq!(tree.depth(), 1);

        let true_child = tree.node(root.true_child().unwrap()).unwrap();
        let false_child = tree.node(root.false_child().unwrap()).unwrap();
        assert!(true_child.is_leaf());
        assert_eq!(true_child.decision(), Some(true));
        assert!(false_child.is_leaf());
        assert_eq!(false_child.decision(), Some(false));

        for ex in &examples {
            assert_eq!(tree.classify(ex).unwrap(), ex.label());
        }
    }

    #[test]
    fn xor_has_no_positive_gain_and_becomes_majority_leaf() {
        let examples = vec![
            Example::new(vec![false, false], false),
            Example::new(vec![false, true], true),
            Example::new(vec![true, false], true),
            Example::new(vec![true, true], false),
        ];
        let tree = DecisionTreeConfig::new(2)
            .with_min_samples_split(1)
            .fit(&examples)
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
        // Two positives, two negatives: ties go to false.
        assert_eq!(tree.root().and_then(TreeNode::decision), Some(false));
    }

    #[test]
    fn overfits_distinct_examples() {
        let examples = majority_of_three();
        for seed in [1, 2, 3] {
            let tree = DecisionTreeConfig::new(5)
                .with_min_samples_split(1)
                .with_max_depth(None)
                .with_seed(seed)
                .fit(&examples)
                .unwrap();
            for ex in &examples {
                assert_eq!(tree.classify(ex).unwrap(), ex.label());
            }
        }
    }

    #[test]
    fn partitions_are_conserved() {
        let examples = majority_of_three();
        let tree = DecisionTreeConfig::new(5)
            .with_min_samples_split(1)
            .fit(&examples)
            .unwrap();
        assert!(tree.n_nodes() > 1);

        for node in tree.nodes().iter().filter(|n| !n.is_leaf()) {
            let t = tree.node(node.true_child().unwrap()).unwrap();
            let f = tree.node(node.false_child().unwrap()).unwrap();
            assert_eq!(t.n_examples() + f.n_examples(), node.n_examples());

            let mut pos: Vec<usize> = t.pos().iter().chain(f.pos()).copied().collect();
            let mut neg: Vec<usize> = t.neg().iter().chain(f.neg()).copied().collect();
            pos.sort_unstable();
            neg.sort_unstable();
            let mut node_pos = node.pos().to_vec();
            let mut node_neg = node.neg().to_vec();
            node_pos.sort_unstable();
            node_neg.sort_unstable();
            assert_eq!(pos, node_pos);
            assert_eq!(neg, node_neg);
        }
    }

    #[test]
    fn children_track_parent_and_depth() {
        let tree = DecisionTreeConfig::new(5)
            .with_min_samples_split(1)
            .fit(&majority_of_three())
            .unwrap();
        for (i, node) in tree.nodes().iter().enumerate().skip(1) {
            let parent = tree.node(node.parent().unwrap()).unwrap();
            assert_eq!(node.depth(), parent.depth() + 1, "node {i}");
        }
    }

    #[test]
    fn max_depth_limits_tree() {
        let tree = DecisionTreeConfig::new(5)
            .with_max_depth(Some(0))
            .with_min_samples_split(1)
            .fit(&majority_of_three())
            .unwrap();
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn min_samples_split_stops_at_root() {
        let tree = DecisionTreeConfig::new(5)
            .with_min_samples_split(100)
            .fit(&majority_of_three())
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
        // 16 positives vs 16 negatives.
        assert_eq!(tree.root().and_then(TreeNode::decision), Some(false));
    }

    #[test]
    fn every_leaf_has_a_decision() {
        let examples = majority_of_three();
        let tree = DecisionTreeConfig::new(5)
            .with_features_per_split(Some(2))
            .with_max_depth(Some(1))
            .fit(&examples)
            .unwrap();
        for node in tree.nodes().iter().filter(|n| n.is_leaf()) {
            assert!(node.decision().is_some());
        }
    }

    #[test]
    fn deterministic_with_same_seed() {
        let examples = majority_of_three();
        let config = DecisionTreeConfig::new(5)
            .with_features_per_split(Some(2))
            .with_seed(123);
        let tree1 = config.fit(&examples).unwrap();
        let tree2 = config.fit(&examples).unwrap();
        assert_eq!(tree1.n_nodes(), tree2.n_nodes());
        for ex in &examples {
            assert_eq!(tree1.classify(ex).unwrap(), tree2.classify(ex).unwrap());
        }
    }

    #[test]
    fn prediction_feature_mismatch() {
        let tree = DecisionTreeConfig::new(2).fit(&four_examples()).unwrap();
        let err = tree.classify(&Example::new(vec![true], true)).unwrap_err();
        assert!(matches!(
            err,
            RfError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn feature_count_mismatch_error() {
        let examples = vec![
            Example::new(vec![true, false], true),
            Example::new(vec![true], false),
        ];
        let err = DecisionTreeConfig::new(2).fit(&examples).unwrap_err();
        assert!(matches!(
            err,
            RfError::FeatureCountMismatch { expected: 2, got: 1, sample_index: 1 }
        ));
    }

    #[test]
    fn too_many_features_per_split_error() {
        let err = DecisionTreeConfig::new(2)
            .with_features_per_split(Some(3))
            .fit(&four_examples())
            .unwrap_err();
        assert!(matches!(err, RfError::InvalidFeaturesPerSplit { .. }));
    }

    #[test]
    fn untrained_tree_is_malformed() {
        let tree = DecisionTree::new(DecisionTreeConfig::new(2));
        let err = tree.classify(&Example::new(vec![true, true], true)).unwrap_err();
        assert!(matches!(err, RfError::MalformedTree { .. }));
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let tree = DecisionTreeConfig::new(5)
            .with_min_samples_split(1)
            .fit(&majority_of_three())
            .unwrap();
        let importances = tree.feature_importances();
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10, "sum = {sum}");
        // Noise features never split.
        assert_eq!(importances[3], 0.0);
        assert_eq!(importances[4], 0.0);
    }

    #[test]
    fn display_renders_split_structure() {
        let tree = DecisionTreeConfig::new(2)
            .with_min_samples_split(1)
            .fit(&four_examples())
            .unwrap();
        let rendered = tree.to_string();
        assert_eq!(rendered, "\nFeature 0 = True:Positive\nFeature 0 = False:Negative\n");
    }

    #[test]
    fn display_indents_nested_splits() {
        // f0 AND f1: the root splits on f0, its true branch on f1.
        let examples = vec![
            Example::new(vec![true, true], true),
            Example::new(vec![true, false], false),
            Example::new(vec![false, true], false),
            Example::new(vec![false, false], false),
        ];
        let tree = DecisionTreeConfig::new(2)
            .with_min_samples_split(1)
            .fit(&examples)
            .unwrap();
        let rendered = tree.to_string();
        assert_eq!(
            rendered,
            "\nFeature 0 = True:\n\tFeature 1 = True:Positive\n\tFeature 1 = False:Negative\n\
             Feature 0 = False:Negative\n"
        );
    }

    /// A root with the given partitions and one child no example reached.
    fn tree_with_empty_child(pos: Vec<usize>, neg: Vec<usize>) -> DecisionTree {
        let mut tree = DecisionTree::new(DecisionTreeConfig::new(2));
        let root = TreeNode::new(None, pos, neg);
        let child = TreeNode::new(Some((NodeIndex::ROOT, &root)), vec![], vec![]);
        tree.nodes.push(root);
        tree.nodes.push(child);
        tree
    }

    #[test]
    fn empty_node_takes_parent_majority() {
        let sample = vec![
            Example::new(vec![true, false], true),
            Example::new(vec![false, true], true),
            Example::new(vec![false, false], false),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let child = NodeIndex::new(1);

        let mut tree = tree_with_empty_child(vec![0, 1], vec![2]);
        tree.grow(&sample, child, 1, &mut rng).unwrap();
        assert!(tree.nodes()[1].is_leaf());
        assert_eq!(tree.nodes()[1].decision(), Some(true));

        let mut tree = tree_with_empty_child(vec![0], vec![2]);
        tree.grow(&sample, child, 1, &mut rng).unwrap();
        assert_eq!(tree.nodes()[1].decision(), Some(false), "tied parent goes false");

        let mut tree = tree_with_empty_child(vec![], vec![2]);
        tree.grow(&sample, child, 1, &mut rng).unwrap();
        assert_eq!(tree.nodes()[1].decision(), Some(false));
    }
}

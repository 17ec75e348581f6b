use std::fmt;

use rand::Rng;

use crate::error::RfError;

/// Zero-based feature column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a new feature index from a zero-based column position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a `Vec<TreeNode>` arena, identifying a specific node in a decision tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// The root is always the first node pushed into the arena.
    pub const ROOT: NodeIndex = NodeIndex(0);

    /// Create a new node index from a zero-based arena position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The candidate features sampled for one split search.
///
/// Drawn uniformly without replacement from `[0, n_features)`. A pool is
/// transient: each split search draws a fresh one and nothing is inherited
/// from ancestor nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeaturePool {
    drawn: Vec<FeatureIndex>,
    mask: Vec<bool>,
}

impl FeaturePool {
    /// Draw `k` distinct feature indices from `[0, n_features)`.
    ///
    /// Uses rejection sampling: a draw that collides with an index already in
    /// the pool is redrawn.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidFeaturesPerSplit`] if `k > n_features`, since
    /// the pool could never be filled.
    pub fn sample(n_features: usize, k: usize, rng: &mut impl Rng) -> Result<Self, RfError> {
        if k > n_features {
            return Err(RfError::InvalidFeaturesPerSplit {
                features_per_split: k,
                n_features,
            });
        }

        let mut mask = vec![false; n_features];
        let mut drawn = Vec::with_capacity(k);
        while drawn.len() < k {
            let candidate = rng.gen_range(0..n_features);
            if mask[candidate] {
                continue;
            }
            mask[candidate] = true;
            drawn.push(FeatureIndex::new(candidate));
        }

        Ok(Self { drawn, mask })
    }

    /// Return `true` if `feature` is a candidate in this pool.
    #[must_use]
    pub fn contains(&self, feature: FeatureIndex) -> bool {
        self.mask.get(feature.index()).copied().unwrap_or(false)
    }

    /// Return the candidates in the order they were drawn.
    #[must_use]
    pub fn drawn(&self) -> &[FeatureIndex] {
        &self.drawn
    }

    /// Iterate over the candidates in ascending feature order.
    pub fn iter(&self) -> impl Iterator<Item = FeatureIndex> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter(|&(_, &eligible)| eligible)
            .map(|(idx, _)| FeatureIndex::new(idx))
    }

    /// Return the number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.drawn.len()
    }

    /// Return `true` if the pool holds no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drawn.is_empty()
    }
}

/// One node of a decision tree arena.
///
/// Holds the partition of training rows that reached it, split into positive
/// (`pos`) and negative (`neg`) rows. Rows are positions in the sample the
/// tree was trained on. The parent link is a non-owning arena index, used for
/// depth and for the majority fallback at nodes no example reached.
#[derive(Debug, Clone)]
pub struct TreeNode {
    parent: Option<NodeIndex>,
    true_child: Option<NodeIndex>,
    false_child: Option<NodeIndex>,
    pos: Vec<usize>,
    neg: Vec<usize>,
    depth: usize,
    eligible: FeaturePool,
    split_feature: Option<FeatureIndex>,
    split_gain: f64,
    is_leaf: bool,
    decision: Option<bool>,
}

impl TreeNode {
    /// Create a node from its parent (if any) and its label partitions.
    ///
    /// A node with an empty `pos` or empty `neg` partition is flagged as a
    /// leaf immediately; its decision is assigned later by tree induction.
    pub(crate) fn new(parent: Option<(NodeIndex, &TreeNode)>, pos: Vec<usize>, neg: Vec<usize>) -> Self {
        let is_leaf = pos.is_empty() || neg.is_empty();
        Self {
            parent: parent.map(|(idx, _)| idx),
            true_child: None,
            false_child: None,
            depth: parent.map_or(0, |(_, p)| p.depth + 1),
            pos,
            neg,
            eligible: FeaturePool::default(),
            split_feature: None,
            split_gain: 0.0,
            is_leaf,
            decision: None,
        }
    }

    /// Re-sample this node's candidate pool, discarding any previous pool.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidFeaturesPerSplit`] if `k > n_features`.
    pub(crate) fn choose_features(
        &mut self,
        n_features: usize,
        k: usize,
        rng: &mut impl Rng,
    ) -> Result<&FeaturePool, RfError> {
        self.eligible = FeaturePool::sample(n_features, k, rng)?;
        Ok(&self.eligible)
    }

    /// Record the feature this node splits on and the gain it achieved.
    pub(crate) fn set_split_feature(&mut self, feature: FeatureIndex, gain: f64) {
        self.split_feature = Some(feature);
        self.split_gain = gain;
    }

    pub(crate) fn set_children(&mut self, true_child: NodeIndex, false_child: NodeIndex) {
        self.true_child = Some(true_child);
        self.false_child = Some(false_child);
    }

    /// Turn this node into a leaf predicting `decision`.
    pub(crate) fn make_leaf(&mut self, decision: bool) {
        debug_assert!(self.decision.is_none(), "leaf decision is assigned once");
        self.is_leaf = true;
        self.decision = Some(decision);
    }

    /// Majority label of this node's own partitions; ties go to `false`.
    pub(crate) fn majority(&self) -> bool {
        self.pos.len() > self.neg.len()
    }

    /// Return the parent node, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Return the child receiving examples whose split feature is `true`.
    #[must_use]
    pub fn true_child(&self) -> Option<NodeIndex> {
        self.true_child
    }

    /// Return the child receiving examples whose split feature is `false`.
    #[must_use]
    pub fn false_child(&self) -> Option<NodeIndex> {
        self.false_child
    }

    /// Return the positive rows that reached this node.
    #[must_use]
    pub fn pos(&self) -> &[usize] {
        &self.pos
    }

    /// Return the negative rows that reached this node.
    #[must_use]
    pub fn neg(&self) -> &[usize] {
        &self.neg
    }

    /// Return the number of rows that reached this node.
    #[must_use]
    pub fn n_examples(&self) -> usize {
        self.pos.len() + self.neg.len()
    }

    /// Return the depth (root is 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Return `true` if `feature` is in the node's current candidate pool.
    #[must_use]
    pub fn is_eligible(&self, feature: FeatureIndex) -> bool {
        self.eligible.contains(feature)
    }

    /// Return the node's current candidate pool.
    #[must_use]
    pub fn eligible_features(&self) -> &FeaturePool {
        &self.eligible
    }

    /// Return the split feature, `None` for leaves.
    #[must_use]
    pub fn split_feature(&self) -> Option<FeatureIndex> {
        self.split_feature
    }

    /// Return the information gain of this node's split (0.0 for leaves).
    #[must_use]
    pub fn split_gain(&self) -> f64 {
        self.split_gain
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Return the leaf decision, `None` until one is assigned.
    #[must_use]
    pub fn decision(&self) -> Option<bool> {
        self.decision
    }
}

use crate::math::mean_indices;
use crate::split::{all_features_constant, get_best_split};
use crate::{FitError, FitResult, RowMajorMatrix, DEFAULT_MAX_DEPTH, SHOULD_NOT_HAPPEN};
use std::convert::TryFrom;
use tracing::{debug, trace};

/// Handle of a node inside the arena of a [`RegressionTree`].
pub type NodeId = usize;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum Node {
    /// Rows with `row[feature] < threshold` go left, the others go right.
    Split {
        feature: usize,
        threshold: f64,
        left: NodeId,
        right: NodeId,
    },
    /// Mean of the training targets that reached this leaf.
    Leaf { value: f64 },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(try_from = "RawTreeParams")]
pub struct TreeParams {
    pub num_features: usize,
    pub max_depth: usize,
}

#[derive(Deserialize)]
struct RawTreeParams {
    num_features: usize,
    max_depth: usize,
}

impl TryFrom<RawTreeParams> for TreeParams {
    type Error = FitError;

    fn try_from(raw: RawTreeParams) -> FitResult<Self> {
        let params = TreeParams {
            num_features: raw.num_features,
            max_depth: raw.max_depth,
        };
        params.validate()?;
        Ok(params)
    }
}

impl TreeParams {
    pub fn new(num_features: usize) -> Self {
        TreeParams {
            num_features,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub(crate) fn validate(&self) -> FitResult<()> {
        if self.num_features == 0 {
            return Err(FitError::Configuration(
                "num_features must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Check the training data against the params before anything is built.
pub(crate) fn check_train_data(
    params: &TreeParams,
    features: &RowMajorMatrix<f64>,
    target: &[f64],
) -> FitResult<()> {
    if features.n_rows() != target.len() {
        return Err(FitError::ShapeMismatch {
            what: "number of rows",
            expected: target.len(),
            got: features.n_rows(),
        });
    }
    if target.is_empty() {
        return Err(FitError::EmptyDataset);
    }
    check_n_features(params, features)?;
    features.check_finite()?;
    if target.iter().any(|y| !y.is_finite()) {
        return Err(FitError::NonFinite { what: "target" });
    }
    Ok(())
}

pub(crate) fn check_n_features(
    params: &TreeParams,
    features: &RowMajorMatrix<f64>,
) -> FitResult<()> {
    if features.n_cols() != params.num_features {
        return Err(FitError::ShapeMismatch {
            what: "number of features",
            expected: params.num_features,
            got: features.n_cols(),
        });
    }
    Ok(())
}

/// Regression tree grown greedily by exhaustive search of the split minimising the sum of
/// squared residuals.
///
/// The nodes are stored in an arena; children are referenced by their [`NodeId`] and always
/// come before their parent.
///
/// A deserialized tree is checked before use. Persisting to JSON with `serde_json` only gives
/// back the exact same thresholds and leaf values with its `float_roundtrip` feature.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(try_from = "RawRegressionTree")]
pub struct RegressionTree {
    params: TreeParams,
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

#[derive(Deserialize)]
struct RawRegressionTree {
    params: TreeParams,
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl TryFrom<RawRegressionTree> for RegressionTree {
    type Error = FitError;

    fn try_from(raw: RawRegressionTree) -> FitResult<Self> {
        let invalid = |msg: String| Err(FitError::Configuration(msg));
        match raw.root {
            None if !raw.nodes.is_empty() => {
                return invalid("nodes without a root".to_string());
            }
            Some(root) if root >= raw.nodes.len() => {
                return invalid(format!("root {} out of {} nodes", root, raw.nodes.len()));
            }
            _ => {}
        }
        for (id, node) in raw.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                if feature >= raw.params.num_features {
                    return invalid(format!("node {} splits on unknown feature {}", id, feature));
                }
                // Also rules out cycles
                if left >= id || right >= id {
                    return invalid(format!("node {} has a child not built before it", id));
                }
            }
        }
        Ok(RegressionTree {
            params: raw.params,
            nodes: raw.nodes,
            root: raw.root,
        })
    }
}

impl RegressionTree {
    pub fn new(num_features: usize, max_depth: usize) -> FitResult<Self> {
        Self::from_params(&TreeParams {
            num_features,
            max_depth,
        })
    }

    pub fn from_params(params: &TreeParams) -> FitResult<Self> {
        params.validate()?;
        Ok(RegressionTree {
            params: params.clone(),
            nodes: Vec::new(),
            root: None,
        })
    }

    /// Build the tree on the whole training set.
    ///
    /// On error the tree is left as it was before the call.
    pub fn fit(&mut self, features: &RowMajorMatrix<f64>, target: &[f64]) -> FitResult<()> {
        check_train_data(&self.params, features, target)?;

        let indices: Vec<usize> = (0..target.len()).collect();
        let mut nodes = Vec::new();
        let root = build(
            features,
            target,
            &indices,
            0,
            self.params.max_depth,
            &mut nodes,
        );

        self.nodes = nodes;
        self.root = Some(root);
        debug!(
            n_nodes = self.n_nodes(),
            n_leaves = self.n_leaves(),
            depth = self.depth(),
            "regression tree fitted"
        );
        Ok(())
    }

    pub fn predict(&self, features: &RowMajorMatrix<f64>) -> FitResult<Vec<f64>> {
        let leaves = self.apply(features)?;
        Ok(leaves.into_iter().map(|leaf| self.leaf_value(leaf)).collect())
    }

    pub fn predict_row(&self, row: &[f64]) -> FitResult<f64> {
        let root = self.root.ok_or(FitError::UntrainedModel)?;
        if row.len() != self.params.num_features {
            return Err(FitError::ShapeMismatch {
                what: "number of features",
                expected: self.params.num_features,
                got: row.len(),
            });
        }
        Ok(self.leaf_value(self.route(root, row)))
    }

    /// Id of the leaf reached by every row.
    pub fn apply(&self, features: &RowMajorMatrix<f64>) -> FitResult<Vec<NodeId>> {
        let root = self.root.ok_or(FitError::UntrainedModel)?;
        check_n_features(&self.params, features)?;
        Ok(features.rows().map(|row| self.route(root, row)).collect())
    }

    fn route(&self, root: NodeId, row: &[f64]) -> NodeId {
        let mut current = root;
        loop {
            match self.nodes[current] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    current = if row[feature] < threshold { left } else { right };
                }
                Node::Leaf { .. } => return current,
            }
        }
    }

    fn leaf_value(&self, id: NodeId) -> f64 {
        match self.nodes[id] {
            Node::Leaf { value } => value,
            Node::Split { .. } => panic!("{}", SHOULD_NOT_HAPPEN),
        }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| match node {
                Node::Leaf { .. } => true,
                Node::Split { .. } => false,
            })
            .count()
    }

    /// Number of edges on the longest path from the root to a leaf. Zero when untrained.
    pub fn depth(&self) -> usize {
        fn depth_from(nodes: &[Node], id: NodeId) -> usize {
            match nodes[id] {
                Node::Split { left, right, .. } => {
                    1 + depth_from(nodes, left).max(depth_from(nodes, right))
                }
                Node::Leaf { .. } => 0,
            }
        }
        self.root.map_or(0, |root| depth_from(&self.nodes, root))
    }
}

/// Grow the subtree of the rows `indices` and return the id of its root.
///
/// Children are pushed before their parent, so the root of the whole tree is the last node.
fn build(
    features: &RowMajorMatrix<f64>,
    target: &[f64],
    indices: &[usize],
    depth: usize,
    max_depth: usize,
    nodes: &mut Vec<Node>,
) -> NodeId {
    macro_rules! return_leaf {
        () => {{
            nodes.push(Node::Leaf {
                value: mean_indices(target, indices),
            });
            return nodes.len() - 1;
        }};
    }

    if depth >= max_depth || indices.len() <= 1 || all_features_constant(features, indices) {
        return_leaf!();
    }

    let split = match get_best_split(features, target, indices) {
        Some(split) => split,
        None => return_leaf!(),
    };
    trace!(
        depth,
        feature = split.feature_id,
        threshold = split.threshold,
        score = split.score,
        "node split"
    );

    let left = build(
        features,
        target,
        &split.left_indices,
        depth + 1,
        max_depth,
        nodes,
    );
    let right = build(
        features,
        target,
        &split.right_indices,
        depth + 1,
        max_depth,
        nodes,
    );

    nodes.push(Node::Split {
        feature: split.feature_id,
        threshold: split.threshold,
        left,
        right,
    });
    nodes.len() - 1
}

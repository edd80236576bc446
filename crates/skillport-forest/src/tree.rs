//! CART regression tree
//!
//! Grows a binary tree by greedily choosing, at every node, the split that
//! minimizes the summed squared error of the two children. At each node only
//! a random subset of `max_features` columns is considered.
//!
//! For a node holding samples S with target sum s and count n, a split into
//! (L, R) reduces the squared error by
//!
//! ΔSSE = s_L²/n_L + s_R²/n_R − s²/n
//!
//! which is also the quantity accumulated into the per-feature importance.

use crate::config::TreeParams;
use crate::error::ForestError;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
    /// Raw squared-error reduction attributed to each feature
    impurity_decrease: Array1<f64>,
}

/// Pending node during growth: its slot and the range of `order` it owns.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: usize,
    start: usize,
    end: usize,
    depth: usize,
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Fit a tree on the rows of `features` listed in `samples`.
    ///
    /// `samples` may contain repeated rows (bootstrap draws). Inputs are
    /// assumed finite; the forest validates them once up front.
    ///
    /// # Arguments
    /// * `features` - Feature matrix (n_rows x n_features)
    /// * `target` - Target per row (n_rows)
    /// * `samples` - Row indices to train on
    /// * `params` - Growth parameters
    /// * `rng` - Source of feature subsampling draws
    pub fn fit<R: Rng + ?Sized>(
        features: ArrayView2<'_, f64>,
        target: ArrayView1<'_, f64>,
        samples: &[usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> Result<Self, ForestError> {
        let (n_rows, n_features) = features.dim();
        if n_rows != target.len() {
            return Err(ForestError::ShapeMismatch {
                rows: n_rows,
                targets: target.len(),
            });
        }
        if samples.is_empty() || n_features == 0 {
            return Err(ForestError::InsufficientData {
                required: 1,
                actual: samples.len().min(n_features),
            });
        }

        let min_leaf = params.min_samples_leaf.max(1);
        let n_candidates = params.max_features.resolve(n_features);

        let mut order = samples.to_vec();
        let mut scratch = Vec::with_capacity(order.len());
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut impurity_decrease = Array1::<f64>::zeros(n_features);
        let mut stack = vec![Frame {
            node: 0,
            start: 0,
            end: order.len(),
            depth: 0,
        }];

        while let Some(frame) = stack.pop() {
            let segment = &order[frame.start..frame.end];
            let n = segment.len();
            let sum: f64 = segment.iter().map(|&i| target[i]).sum();
            let mean = sum / n as f64;
            let sse: f64 = segment.iter().map(|&i| (target[i] - mean).powi(2)).sum();
            let sum_sq: f64 = segment.iter().map(|&i| target[i] * target[i]).sum();

            // Pure node: remaining error is rounding noise relative to the target's scale.
            let pure = sse <= f64::EPSILON * sum_sq;
            let depth_exhausted = params.max_depth.is_some_and(|d| frame.depth >= d);
            if depth_exhausted || n < 2 * min_leaf || pure {
                nodes[frame.node] = Node::Leaf { value: mean };
                continue;
            }

            let mut best: Option<BestSplit> = None;
            let candidates = rand::seq::index::sample(&mut *rng, n_features, n_candidates);
            for feature in candidates.iter() {
                scratch.clear();
                scratch.extend_from_slice(segment);
                scratch.sort_unstable_by(|&a, &b| {
                    features[[a, feature]].total_cmp(&features[[b, feature]])
                });

                let mut left_sum = 0.0;
                for pos in 0..n - 1 {
                    left_sum += target[scratch[pos]];
                    let n_left = pos + 1;
                    let n_right = n - n_left;
                    if n_left < min_leaf {
                        continue;
                    }
                    if n_right < min_leaf {
                        break;
                    }

                    let here = features[[scratch[pos], feature]];
                    let next = features[[scratch[pos + 1], feature]];
                    if next <= here {
                        continue;
                    }

                    let right_sum = sum - left_sum;
                    let score =
                        left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                    if best.is_none_or(|b| score > b.score) {
                        let mut threshold = here / 2.0 + next / 2.0;
                        if threshold >= next {
                            threshold = here;
                        }
                        best = Some(BestSplit {
                            feature,
                            threshold,
                            score,
                        });
                    }
                }
            }

            let Some(split) = best else {
                nodes[frame.node] = Node::Leaf { value: mean };
                continue;
            };
            let decrease = split.score - sum * sum / n as f64;
            if decrease <= 0.0 {
                nodes[frame.node] = Node::Leaf { value: mean };
                continue;
            }

            let (left, right): (Vec<usize>, Vec<usize>) = order[frame.start..frame.end]
                .iter()
                .copied()
                .partition(|&i| features[[i, split.feature]] <= split.threshold);
            let mid = frame.start + left.len();
            order[frame.start..mid].copy_from_slice(&left);
            order[mid..frame.end].copy_from_slice(&right);

            impurity_decrease[split.feature] += decrease;

            let left_node = nodes.len();
            let right_node = left_node + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[frame.node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: left_node,
                right: right_node,
            };

            stack.push(Frame {
                node: right_node,
                start: mid,
                end: frame.end,
                depth: frame.depth + 1,
            });
            stack.push(Frame {
                node: left_node,
                start: frame.start,
                end: mid,
                depth: frame.depth + 1,
            });
        }

        Ok(Self {
            nodes,
            n_features,
            impurity_decrease,
        })
    }

    /// Predict a single feature row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => idx = if row[feature] <= threshold { left } else { right },
            }
        }
    }

    /// Predict every row of `features`.
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ForestError> {
        if features.ncols() != self.n_features {
            return Err(ForestError::DimensionMismatch {
                expected: self.n_features,
                actual: features.ncols(),
            });
        }
        Ok(features
            .rows()
            .into_iter()
            .map(|row| self.predict_row(row))
            .collect())
    }

    /// Squared-error reduction per feature, normalized to sum to 1.
    ///
    /// A tree that never split returns all zeros.
    pub fn feature_importances(&self) -> Array1<f64> {
        let total = self.impurity_decrease.sum();
        if total > 0.0 {
            &self.impurity_decrease / total
        } else {
            Array1::zeros(self.n_features)
        }
    }

    /// Number of features seen during fitting.
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        max_depth
    }
}

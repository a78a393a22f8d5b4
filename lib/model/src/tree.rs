//! CART decision tree classifier (Gini impurity)

use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

/// Tree growth parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TreeParams {
    /// Maximum depth, unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples required to split an internal node
    pub min_samples_split: usize,
    /// Features examined per split, all when `None`
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Fitted decision tree stored as a flat node arena
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    params: TreeParams,
    nodes: Vec<Node>,
    n_classes: usize,
    /// Row width seen at fit time
    n_features: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            nodes: Vec::new(),
            n_classes: 0,
            n_features: 0,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Fit on the rows selected by `indices` (may contain repeats).
    ///
    /// `rng` is only consulted when `max_features` limits the features
    /// examined per split.
    pub fn fit_indices(
        &mut self,
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        indices: Vec<usize>,
        rng: &mut StdRng,
    ) {
        self.nodes.clear();
        self.n_classes = n_classes;
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        self.n_features = n_features;
        self.grow(x, y, indices, 0, n_features, rng);
    }

    /// Fit on every row
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[usize], n_classes: usize, rng: &mut StdRng) {
        let indices = (0..y.len()).collect();
        self.fit_indices(x, y, n_classes, indices, rng);
    }

    pub fn predict_one(&self, row: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[usize],
        indices: Vec<usize>,
        depth: usize,
        n_features: usize,
        rng: &mut StdRng,
    ) -> usize {
        let counts = class_counts(y, &indices, self.n_classes);
        let majority = argmax(&counts);
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { class: majority });

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.params.max_depth.map_or(false, |d| depth >= d);
        if pure || depth_reached || indices.len() < self.params.min_samples_split.max(2) {
            return node_id;
        }

        let Some(split) = self.best_split(x, y, &indices, &counts, n_features, rng) else {
            return node_id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.grow(x, y, left_idx, depth + 1, n_features, rng);
        let right = self.grow(x, y, right_idx, depth + 1, n_features, rng);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[usize],
        indices: &[usize],
        parent_counts: &[usize],
        n_features: usize,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let features: Vec<usize> = match self.params.max_features {
            Some(k) if k < n_features => {
                let mut picked = sample(rng, n_features, k.max(1)).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..n_features).collect(),
        };

        let total = indices.len();
        let mut best: Option<SplitCandidate> = None;

        for feature in features {
            let mut sorted: Vec<(f64, usize)> = indices.iter().map(|&i| (x[i][feature], y[i])).collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent_counts.to_vec();

            for pos in 0..total - 1 {
                let (value, class) = sorted[pos];
                left[class] += 1;
                right[class] -= 1;

                let next = sorted[pos + 1].0;
                if value == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = total - n_left;
                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / total as f64;

                // strict comparison keeps the first feature/threshold on ties
                if best.as_ref().map_or(true, |b| impurity < b.impurity - 1e-12) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: value + (next - value) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

/// Index of the largest count, lowest class on ties
pub(crate) fn argmax(counts: &[usize]) -> usize {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    best
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

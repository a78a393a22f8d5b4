//! Random forest of bootstrapped CART trees

use crate::tree::{argmax, DecisionTree, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Forest parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Base seed; tree `i` is grown from `seed + i`
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            n_classes: 0,
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// At least one tree, and every tree grown
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(DecisionTree::is_fitted)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Fit every tree on its own bootstrap sample with `sqrt(d)` features
    /// per split.
    ///
    /// Trees are grown in parallel; each owns an RNG derived from its index,
    /// so the fitted forest does not depend on thread scheduling.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[usize], n_classes: usize) {
        let n_samples = y.len();
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let max_features = ((n_features as f64).sqrt().round() as usize).max(1);

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            max_features: Some(max_features),
        };
        let base_seed = self.params.seed;

        self.trees = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
                let bootstrap: Vec<usize> = (0..n_samples)
                    .map(|_| rng.random_range(0..n_samples))
                    .collect();
                let mut tree = DecisionTree::new(tree_params);
                tree.fit_indices(x, y, n_classes, bootstrap, &mut rng);
                tree
            })
            .collect();
        self.n_classes = n_classes;
        self.n_features = n_features;
    }

    /// Majority vote, lowest class index on ties
    pub fn predict_one(&self, row: &[f64]) -> usize {
        let mut votes = vec![0usize; self.n_classes.max(1)];
        for tree in &self.trees {
            let class = tree.predict_one(row);
            if class < votes.len() {
                votes[class] += 1;
            }
        }
        argmax(&votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let jitter = (i % 5) as f64 * 0.1;
            x.push(vec![0.0 + jitter, 0.0 - jitter, 1.0]);
            y.push(0);
            x.push(vec![5.0 + jitter, 5.0 - jitter, 1.0]);
            y.push(1);
            x.push(vec![-5.0 + jitter, 5.0 + jitter, 1.0]);
            y.push(2);
        }
        (x, y)
    }

    #[test]
    fn test_separable_blobs() {
        let (x, y) = blobs();
        let mut forest = RandomForest::new(ForestParams {
            n_estimators: 15,
            ..ForestParams::default()
        });
        forest.fit(&x, &y, 3);

        assert_eq!(forest.n_trees(), 15);
        assert!(forest.is_fitted());
        assert_eq!(forest.n_features(), 3);
        assert_eq!(forest.predict_one(&[0.1, -0.1, 1.0]), 0);
        assert_eq!(forest.predict_one(&[5.2, 4.9, 1.0]), 1);
        assert_eq!(forest.predict_one(&[-5.0, 5.1, 1.0]), 2);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = blobs();
        let params = ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        };
        let mut a = RandomForest::new(params);
        let mut b = RandomForest::new(params);
        a.fit(&x, &y, 3);
        b.fit(&x, &y, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unfitted_forest() {
        let forest = RandomForest::new(ForestParams::default());
        assert!(!forest.is_fitted());
        assert_eq!(forest.n_features(), 0);
    }
}

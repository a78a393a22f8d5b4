use crate::forest::{ForestParams, RandomForest};
use crate::tree::{DecisionTree, TreeParams};
use fertirag_core::{Error, Result, Stage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Candidate classifier kinds with their fixed hyperparameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateKind {
    DecisionTree(TreeParams),
    RandomForest(ForestParams),
}

/// A named entry in the ordered candidate set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub kind: CandidateKind,
}

impl Candidate {
    pub fn new(name: impl Into<String>, kind: CandidateKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Fit this candidate on encoded training data
    pub fn fit(&self, x: &[Vec<f64>], y: &[usize], n_classes: usize, seed: u64) -> Result<Model> {
        if x.is_empty() || x.len() != y.len() {
            return Err(Error::validation(Stage::Training, "training data is empty or misaligned")
                .with("candidate", &self.name)
                .with("rows", x.len())
                .with("labels", y.len()));
        }
        if let Some(bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(Error::validation(Stage::Training, "label code out of range")
                .with("candidate", &self.name)
                .with("code", bad));
        }

        let model = match self.kind {
            CandidateKind::DecisionTree(params) => {
                let mut tree = DecisionTree::new(params);
                tree.fit(x, y, n_classes, &mut StdRng::seed_from_u64(seed));
                Model::DecisionTree(tree)
            }
            CandidateKind::RandomForest(params) => {
                let mut forest = RandomForest::new(ForestParams { seed, ..params });
                forest.fit(x, y, n_classes);
                Model::RandomForest(forest)
            }
        };
        Ok(model)
    }
}

/// The fixed, ordered candidate set. Declaration order is the tie-break.
pub fn default_candidates() -> Vec<Candidate> {
    vec![
        Candidate::new("Decision Tree", CandidateKind::DecisionTree(TreeParams::default())),
        Candidate::new("Random Forest", CandidateKind::RandomForest(ForestParams::default())),
    ]
}

/// A fitted classifier, immutable after training
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Model {
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl Model {
    pub fn predict_one(&self, row: &[f64]) -> usize {
        match self {
            Model::DecisionTree(tree) => tree.predict_one(row),
            Model::RandomForest(forest) => forest.predict_one(row),
        }
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<usize> {
        rows.iter().map(|r| self.predict_one(r)).collect()
    }

    pub fn is_fitted(&self) -> bool {
        match self {
            Model::DecisionTree(tree) => tree.is_fitted(),
            Model::RandomForest(forest) => forest.is_fitted(),
        }
    }

    /// Row width the model was fitted on
    pub fn n_features(&self) -> usize {
        match self {
            Model::DecisionTree(tree) => tree.n_features(),
            Model::RandomForest(forest) => forest.n_features(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Model::DecisionTree(_) => "decision_tree",
            Model::RandomForest(_) => "random_forest",
        }
    }
}

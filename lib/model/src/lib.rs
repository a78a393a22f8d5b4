//! # fertirag Model
//!
//! Classifiers and model selection for the fertilizer recommender.
//!
//! - [`DecisionTree`] - CART classifier with Gini impurity
//! - [`RandomForest`] - bootstrapped trees with per-split feature sampling
//! - [`ModelSelector`] - fits the fixed candidate set, scores each on the
//!   held-out split, keeps the best one above the quality floor
//!
//! ## Example
//!
//! ```rust
//! use fertirag_model::{pick_winner, CandidateScore};
//!
//! let scores = vec![
//!     CandidateScore { name: "Decision Tree".into(), accuracy: 0.87 },
//!     CandidateScore { name: "Random Forest".into(), accuracy: 0.91 },
//! ];
//! assert_eq!(pick_winner(&scores, 0.6).unwrap(), 1);
//! ```

pub mod classifier;
pub mod forest;
pub mod metrics;
pub mod selection;
pub mod tree;

pub use classifier::{default_candidates, Candidate, CandidateKind, Model};
pub use forest::{ForestParams, RandomForest};
pub use metrics::accuracy;
pub use selection::{
    pick_winner, CandidateScore, ModelSelector, Selection, SelectionReport, DEFAULT_QUALITY_FLOOR,
};
pub use tree::{DecisionTree, TreeParams};

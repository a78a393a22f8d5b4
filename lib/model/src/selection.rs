//! Model selection over the fixed candidate set
//!
//! Every candidate is fitted on the train split and scored by top-1
//! accuracy on the test split. The strictly highest score wins; on a tie the
//! earliest-declared candidate wins. A run whose best score is below the
//! quality floor is rejected and nothing is published.

use crate::classifier::{default_candidates, Candidate, Model};
use crate::metrics::accuracy;
use fertirag_core::{Error, Result, Stage};
use fertirag_schema::EncodedSplit;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Minimum acceptable test accuracy
pub const DEFAULT_QUALITY_FLOOR: f64 = 0.6;

/// Score of one candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateScore {
    pub name: String,
    pub accuracy: f64,
}

/// Audit record of a selection decision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionReport {
    /// Scores in candidate declaration order
    pub scores: Vec<CandidateScore>,
    pub winner: String,
    pub accuracy: f64,
    pub quality_floor: f64,
}

/// Winning model plus the decision that picked it
#[derive(Debug, Clone)]
pub struct Selection {
    pub model: Model,
    pub report: SelectionReport,
}

/// Index of the best score: strictly highest accuracy, first declared on ties.
///
/// Fails with a model quality error when the best score is below `floor`.
pub fn pick_winner(scores: &[CandidateScore], floor: f64) -> Result<usize> {
    let mut best: Option<usize> = None;
    for (i, score) in scores.iter().enumerate() {
        let better = match best {
            None => true,
            Some(b) => OrderedFloat(score.accuracy) > OrderedFloat(scores[b].accuracy),
        };
        if better {
            best = Some(i);
        }
    }

    let Some(best) = best else {
        return Err(Error::model_quality("no candidates were evaluated").with("floor", floor));
    };

    let winner = &scores[best];
    if winner.accuracy < floor {
        return Err(Error::model_quality("no candidate cleared the quality floor")
            .with("winner", &winner.name)
            .with("accuracy", winner.accuracy)
            .with("floor", floor));
    }
    Ok(best)
}

pub struct ModelSelector {
    candidates: Vec<Candidate>,
    quality_floor: f64,
    seed: u64,
}

impl ModelSelector {
    pub fn new(candidates: Vec<Candidate>, quality_floor: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&quality_floor) {
            return Err(Error::validation(Stage::Training, "quality floor must be within 0..=1")
                .with("quality_floor", quality_floor));
        }
        if candidates.is_empty() {
            return Err(Error::validation(Stage::Training, "candidate set is empty"));
        }
        Ok(Self {
            candidates,
            quality_floor,
            seed,
        })
    }

    pub fn with_defaults(quality_floor: f64, seed: u64) -> Result<Self> {
        Self::new(default_candidates(), quality_floor, seed)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn quality_floor(&self) -> f64 {
        self.quality_floor
    }

    /// Fit and score every candidate, then keep the winner
    pub fn select(&self, train: &EncodedSplit, test: &EncodedSplit, n_classes: usize) -> Result<Selection> {
        if test.is_empty() {
            return Err(Error::validation(Stage::Training, "test split is empty"));
        }

        let mut models = Vec::with_capacity(self.candidates.len());
        let mut scores = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            info!(candidate = %candidate.name, rows = train.len(), "Training candidate");
            let model = candidate.fit(&train.features, &train.labels, n_classes, self.seed)?;
            let predicted = model.predict(&test.features);
            let score = accuracy(&test.labels, &predicted);
            info!(candidate = %candidate.name, accuracy = score, "Candidate test accuracy");

            scores.push(CandidateScore {
                name: candidate.name.clone(),
                accuracy: score,
            });
            models.push(model);
        }

        let best = match pick_winner(&scores, self.quality_floor) {
            Ok(best) => best,
            Err(e) => {
                warn!(floor = self.quality_floor, scores = ?scores, "Rejected training run");
                return Err(e);
            }
        };

        let report = SelectionReport {
            winner: scores[best].name.clone(),
            accuracy: scores[best].accuracy,
            quality_floor: self.quality_floor,
            scores,
        };
        info!(
            winner = %report.winner,
            accuracy = report.accuracy,
            floor = report.quality_floor,
            "Selected best model"
        );

        let model = models.swap_remove(best);
        Ok(Selection { model, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fertirag_core::ErrorKind;

    fn scores(values: &[(&str, f64)]) -> Vec<CandidateScore> {
        values
            .iter()
            .map(|(n, a)| CandidateScore {
                name: n.to_string(),
                accuracy: *a,
            })
            .collect()
    }

    #[test]
    fn test_highest_accuracy_wins() {
        let s = scores(&[("Decision Tree", 0.87), ("Random Forest", 0.91)]);
        assert_eq!(pick_winner(&s, 0.6).unwrap(), 1);

        let s = scores(&[("Decision Tree", 0.91), ("Random Forest", 0.87)]);
        assert_eq!(pick_winner(&s, 0.6).unwrap(), 0);
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        let s = scores(&[("A", 0.8), ("B", 0.8), ("C", 0.7)]);
        assert_eq!(pick_winner(&s, 0.6).unwrap(), 0);
    }

    #[test]
    fn test_all_below_floor_rejected() {
        let s = scores(&[("A", 0.59), ("B", 0.4)]);
        let err = pick_winner(&s, 0.6).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelQuality);
        assert_eq!(err.detail().get("winner"), Some("A"));
        assert_eq!(err.detail().get("floor"), Some("0.6"));
    }

    #[test]
    fn test_exactly_at_floor_accepted() {
        let s = scores(&[("A", 0.6)]);
        assert!(pick_winner(&s, 0.6).is_ok());
    }

    #[test]
    fn test_invalid_floor() {
        assert!(ModelSelector::with_defaults(1.5, 0).is_err());
    }

    fn split(x: Vec<Vec<f64>>, y: Vec<usize>) -> EncodedSplit {
        EncodedSplit {
            features: x,
            labels: y,
        }
    }

    #[test]
    fn test_select_on_learnable_data() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<usize> = (0..40).map(|i| usize::from(i >= 20)).collect();
        let train = split(x.clone(), y.clone());
        let test = split(x, y);

        let selector = ModelSelector::with_defaults(0.6, 42).unwrap();
        let selection = selector.select(&train, &test, 2).unwrap();

        assert_eq!(selection.report.scores.len(), 2);
        assert!(selection.report.accuracy >= 0.9);
        // both candidates are perfect here, so the first one wins
        assert_eq!(selection.report.winner, "Decision Tree");
    }

    #[test]
    fn test_select_rejects_unlearnable_data() {
        // test labels are the inverse of the train labels
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y_train: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
        let y_test: Vec<usize> = y_train.iter().map(|c| 1 - c).collect();

        let selector = ModelSelector::with_defaults(0.6, 42).unwrap();
        let err = selector
            .select(&split(x.clone(), y_train), &split(x, y_test), 2)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelQuality);
    }
}

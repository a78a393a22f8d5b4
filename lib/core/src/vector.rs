use serde::{Deserialize, Serialize};

/// Dense embedding of a text chunk or query.
///
/// The index stores unit vectors only, so ranking reduces to an inner
/// product. Raw embedder output goes through [`Vector::into_unit`] first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Vector(Vec<f32>);

impl Vector {
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self(vec![0.0; dim])
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Inner product; extra components of the longer operand are ignored
    pub fn dot(&self, other: &Vector) -> f32 {
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }

    pub fn norm(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn is_unit(&self) -> bool {
        (self.norm() - 1.0).abs() < 1e-4
    }

    /// Scale to unit length in place. Returns `false` and leaves the vector
    /// untouched when it has no direction (all zeros or too small).
    pub fn normalize(&mut self) -> bool {
        let norm = self.norm();
        if !norm.is_finite() || norm <= f32::EPSILON {
            return false;
        }
        self.0.iter_mut().for_each(|x| *x /= norm);
        true
    }

    #[must_use]
    pub fn into_unit(mut self) -> Self {
        self.normalize();
        self
    }

    /// Cosine similarity; 0 for mismatched dimensions or a zero operand
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }
        let denom = self.norm() * other.norm();
        if denom <= f32::EPSILON {
            0.0
        } else {
            self.dot(other) / denom
        }
    }
}

impl From<Vec<f32>> for Vector {
    fn from(values: Vec<f32>) -> Self {
        Vector(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_vectors_rank_by_dot() {
        let query = Vector::new(vec![1.0, 1.0]).into_unit();
        let near = Vector::new(vec![2.0, 1.5]).into_unit();
        let far = Vector::new(vec![0.0, 3.0]).into_unit();
        assert!(query.is_unit() && near.is_unit() && far.is_unit());
        assert!(query.dot(&near) > query.dot(&far));
        assert!((query.dot(&near) - query.cosine_similarity(&near)).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_has_no_direction() {
        let mut v = Vector::zeros(4);
        assert!(!v.normalize());
        assert_eq!(v.as_slice(), &[0.0; 4]);
        assert_eq!(v.cosine_similarity(&Vector::new(vec![1.0, 0.0, 0.0, 0.0])), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_scores_zero() {
        let a = Vector::new(vec![1.0, 0.0]);
        let b = Vector::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let json = serde_json::to_string(&Vector::new(vec![0.5, 0.25])).unwrap();
        assert_eq!(json, "[0.5,0.25]");
    }
}

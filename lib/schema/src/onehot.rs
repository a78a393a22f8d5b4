use serde::{Deserialize, Serialize};

/// One-hot encoder for a single categorical column.
///
/// The vocabulary is sorted and deduplicated at fit time. Values never seen
/// during fit encode to an all-zero block instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OneHotEncoder {
    categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut categories: Vec<String> = values.into_iter().map(str::to_string).collect();
        categories.sort();
        categories.dedup();
        Self { categories }
    }

    /// Width of the encoded block
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Position of a known category
    pub fn position(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Write the encoded block into `out`, which must be `width()` long
    pub fn encode_into(&self, value: &str, out: &mut [f64]) {
        out.fill(0.0);
        if let Some(pos) = self.position(value) {
            out[pos] = 1.0;
        }
    }

    pub fn encode(&self, value: &str) -> Vec<f64> {
        let mut block = vec![0.0; self.width()];
        self.encode_into(value, &mut block);
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_vocabulary() {
        let enc = OneHotEncoder::fit(["Sandy", "Loamy", "Sandy", "Black"]);
        assert_eq!(enc.categories(), &["Black", "Loamy", "Sandy"]);
        assert_eq!(enc.encode("Loamy"), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unknown_category_is_all_zero() {
        let enc = OneHotEncoder::fit(["Sandy", "Loamy"]);
        assert_eq!(enc.encode("Peaty"), vec![0.0, 0.0]);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let enc = OneHotEncoder::fit(["Sandy"]);
        assert_eq!(enc.encode("sandy"), vec![0.0]);
    }
}

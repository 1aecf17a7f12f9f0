use socialpedia_core::SearchConfig;

/// Calculate cosine similarity between two vectors.
///
/// A zero-norm vector carries no direction, so it scores 0.0 against
/// anything. Mismatched lengths also score 0.0; callers that care check
/// dimensions first.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();

    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Similarity cutoff for results
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub value: f32,
    /// `>=` when true, `>` when false
    pub inclusive: bool,
}

impl Threshold {
    pub fn inclusive(value: f32) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    pub fn exclusive(value: f32) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            value: config.threshold,
            inclusive: config.threshold_inclusive,
        }
    }

    /// NaN never passes
    pub fn admits(&self, similarity: f32) -> bool {
        if self.inclusive {
            similarity >= self.value
        } else {
            similarity > self.value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let d = vec![1.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &d);
        assert!(sim > 0.7 && sim < 0.8); // Should be ~0.707

        let e = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &e) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_magnitude_does_not_matter() {
        let a = vec![1.0, 2.0, 3.0];
        let scaled = vec![10.0, 20.0, 30.0];
        assert!((cosine_similarity(&a, &scaled) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let zero = vec![0.0, 0.0, 0.0];
        let a = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &a), 0.0);
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_length_mismatch_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_threshold_operators() {
        let inclusive = Threshold::inclusive(0.5);
        assert!(inclusive.admits(0.5));
        assert!(inclusive.admits(0.9));
        assert!(!inclusive.admits(0.49));

        let exclusive = Threshold::exclusive(0.5);
        assert!(!exclusive.admits(0.5));
        assert!(exclusive.admits(0.51));

        assert!(!inclusive.admits(f32::NAN));
        assert!(!exclusive.admits(f32::NAN));
    }

    #[test]
    fn test_threshold_from_config() {
        let config = SearchConfig::default();
        assert_eq!(Threshold::from_config(&config), Threshold::inclusive(0.2));
    }
}

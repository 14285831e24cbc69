use async_trait::async_trait;
use indexmap::IndexMap;

use super::{Classification, PoseClassifier};
use crate::error::ClassifierError;

/// Brute-force k-nearest-neighbour classifier over Euclidean distance.
///
/// Votes are counted among the `k` closest examples. Ties go to the label
/// that was registered first.
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: usize,
    dimension: Option<usize>,
    /// label -> examples, in registration order
    examples: IndexMap<String, Vec<Vec<f32>>>,
}

impl KnnClassifier {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            dimension: None,
            examples: IndexMap::new(),
        }
    }

    pub fn example_count(&self) -> usize {
        self.examples.values().map(Vec::len).sum()
    }

    fn check_features(&self, features: &[f32]) -> Result<(), ClassifierError> {
        if let Some(expected) = self.dimension {
            if features.len() != expected {
                return Err(ClassifierError::DimensionMismatch {
                    expected,
                    found: features.len(),
                });
            }
        }
        if !features.iter().all(|v| v.is_finite()) {
            return Err(ClassifierError::InvalidFeatures);
        }
        Ok(())
    }

    fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl PoseClassifier for KnnClassifier {
    async fn add_example(&mut self, features: &[f32], label: &str) -> Result<(), ClassifierError> {
        self.check_features(features)?;
        if self.dimension.is_none() {
            self.dimension = Some(features.len());
        }
        self.examples
            .entry(label.to_string())
            .or_default()
            .push(features.to_vec());
        Ok(())
    }

    async fn classify(&self, features: &[f32]) -> Result<Classification, ClassifierError> {
        if self.example_count() == 0 {
            return Err(ClassifierError::Empty);
        }
        self.check_features(features)?;

        // (distance, label index)
        let mut neighbours: Vec<(f32, usize)> = self
            .examples
            .values()
            .enumerate()
            .flat_map(|(label_idx, examples)| {
                examples
                    .iter()
                    .map(move |example| (Self::squared_distance(features, example), label_idx))
            })
            .collect();
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));

        let k = self.k.min(neighbours.len());
        let mut votes = vec![0usize; self.examples.len()];
        for &(_, label_idx) in neighbours.iter().take(k) {
            votes[label_idx] += 1;
        }

        // max_by_key keeps the last maximum, so scan in reverse to favour
        // the earliest registered label on ties
        let winner = votes
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|&(_, count)| *count)
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        let confidences = self
            .examples
            .keys()
            .zip(votes.iter())
            .map(|(label, &count)| (label.clone(), count as f32 / k as f32))
            .collect();

        let label = self
            .examples
            .get_index(winner)
            .map(|(label, _)| label.clone())
            .ok_or(ClassifierError::Empty)?;

        Ok(Classification { label, confidences })
    }

    fn num_labels(&self) -> usize {
        self.examples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_classifier_refuses() {
        let knn = KnnClassifier::default();
        assert_eq!(knn.num_labels(), 0);
        assert_eq!(knn.classify(&[0.0, 0.0]).await, Err(ClassifierError::Empty));
    }

    #[tokio::test]
    async fn majority_of_nearest_wins() {
        let mut knn = KnnClassifier::new(3);
        knn.add_example(&[0.0, 0.0], "a").await.unwrap();
        knn.add_example(&[0.1, 0.0], "a").await.unwrap();
        knn.add_example(&[5.0, 5.0], "b").await.unwrap();
        knn.add_example(&[5.1, 5.0], "b").await.unwrap();
        knn.add_example(&[5.0, 5.1], "b").await.unwrap();

        let result = knn.classify(&[0.05, 0.0]).await.unwrap();
        assert_eq!(result.label, "a");
        assert!((result.confidence() - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(knn.num_labels(), 2);

        let result = knn.classify(&[4.9, 5.0]).await.unwrap();
        assert_eq!(result.label, "b");
        assert_eq!(result.confidences["b"], 1.0);
    }

    #[tokio::test]
    async fn ties_favour_first_label() {
        let mut knn = KnnClassifier::new(2);
        knn.add_example(&[0.0], "first").await.unwrap();
        knn.add_example(&[2.0], "second").await.unwrap();
        let result = knn.classify(&[1.0]).await.unwrap();
        assert_eq!(result.label, "first");
    }

    #[tokio::test]
    async fn k_larger_than_examples_uses_all() {
        let mut knn = KnnClassifier::new(10);
        knn.add_example(&[1.0], "only").await.unwrap();
        let result = knn.classify(&[3.0]).await.unwrap();
        assert_eq!(result.label, "only");
        assert_eq!(result.confidence(), 1.0);
    }

    #[tokio::test]
    async fn rejects_dimension_mismatch() {
        let mut knn = KnnClassifier::default();
        knn.add_example(&[1.0, 2.0], "a").await.unwrap();
        assert_eq!(
            knn.classify(&[1.0]).await,
            Err(ClassifierError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        assert!(knn.add_example(&[1.0, 2.0, 3.0], "a").await.is_err());
    }
}

// Topic model types — trained topics, per-blob assignments, cell mixtures.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A ranked term distribution. Terms are sorted by probability
/// (descending) and probabilities sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Human-readable label built from the top terms.
    pub label: String,
    pub terms: Vec<(String, f64)>,
}

impl Topic {
    /// P(term | topic), 0 for terms outside the topic.
    pub fn probability(&self, term: &str) -> f64 {
        self.terms
            .iter()
            .find(|(t, _)| t == term)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    /// The `m` most probable terms.
    pub fn top_terms(&self, m: usize) -> &[(String, f64)] {
        &self.terms[..m.min(self.terms.len())]
    }
}

/// Output of one training run over a set of text blobs.
#[derive(Debug, Clone, Default)]
pub struct TopicModel {
    pub topics: Vec<Arc<Topic>>,
    /// One entry per input blob: (topic index, weight) pairs, weights
    /// summing to 1, or empty when the blob carries none of the topics.
    pub assignments: Vec<Vec<(usize, f64)>>,
}

impl TopicModel {
    /// A model with no topics for `blobs` inputs (degenerate training data).
    pub fn empty(blobs: usize) -> Self {
        Self {
            topics: Vec::new(),
            assignments: vec![Vec::new(); blobs],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// A topic's share of one cell's documents. The weight is relative to the
/// cell, not to the whole collection.
#[derive(Debug, Clone)]
pub struct TopicScore {
    pub topic: Arc<Topic>,
    pub weight: f64,
}

/// Normalize `(index, mass)` pairs so the weights sum to 1, dropping
/// non-positive or non-finite masses, highest weight first (stable on ties).
pub fn normalize_masses(masses: Vec<(usize, f64)>) -> Vec<(usize, f64)> {
    let mut kept: Vec<(usize, f64)> = masses
        .into_iter()
        .filter(|(_, m)| m.is_finite() && *m > 0.0)
        .collect();
    let total: f64 = kept.iter().map(|(_, m)| m).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    for (_, m) in &mut kept {
        *m /= total;
    }
    kept.sort_by(|a, b| b.1.total_cmp(&a.1));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_sums_to_one_and_sorts() {
        let n = normalize_masses(vec![(0, 1.0), (1, 3.0), (2, 0.0)]);
        assert_eq!(n.len(), 2);
        assert_eq!(n[0].0, 1);
        let sum: f64 = n.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_of_nothing_is_empty() {
        assert!(normalize_masses(vec![(0, 0.0)]).is_empty());
        assert!(normalize_masses(vec![(0, f64::NAN)]).is_empty());
    }

    #[test]
    fn top_terms_is_bounded() {
        let topic = Topic {
            label: "a / b".into(),
            terms: vec![("a".into(), 0.7), ("b".into(), 0.3)],
        };
        assert_eq!(topic.top_terms(5).len(), 2);
        assert_eq!(topic.top_terms(1)[0].0, "a");
        assert_eq!(topic.probability("b"), 0.3);
        assert_eq!(topic.probability("zzz"), 0.0);
    }
}

// Token scorer — deltas for candidate summary terms.
//
// A cell must not "summarize itself": a term equal to the cell's row or
// column label (or to any word of a multi-word label) is discarded.

use super::{DISCARD, MINOR_PENALTY};
use crate::text;

#[derive(Debug, Clone, Default)]
pub struct TokenScorer {
    labels: Vec<String>,
}

impl TokenScorer {
    pub fn new(labels: &[&str]) -> Self {
        let mut lowered = Vec::new();
        for label in labels {
            lowered.push(label.to_lowercase());
            for word in text::tokenize(label) {
                if !lowered.contains(&word) {
                    lowered.push(word);
                }
            }
        }
        Self { labels: lowered }
    }

    pub fn is_label(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.labels.iter().any(|l| *l == term)
    }

    pub fn score(&self, term: &str) -> f64 {
        if self.is_label(term) {
            DISCARD
        } else if term.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '.') {
            MINOR_PENALTY
        } else {
            0.0
        }
    }
}

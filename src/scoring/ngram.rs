// N-gram typicality — how "ordinary" a sentence reads against the matrix's text.
//
// The model is trained once per run over the in-scope documents. A
// sentence's typicality is 1 - H/H_max, where H is its per-token cross
// entropy under an add-one smoothed bigram model and H_max the entropy of a
// uniform distribution over the vocabulary. 1.0 is perfectly predictable
// text, 0.0 is noise.

use std::collections::HashMap;
use std::fmt;

use crate::text;

/// Trait for language models that rate token sequences.
pub trait NgramModel: Send + Sync + fmt::Debug {
    /// Typicality of `tokens` in [0, 1]. Empty input is neutral (1.0).
    fn typicality(&self, tokens: &[String]) -> f64;
}

const START: &str = "<s>";

#[derive(Debug, Default)]
pub struct BigramModel {
    unigrams: HashMap<String, u64>,
    bigrams: HashMap<(String, String), u64>,
}

impl BigramModel {
    /// Train over raw texts, sentence by sentence.
    pub fn train<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut model = BigramModel::default();
        for text in texts {
            for sentence in text::split_sentences(text) {
                let tokens = text::tokenize(&sentence);
                let mut prev = START.to_string();
                *model.unigrams.entry(prev.clone()).or_insert(0) += 1;
                for token in tokens {
                    *model.unigrams.entry(token.clone()).or_insert(0) += 1;
                    *model
                        .bigrams
                        .entry((prev, token.clone()))
                        .or_insert(0) += 1;
                    prev = token;
                }
            }
        }
        model
    }

    pub fn vocabulary_size(&self) -> usize {
        self.unigrams.len()
    }

    fn probability(&self, prev: &str, token: &str) -> f64 {
        // +1 for the unknown-word slot
        let vocab = self.unigrams.len() as f64 + 1.0;
        let context = self.unigrams.get(prev).copied().unwrap_or(0) as f64;
        let pair = self
            .bigrams
            .get(&(prev.to_string(), token.to_string()))
            .copied()
            .unwrap_or(0) as f64;
        (pair + 1.0) / (context + vocab)
    }
}

impl NgramModel for BigramModel {
    fn typicality(&self, tokens: &[String]) -> f64 {
        if tokens.is_empty() {
            return 1.0;
        }
        let max_entropy = (self.unigrams.len() as f64 + 1.0).ln();
        if max_entropy <= 0.0 {
            return 1.0;
        }

        let mut prev = START;
        let mut log_prob = 0.0;
        for token in tokens {
            log_prob += self.probability(prev, token).ln();
            prev = token.as_str();
        }
        let entropy = -log_prob / tokens.len() as f64;
        (1.0 - entropy / max_entropy).clamp(0.0, 1.0)
    }
}

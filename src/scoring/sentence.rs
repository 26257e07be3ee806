// Sentence scorers — a closed set of heuristics composed per cell.
//
// The summarizer builds one `SentenceScorers` chain per cell (the facet
// labels differ per cell) and adds the summed delta to each sentence's
// TF-IDF score. A chain total at or below DISCARD removes the sentence.

use std::sync::Arc;

use super::ngram::NgramModel;
use super::traits::{Candidate, Scorer};
use super::{sanitize, DISCARD, MAJOR_PENALTY, MINOR_PENALTY};
use crate::config::SummarizerConfig;
use crate::text;

const LEADING_CONJUNCTIONS: &[&str] = &[
    "and", "but", "or", "so", "yet", "nor", "because", "although", "however", "also", "then",
];
const LEADING_PRONOUNS: &[&str] = &[
    "he", "she", "it", "they", "we", "i", "you", "this", "that", "these", "those", "his", "her",
    "their", "its",
];
const REPORTING_VERBS: &[&str] = &[
    "said", "says", "told", "tells", "according", "reported", "added", "stated",
];
const QUOTATION_MARKS: &[char] = &['"', '\'', '“', '”', '„', '‘', '’', '«', '»'];

#[derive(Debug, Clone)]
pub enum SentenceScorer {
    /// MAJOR_PENALTY for sentences shorter than `min_chars` characters.
    Length { min_chars: usize },
    /// MINOR_PENALTY per stylistic signal: leading conjunction, leading
    /// pronoun, reporting verb.
    StigmaWords,
    /// DISCARD for sentences opening with a quotation mark or consisting
    /// only of one of the cell's facet labels.
    Unusable { labels: Vec<Vec<String>> },
    /// MINOR_PENALTY for sentences without any noun or verb.
    PosWeight,
    /// Up to MINOR_PENALTY for sentences atypical of the matrix's text.
    NgramNovelty(Arc<dyn NgramModel>),
}

impl Scorer for SentenceScorer {
    fn score(&self, candidate: &Candidate<'_>) -> f64 {
        match self {
            SentenceScorer::Length { min_chars } => {
                if candidate.text.chars().count() < *min_chars {
                    MAJOR_PENALTY
                } else {
                    0.0
                }
            }
            SentenceScorer::StigmaWords => {
                let mut delta = 0.0;
                if let Some(first) = candidate.tokens.first() {
                    if LEADING_CONJUNCTIONS.contains(&first.as_str()) {
                        delta += MINOR_PENALTY;
                    }
                    if LEADING_PRONOUNS.contains(&first.as_str()) {
                        delta += MINOR_PENALTY;
                    }
                }
                if candidate
                    .tokens
                    .iter()
                    .any(|t| REPORTING_VERBS.contains(&t.as_str()))
                {
                    delta += MINOR_PENALTY;
                }
                delta
            }
            SentenceScorer::Unusable { labels } => {
                let opens_with_quote = candidate
                    .text
                    .trim_start()
                    .starts_with(QUOTATION_MARKS);
                let is_label = labels
                    .iter()
                    .any(|label| !label.is_empty() && label.as_slice() == candidate.tokens);
                if opens_with_quote || is_label {
                    DISCARD
                } else {
                    0.0
                }
            }
            SentenceScorer::PosWeight => {
                if candidate.tags.iter().any(|t| t.is_content()) {
                    0.0
                } else {
                    MINOR_PENALTY
                }
            }
            SentenceScorer::NgramNovelty(model) => {
                MINOR_PENALTY * (1.0 - model.typicality(candidate.tokens))
            }
        }
    }
}

/// The ordered scorer chain applied to every sentence of one cell.
#[derive(Debug, Clone, Default)]
pub struct SentenceScorers {
    scorers: Vec<SentenceScorer>,
}

impl SentenceScorers {
    pub fn new(scorers: Vec<SentenceScorer>) -> Self {
        Self { scorers }
    }

    /// Standard chain for a cell labelled `labels`. The novelty scorer is
    /// wired in only when a model is supplied.
    pub fn for_cell(
        config: &SummarizerConfig,
        labels: &[&str],
        ngram: Option<Arc<dyn NgramModel>>,
    ) -> Self {
        let mut scorers = vec![
            SentenceScorer::Length {
                min_chars: config.min_sentence_chars,
            },
            SentenceScorer::StigmaWords,
            SentenceScorer::Unusable {
                labels: labels.iter().map(|l| text::tokenize(l)).collect(),
            },
            SentenceScorer::PosWeight,
        ];
        if let Some(model) = ngram {
            scorers.push(SentenceScorer::NgramNovelty(model));
        }
        Self { scorers }
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }
}

impl Scorer for SentenceScorers {
    fn score(&self, candidate: &Candidate<'_>) -> f64 {
        sanitize(self.scorers.iter().map(|s| s.score(candidate)).sum())
    }
}

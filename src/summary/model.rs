// Summary data model — what each matrix cell hands to the presentation layer.
//
// Every list is bounded and sorted by score (descending, stable on ties).
// The sentinel summary has exactly the same shape as a real one, so
// consumers never need a separate code path for empty cells.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scoring::sanitize;
use crate::search::DocId;

/// Label used by every entry of the sentinel summary.
pub const NOT_DEFINED: &str = "not defined";

/// A ranked sentence or term with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub text: String,
    pub score: f64,
}

impl Ranked {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score: sanitize(score),
        }
    }

    fn not_defined() -> Self {
        Self::new(NOT_DEFINED, 1.0)
    }
}

/// Summary of one text field of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub top_sentences: Vec<Ranked>,
    pub top_terms: Vec<Ranked>,
    pub top_terms_of_topics: Vec<Ranked>,
    /// Sentence text -> ids of the documents it was taken from.
    pub sentence_doc_ids: BTreeMap<String, Vec<DocId>>,
}

impl Summary {
    pub fn sentinel() -> Self {
        Self {
            top_sentences: vec![Ranked::not_defined()],
            top_terms: vec![Ranked::not_defined()],
            top_terms_of_topics: vec![Ranked::not_defined()],
            sentence_doc_ids: BTreeMap::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }
}

/// Per-field summaries of a cell plus the ids of the documents they were
/// built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summaries {
    pub fields: BTreeMap<String, Summary>,
    pub top_document_ids: Vec<DocId>,
}

impl Summaries {
    /// The "nothing to summarize" result, with an entry for every field.
    pub fn sentinel(fields: &[String]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|f| (f.clone(), Summary::sentinel()))
                .collect(),
            top_document_ids: Vec::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.top_document_ids.is_empty() && self.fields.values().all(Summary::is_sentinel)
    }

    pub fn field(&self, name: &str) -> Option<&Summary> {
        self.fields.get(name)
    }
}

/// Sort candidates by score (descending) and keep the first `k`.
///
/// The sort is stable, so equal scores keep the order in which the
/// candidates were first encountered.
pub fn top_k(candidates: Vec<(String, f64)>, k: usize) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = candidates
        .into_iter()
        .map(|(text, score)| Ranked::new(text, score))
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(k);
    ranked
}

/// Substitute the sentinel entry for an empty list so every list of a
/// real summary stays non-empty.
pub fn or_not_defined(list: Vec<Ranked>) -> Vec<Ranked> {
    if list.is_empty() {
        vec![Ranked::not_defined()]
    } else {
        list
    }
}

// In-memory search engine over a loaded corpus.
//
// Holds every document with per-field term counts and a document-frequency
// table. Queries are evaluated by a linear scan; relevance is the sum of
// TF-IDF contributions of matched `Term` clauses (filters score zero), and
// ties keep corpus order so results are deterministic.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::query::Query;
use super::traits::{idf, DocId, Hit, SearchEngine};
use crate::text;

/// A dated, faceted news document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Facet name -> values (e.g. "country" -> ["DE"]).
    #[serde(default)]
    pub facets: BTreeMap<String, Vec<String>>,
    /// Text field name -> content (e.g. "title", "text").
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

struct IndexedDoc {
    doc: Document,
    term_counts: HashMap<String, HashMap<String, u32>>,
}

pub struct MemoryIndex {
    docs: Vec<IndexedDoc>,
    by_id: HashMap<DocId, usize>,
    doc_freq: HashMap<(String, String), u64>,
}

impl MemoryIndex {
    pub fn new(documents: Vec<Document>) -> Result<Self> {
        let mut docs = Vec::with_capacity(documents.len());
        let mut by_id = HashMap::new();
        let mut doc_freq: HashMap<(String, String), u64> = HashMap::new();

        for doc in documents {
            if by_id.contains_key(&doc.id) {
                anyhow::bail!("Duplicate document id in corpus: {}", doc.id);
            }
            let mut term_counts = HashMap::new();
            for (field, content) in &doc.fields {
                let mut counts: HashMap<String, u32> = HashMap::new();
                for token in text::tokenize(content) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                for term in counts.keys() {
                    *doc_freq.entry((field.clone(), term.clone())).or_insert(0) += 1;
                }
                term_counts.insert(field.clone(), counts);
            }
            by_id.insert(doc.id.clone(), docs.len());
            docs.push(IndexedDoc { doc, term_counts });
        }

        Ok(Self {
            docs,
            by_id,
            doc_freq,
        })
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter().map(|d| &d.doc)
    }

    fn term_doc_freq(&self, field: &str, term: &str) -> u64 {
        self.doc_freq
            .get(&(field.to_string(), term.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Evaluate `query` against one document: `None` if it does not match,
    /// otherwise the relevance contribution.
    fn evaluate(&self, query: &Query, doc: &IndexedDoc) -> Option<f64> {
        match query {
            Query::All => Some(0.0),
            Query::Exact { field, value } => doc
                .doc
                .facets
                .get(field)
                .filter(|values| values.iter().any(|v| v.eq_ignore_ascii_case(value)))
                .map(|_| 0.0),
            Query::Term { field, term } => {
                let tf = doc.term_counts.get(field)?.get(term).copied()?;
                let idf = idf(self.term_doc_freq(field, term), self.docs.len() as u64);
                Some(tf as f64 * idf)
            }
            Query::DateRange { from, to } => {
                let date = doc.doc.date?;
                let after_start = from.map_or(true, |f| date >= f);
                let before_end = to.map_or(true, |t| date <= t);
                (after_start && before_end).then_some(0.0)
            }
            Query::And(clauses) => clauses
                .iter()
                .map(|c| self.evaluate(c, doc))
                .sum::<Option<f64>>(),
            Query::Or {
                clauses,
                min_should_match,
            } => {
                let matched: Vec<f64> = clauses
                    .iter()
                    .filter_map(|c| self.evaluate(c, doc))
                    .collect();
                (matched.len() >= (*min_should_match).max(1)).then(|| matched.iter().sum())
            }
            Query::Boost { query, boost } => self.evaluate(query, doc).map(|s| s * boost),
        }
    }
}

#[async_trait]
impl SearchEngine for MemoryIndex {
    async fn search(&self, query: &Query, limit: Option<usize>) -> Result<Vec<Hit>> {
        let mut hits: Vec<(usize, f64)> = self
            .docs
            .iter()
            .enumerate()
            .filter_map(|(i, doc)| self.evaluate(query, doc).map(|score| (i, score)))
            .collect();

        // Stable sort keeps corpus order among equal scores
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));

        let limit = limit.unwrap_or(hits.len());
        Ok(hits
            .into_iter()
            .take(limit)
            .map(|(i, score)| Hit {
                id: self.docs[i].doc.id.clone(),
                score,
            })
            .collect())
    }

    async fn document_text(&self, id: &str, field: &str) -> Result<Option<String>> {
        let Some(&idx) = self.by_id.get(id) else {
            anyhow::bail!("Unknown document id: {id}");
        };
        Ok(self.docs[idx].doc.fields.get(field).cloned())
    }

    async fn doc_freq(&self, field: &str, term: &str) -> Result<u64> {
        Ok(self.term_doc_freq(field, term))
    }

    async fn num_docs(&self) -> Result<u64> {
        Ok(self.docs.len() as u64)
    }
}

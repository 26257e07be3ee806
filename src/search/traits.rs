// Search engine trait — the retrieval collaborator the core consumes.
//
// The engine is treated as a read-only snapshot for the duration of a run,
// so every method takes `&self` and implementations must tolerate
// concurrent calls from the per-cell worker pool.

use anyhow::Result;
use async_trait::async_trait;

use super::query::Query;

/// Document identifiers are opaque strings assigned by the corpus.
pub type DocId = String;

/// A ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: DocId,
    pub score: f64,
}

#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Execute `query`, returning hits ranked by relevance (highest first).
    /// `limit: None` returns every matching document.
    async fn search(&self, query: &Query, limit: Option<usize>) -> Result<Vec<Hit>>;

    /// Stored text of a document's field, `None` if the field is absent.
    async fn document_text(&self, id: &str, field: &str) -> Result<Option<String>>;

    /// Number of documents whose `field` contains `term`.
    async fn doc_freq(&self, field: &str, term: &str) -> Result<u64>;

    /// Number of documents in the collection.
    async fn num_docs(&self) -> Result<u64>;

    /// Fetch the `field` text of several documents, in the given order.
    /// Documents without the field contribute nothing.
    async fn fetch_texts(&self, ids: &[DocId], field: &str) -> Result<Vec<(DocId, String)>> {
        let mut texts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(text) = self.document_text(id, field).await? {
                texts.push((id.clone(), text));
            }
        }
        Ok(texts)
    }
}

/// Smoothed inverse document frequency, always positive and finite.
pub fn idf(doc_freq: u64, num_docs: u64) -> f64 {
    (1.0 + num_docs as f64 / (1.0 + doc_freq as f64)).ln()
}

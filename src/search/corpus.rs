// Corpus loading — JSON-lines files of dated, faceted documents.
//
// One document per line:
//   {"id":"d1","date":"2020-03-01","facets":{"country":["DE"]},"fields":{"text":"..."}}
// Blank lines and lines starting with '#' are skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use super::memory::Document;

/// Parse JSON-lines corpus content.
pub fn parse_documents(content: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let doc: Document = serde_json::from_str(line)
            .with_context(|| format!("Invalid document on line {}", line_no + 1))?;
        documents.push(doc);
    }
    Ok(documents)
}

/// Read and parse a JSON-lines corpus file.
pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus at {}", path.display()))?;
    let documents = parse_documents(&content)?;
    info!(
        path = %path.display(),
        documents = documents.len(),
        "Loaded corpus"
    );
    Ok(documents)
}

/// Overview of a corpus: size, date span and facet value frequencies.
#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    pub documents: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Facet name -> value -> document count.
    pub facets: BTreeMap<String, BTreeMap<String, usize>>,
    pub fields: BTreeSet<String>,
}

impl CorpusStats {
    pub fn from_documents<'a>(docs: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut stats = CorpusStats::default();
        for doc in docs {
            stats.documents += 1;
            if let Some(date) = doc.date {
                stats.first_date = Some(stats.first_date.map_or(date, |d| d.min(date)));
                stats.last_date = Some(stats.last_date.map_or(date, |d| d.max(date)));
            }
            for (facet, values) in &doc.facets {
                let counts = stats.facets.entry(facet.clone()).or_default();
                for value in values {
                    *counts.entry(value.clone()).or_insert(0) += 1;
                }
            }
            stats.fields.extend(doc.fields.keys().cloned());
        }
        stats
    }
}

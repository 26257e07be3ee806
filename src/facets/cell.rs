// Matrix cells — one per (row value, column value) pair.
//
// Identity and query are fixed when the matrix is built. Later stages
// write their results back: the topic stage sets the mixture, the
// summarizer fills the attribute store.

use std::collections::{BTreeMap, BTreeSet};

use crate::search::{DocId, Query};
use crate::summary::{Ranked, Summaries};
use crate::topics::TopicScore;

/// The kinds of result a pipeline stage can attach to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKind {
    Summaries,
    Synonyms,
    NgramScore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellAttribute {
    Summaries(Summaries),
    /// Terms co-occurring with the cell's labels, best first.
    Synonyms(Vec<Ranked>),
    /// Mean typicality of the cell's selected sentences, in [0, 1].
    NgramScore(f64),
}

impl CellAttribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            CellAttribute::Summaries(_) => AttributeKind::Summaries,
            CellAttribute::Synonyms(_) => AttributeKind::Synonyms,
            CellAttribute::NgramScore(_) => AttributeKind::NgramScore,
        }
    }
}

/// At most one attribute per kind; inserting a kind again replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellAttributes {
    entries: BTreeMap<AttributeKind, CellAttribute>,
}

impl CellAttributes {
    /// Store `attribute`, returning the value it replaced.
    pub fn insert(&mut self, attribute: CellAttribute) -> Option<CellAttribute> {
        self.entries.insert(attribute.kind(), attribute)
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&CellAttribute> {
        self.entries.get(&kind)
    }

    pub fn summaries(&self) -> Option<&Summaries> {
        match self.get(AttributeKind::Summaries) {
            Some(CellAttribute::Summaries(s)) => Some(s),
            _ => None,
        }
    }

    pub fn synonyms(&self) -> Option<&[Ranked]> {
        match self.get(AttributeKind::Synonyms) {
            Some(CellAttribute::Synonyms(terms)) => Some(terms),
            _ => None,
        }
    }

    pub fn ngram_score(&self) -> Option<f64> {
        match self.get(AttributeKind::NgramScore) {
            Some(CellAttribute::NgramScore(score)) => Some(*score),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FilterCell {
    row: usize,
    col: usize,
    row_label: String,
    col_label: String,
    query: Query,
    documents: BTreeSet<DocId>,
    pub(crate) topic_mixture: Vec<TopicScore>,
    pub(crate) attributes: CellAttributes,
}

impl FilterCell {
    pub(crate) fn new(
        (row, row_label): (usize, &str),
        (col, col_label): (usize, &str),
        query: Query,
        documents: BTreeSet<DocId>,
    ) -> Self {
        Self {
            row,
            col,
            row_label: row_label.to_string(),
            col_label: col_label.to_string(),
            query,
            documents,
            topic_mixture: Vec::new(),
            attributes: CellAttributes::default(),
        }
    }

    /// (row index, column index) in dimension order.
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn row_label(&self) -> &str {
        &self.row_label
    }

    pub fn col_label(&self) -> &str {
        &self.col_label
    }

    pub fn labels(&self) -> [&str; 2] {
        [&self.row_label, &self.col_label]
    }

    /// AND(global filter, row predicate, column predicate).
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn documents(&self) -> &BTreeSet<DocId> {
        &self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Empty until topics have been computed, and for cells without
    /// documents or topics.
    pub fn topic_mixture(&self) -> &[TopicScore] {
        &self.topic_mixture
    }

    pub fn attributes(&self) -> &CellAttributes {
        &self.attributes
    }

    pub fn summaries(&self) -> Option<&Summaries> {
        self.attributes.summaries()
    }

    pub(crate) fn set_attribute(&mut self, attribute: CellAttribute) {
        self.attributes.insert(attribute);
    }
}

// Matrix report — the serializable description of one analysis run.
//
// Row and column labels in dimension order, then one entry per cell in
// row-major order. Sentinel summaries serialize in exactly the same shape
// as real ones.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::facets::{FilterCell, TableManager};
use crate::summary::{Ranked, Summaries};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixReport {
    pub generated_at: DateTime<Utc>,
    pub row_dimension: String,
    pub col_dimension: String,
    pub global_filter: String,
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub cells: Vec<CellReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicWeight {
    pub label: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellReport {
    pub row: String,
    pub col: String,
    pub documents: usize,
    pub topics: Vec<TopicWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summaries: Option<Summaries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_terms: Option<Vec<Ranked>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ngram_score: Option<f64>,
}

impl CellReport {
    pub fn from_cell(cell: &FilterCell) -> Self {
        let attributes = cell.attributes();
        Self {
            row: cell.row_label().to_string(),
            col: cell.col_label().to_string(),
            documents: cell.documents().len(),
            topics: cell
                .topic_mixture()
                .iter()
                .map(|s| TopicWeight {
                    label: s.topic.label.clone(),
                    weight: s.weight,
                })
                .collect(),
            summaries: attributes.summaries().cloned(),
            related_terms: attributes.synonyms().map(<[Ranked]>::to_vec),
            ngram_score: attributes.ngram_score(),
        }
    }
}

impl MatrixReport {
    pub fn from_table(table: &TableManager) -> Self {
        Self {
            generated_at: Utc::now(),
            row_dimension: table.rows().name().to_string(),
            col_dimension: table.cols().name().to_string(),
            global_filter: table.global_filter().to_string(),
            rows: table.rows().labels(),
            cols: table.cols().labels(),
            cells: table.cells().iter().map(CellReport::from_cell).collect(),
        }
    }

    pub fn cell(&self, row: &str, col: &str) -> Option<&CellReport> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize matrix report")
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }
}

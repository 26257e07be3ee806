// Matrix manager — builds the rows × columns grid of cells.
//
// Each cell's query is AND(global filter, row predicate, column predicate)
// and its document set is resolved with one search per cell. Cells are
// resolved concurrently; the grid is assembled in dimension order once
// every search has returned. Any failed search fails the whole build.

use std::collections::BTreeSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use super::cell::FilterCell;
use super::filter::FilterDimension;
use crate::config::SummarizerConfig;
use crate::error::{Error, Result};
use crate::output::stage_progress;
use crate::search::{Query, SearchEngine};

#[derive(Debug, Clone)]
pub struct TableManager {
    rows: FilterDimension,
    cols: FilterDimension,
    global_filter: Query,
    /// Row-major: cell (r, c) lives at `r * cols.len() + c`.
    cells: Vec<FilterCell>,
}

impl TableManager {
    /// Compose and resolve every cell of the matrix.
    pub async fn build(
        engine: &dyn SearchEngine,
        rows: FilterDimension,
        cols: FilterDimension,
        global_filter: Query,
        config: &SummarizerConfig,
    ) -> Result<Self> {
        if rows.is_empty() || cols.is_empty() {
            return Err(Error::config("Both matrix dimensions need at least one value"));
        }

        let mut pending = Vec::with_capacity(rows.len() * cols.len());
        for (r, row) in rows.values().iter().enumerate() {
            for (c, col) in cols.values().iter().enumerate() {
                let query = Query::and([
                    global_filter.clone(),
                    row.predicate().clone(),
                    col.predicate().clone(),
                ]);
                pending.push((r, c, query));
            }
        }

        info!(
            rows = rows.len(),
            cols = cols.len(),
            cells = pending.len(),
            "Building matrix"
        );
        let pb = stage_progress(pending.len(), "Resolving cells", config.show_progress);

        let resolved: Vec<Result<(usize, BTreeSet<String>)>> =
            stream::iter(pending.iter().enumerate().map(|(i, (_, _, query))| async move {
                let hits = engine.search(query, None).await.map_err(Error::Retrieval)?;
                debug!(query = %query, documents = hits.len(), "Resolved cell");
                Ok::<_, Error>((i, hits.into_iter().map(|h| h.id).collect()))
            }))
            .buffer_unordered(config.concurrency.max(1))
            .inspect(|_| pb.inc(1))
            .collect()
            .await;
        pb.finish_and_clear();

        let mut documents: Vec<BTreeSet<String>> = vec![BTreeSet::new(); pending.len()];
        for result in resolved {
            let (i, docs) = result?;
            documents[i] = docs;
        }

        let cells: Vec<FilterCell> = pending
            .into_iter()
            .zip(documents)
            .map(|((r, c, query), docs)| {
                FilterCell::new(
                    (r, rows.values()[r].descriptor()),
                    (c, cols.values()[c].descriptor()),
                    query,
                    docs,
                )
            })
            .collect();

        let non_empty = cells.iter().filter(|c| !c.is_empty()).count();
        info!(cells = cells.len(), non_empty, "Matrix built");

        Ok(Self {
            rows,
            cols,
            global_filter,
            cells,
        })
    }

    pub fn rows(&self) -> &FilterDimension {
        &self.rows
    }

    pub fn cols(&self) -> &FilterDimension {
        &self.cols
    }

    pub fn global_filter(&self) -> &Query {
        &self.global_filter
    }

    /// Every cell, row-major in dimension order.
    pub fn cells(&self) -> &[FilterCell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [FilterCell] {
        &mut self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&FilterCell> {
        if row >= self.rows.len() || col >= self.cols.len() {
            return None;
        }
        self.cells.get(row * self.cols.len() + col)
    }

    /// Documents that fall inside the matrix at all: AND(global filter,
    /// any row value, any column value).
    pub fn scope_query(&self) -> Query {
        Query::and([
            self.global_filter.clone(),
            self.rows.any_predicate(),
            self.cols.any_predicate(),
        ])
    }
}

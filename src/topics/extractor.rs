// Topic engine — trains topic models over the matrix and biases cell
// queries toward each cell's dominant theme.
//
// Stage layout:
// 1. Group cells by merge strategy (per cell, per column or per row)
// 2. Fetch the topic field of every document in each group
// 3. Train one model per group on a blocking worker (all groups at once)
// 4. Write each cell's topic mixture back, sequentially
//
// A group whose training yields no topics leaves its cells with an empty
// mixture; their topic query is then the cell query itself.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use super::model::{normalize_masses, Topic, TopicModel, TopicScore};
use super::traits::TopicTrainer;
use crate::config::{MergeStrategy, SummarizerConfig, TopicQueryPolicy};
use crate::error::{Error, Result};
use crate::facets::{FilterCell, TableManager};
use crate::search::{DocId, Query, SearchEngine};

/// One training unit: the cells whose documents were pooled, and the
/// topics learned from them.
#[derive(Debug, Clone)]
pub struct TopicGroup {
    /// Row label, column label, or "row / column" for per-cell groups.
    pub label: String,
    /// Indices into `TableManager::cells()`.
    pub cells: Vec<usize>,
    /// Texts the model was trained on.
    pub documents: usize,
    pub topics: Vec<Arc<Topic>>,
}

#[derive(Debug, Clone)]
pub struct TopicExtractor {
    strategy: MergeStrategy,
    field: String,
    topic_terms: usize,
    policy: TopicQueryPolicy,
    groups: Vec<TopicGroup>,
}

struct PendingGroup {
    label: String,
    cells: Vec<usize>,
    ids: Vec<DocId>,
    texts: Vec<String>,
}

impl TopicExtractor {
    /// Train topics for every merge group and assign each cell its mixture.
    ///
    /// Retrieval failures and trainer failures abort the stage.
    pub async fn compute_topics(
        table: &mut TableManager,
        engine: &dyn SearchEngine,
        trainer: Arc<dyn TopicTrainer>,
        config: &SummarizerConfig,
    ) -> Result<Self> {
        let strategy = config.merge_strategy;
        let field = config.topic_field.as_str();

        let groups = group_cells(table, strategy);
        info!(
            strategy = %strategy,
            groups = groups.len(),
            topics = config.num_topics,
            "Computing topics"
        );

        // Fetch the training text of each group
        let fetched: Vec<Result<PendingGroup>> =
            stream::iter(groups.into_iter().map(|(label, cells)| {
                let ids: Vec<DocId> = cells
                    .iter()
                    .flat_map(|&i| table.cells()[i].documents().iter().cloned())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();
                async move {
                    let pairs = engine
                        .fetch_texts(&ids, field)
                        .await
                        .map_err(Error::Retrieval)?;
                    let (ids, texts) = pairs.into_iter().unzip();
                    Ok::<_, Error>(PendingGroup {
                        label,
                        cells,
                        ids,
                        texts,
                    })
                }
            }))
            .buffered(config.concurrency.max(1))
            .collect()
            .await;
        let pending: Vec<PendingGroup> = fetched.into_iter().collect::<Result<_>>()?;

        // Train every non-empty group on the blocking pool
        let handles = pending
            .iter()
            .filter(|g| !g.texts.is_empty())
            .map(|g| {
                let trainer = Arc::clone(&trainer);
                let texts = g.texts.clone();
                let num_topics = config.num_topics;
                tokio::task::spawn_blocking(move || -> anyhow::Result<TopicModel> {
                    let model = trainer.train(&texts, num_topics)?;
                    if model.assignments.len() != texts.len() {
                        anyhow::bail!(
                            "Topic trainer returned {} assignments for {} texts",
                            model.assignments.len(),
                            texts.len()
                        );
                    }
                    Ok(model)
                })
            });
        let mut trained = Vec::new();
        for joined in future::join_all(handles).await {
            let model = joined
                .map_err(|e| Error::Training(anyhow::Error::from(e)))?
                .map_err(Error::Training)?;
            trained.push(model);
        }
        let mut trained = trained.into_iter();

        // Write back, one group at a time
        let mut groups = Vec::with_capacity(pending.len());
        for group in pending {
            let model = if group.texts.is_empty() {
                TopicModel::empty(0)
            } else {
                trained.next().unwrap_or_default()
            };
            if model.is_empty() {
                debug!(group = %group.label, "No topics for group, cells keep an empty mixture");
            }

            let blob_of: HashMap<&str, usize> = group
                .ids
                .iter()
                .enumerate()
                .map(|(i, id)| (id.as_str(), i))
                .collect();
            for &index in &group.cells {
                let cell = &mut table.cells_mut()[index];
                cell.topic_mixture = cell_mixture(cell, &model, &blob_of);
                debug!(
                    row = cell.row_label(),
                    col = cell.col_label(),
                    topics = cell.topic_mixture.len(),
                    "Assigned topic mixture"
                );
            }

            groups.push(TopicGroup {
                label: group.label,
                cells: group.cells,
                documents: group.texts.len(),
                topics: model.topics,
            });
        }

        let trained_topics: usize = groups.iter().map(|g| g.topics.len()).sum();
        info!(topics = trained_topics, "Topics computed");

        Ok(Self {
            strategy,
            field: config.topic_field.clone(),
            topic_terms: config.topic_terms,
            policy: config.topic_policy.clone(),
            groups,
        })
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    pub fn groups(&self) -> &[TopicGroup] {
        &self.groups
    }

    /// Query biased toward the cell's dominant topic(s).
    ///
    /// Always contains the cell's own query; with an empty mixture it is
    /// exactly the cell query, so it never matches nothing by construction.
    pub fn topic_query_for_cell(&self, cell: &FilterCell) -> Query {
        let mixture = cell.topic_mixture();
        if mixture.is_empty() {
            return cell.query().clone();
        }

        let selected: Vec<&TopicScore> = if self.policy.single_top_topic {
            mixture.iter().take(1).collect()
        } else {
            mixture
                .iter()
                .enumerate()
                .filter(|(i, s)| *i == 0 || s.weight >= self.policy.topic_weight_threshold)
                .map(|(_, s)| s)
                .collect()
        };

        let topic_clauses: Vec<Query> = selected
            .iter()
            .enumerate()
            .filter_map(|(i, score)| self.topic_clause(score, i == 0))
            .collect();
        if topic_clauses.is_empty() {
            return cell.query().clone();
        }

        Query::and([cell.query().clone(), Query::or(topic_clauses, 1)])
    }

    /// Term clauses for one topic, each boosted by P(term) × topic weight.
    fn topic_clause(&self, score: &TopicScore, is_top: bool) -> Option<Query> {
        let terms = score.topic.top_terms(self.topic_terms);
        if terms.is_empty() {
            return None;
        }

        let clauses: Vec<Query> = terms
            .iter()
            .enumerate()
            .map(|(j, (term, p))| {
                let mut boost = p * score.weight;
                if is_top && j == 0 && self.policy.super_boost_top_term {
                    boost *= self.policy.super_boost_factor;
                }
                Query::term(&self.field, term).boosted(boost)
            })
            .collect();

        Some(if self.policy.require_all_terms {
            Query::and(clauses)
        } else {
            Query::or(clauses, self.policy.min_should_match)
        })
    }
}

/// Merge groups as (label, cell indices), in matrix order.
fn group_cells(table: &TableManager, strategy: MergeStrategy) -> Vec<(String, Vec<usize>)> {
    let n_cols = table.cols().len();
    match strategy {
        MergeStrategy::PerCell => table
            .cells()
            .iter()
            .enumerate()
            .map(|(i, cell)| (format!("{} / {}", cell.row_label(), cell.col_label()), vec![i]))
            .collect(),
        MergeStrategy::AcrossRows => table
            .cols()
            .values()
            .iter()
            .enumerate()
            .map(|(c, value)| {
                let cells = (0..table.rows().len()).map(|r| r * n_cols + c).collect();
                (value.descriptor().to_string(), cells)
            })
            .collect(),
        MergeStrategy::AcrossColumns => table
            .rows()
            .values()
            .iter()
            .enumerate()
            .map(|(r, value)| {
                let cells = (0..n_cols).map(|c| r * n_cols + c).collect();
                (value.descriptor().to_string(), cells)
            })
            .collect(),
    }
}

/// Sum the assignments of the cell's own documents and normalize.
fn cell_mixture(
    cell: &FilterCell,
    model: &TopicModel,
    blob_of: &HashMap<&str, usize>,
) -> Vec<TopicScore> {
    if cell.is_empty() || model.is_empty() {
        return Vec::new();
    }

    let mut mass = vec![0.0; model.topics.len()];
    for id in cell.documents() {
        let Some(&blob) = blob_of.get(id.as_str()) else {
            continue;
        };
        for &(topic, weight) in &model.assignments[blob] {
            if let Some(m) = mass.get_mut(topic) {
                *m += weight;
            }
        }
    }

    // A trainer may leave some texts unassigned, and documents without the
    // topic field have no text at all; such cells take the group's mixture.
    let mut weights = normalize_masses(mass.into_iter().enumerate().collect());
    if weights.is_empty() {
        debug!(
            row = cell.row_label(),
            col = cell.col_label(),
            "No topic mass in cell documents, using the group mixture"
        );
        weights = group_mixture(model);
    }

    weights
        .into_iter()
        .map(|(topic, weight)| TopicScore {
            topic: Arc::clone(&model.topics[topic]),
            weight,
        })
        .collect()
}

/// Mixture of the whole training group: the summed assignments, or a
/// uniform distribution when no text carries any topic.
fn group_mixture(model: &TopicModel) -> Vec<(usize, f64)> {
    let mut mass = vec![0.0; model.topics.len()];
    for assignment in &model.assignments {
        for &(topic, weight) in assignment {
            if let Some(m) = mass.get_mut(topic) {
                *m += weight;
            }
        }
    }
    let summed = normalize_masses(mass.into_iter().enumerate().collect());
    if !summed.is_empty() {
        return summed;
    }
    let uniform = 1.0 / model.topics.len() as f64;
    (0..model.topics.len()).map(|i| (i, uniform)).collect()
}

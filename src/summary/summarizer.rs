// Cell summarizer — topic-aware extractive summaries.
//
// For each non-empty cell:
// 1. Refine the cell query with its topic query and fetch the top documents
// 2. Per configured field, rank sentences (TF-IDF + optional position
//    bonus + sentence scorer deltas) and terms (TF-IDF x POS weight +
//    token scorer delta)
// 3. Rank topic terms from the cell's mixture alone
//
// Empty cells and cells whose refined query matches nothing get the
// sentinel summaries. Retrieval errors abort the run.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use super::model::{or_not_defined, top_k, Ranked, Summaries, Summary};
use crate::config::SummarizerConfig;
use crate::error::{Error, Result};
use crate::facets::{CellAttribute, FilterCell, TableManager};
use crate::output::stage_progress;
use crate::scoring::ngram::NgramModel;
use crate::scoring::pos::{pos_weight, PosTag, PosTagger};
use crate::scoring::sentence::SentenceScorers;
use crate::scoring::token::TokenScorer;
use crate::scoring::traits::{Candidate, Scorer};
use crate::scoring::{is_discarded, sanitize};
use crate::search::{idf, DocId, Query, SearchEngine};
use crate::text;
use crate::topics::{TopicExtractor, TopicScore};

pub struct Summarizer<'a> {
    engine: &'a dyn SearchEngine,
    topics: &'a TopicExtractor,
    tagger: &'a dyn PosTagger,
    ngram: Option<Arc<dyn NgramModel>>,
    config: &'a SummarizerConfig,
}

/// One sentence of a fetched document, tokenized and tagged.
struct ParsedSentence {
    doc_id: DocId,
    position: usize,
    text: String,
    tokens: Vec<String>,
    tags: Vec<PosTag>,
}

/// Term frequencies over the fetched documents, in first-seen order.
#[derive(Default)]
struct TermStats {
    order: Vec<String>,
    counts: HashMap<String, (u32, PosTag)>,
}

impl TermStats {
    fn from_sentences(sentences: &[ParsedSentence]) -> Self {
        let mut stats = TermStats::default();
        for sentence in sentences {
            for (token, tag) in sentence.tokens.iter().zip(&sentence.tags) {
                if !text::is_content_term(token) {
                    continue;
                }
                match stats.counts.get_mut(token) {
                    Some((count, _)) => *count += 1,
                    None => {
                        stats.order.push(token.clone());
                        stats.counts.insert(token.clone(), (1, *tag));
                    }
                }
            }
        }
        stats
    }

    fn count(&self, term: &str) -> u32 {
        self.counts.get(term).map_or(0, |(n, _)| *n)
    }
}

impl<'a> Summarizer<'a> {
    pub fn new(
        engine: &'a dyn SearchEngine,
        topics: &'a TopicExtractor,
        tagger: &'a dyn PosTagger,
        config: &'a SummarizerConfig,
    ) -> Self {
        Self {
            engine,
            topics,
            tagger,
            ngram: None,
            config,
        }
    }

    /// Demote atypical sentences with `model` and record each cell's mean
    /// typicality.
    pub fn with_ngram(mut self, model: Arc<dyn NgramModel>) -> Self {
        self.ngram = Some(model);
        self
    }

    /// Summarize every cell and attach the results. Cells are processed
    /// concurrently; results are written back only after all succeeded.
    pub async fn summarize_matrix(&self, table: &mut TableManager) -> Result<()> {
        let cells = table.cells();
        info!(cells = cells.len(), "Summarizing cells");
        let pb = stage_progress(cells.len(), "Summarizing", self.config.show_progress);

        let results: Vec<Result<(usize, Vec<CellAttribute>)>> =
            stream::iter(cells.iter().enumerate().map(|(i, cell)| async move {
                let attributes = self.compute_summary(cell).await?;
                Ok::<_, Error>((i, attributes))
            }))
            .buffer_unordered(self.config.concurrency.max(1))
            .inspect(|_| pb.inc(1))
            .collect()
            .await;
        pb.finish_and_clear();

        let results: Vec<(usize, Vec<CellAttribute>)> =
            results.into_iter().collect::<Result<_>>()?;
        let mut sentinel_cells = 0;
        for (i, attributes) in results {
            let cell = &mut table.cells_mut()[i];
            for attribute in attributes {
                if let CellAttribute::Summaries(s) = &attribute {
                    if s.is_sentinel() {
                        sentinel_cells += 1;
                    }
                }
                cell.set_attribute(attribute);
            }
        }

        info!(cells = table.cells().len(), sentinel_cells, "Summaries computed");
        Ok(())
    }

    /// Compute the attributes of one cell: always its `Summaries`, plus
    /// related terms and n-gram score when enabled.
    pub async fn compute_summary(&self, cell: &FilterCell) -> Result<Vec<CellAttribute>> {
        let sentinel =
            || vec![CellAttribute::Summaries(Summaries::sentinel(&self.config.fields))];

        if cell.is_empty() {
            debug!(row = cell.row_label(), col = cell.col_label(), "Empty cell");
            return Ok(sentinel());
        }

        let final_query = Query::and([
            cell.query().clone(),
            self.topics.topic_query_for_cell(cell),
        ]);
        let hits = self
            .engine
            .search(&final_query, Some(self.config.max_documents))
            .await
            .map_err(Error::Retrieval)?;
        if hits.is_empty() {
            debug!(
                row = cell.row_label(),
                col = cell.col_label(),
                query = %final_query,
                "Topic query matched nothing, using sentinel summary"
            );
            return Ok(sentinel());
        }
        let ids: Vec<DocId> = hits.into_iter().map(|h| h.id).collect();
        let num_docs = self.engine.num_docs().await.map_err(Error::Retrieval)?;

        let labels = cell.labels();
        let scorers = SentenceScorers::for_cell(self.config, &labels, self.ngram.clone());
        let token_scorer = TokenScorer::new(&labels);
        let topic_terms = rank_topic_terms(cell.topic_mixture(), self.config.max_terms);

        let mut fields = BTreeMap::new();
        let mut related: Vec<(String, f64)> = Vec::new();
        let mut typicality = Vec::new();

        for field in &self.config.fields {
            let texts = self
                .engine
                .fetch_texts(&ids, field)
                .await
                .map_err(Error::Retrieval)?;
            let sentences = self.parse_sentences(&texts);
            let stats = TermStats::from_sentences(&sentences);
            let idf = self.idf_table(field, &stats, num_docs).await?;

            let summary = self.field_summary(
                &sentences,
                &stats,
                &idf,
                (&scorers, &token_scorer),
                &topic_terms,
            );

            if self.config.related_terms {
                related.extend(related_terms(&sentences, &idf, &token_scorer));
            }
            if let Some(model) = &self.ngram {
                for top in &summary.top_sentences {
                    if let Some(s) = sentences.iter().find(|s| s.text == top.text) {
                        typicality.push(model.typicality(&s.tokens));
                    }
                }
            }

            fields.insert(field.clone(), summary);
        }

        debug!(
            row = cell.row_label(),
            col = cell.col_label(),
            documents = ids.len(),
            "Summarized cell"
        );

        let mut attributes = vec![CellAttribute::Summaries(Summaries {
            fields,
            top_document_ids: ids,
        })];
        if self.config.related_terms {
            attributes.push(CellAttribute::Synonyms(merge_related(related, self.config.max_terms)));
        }
        if self.ngram.is_some() && !typicality.is_empty() {
            let mean = typicality.iter().sum::<f64>() / typicality.len() as f64;
            attributes.push(CellAttribute::NgramScore(sanitize(mean)));
        }
        Ok(attributes)
    }

    fn parse_sentences(&self, texts: &[(DocId, String)]) -> Vec<ParsedSentence> {
        let mut parsed = Vec::new();
        for (doc_id, content) in texts {
            for (position, sentence) in text::split_sentences(content).into_iter().enumerate() {
                let tokens = text::tokenize(&sentence);
                let tags = self.tagger.tag(&tokens);
                parsed.push(ParsedSentence {
                    doc_id: doc_id.clone(),
                    position,
                    text: sentence,
                    tokens,
                    tags,
                });
            }
        }
        parsed
    }

    /// IDF of every term seen in the fetched documents, from collection
    /// statistics.
    async fn idf_table(
        &self,
        field: &str,
        stats: &TermStats,
        num_docs: u64,
    ) -> Result<HashMap<String, f64>> {
        let mut table = HashMap::with_capacity(stats.order.len());
        for term in &stats.order {
            let df = self
                .engine
                .doc_freq(field, term)
                .await
                .map_err(Error::Retrieval)?;
            table.insert(term.clone(), idf(df, num_docs));
        }
        Ok(table)
    }

    fn field_summary(
        &self,
        sentences: &[ParsedSentence],
        stats: &TermStats,
        idf: &HashMap<String, f64>,
        (scorers, token_scorer): (&SentenceScorers, &TokenScorer),
        topic_terms: &[Ranked],
    ) -> Summary {
        let weight = |term: &str| stats.count(term) as f64 * idf.get(term).copied().unwrap_or(0.0);

        // Sentences: deduplicated by text, best score kept, sources merged
        let mut scored: Vec<(String, f64)> = Vec::new();
        let mut index_of: HashMap<&str, usize> = HashMap::new();
        let mut sources: HashMap<&str, Vec<DocId>> = HashMap::new();
        for sentence in sentences {
            let candidate = Candidate {
                text: &sentence.text,
                tokens: &sentence.tokens,
                tags: &sentence.tags,
            };
            let delta = scorers.score(&candidate);
            if is_discarded(delta) {
                continue;
            }

            let content: Vec<f64> = sentence
                .tokens
                .iter()
                .filter(|t| text::is_content_term(t))
                .map(|t| weight(t.as_str()))
                .collect();
            let mut score = if content.is_empty() {
                0.0
            } else {
                content.iter().sum::<f64>() / content.len() as f64
            };
            if self.config.position_bonus {
                score += self.config.position_multiplier / (sentence.position + 1) as f64;
            }
            score = sanitize(score + delta);

            let ids = sources.entry(sentence.text.as_str()).or_default();
            if !ids.contains(&sentence.doc_id) {
                ids.push(sentence.doc_id.clone());
            }
            match index_of.get(sentence.text.as_str()) {
                Some(&i) => scored[i].1 = scored[i].1.max(score),
                None => {
                    index_of.insert(sentence.text.as_str(), scored.len());
                    scored.push((sentence.text.clone(), score));
                }
            }
        }
        let top_sentences = top_k(scored, self.config.max_sentences);

        // Terms: TF-IDF weighted by the POS prior, label terms discarded
        let terms: Vec<(String, f64)> = stats
            .order
            .iter()
            .filter_map(|term| {
                let delta = token_scorer.score(term);
                if is_discarded(delta) {
                    return None;
                }
                let tag = stats.counts.get(term).map_or(PosTag::Other, |(_, tag)| *tag);
                Some((term.clone(), weight(term.as_str()) * pos_weight(tag) + delta))
            })
            .collect();
        let top_terms = top_k(terms, self.config.max_terms);

        let sentence_doc_ids = if self.config.record_sentence_sources {
            top_sentences
                .iter()
                .filter_map(|s| {
                    sources
                        .get(s.text.as_str())
                        .map(|ids| (s.text.clone(), ids.clone()))
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        Summary {
            top_sentences: or_not_defined(top_sentences),
            top_terms: or_not_defined(top_terms),
            top_terms_of_topics: or_not_defined(topic_terms.to_vec()),
            sentence_doc_ids,
        }
    }
}

/// score(term) = sum over the mixture of weight(topic) x P(term | topic).
/// Depends on the mixture only, never on the fetched documents.
pub fn rank_topic_terms(mixture: &[TopicScore], k: usize) -> Vec<Ranked> {
    let mut order: Vec<(String, f64)> = Vec::new();
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    for score in mixture {
        for (term, p) in &score.topic.terms {
            let contribution = score.weight * p;
            match index_of.get(term.as_str()) {
                Some(&i) => order[i].1 += contribution,
                None => {
                    index_of.insert(term.as_str(), order.len());
                    order.push((term.clone(), contribution));
                }
            }
        }
    }
    top_k(order, k)
}

/// Terms sharing a sentence with one of the cell's label words, scored by
/// co-occurrence count x IDF.
fn related_terms(
    sentences: &[ParsedSentence],
    idf: &HashMap<String, f64>,
    token_scorer: &TokenScorer,
) -> Vec<(String, f64)> {
    let mut order: Vec<(String, f64)> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();
    for sentence in sentences {
        if !sentence.tokens.iter().any(|t| token_scorer.is_label(t)) {
            continue;
        }
        for token in &sentence.tokens {
            if !text::is_content_term(token) || is_discarded(token_scorer.score(token)) {
                continue;
            }
            let contribution = idf.get(token).copied().unwrap_or(0.0);
            match index_of.get(token) {
                Some(&i) => order[i].1 += contribution,
                None => {
                    index_of.insert(token.clone(), order.len());
                    order.push((token.clone(), contribution));
                }
            }
        }
    }
    order
}

/// Fold per-field related terms together and keep the best `k`.
fn merge_related(related: Vec<(String, f64)>, k: usize) -> Vec<Ranked> {
    let mut merged: Vec<(String, f64)> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();
    for (term, score) in related {
        match index_of.get(&term) {
            Some(&i) => merged[i].1 += score,
            None => {
                index_of.insert(term.clone(), merged.len());
                merged.push((term, score));
            }
        }
    }
    top_k(merged, k)
}

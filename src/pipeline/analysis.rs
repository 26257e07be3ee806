// Analysis pipeline: matrix -> topics -> summaries.
//
// Each stage completes for every cell before the next one starts:
// 1. Build the matrix (one search per cell)
// 2. Train topics and assign each cell its mixture
// 3. Optionally train the bigram model over the matrix's in-scope text
// 4. Summarize every cell and attach the results
//
// A run either returns a fully populated matrix (sentinel cells included)
// or a single error. Nothing from a failed run is exposed.

use std::sync::Arc;

use tracing::info;

use crate::config::SummarizerConfig;
use crate::error::{Error, Result};
use crate::facets::{FilterDimension, TableManager};
use crate::output::MatrixReport;
use crate::scoring::ngram::{BigramModel, NgramModel};
use crate::scoring::pos::PosTagger;
use crate::search::{DocId, Query, SearchEngine};
use crate::summary::Summarizer;
use crate::topics::{TopicExtractor, TopicTrainer};

/// What to cross-tabulate: two dimensions and the filter every cell shares.
#[derive(Debug, Clone)]
pub struct MatrixRequest {
    pub rows: FilterDimension,
    pub cols: FilterDimension,
    /// `Query::All` when nothing is filtered out.
    pub global_filter: Query,
}

/// Everything one run produced. Private to the run that built it.
#[derive(Debug)]
pub struct Analysis {
    pub table: TableManager,
    pub topics: TopicExtractor,
    pub report: MatrixReport,
}

/// Build the matrix and compute topics, without summarizing.
pub async fn build_topics(
    engine: &dyn SearchEngine,
    trainer: Arc<dyn TopicTrainer>,
    request: MatrixRequest,
    config: &SummarizerConfig,
) -> Result<(TableManager, TopicExtractor)> {
    config.validate()?;

    let mut table = TableManager::build(
        engine,
        request.rows,
        request.cols,
        request.global_filter,
        config,
    )
    .await?;
    let topics = TopicExtractor::compute_topics(&mut table, engine, trainer, config).await?;
    Ok((table, topics))
}

/// Run the full analysis.
pub async fn run(
    engine: &dyn SearchEngine,
    trainer: Arc<dyn TopicTrainer>,
    tagger: &dyn PosTagger,
    request: MatrixRequest,
    config: &SummarizerConfig,
) -> Result<Analysis> {
    let (mut table, topics) = build_topics(engine, trainer, request, config).await?;

    let mut summarizer = Summarizer::new(engine, &topics, tagger, config);
    if config.ngram_novelty {
        let model = train_ngram_model(engine, &table, config).await?;
        summarizer = summarizer.with_ngram(model);
    }
    summarizer.summarize_matrix(&mut table).await?;

    let report = MatrixReport::from_table(&table);
    info!(
        rows = report.rows.len(),
        cols = report.cols.len(),
        "Analysis complete"
    );

    Ok(Analysis {
        table,
        topics,
        report,
    })
}

/// Train the bigram model over every document inside the matrix.
async fn train_ngram_model(
    engine: &dyn SearchEngine,
    table: &TableManager,
    config: &SummarizerConfig,
) -> Result<Arc<dyn NgramModel>> {
    let scope = table.scope_query();
    let hits = engine.search(&scope, None).await.map_err(Error::Retrieval)?;
    let ids: Vec<DocId> = hits.into_iter().map(|h| h.id).collect();
    let texts = engine
        .fetch_texts(&ids, &config.topic_field)
        .await
        .map_err(Error::Retrieval)?;

    let model = tokio::task::spawn_blocking(move || {
        BigramModel::train(texts.iter().map(|(_, text)| text.as_str()))
    })
    .await
    .map_err(|e| Error::Training(anyhow::Error::from(e)))?;

    info!(
        documents = ids.len(),
        vocabulary = model.vocabulary_size(),
        "Trained bigram model"
    );
    Ok(Arc::new(model))
}

// Unit tests for the cell summarizer.
//
// Tests the sentinel paths (empty cell, over-narrowed topic query), the
// position bonus, sentence provenance, topic-term ranking, the optional
// attributes and retrieval failures during summarization.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use facetmap::error::Error;
use facetmap::facets::{AttributeKind, CellAttribute, FilterDimension, TableManager};
use facetmap::scoring::ngram::{BigramModel, NgramModel};
use facetmap::scoring::pos::LexiconTagger;
use facetmap::search::{Document, Hit, MemoryIndex, Query, SearchEngine};
use facetmap::summary::summarizer::rank_topic_terms;
use facetmap::summary::{Summaries, Summarizer, NOT_DEFINED};
use facetmap::topics::{Topic, TopicExtractor, TopicModel, TopicScore, TopicTrainer};
use facetmap::SummarizerConfig;

const FIRST_A: &str = "Regional health officials postponed routine surgery this week.";
const FIRST_B: &str = "Vaccination centres in Hamburg extended their opening hours.";
const SHARED: &str = "Intensive care units across Bavaria reached capacity.";

fn doc(id: &str, country: &str, text: &str) -> Document {
    Document {
        id: id.to_string(),
        date: NaiveDate::from_ymd_opt(2021, 11, 20),
        facets: BTreeMap::from([
            ("country".to_string(), vec![country.to_string()]),
            ("topic".to_string(), vec!["health".to_string()]),
        ]),
        fields: BTreeMap::from([("text".to_string(), text.to_string())]),
    }
}

fn corpus() -> MemoryIndex {
    MemoryIndex::new(vec![
        doc("a", "DE", &format!("{FIRST_A} {SHARED}")),
        doc("b", "DE", &format!("{FIRST_B} {SHARED}")),
        doc("c", "AT", "Ski resorts in Tyrol closed their lifts early."),
    ])
    .unwrap()
}

/// Never finds any topic, so topic queries are the cell queries.
struct BarrenTrainer;

impl TopicTrainer for BarrenTrainer {
    fn train(&self, texts: &[String], _num_topics: usize) -> anyhow::Result<TopicModel> {
        Ok(TopicModel::empty(texts.len()))
    }
}

/// Assigns every text to one fixed topic.
struct FixedTrainer(Vec<(&'static str, f64)>);

impl TopicTrainer for FixedTrainer {
    fn train(&self, texts: &[String], _num_topics: usize) -> anyhow::Result<TopicModel> {
        let topic = Topic {
            label: self.0[0].0.to_string(),
            terms: self.0.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
        };
        Ok(TopicModel {
            topics: vec![Arc::new(topic)],
            assignments: vec![vec![(0, 1.0)]; texts.len()],
        })
    }
}

/// Searches like the wrapped index but cannot load document text.
struct TextlessEngine(MemoryIndex);

#[async_trait]
impl SearchEngine for TextlessEngine {
    async fn search(&self, query: &Query, limit: Option<usize>) -> Result<Vec<Hit>> {
        self.0.search(query, limit).await
    }

    async fn document_text(&self, _id: &str, _field: &str) -> Result<Option<String>> {
        anyhow::bail!("document store unavailable")
    }

    async fn doc_freq(&self, field: &str, term: &str) -> Result<u64> {
        self.0.doc_freq(field, term).await
    }

    async fn num_docs(&self) -> Result<u64> {
        self.0.num_docs().await
    }
}

async fn prepared(
    index: &MemoryIndex,
    trainer: Arc<dyn TopicTrainer>,
    config: &SummarizerConfig,
) -> (TableManager, TopicExtractor) {
    let mut table = TableManager::build(
        index,
        FilterDimension::parse("country=DE,FR").unwrap(),
        FilterDimension::parse("topic=health").unwrap(),
        Query::All,
        config,
    )
    .await
    .unwrap();
    let topics = TopicExtractor::compute_topics(&mut table, index, trainer, config)
        .await
        .unwrap();
    (table, topics)
}

fn summaries_of(attributes: &[CellAttribute]) -> &Summaries {
    attributes
        .iter()
        .find_map(|a| match a {
            CellAttribute::Summaries(s) => Some(s),
            _ => None,
        })
        .expect("summaries are always attached")
}

// ============================================================
// Sentinel paths
// ============================================================

#[tokio::test]
async fn empty_cell_gets_a_sentinel_for_every_field() {
    let index = corpus();
    let config = SummarizerConfig {
        fields: vec!["text".to_string(), "title".to_string()],
        ..SummarizerConfig::default()
    };
    let (table, topics) = prepared(&index, Arc::new(BarrenTrainer), &config).await;
    let summarizer = Summarizer::new(&index, &topics, &LexiconTagger, &config);

    let fr = table.cell(1, 0).unwrap();
    assert!(fr.is_empty());
    let attributes = summarizer.compute_summary(fr).await.unwrap();
    assert_eq!(attributes.len(), 1);

    let summaries = summaries_of(&attributes);
    assert!(summaries.is_sentinel());
    assert_eq!(summaries.fields.len(), 2);
    for summary in summaries.fields.values() {
        assert_eq!(summary.top_sentences[0].text, NOT_DEFINED);
        assert_eq!(summary.top_terms.len(), 1);
    }
}

#[tokio::test]
async fn over_narrowed_topic_query_gets_the_sentinel() {
    let index = corpus();
    let mut config = SummarizerConfig::default();
    config.topic_policy.require_all_terms = true;
    let trainer = Arc::new(FixedTrainer(vec![("zeppelin", 0.7), ("airship", 0.3)]));
    let (table, topics) = prepared(&index, trainer, &config).await;
    let summarizer = Summarizer::new(&index, &topics, &LexiconTagger, &config);

    let de = table.cell(0, 0).unwrap();
    assert_eq!(de.documents().len(), 2);
    assert!(!de.topic_mixture().is_empty());

    let attributes = summarizer.compute_summary(de).await.unwrap();
    assert!(summaries_of(&attributes).is_sentinel());
}

// ============================================================
// Sentence ranking
// ============================================================

#[tokio::test]
async fn position_bonus_favours_opening_sentences() {
    let index = corpus();
    let config = SummarizerConfig {
        position_bonus: true,
        ..SummarizerConfig::default()
    };
    let (table, topics) = prepared(&index, Arc::new(BarrenTrainer), &config).await;
    let summarizer = Summarizer::new(&index, &topics, &LexiconTagger, &config);

    let attributes = summarizer.compute_summary(table.cell(0, 0).unwrap()).await.unwrap();
    let summary = summaries_of(&attributes).field("text").unwrap();

    let mut leading: Vec<&str> = summary.top_sentences[..2]
        .iter()
        .map(|s| s.text.as_str())
        .collect();
    leading.sort_unstable();
    assert_eq!(leading, vec![FIRST_A, FIRST_B]);
    assert!(summary.top_sentences[0].score >= config.position_multiplier);
    assert_eq!(summary.top_sentences[2].text, SHARED);
    assert!(summary.top_sentences[2].score < config.position_multiplier);
}

#[tokio::test]
async fn repeated_sentences_merge_their_sources() {
    let index = corpus();
    let config = SummarizerConfig::default();
    let (table, topics) = prepared(&index, Arc::new(BarrenTrainer), &config).await;
    let summarizer = Summarizer::new(&index, &topics, &LexiconTagger, &config);

    let attributes = summarizer.compute_summary(table.cell(0, 0).unwrap()).await.unwrap();
    let summary = summaries_of(&attributes).field("text").unwrap();

    assert_eq!(summary.top_sentences.len(), 3);
    let occurrences = summary
        .top_sentences
        .iter()
        .filter(|s| s.text == SHARED)
        .count();
    assert_eq!(occurrences, 1);

    let mut sources = summary.sentence_doc_ids[SHARED].clone();
    sources.sort_unstable();
    assert_eq!(sources, vec!["a", "b"]);
    assert_eq!(summary.sentence_doc_ids[FIRST_A], vec!["a"]);
}

#[tokio::test]
async fn sentence_sources_can_be_switched_off() {
    let index = corpus();
    let config = SummarizerConfig {
        record_sentence_sources: false,
        ..SummarizerConfig::default()
    };
    let (table, topics) = prepared(&index, Arc::new(BarrenTrainer), &config).await;
    let summarizer = Summarizer::new(&index, &topics, &LexiconTagger, &config);

    let attributes = summarizer.compute_summary(table.cell(0, 0).unwrap()).await.unwrap();
    let summary = summaries_of(&attributes).field("text").unwrap();
    assert!(summary.sentence_doc_ids.is_empty());
    assert_ne!(summary.top_sentences[0].text, NOT_DEFINED);
}

// ============================================================
// Terms
// ============================================================

#[tokio::test]
async fn cell_labels_are_never_top_terms() {
    let index = corpus();
    let config = SummarizerConfig::default();
    let (table, topics) = prepared(&index, Arc::new(BarrenTrainer), &config).await;
    let summarizer = Summarizer::new(&index, &topics, &LexiconTagger, &config);

    let attributes = summarizer.compute_summary(table.cell(0, 0).unwrap()).await.unwrap();
    let summary = summaries_of(&attributes).field("text").unwrap();
    assert!(summary.top_terms.len() > 1);
    assert!(summary.top_terms.iter().all(|t| t.text != "health" && t.text != "de"));
    assert!(summary.top_terms.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn topic_terms_come_from_the_mixture() {
    let index = corpus();
    let config = SummarizerConfig::default();
    let trainer = Arc::new(FixedTrainer(vec![("capacity", 0.6), ("hospitals", 0.4)]));
    let (table, topics) = prepared(&index, trainer, &config).await;
    let summarizer = Summarizer::new(&index, &topics, &LexiconTagger, &config);

    let de = table.cell(0, 0).unwrap();
    let attributes = summarizer.compute_summary(de).await.unwrap();
    let summary = summaries_of(&attributes).field("text").unwrap();

    let terms: Vec<(&str, f64)> = summary
        .top_terms_of_topics
        .iter()
        .map(|t| (t.text.as_str(), t.score))
        .collect();
    assert_eq!(terms, vec![("capacity", 0.6), ("hospitals", 0.4)]);
    assert_eq!(summary.top_terms_of_topics, rank_topic_terms(de.topic_mixture(), config.max_terms));
}

#[test]
fn shared_topic_terms_accumulate_weight() {
    let topic = |terms: &[(&str, f64)]| {
        Arc::new(Topic {
            label: terms[0].0.to_string(),
            terms: terms.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
        })
    };
    let mixture = vec![
        TopicScore {
            topic: topic(&[("vaccine", 0.5), ("hospital", 0.5)]),
            weight: 0.6,
        },
        TopicScore {
            topic: topic(&[("school", 0.75), ("hospital", 0.25)]),
            weight: 0.4,
        },
    ];
    let ranked = rank_topic_terms(&mixture, 2);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].text, "hospital");
    assert!((ranked[0].score - 0.4).abs() < 1e-12);
    assert_eq!(ranked[1].text, "vaccine");
    assert!((ranked[1].score - 0.3).abs() < 1e-12);
}

// ============================================================
// Optional attributes
// ============================================================

#[tokio::test]
async fn related_terms_and_ngram_score_are_opt_in() {
    let index = corpus();
    let config = SummarizerConfig {
        related_terms: true,
        ..SummarizerConfig::default()
    };
    let (table, topics) = prepared(&index, Arc::new(BarrenTrainer), &config).await;
    let model: Arc<dyn NgramModel> = Arc::new(BigramModel::train([FIRST_A, FIRST_B, SHARED]));
    let summarizer =
        Summarizer::new(&index, &topics, &LexiconTagger, &config).with_ngram(model);

    let attributes = summarizer.compute_summary(table.cell(0, 0).unwrap()).await.unwrap();
    let kinds: Vec<AttributeKind> = attributes.iter().map(CellAttribute::kind).collect();
    assert!(kinds.contains(&AttributeKind::Summaries));
    assert!(kinds.contains(&AttributeKind::Synonyms));
    assert!(kinds.contains(&AttributeKind::NgramScore));

    for attribute in &attributes {
        match attribute {
            CellAttribute::Synonyms(terms) => {
                // co-occurs with the "health" label in the first sentence of "a"
                assert!(terms.iter().any(|t| t.text == "officials"));
                assert!(terms.iter().all(|t| t.text != "health"));
            }
            CellAttribute::NgramScore(score) => assert!((0.0..=1.0).contains(score)),
            CellAttribute::Summaries(_) => {}
        }
    }
}

#[tokio::test]
async fn summarize_matrix_attaches_summaries_to_every_cell() {
    let index = corpus();
    let config = SummarizerConfig::default();
    let (mut table, topics) = prepared(&index, Arc::new(BarrenTrainer), &config).await;
    let summarizer = Summarizer::new(&index, &topics, &LexiconTagger, &config);
    summarizer.summarize_matrix(&mut table).await.unwrap();

    assert!(!table.cell(0, 0).unwrap().summaries().unwrap().is_sentinel());
    assert!(table.cell(1, 0).unwrap().summaries().unwrap().is_sentinel());
    assert!(table.cells().iter().all(|c| c.attributes().synonyms().is_none()));
}

// ============================================================
// Failures
// ============================================================

#[tokio::test]
async fn text_retrieval_failure_aborts_summarization() {
    let index = corpus();
    let config = SummarizerConfig::default();
    let (mut table, topics) = prepared(&index, Arc::new(BarrenTrainer), &config).await;

    let engine = TextlessEngine(corpus());
    let summarizer = Summarizer::new(&engine, &topics, &LexiconTagger, &config);
    match summarizer.summarize_matrix(&mut table).await {
        Err(Error::Retrieval(e)) => assert!(e.to_string().contains("document store")),
        other => panic!("expected a retrieval error, got {other:?}"),
    }
    // Nothing is written back on failure
    assert!(table.cells().iter().all(|c| c.summaries().is_none()));
}

use std::env;
use std::str::FromStr;

use crate::error::{Error, Result};

/// How documents are grouped for topic training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// One topic model per cell (default).
    #[default]
    PerCell,
    /// One model per column, trained over every row of that column.
    AcrossRows,
    /// One model per row, trained over every column of that row.
    AcrossColumns,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::PerCell => "per-cell",
            MergeStrategy::AcrossRows => "across-rows",
            MergeStrategy::AcrossColumns => "across-columns",
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "per-cell" | "cell" => Ok(MergeStrategy::PerCell),
            "across-rows" | "rows" => Ok(MergeStrategy::AcrossRows),
            "across-columns" | "columns" | "cols" => Ok(MergeStrategy::AcrossColumns),
            other => Err(Error::config(format!(
                "Unknown merge strategy '{other}' (expected per-cell, across-rows or across-columns)"
            ))),
        }
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Knobs for building a cell's topic query. They are independent: the
/// super-boost applies whether terms are required all-or-any.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicQueryPolicy {
    /// Use only the highest-weight topic. When false, every topic whose
    /// weight reaches `topic_weight_threshold` contributes (the top topic
    /// always does).
    pub single_top_topic: bool,
    pub topic_weight_threshold: f64,
    /// Multiply the boost of the single most probable term by
    /// `super_boost_factor`.
    pub super_boost_top_term: bool,
    pub super_boost_factor: f64,
    /// Require every top term (AND) instead of at least `min_should_match`.
    pub require_all_terms: bool,
    pub min_should_match: usize,
}

impl Default for TopicQueryPolicy {
    fn default() -> Self {
        Self {
            single_top_topic: true,
            topic_weight_threshold: 0.2,
            super_boost_top_term: false,
            super_boost_factor: 10.0,
            require_all_terms: false,
            min_should_match: 1,
        }
    }
}

/// Immutable configuration for one analysis run, threaded through every
/// stage. Built once (defaults, then environment, then CLI flags) and
/// validated before any retrieval happens.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizerConfig {
    /// Text fields that get a summary each.
    pub fields: Vec<String>,
    /// Text field the topic models are trained on.
    pub topic_field: String,
    pub num_topics: usize,
    pub merge_strategy: MergeStrategy,
    /// Number of top terms per topic used in the topic query (M).
    pub topic_terms: usize,
    pub topic_policy: TopicQueryPolicy,
    /// Documents fetched per cell for summarization (K_docs).
    pub max_documents: usize,
    /// Sentences kept per field (K_sent).
    pub max_sentences: usize,
    /// Terms kept per field, for both term lists (K_term).
    pub max_terms: usize,
    /// Favour sentences that occur early in their source document.
    pub position_bonus: bool,
    /// Scale of the position bonus relative to TF-IDF scores.
    pub position_multiplier: f64,
    /// Sentences shorter than this get MAJOR_PENALTY.
    pub min_sentence_chars: usize,
    /// Train a bigram model over the in-scope text and demote atypical
    /// sentences.
    pub ngram_novelty: bool,
    /// Store terms co-occurring with the cell labels as the cell's
    /// synonyms attribute.
    pub related_terms: bool,
    /// Record which documents each top sentence came from.
    pub record_sentence_sources: bool,
    /// Cells processed concurrently during retrieval stages.
    pub concurrency: usize,
    pub show_progress: bool,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            fields: vec!["text".to_string()],
            topic_field: "text".to_string(),
            num_topics: 5,
            merge_strategy: MergeStrategy::PerCell,
            topic_terms: 5,
            topic_policy: TopicQueryPolicy::default(),
            max_documents: 30,
            max_sentences: 30,
            max_terms: 40,
            position_bonus: false,
            position_multiplier: 10_000.0,
            min_sentence_chars: 30,
            ngram_novelty: false,
            related_terms: false,
            record_sentence_sources: true,
            concurrency: 8,
            show_progress: false,
        }
    }
}

impl SummarizerConfig {
    /// Defaults overridden by `FACETMAP_*` environment variables.
    ///
    /// Malformed values are configuration errors rather than being
    /// silently ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(fields) = env_var("FACETMAP_FIELDS") {
            config.fields = fields
                .split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect();
        }
        if let Some(field) = env_var("FACETMAP_TOPIC_FIELD") {
            config.topic_field = field;
        }
        if let Some(strategy) = env_var("FACETMAP_MERGE") {
            config.merge_strategy = strategy.parse()?;
        }
        parse_env("FACETMAP_TOPICS", &mut config.num_topics)?;
        parse_env("FACETMAP_TOPIC_TERMS", &mut config.topic_terms)?;
        parse_env("FACETMAP_MAX_DOCUMENTS", &mut config.max_documents)?;
        parse_env("FACETMAP_MAX_SENTENCES", &mut config.max_sentences)?;
        parse_env("FACETMAP_MAX_TERMS", &mut config.max_terms)?;
        parse_env("FACETMAP_POSITION_BONUS", &mut config.position_bonus)?;
        parse_env("FACETMAP_POSITION_MULTIPLIER", &mut config.position_multiplier)?;
        parse_env("FACETMAP_MIN_SENTENCE_CHARS", &mut config.min_sentence_chars)?;
        parse_env("FACETMAP_NGRAM", &mut config.ngram_novelty)?;
        parse_env("FACETMAP_RELATED_TERMS", &mut config.related_terms)?;
        parse_env("FACETMAP_CONCURRENCY", &mut config.concurrency)?;

        let policy = &mut config.topic_policy;
        parse_env("FACETMAP_SINGLE_TOP_TOPIC", &mut policy.single_top_topic)?;
        parse_env("FACETMAP_TOPIC_THRESHOLD", &mut policy.topic_weight_threshold)?;
        parse_env("FACETMAP_SUPER_BOOST", &mut policy.super_boost_top_term)?;
        parse_env("FACETMAP_SUPER_BOOST_FACTOR", &mut policy.super_boost_factor)?;
        parse_env("FACETMAP_REQUIRE_ALL_TERMS", &mut policy.require_all_terms)?;
        parse_env("FACETMAP_MIN_SHOULD_MATCH", &mut policy.min_should_match)?;

        Ok(config)
    }

    /// Check the configuration before a run starts.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::config("At least one summary field is required"));
        }
        if self.topic_field.trim().is_empty() {
            return Err(Error::config("Topic field must not be empty"));
        }
        for (name, value) in [
            ("num_topics", self.num_topics),
            ("topic_terms", self.topic_terms),
            ("max_documents", self.max_documents),
            ("max_sentences", self.max_sentences),
            ("max_terms", self.max_terms),
            ("concurrency", self.concurrency),
            ("min_should_match", self.topic_policy.min_should_match),
        ] {
            if value == 0 {
                return Err(Error::config(format!("{name} must be at least 1")));
            }
        }
        let threshold = self.topic_policy.topic_weight_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "topic_weight_threshold must be within [0, 1], got {threshold}"
            )));
        }
        for (name, value) in [
            ("position_multiplier", self.position_multiplier),
            ("super_boost_factor", self.topic_policy.super_boost_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::config(format!(
                    "{name} must be a finite, non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, target: &mut T) -> Result<()> {
    if let Some(raw) = env_var(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| Error::config(format!("{key} has an invalid value: '{raw}'")))?;
    }
    Ok(())
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use facetmap::facets::{global_filter, FilterDimension};
use facetmap::output::terminal;
use facetmap::pipeline::{self, MatrixRequest};
use facetmap::scoring::pos::LexiconTagger;
use facetmap::search::corpus::{self, CorpusStats};
use facetmap::search::MemoryIndex;
use facetmap::topics::TfIdfTopicTrainer;
use facetmap::{MergeStrategy, SummarizerConfig};

/// Facetmap: cross-tabulate a news corpus along two facets and summarize
/// every cell.
///
/// Each cell of the rows x columns matrix gets a topic mixture and an
/// extractive summary: representative sentences, terms and topic terms.
#[derive(Parser)]
#[command(name = "facetmap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the matrix, compute topics and summarize every cell
    Analyze {
        #[command(flatten)]
        matrix: MatrixArgs,

        /// Write the full report as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Field shown in the terminal (default: the first summary field)
        #[arg(long)]
        show_field: Option<String>,

        /// Sentences shown per cell in the terminal (default: 3)
        #[arg(long, default_value = "3")]
        show_sentences: usize,
    },

    /// Build the matrix and show the trained topics per cell
    Topics {
        #[command(flatten)]
        matrix: MatrixArgs,
    },

    /// Show a corpus overview: size, date span, facet values
    Stats {
        /// JSON-lines corpus file
        #[arg(long)]
        corpus: PathBuf,

        /// Values listed per facet (default: 15)
        #[arg(long, default_value = "15")]
        top: usize,
    },
}

#[derive(Args)]
struct MatrixArgs {
    /// JSON-lines corpus file
    #[arg(long)]
    corpus: PathBuf,

    /// Row dimension, e.g. country=DE,US or text~covid,flu
    #[arg(long)]
    rows: String,

    /// Column dimension, same syntax as --rows
    #[arg(long)]
    cols: String,

    /// Only documents on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<NaiveDate>,

    /// Only documents on or before this date (YYYY-MM-DD)
    #[arg(long)]
    until: Option<NaiveDate>,

    /// Extra exact facet filter, field=value (repeatable)
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Comma-separated text fields to summarize
    #[arg(long)]
    fields: Option<String>,

    /// Text field the topic models are trained on
    #[arg(long)]
    topic_field: Option<String>,

    /// Topics per model
    #[arg(long)]
    topics: Option<usize>,

    /// per-cell, across-rows or across-columns
    #[arg(long)]
    merge: Option<MergeStrategy>,

    /// Documents fetched per cell
    #[arg(long)]
    max_documents: Option<usize>,

    /// Sentences kept per field
    #[arg(long)]
    max_sentences: Option<usize>,

    /// Terms kept per field
    #[arg(long)]
    max_terms: Option<usize>,

    /// Favour sentences near the start of their document
    #[arg(long)]
    position_bonus: bool,

    /// Demote sentences atypical of the matrix's text
    #[arg(long)]
    ngram: bool,

    /// Collect terms co-occurring with the cell labels
    #[arg(long)]
    related_terms: bool,

    /// Cells processed in parallel
    #[arg(long)]
    concurrency: Option<usize>,

    /// Hide progress bars
    #[arg(long)]
    quiet: bool,
}

impl MatrixArgs {
    /// Environment/default configuration with command-line overrides.
    fn config(&self) -> Result<SummarizerConfig> {
        let mut config = SummarizerConfig::from_env()?;
        if let Some(fields) = &self.fields {
            config.fields = fields
                .split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect();
        }
        if let Some(field) = &self.topic_field {
            config.topic_field = field.clone();
        }
        if let Some(n) = self.topics {
            config.num_topics = n;
        }
        if let Some(strategy) = self.merge {
            config.merge_strategy = strategy;
        }
        if let Some(n) = self.max_documents {
            config.max_documents = n;
        }
        if let Some(n) = self.max_sentences {
            config.max_sentences = n;
        }
        if let Some(n) = self.max_terms {
            config.max_terms = n;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        config.position_bonus |= self.position_bonus;
        config.ngram_novelty |= self.ngram;
        config.related_terms |= self.related_terms;
        config.show_progress = !self.quiet;
        config.validate()?;
        Ok(config)
    }

    fn request(&self) -> Result<MatrixRequest> {
        Ok(MatrixRequest {
            rows: FilterDimension::parse(&self.rows)?,
            cols: FilterDimension::parse(&self.cols)?,
            global_filter: global_filter(self.since, self.until, &self.filters)?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("facetmap=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            matrix,
            json,
            show_field,
            show_sentences,
        } => {
            // Configuration errors surface before the corpus is touched
            let config = matrix.config()?;
            let request = matrix.request()?;
            let index = load_index(&matrix.corpus)?;

            let trainer = Arc::new(TfIdfTopicTrainer::default());
            let tagger = LexiconTagger;
            let analysis = pipeline::run(&index, trainer, &tagger, request, &config).await?;

            let field = show_field.unwrap_or_else(|| config.fields[0].clone());
            terminal::display_matrix(&analysis.report, &field, show_sentences, 10);

            if let Some(path) = json {
                analysis.report.write_json(&path)?;
                println!("Report written to {}", path.display().to_string().bold());
            }
        }

        Commands::Topics { matrix } => {
            let config = matrix.config()?;
            let request = matrix.request()?;
            let index = load_index(&matrix.corpus)?;

            let trainer = Arc::new(TfIdfTopicTrainer::default());
            let (table, topics) =
                pipeline::build_topics(&index, trainer, request, &config).await?;
            terminal::display_topics(&table, &topics, config.topic_terms);
        }

        Commands::Stats { corpus, top } => {
            let documents = corpus::load_documents(&corpus)?;
            let stats = CorpusStats::from_documents(&documents);
            terminal::display_stats(&stats, top);
        }
    }

    Ok(())
}

fn load_index(path: &Path) -> Result<MemoryIndex> {
    let documents = corpus::load_documents(path)?;
    let index = MemoryIndex::new(documents)
        .with_context(|| format!("Failed to index corpus {}", path.display()))?;
    info!(documents = index.len(), "Corpus indexed");
    Ok(index)
}

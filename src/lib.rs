// Facetmap: faceted matrix analysis with topic-aware summaries.
//
// This is the library root. Each module corresponds to a stage or a
// collaborator of the analysis pipeline.

pub mod config;
pub mod error;
pub mod facets;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod search;
pub mod summary;
pub mod text;
pub mod topics;

pub use config::{MergeStrategy, SummarizerConfig, TopicQueryPolicy};
pub use error::{Error, Result};

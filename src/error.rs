// Error taxonomy for an analysis run.
//
// Configuration problems are reported before any retrieval happens.
// Collaborator failures (search engine, topic trainer) are fatal to the
// whole run. Degenerate data is never an error: it resolves to sentinel
// summaries or fallback queries inside the pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid dimensions, limits or strategy names. Raised synchronously,
    /// before the first search-engine call.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O or protocol failure talking to the search engine.
    #[error("Retrieval failed: {0:#}")]
    Retrieval(#[source] anyhow::Error),

    /// The topic trainer failed or its worker panicked.
    #[error("Topic training failed: {0:#}")]
    Training(#[source] anyhow::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

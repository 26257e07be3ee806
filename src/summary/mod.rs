// Summaries — the per-cell result model and the summarizer that fills it.

pub mod model;
pub mod summarizer;

pub use model::{Ranked, Summaries, Summary, NOT_DEFINED};
pub use summarizer::Summarizer;

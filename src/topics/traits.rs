// Topic trainer trait — swap-ready abstraction.
//
// The pipeline only needs "train on a set of texts -> topics plus a mixture
// per text". The default implementation clusters TF-IDF keywords; an LDA
// trainer can be dropped in behind the same trait.

use anyhow::Result;

use super::model::TopicModel;

/// Trait for training a topic model over a set of text blobs.
///
/// Training is CPU-bound and blocking; the pipeline runs it on a blocking
/// worker thread.
pub trait TopicTrainer: Send + Sync {
    /// Train at most `num_topics` topics over `texts`. The returned model
    /// has exactly one assignment per input text. Degenerate input (no
    /// usable terms) yields a model without topics, not an error.
    fn train(&self, texts: &[String], num_topics: usize) -> Result<TopicModel>;
}

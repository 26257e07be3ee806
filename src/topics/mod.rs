// Topic engine — trainer contract, reference trainer, cell mixtures and
// topic-biased queries.

pub mod extractor;
pub mod model;
pub mod tfidf;
pub mod traits;

pub use extractor::{TopicExtractor, TopicGroup};
pub use model::{Topic, TopicModel, TopicScore};
pub use tfidf::TfIdfTopicTrainer;
pub use traits::TopicTrainer;

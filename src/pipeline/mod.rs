// Pipeline orchestration — ties the matrix, topic and summary stages together.

pub mod analysis;

pub use analysis::{build_topics, run, Analysis, MatrixRequest};

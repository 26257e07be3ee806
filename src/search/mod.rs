// Search collaborator — query model, engine trait and an in-memory engine.

pub mod corpus;
pub mod memory;
pub mod query;
pub mod traits;

pub use memory::{Document, MemoryIndex};
pub use query::Query;
pub use traits::{idf, DocId, Hit, SearchEngine};

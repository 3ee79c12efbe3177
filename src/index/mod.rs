//! Document index: precomputed passage embeddings and similarity search.

mod chunker;
mod sqlite;
mod store;

pub use chunker::{split_into_chunks, ChunkerConfig, TextChunk};
pub use sqlite::SqliteVectorStore;
pub use store::{PassageSearchResult, StoredPassage, VectorStore};

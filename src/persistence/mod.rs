pub mod repository;
pub mod sqlite;

pub use repository::{CheckpointError, CheckpointStore, KeyValueStore, MemoryStore};
pub use sqlite::SqliteStore;

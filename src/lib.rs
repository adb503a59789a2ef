// Re-export core modules for use by the binary or other consumers
pub mod content;
pub mod core;
pub mod data;
pub mod persistence;
pub mod simulation;
pub mod systems;

// Expose the engine and the types needed to drive it
pub use crate::content::{Chapter, ChapterId, Decision};
pub use crate::core::{EngineConfig, EngineError, StatReset, StoryEngine, StorySnapshot, Transition};
pub use crate::data::{load_story_catalog, StoryCatalog};
pub use crate::persistence::{CheckpointStore, SqliteStore};
pub use crate::simulation::PlayerStats;

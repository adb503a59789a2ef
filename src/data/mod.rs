pub mod story;

pub use story::{load_story_catalog, CompletionEntry, StoryCatalog, StoryDataError};

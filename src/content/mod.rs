pub mod chapter;
pub mod graph;

pub use chapter::{Chapter, ChapterId, Decision, SENTINEL_STORY_DAY};
pub use graph::{ChapterGraph, CompletionTable};

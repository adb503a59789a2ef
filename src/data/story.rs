use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::chapter::{Chapter, ChapterId};

pub const STORY_SCHEMA_VERSION: u32 = 1;

/// Static story content: the chapter graph plus its completion table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryCatalog {
    pub schema_version: u32,
    #[serde(default)]
    pub title: String,
    pub first_chapter: ChapterId,
    pub death_chapter: ChapterId,
    #[serde(default)]
    pub survive_chapter: Option<ChapterId>,
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub completion: Vec<CompletionEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompletionEntry {
    pub chapter: ChapterId,
    pub percent: i64,
}

#[derive(Debug, Error)]
pub enum StoryDataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("{0}")]
    Validation(String),
}

pub fn load_story_catalog(path: impl AsRef<Path>) -> Result<StoryCatalog, StoryDataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| StoryDataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog: StoryCatalog =
        serde_json::from_str(&raw).map_err(|source| StoryDataError::Json {
            path: path.display().to_string(),
            source,
        })?;
    catalog.validate()?;
    Ok(catalog)
}

impl StoryCatalog {
    /// Reject content the engine cannot start from. Softer authoring
    /// inconsistencies are left to the graph's load warnings.
    pub fn validate(&self) -> Result<(), StoryDataError> {
        if self.schema_version != STORY_SCHEMA_VERSION {
            return Err(StoryDataError::Validation(format!(
                "unsupported story schema version {} (expected {})",
                self.schema_version, STORY_SCHEMA_VERSION
            )));
        }
        if self.chapters.is_empty() {
            return Err(StoryDataError::Validation(
                "story has no chapters".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for chapter in &self.chapters {
            if !ids.insert(chapter.id) {
                return Err(StoryDataError::Validation(format!(
                    "duplicate chapter id {}",
                    chapter.id
                )));
            }
            if chapter.is_terminal && !chapter.decisions.is_empty() {
                return Err(StoryDataError::Validation(format!(
                    "terminal chapter {} has decisions",
                    chapter.id
                )));
            }
        }

        if !ids.contains(&self.first_chapter) {
            return Err(StoryDataError::Validation(format!(
                "first chapter {} is not in the story",
                self.first_chapter
            )));
        }
        if !ids.contains(&self.death_chapter) {
            return Err(StoryDataError::Validation(format!(
                "death chapter {} is not in the story",
                self.death_chapter
            )));
        }
        if let Some(survive) = self.survive_chapter {
            if !ids.contains(&survive) {
                return Err(StoryDataError::Validation(format!(
                    "survive chapter {} is not in the story",
                    survive
                )));
            }
        }

        let mut completed = HashSet::new();
        for entry in &self.completion {
            if !ids.contains(&entry.chapter) {
                return Err(StoryDataError::Validation(format!(
                    "completion entry for chapter {} which is not in the story",
                    entry.chapter
                )));
            }
            if !completed.insert(entry.chapter) {
                return Err(StoryDataError::Validation(format!(
                    "duplicate completion entry for chapter {}",
                    entry.chapter
                )));
            }
            if !(0..=100).contains(&entry.percent) {
                return Err(StoryDataError::Validation(format!(
                    "completion for chapter {} is {}%, outside 0..=100",
                    entry.chapter, entry.percent
                )));
            }
        }
        Ok(())
    }
}

/// Small survival story used across the crate's tests.
#[cfg(test)]
pub(crate) fn test_catalog() -> StoryCatalog {
    use crate::content::chapter::Decision;

    fn chapter(
        id: i64,
        day: u32,
        title: &str,
        decisions: Vec<Decision>,
        terminal: bool,
    ) -> Chapter {
        Chapter {
            id: ChapterId(id),
            story_day: day,
            title: title.to_string(),
            narrative_text: format!("{title}."),
            image_references: vec![format!("chapter_{id}")],
            decisions,
            is_terminal: terminal,
        }
    }

    StoryCatalog {
        schema_version: STORY_SCHEMA_VERSION,
        title: "Whiteout".to_string(),
        first_chapter: ChapterId(11),
        death_chapter: ChapterId(9),
        survive_chapter: Some(ChapterId(10)),
        chapters: vec![
            chapter(
                11,
                1,
                "The Crash",
                vec![
                    Decision::new("Search the wreck", Some(ChapterId(12))).with_deltas(0, -2),
                    Decision::new("Walk into the storm", Some(ChapterId(9))),
                    Decision::new("Drink the river water", Some(ChapterId(12))).with_deltas(-5, 0),
                ],
                false,
            ),
            chapter(
                12,
                1,
                "Shelter",
                vec![
                    Decision::new("Push on to the ridge", Some(ChapterId(13))).with_deltas(0, -3),
                    Decision::new("Rest by the fire", None).with_deltas(1, 2),
                ],
                false,
            ),
            chapter(
                13,
                2,
                "The Ridge",
                vec![Decision::new("Signal the plane", Some(ChapterId(10))).with_deltas(0, -1)],
                false,
            ),
            chapter(9, 0, "Death", Vec::new(), true),
            chapter(10, 0, "Rescued", Vec::new(), true),
        ],
        completion: vec![
            CompletionEntry { chapter: ChapterId(11), percent: 0 },
            CompletionEntry { chapter: ChapterId(12), percent: 25 },
            CompletionEntry { chapter: ChapterId(13), percent: 60 },
            CompletionEntry { chapter: ChapterId(10), percent: 100 },
        ],
    }
}

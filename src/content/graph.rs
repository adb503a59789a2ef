use std::collections::{BTreeSet, HashMap};

use bevy_ecs::prelude::*;
use bevy_utils::tracing::warn;

use crate::content::chapter::{Chapter, ChapterId};
use crate::data::story::{StoryCatalog, StoryDataError};

/// Read-only chapter graph for the active story.
#[derive(Resource, Debug, Clone)]
pub struct ChapterGraph {
    chapters: HashMap<ChapterId, Chapter>,
    first: ChapterId,
    death: ChapterId,
    survive: Option<ChapterId>,
}

impl ChapterGraph {
    /// Validate the catalog and index its chapters.
    pub fn from_catalog(catalog: &StoryCatalog) -> Result<Self, StoryDataError> {
        catalog.validate()?;

        let chapters: HashMap<ChapterId, Chapter> = catalog
            .chapters
            .iter()
            .map(|chapter| (chapter.id, chapter.clone()))
            .collect();

        let graph = Self {
            chapters,
            first: catalog.first_chapter,
            death: catalog.death_chapter,
            survive: catalog.survive_chapter,
        };
        graph.report_content_warnings();
        Ok(graph)
    }

    pub fn chapter_by_id(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.get(&id)
    }

    pub fn contains(&self, id: ChapterId) -> bool {
        self.chapters.contains_key(&id)
    }

    /// Number of distinct in-story days, ignoring the day-zero sentinels.
    pub fn total_days(&self) -> usize {
        self.chapters
            .values()
            .filter(|chapter| !chapter.is_sentinel_day())
            .map(|chapter| chapter.story_day)
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn first_chapter_id(&self) -> ChapterId {
        self.first
    }

    pub fn death_chapter_id(&self) -> ChapterId {
        self.death
    }

    pub fn survive_chapter_id(&self) -> Option<ChapterId> {
        self.survive
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    fn report_content_warnings(&self) {
        let mut ids: Vec<&ChapterId> = self.chapters.keys().collect();
        ids.sort();
        for id in ids {
            let chapter = &self.chapters[id];
            if chapter.decisions.is_empty() && !chapter.is_terminal {
                warn!(chapter = id.0, "chapter has no decisions; treating it as terminal");
            }
            for decision in &chapter.decisions {
                match decision.target_chapter_id {
                    Some(target) if !self.contains(target) => {
                        warn!(
                            chapter = id.0,
                            target = target.0,
                            "decision targets a chapter that is not in the story"
                        );
                    }
                    None => {
                        warn!(chapter = id.0, "decision on a non-terminal chapter has no target");
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Authored chapter -> completion percentage lookup.
#[derive(Resource, Debug, Clone, Default)]
pub struct CompletionTable(HashMap<ChapterId, u8>);

impl CompletionTable {
    pub fn new(entries: impl IntoIterator<Item = (ChapterId, i64)>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(id, percent)| (id, percent.clamp(0, 100) as u8))
                .collect(),
        )
    }

    /// Unknown chapters count as zero.
    pub fn percentage(&self, id: ChapterId) -> u8 {
        self.0.get(&id).copied().unwrap_or(0)
    }
}

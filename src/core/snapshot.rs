use bevy_ecs::prelude::*;

use crate::content::chapter::ChapterId;
use crate::content::graph::ChapterGraph;
use crate::simulation::economy::PendingSteps;
use crate::simulation::ledger::PlayerStats;
use crate::simulation::progression::{AttemptCounter, ProgressionState};

/// Data returned to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StorySnapshot {
    pub story_title: String,
    pub chapter_id: ChapterId,
    pub title: String,
    pub narrative_text: String,
    pub image_references: Vec<String>,
    pub story_day: u32,
    pub total_days: usize,
    pub decisions: Vec<DecisionView>,
    pub is_terminal: bool,
    pub died: bool,
    pub survived: bool,
    pub health: i32,
    pub energy: i32,
    pub completion_percentage: u8,
    pub attempts: u64,
    pub pending_steps: i64,
    pub started: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionView {
    pub index: usize,
    pub text: String,
    /// Cleared when the player is out of energy.
    pub enabled: bool,
}

impl StorySnapshot {
    pub(crate) fn capture(world: &World, story_title: &str, started: bool) -> Self {
        let graph = world.resource::<ChapterGraph>();
        let progression = world.resource::<ProgressionState>();
        let stats = world.resource::<PlayerStats>();
        let chapter_id = progression.current();
        let chapter = graph.chapter_by_id(chapter_id);

        let decisions: Vec<DecisionView> = chapter
            .map(|chapter| {
                chapter
                    .decisions
                    .iter()
                    .enumerate()
                    .map(|(index, decision)| DecisionView {
                        index,
                        text: decision.text.clone(),
                        enabled: !stats.is_depleted(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        StorySnapshot {
            story_title: story_title.to_string(),
            chapter_id,
            title: chapter
                .map(|c| c.title.clone())
                .unwrap_or_else(|| "Unknown chapter".to_string()),
            narrative_text: chapter.map(|c| c.narrative_text.clone()).unwrap_or_default(),
            image_references: chapter
                .map(|c| c.image_references.clone())
                .unwrap_or_default(),
            story_day: chapter.map(|c| c.story_day).unwrap_or(0),
            total_days: graph.total_days(),
            decisions,
            is_terminal: chapter.map(|c| c.is_terminal()).unwrap_or(true),
            died: chapter_id == graph.death_chapter_id(),
            survived: graph.survive_chapter_id() == Some(chapter_id),
            health: stats.health(),
            energy: stats.energy(),
            completion_percentage: progression.completion_percentage(),
            attempts: world.resource::<AttemptCounter>().value(),
            pending_steps: world.resource::<PendingSteps>().value(),
            started,
        }
    }

    /// "Day X of N", or `None` on the day-zero sentinel chapters.
    pub fn day_label(&self) -> Option<String> {
        (self.story_day > 0).then(|| format!("Day {} of {}", self.story_day, self.total_days))
    }
}

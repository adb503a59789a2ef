use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a chapter in the narrative graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(pub i64);

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Day value carried by the shared Death/Survive chapters.
pub const SENTINEL_STORY_DAY: u32 = 0;

/// A node in the narrative graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(default)]
    pub story_day: u32,
    pub title: String,
    #[serde(default)]
    pub narrative_text: String,
    #[serde(default)]
    pub image_references: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
    #[serde(default)]
    pub is_terminal: bool,
}

impl Chapter {
    /// Absorbing state for the engine: flagged terminal, or nothing left to choose.
    pub fn is_terminal(&self) -> bool {
        self.is_terminal || self.decisions.is_empty()
    }

    pub fn is_sentinel_day(&self) -> bool {
        self.story_day == SENTINEL_STORY_DAY
    }

    pub fn decision(&self, index: usize) -> Option<&Decision> {
        self.decisions.get(index)
    }
}

/// An edge out of a chapter, carrying the stat deltas applied when taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub text: String,
    #[serde(default)]
    pub target_chapter_id: Option<ChapterId>,
    #[serde(default)]
    pub health_delta: i32,
    #[serde(default)]
    pub energy_delta: i32,
}

impl Decision {
    pub fn new(text: impl Into<String>, target: Option<ChapterId>) -> Self {
        Self {
            text: text.into(),
            target_chapter_id: target,
            health_delta: 0,
            energy_delta: 0,
        }
    }

    pub fn with_deltas(mut self, health_delta: i32, energy_delta: i32) -> Self {
        self.health_delta = health_delta;
        self.energy_delta = energy_delta;
        self
    }
}

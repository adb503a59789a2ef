use std::collections::VecDeque;

use bevy_ecs::prelude::*;

use crate::content::chapter::ChapterId;
use crate::content::graph::CompletionTable;

/// Where the player is in the story.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionState {
    current: ChapterId,
    completion: u8,
}

impl ProgressionState {
    pub fn new(current: ChapterId) -> Self {
        Self {
            current,
            completion: 0,
        }
    }

    pub fn current(&self) -> ChapterId {
        self.current
    }

    pub fn completion_percentage(&self) -> u8 {
        self.completion
    }

    /// Move to `chapter`; completion is always re-derived from the table.
    pub fn move_to(&mut self, chapter: ChapterId, table: &CompletionTable) {
        self.current = chapter;
        self.completion = table.percentage(chapter);
    }
}

/// Number of times the story has been restarted.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptCounter(u64);

impl AttemptCounter {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

const TRANSITION_LOG_CAPACITY: usize = 32;

/// Recent transitions as display lines, newest last.
#[derive(Resource, Debug, Clone, Default)]
pub struct TransitionLog(VecDeque<String>);

impl TransitionLog {
    pub fn push(&mut self, line: String) {
        if self.0.len() == TRANSITION_LOG_CAPACITY {
            self.0.pop_front();
        }
        self.0.push_back(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_to_recomputes_completion() {
        let table = CompletionTable::new([(ChapterId(2), 50)]);
        let mut state = ProgressionState::new(ChapterId(1));
        state.move_to(ChapterId(2), &table);
        assert_eq!(state.current(), ChapterId(2));
        assert_eq!(state.completion_percentage(), 50);
        state.move_to(ChapterId(3), &table);
        assert_eq!(state.completion_percentage(), 0);
    }

    #[test]
    fn attempt_counter_counts_and_resets() {
        let mut attempts = AttemptCounter::default();
        attempts.increment();
        attempts.increment();
        assert_eq!(attempts.value(), 2);
        attempts.reset();
        assert_eq!(attempts.value(), 0);
    }

    #[test]
    fn transition_log_drops_oldest_lines() {
        let mut log = TransitionLog::default();
        for i in 0..40 {
            log.push(format!("line {i}"));
        }
        assert_eq!(log.len(), TRANSITION_LOG_CAPACITY);
        assert_eq!(log.lines().next(), Some("line 8"));
        assert_eq!(log.lines().last(), Some("line 39"));
    }
}

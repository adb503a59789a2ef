use bevy_ecs::prelude::*;
use bevy_utils::tracing::{debug, info, warn};
use thiserror::Error;

use crate::content::chapter::{Chapter, ChapterId, Decision};
use crate::content::graph::{ChapterGraph, CompletionTable};
use crate::core::config::{EnergyGate, EngineConfig, StatReset};
use crate::core::snapshot::StorySnapshot;
use crate::data::story::{StoryCatalog, StoryDataError};
use crate::persistence::repository::{CheckpointError, CheckpointStore};
use crate::simulation::economy::{credit_energy, credit_pending, EnergyCredit, PendingSteps};
use crate::simulation::ledger::PlayerStats;
use crate::simulation::progression::{AttemptCounter, ProgressionState, TransitionLog};

/// Recoverable conditions reported to the host. The engine state is left
/// well defined whenever one of these is returned.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("story not found: chapter {0} is not part of this story")]
    ChapterNotFound(ChapterId),
    #[error("chapter {chapter} has no decision #{index}")]
    DecisionOutOfRange { chapter: ChapterId, index: usize },
    #[error("chapter {0} is an ending; reset the story to play again")]
    ChapterIsTerminal(ChapterId),
    #[error("not enough energy to make a decision")]
    EnergyDepleted,
    #[error("no checkpoint has been saved")]
    NoCheckpoint,
    #[error("the story has not been started")]
    NotStarted,
    #[error("checkpoint unavailable: {0}")]
    Checkpoint(#[from] CheckpointError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Started,
    Advanced,
    Died,
    Stayed,
    Reset,
    Resumed,
}

/// Outcome of a controller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Option<ChapterId>,
    pub to: ChapterId,
    pub kind: TransitionKind,
    /// False when the checkpoint write failed; progress still advanced in memory.
    pub persisted: bool,
}

/// The progression controller: owns the story state and mediates every
/// write to the ledger, checkpoint and attempt counter.
pub struct StoryEngine {
    world: World,
    checkpoints: CheckpointStore,
    config: EngineConfig,
    title: String,
    started: bool,
}

impl StoryEngine {
    /// Build an engine for `catalog`. Fails only when the content gives no
    /// usable starting point.
    pub fn new(
        catalog: &StoryCatalog,
        checkpoints: CheckpointStore,
        config: EngineConfig,
    ) -> Result<Self, StoryDataError> {
        let graph = ChapterGraph::from_catalog(catalog)?;
        let completion = CompletionTable::new(
            catalog
                .completion
                .iter()
                .map(|entry| (entry.chapter, entry.percent)),
        );
        let first = graph.first_chapter_id();

        let mut world = World::new();
        world.insert_resource(graph);
        world.insert_resource(completion);
        world.insert_resource(config.starting_stats);
        world.insert_resource(ProgressionState::new(first));
        world.insert_resource(AttemptCounter::default());
        world.insert_resource(PendingSteps::default());
        world.insert_resource(TransitionLog::default());

        Ok(Self {
            world,
            checkpoints,
            config,
            title: catalog.title.clone(),
            started: false,
        })
    }

    /// Resume from the saved checkpoint, or the first chapter when there is
    /// none (or it no longer exists in the story).
    pub fn start(&mut self) -> Transition {
        let graph = self.world.resource::<ChapterGraph>();
        let first = graph.first_chapter_id();
        let chapter = match self.checkpoints.load() {
            Ok(Some(id)) if graph.contains(id) => id,
            Ok(Some(id)) => {
                warn!(chapter = id.0, "checkpoint names an unknown chapter; starting over");
                first
            }
            Ok(None) => first,
            Err(err) => {
                warn!(error = %err, "failed to read checkpoint; starting over");
                first
            }
        };

        let attempts = self.restore_attempts();
        self.started = true;

        info!(chapter = chapter.0, attempts, "story started");
        self.enter(None, chapter, TransitionKind::Started)
    }

    /// Apply `decision` from the current chapter. Endings are absorbing: only
    /// `reset_story` leaves them.
    pub fn apply_decision(&mut self, decision: &Decision) -> Result<Transition, EngineError> {
        let from = self.require_started()?;
        if self.current_chapter().map_or(true, Chapter::is_terminal) {
            return Err(EngineError::ChapterIsTerminal(from));
        }
        if self.config.energy_gate == EnergyGate::Enforced
            && self.world.resource::<PlayerStats>().is_depleted()
        {
            return Err(EngineError::EnergyDepleted);
        }

        let stats = self
            .world
            .resource_mut::<PlayerStats>()
            .apply_deltas(decision.health_delta, decision.energy_delta);

        if stats.is_dead() {
            self.world.resource_mut::<PlayerStats>().kill();
            let death = self.world.resource::<ChapterGraph>().death_chapter_id();
            info!(from = from.0, death = death.0, "player died");
            return Ok(self.enter(Some(from), death, TransitionKind::Died));
        }

        let Some(target) = decision.target_chapter_id else {
            debug!(chapter = from.0, decision = %decision.text, "decision has no target; staying");
            let persisted = self.persist(from);
            self.log(format!("{:?}: chapter {}", TransitionKind::Stayed, from));
            return Ok(Transition {
                from: Some(from),
                to: from,
                kind: TransitionKind::Stayed,
                persisted,
            });
        };

        if !self.world.resource::<ChapterGraph>().contains(target) {
            warn!(from = from.0, target = target.0, "decision targets a missing chapter");
            return Err(EngineError::ChapterNotFound(target));
        }
        Ok(self.enter(Some(from), target, TransitionKind::Advanced))
    }

    /// Apply the decision at `index` in the current chapter.
    pub fn choose(&mut self, index: usize) -> Result<Transition, EngineError> {
        let current = self.require_started()?;
        let decision = self
            .current_chapter()
            .ok_or(EngineError::ChapterNotFound(current))?
            .decision(index)
            .cloned()
            .ok_or(EngineError::DecisionOutOfRange {
                chapter: current,
                index,
            })?;
        self.apply_decision(&decision)
    }

    /// Start a new attempt from the first chapter.
    pub fn reset_story(&mut self, stats: StatReset) -> Transition {
        let from = self.started.then(|| self.current_chapter_id());
        if !self.started {
            self.restore_attempts();
        }
        let first = self.world.resource::<ChapterGraph>().first_chapter_id();

        if stats == StatReset::Restore {
            self.world.insert_resource(self.config.starting_stats);
        }
        let mut transition = self.enter(from, first, TransitionKind::Reset);

        let attempts = {
            let mut counter = self.world.resource_mut::<AttemptCounter>();
            counter.increment();
            counter.value()
        };
        if let Err(err) = self.checkpoints.save_attempts(attempts) {
            warn!(error = %err, "failed to persist attempt count");
            transition.persisted = false;
        }
        self.started = true;

        info!(attempts, ?stats, "story reset");
        transition
    }

    /// Reset using the configured stat policy.
    pub fn reset_story_with_config(&mut self) -> Transition {
        self.reset_story(self.config.reset_stats)
    }

    /// Re-read the checkpoint after an external restart and jump to it.
    pub fn resume_story(&mut self) -> Result<Transition, EngineError> {
        let from = self.require_started()?;
        let chapter = self.checkpoints.load()?.ok_or(EngineError::NoCheckpoint)?;
        if !self.world.resource::<ChapterGraph>().contains(chapter) {
            warn!(chapter = chapter.0, "checkpoint names an unknown chapter; not resuming");
            return Err(EngineError::ChapterNotFound(chapter));
        }

        self.move_to(chapter);
        self.log(format!("resumed at chapter {}", chapter));
        info!(chapter = chapter.0, "story resumed");
        Ok(Transition {
            from: Some(from),
            to: chapter,
            kind: TransitionKind::Resumed,
            persisted: true,
        })
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        if !self.started {
            return None;
        }
        self.world
            .resource::<ChapterGraph>()
            .chapter_by_id(self.current_chapter_id())
    }

    pub fn completion_percentage(&self) -> u8 {
        self.world
            .resource::<ProgressionState>()
            .completion_percentage()
    }

    pub fn player_stats(&self) -> PlayerStats {
        *self.world.resource::<PlayerStats>()
    }

    pub fn attempt_count(&self) -> u64 {
        self.world.resource::<AttemptCounter>().value()
    }

    /// Add raw steps from the step source to the pending pool.
    pub fn record_steps(&mut self, steps: i64) {
        self.world.resource_mut::<PendingSteps>().record(steps);
    }

    pub fn pending_steps(&self) -> i64 {
        self.world.resource::<PendingSteps>().value()
    }

    /// Convert caller-supplied steps into energy.
    pub fn credit_steps_as_energy(
        &mut self,
        steps_to_convert: i64,
        total_steps_goal: i64,
    ) -> EnergyCredit {
        let mut stats = self.world.resource_mut::<PlayerStats>();
        let credit = credit_energy(&mut stats, steps_to_convert, total_steps_goal);
        debug!(earned = credit.earned, energy = credit.energy, "steps credited");
        credit
    }

    /// Convert the pending pool into energy, then empty it.
    pub fn credit_pending_steps(&mut self, total_steps_goal: i64) -> EnergyCredit {
        let credit = self
            .world
            .resource_scope(|world, mut pending: Mut<PendingSteps>| {
                let mut stats = world.resource_mut::<PlayerStats>();
                credit_pending(&mut stats, &mut pending, total_steps_goal)
            });
        debug!(earned = credit.earned, energy = credit.energy, "pending steps credited");
        credit
    }

    pub fn snapshot(&self) -> StorySnapshot {
        StorySnapshot::capture(&self.world, &self.title, self.started)
    }

    pub fn transition_log(&self) -> impl Iterator<Item = &str> {
        self.world.resource::<TransitionLog>().lines()
    }

    pub fn graph(&self) -> &ChapterGraph {
        self.world.resource::<ChapterGraph>()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    fn current_chapter_id(&self) -> ChapterId {
        self.world.resource::<ProgressionState>().current()
    }

    fn require_started(&self) -> Result<ChapterId, EngineError> {
        if self.started {
            Ok(self.current_chapter_id())
        } else {
            Err(EngineError::NotStarted)
        }
    }

    fn restore_attempts(&mut self) -> u64 {
        let attempts = self.checkpoints.load_attempts().unwrap_or_else(|err| {
            warn!(error = %err, "failed to read attempt count");
            0
        });
        self.world.insert_resource(AttemptCounter::new(attempts));
        attempts
    }

    fn move_to(&mut self, chapter: ChapterId) {
        self.world
            .resource_scope(|world, mut progression: Mut<ProgressionState>| {
                progression.move_to(chapter, world.resource::<CompletionTable>());
            });
    }

    /// Make `to` current, write the checkpoint and log the move.
    fn enter(
        &mut self,
        from: Option<ChapterId>,
        to: ChapterId,
        kind: TransitionKind,
    ) -> Transition {
        self.move_to(to);
        let persisted = self.persist(to);

        let line = match from {
            Some(from) => format!("{:?}: chapter {} -> {}", kind, from, to),
            None => format!("{:?}: chapter {}", kind, to),
        };
        debug!("{}", line);
        self.log(line);

        Transition {
            from,
            to,
            kind,
            persisted,
        }
    }

    fn persist(&mut self, chapter: ChapterId) -> bool {
        match self.checkpoints.save(chapter) {
            Ok(()) => true,
            Err(err) => {
                warn!(chapter = chapter.0, error = %err, "failed to save checkpoint");
                false
            }
        }
    }

    fn log(&mut self, line: String) {
        self.world.resource_mut::<TransitionLog>().push(line);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::data::story::test_catalog;
    use crate::persistence::repository::{KeyValueStore, MemoryStore};

    const FIRST: ChapterId = ChapterId(11);
    const SHELTER: ChapterId = ChapterId(12);
    const RIDGE: ChapterId = ChapterId(13);
    const DEATH: ChapterId = ChapterId(9);
    const RESCUED: ChapterId = ChapterId(10);

    /// Store shared between engines to model an app restart.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get_int(&self, key: &str) -> Result<Option<i64>, CheckpointError> {
            self.0.borrow().get_int(key)
        }

        fn set_int(&mut self, key: &str, value: i64) -> Result<(), CheckpointError> {
            self.0.borrow_mut().set_int(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), CheckpointError> {
            self.0.borrow_mut().remove(key)
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_int(&self, _key: &str) -> Result<Option<i64>, CheckpointError> {
            Err(CheckpointError::InvalidData("disk unavailable".to_string()))
        }

        fn set_int(&mut self, _key: &str, _value: i64) -> Result<(), CheckpointError> {
            Err(CheckpointError::InvalidData("disk unavailable".to_string()))
        }

        fn remove(&mut self, _key: &str) -> Result<(), CheckpointError> {
            Err(CheckpointError::InvalidData("disk unavailable".to_string()))
        }
    }

    fn engine_with(store: impl KeyValueStore + 'static, config: EngineConfig) -> StoryEngine {
        StoryEngine::new(&test_catalog(), CheckpointStore::new(store), config).unwrap()
    }

    fn started() -> StoryEngine {
        let mut engine = engine_with(MemoryStore::default(), EngineConfig::default());
        engine.start();
        engine
    }

    fn saved_chapter(store: &SharedStore) -> Option<i64> {
        store.get_int("current_chapter").unwrap()
    }

    #[test]
    fn empty_checkpoint_starts_at_first_chapter() {
        let store = SharedStore::default();
        let mut engine = engine_with(store.clone(), EngineConfig::default());
        let transition = engine.start();

        assert_eq!(transition.kind, TransitionKind::Started);
        assert_eq!(transition.to, FIRST);
        assert!(transition.persisted);
        assert_eq!(engine.current_chapter().unwrap().id, FIRST);
        assert_eq!(saved_chapter(&store), Some(11));
    }

    #[test]
    fn start_resumes_from_saved_checkpoint() {
        let store = SharedStore::default();
        store.clone().set_int("current_chapter", 13).unwrap();
        let mut engine = engine_with(store, EngineConfig::default());
        engine.start();
        assert_eq!(engine.current_chapter().unwrap().id, RIDGE);
        assert_eq!(engine.completion_percentage(), 60);
    }

    #[test]
    fn start_ignores_checkpoint_for_unknown_chapter() {
        let store = SharedStore::default();
        store.clone().set_int("current_chapter", 404).unwrap();
        let mut engine = engine_with(store.clone(), EngineConfig::default());
        engine.start();
        assert_eq!(engine.current_chapter().unwrap().id, FIRST);
        assert_eq!(saved_chapter(&store), Some(11));
    }

    #[test]
    fn unreadable_checkpoint_is_not_fatal() {
        let mut engine = engine_with(BrokenStore, EngineConfig::default());
        let transition = engine.start();
        assert_eq!(transition.to, FIRST);
        assert!(!transition.persisted);

        let transition = engine.choose(0).unwrap();
        assert_eq!(transition.to, SHELTER);
        assert!(!transition.persisted);
        assert_eq!(engine.current_chapter().unwrap().id, SHELTER);
    }

    #[test]
    fn operations_before_start_are_rejected() {
        let mut engine = engine_with(MemoryStore::default(), EngineConfig::default());
        assert!(engine.current_chapter().is_none());
        assert!(matches!(engine.choose(0), Err(EngineError::NotStarted)));
        assert!(matches!(engine.resume_story(), Err(EngineError::NotStarted)));
    }

    #[test]
    fn decision_targeting_death_lands_on_death() {
        let mut engine = started();
        let before = engine.player_stats();
        let transition = engine.choose(1).unwrap();

        assert_eq!(transition.kind, TransitionKind::Advanced);
        assert_eq!(engine.current_chapter().unwrap().id, DEATH);
        assert_eq!(engine.player_stats(), before);
        assert!(engine.current_chapter().unwrap().is_terminal());
    }

    #[test]
    fn lethal_deltas_force_death_over_declared_target() {
        let mut engine = engine_with(
            MemoryStore::default(),
            EngineConfig {
                starting_stats: PlayerStats::new(3, 10),
                ..EngineConfig::default()
            },
        );
        engine.start();
        let transition = engine.choose(2).unwrap();

        assert_eq!(transition.kind, TransitionKind::Died);
        assert_eq!(transition.to, DEATH);
        assert_eq!(engine.player_stats().health(), 0);
        assert_eq!(engine.current_chapter().unwrap().id, DEATH);
    }

    #[test]
    fn any_lethal_decision_lands_on_death() {
        for target in [Some(SHELTER), Some(RESCUED), Some(ChapterId(404)), None] {
            let mut engine = started();
            let decision = Decision::new("Fall", target).with_deltas(-10, 0);
            let transition = engine.apply_decision(&decision).unwrap();
            assert_eq!(transition.to, DEATH, "target {target:?}");
        }
    }

    #[test]
    fn advancing_applies_deltas_and_recomputes_completion() {
        let mut engine = started();
        engine.choose(0).unwrap();
        assert_eq!(engine.current_chapter().unwrap().id, SHELTER);
        assert_eq!(engine.player_stats().energy(), 8);
        assert_eq!(engine.completion_percentage(), 25);

        engine.choose(0).unwrap();
        engine.choose(0).unwrap();
        assert_eq!(engine.current_chapter().unwrap().id, RESCUED);
        assert_eq!(engine.completion_percentage(), 100);
        assert_eq!(engine.player_stats().energy(), 4);
    }

    #[test]
    fn missing_target_keeps_player_in_place() {
        let store = SharedStore::default();
        let mut engine = engine_with(store.clone(), EngineConfig::default());
        engine.start();
        let decision = Decision::new("Into the fog", Some(ChapterId(404))).with_deltas(-1, -1);

        let err = engine.apply_decision(&decision).unwrap_err();
        assert!(matches!(err, EngineError::ChapterNotFound(ChapterId(404))));
        assert_eq!(engine.current_chapter().unwrap().id, FIRST);
        assert_eq!(saved_chapter(&store), Some(11));
        // deltas are applied before the target is resolved
        assert_eq!(engine.player_stats(), PlayerStats::new(9, 9));
    }

    #[test]
    fn untargeted_decision_stays() {
        let mut engine = started();
        engine.choose(0).unwrap();
        let transition = engine.choose(1).unwrap();
        assert_eq!(transition.kind, TransitionKind::Stayed);
        assert_eq!(transition.to, SHELTER);
        assert!(transition.persisted);
        assert_eq!(engine.player_stats(), PlayerStats::new(10, 10));
        assert_eq!(engine.transition_log().last(), Some("Stayed: chapter 12"));
    }

    #[test]
    fn staying_reports_failed_checkpoint_write() {
        let mut engine = engine_with(BrokenStore, EngineConfig::default());
        engine.start();
        engine.choose(0).unwrap();
        let transition = engine.choose(1).unwrap();
        assert_eq!(transition.kind, TransitionKind::Stayed);
        assert!(!transition.persisted);
    }

    #[test]
    fn endings_are_absorbing() {
        let mut engine = started();
        for _ in 0..3 {
            engine.choose(0).unwrap();
        }
        assert_eq!(engine.current_chapter().unwrap().id, RESCUED);
        let stats = engine.player_stats();

        let err = engine
            .apply_decision(&Decision::new("Search the wreck", Some(SHELTER)).with_deltas(0, -2))
            .unwrap_err();
        assert!(matches!(err, EngineError::ChapterIsTerminal(RESCUED)));
        assert_eq!(engine.current_chapter().unwrap().id, RESCUED);
        assert_eq!(engine.player_stats(), stats);

        let mut engine = started();
        engine.choose(1).unwrap();
        assert_eq!(engine.current_chapter().unwrap().id, DEATH);
        for decision in [
            Decision::new("Crawl back", Some(FIRST)),
            Decision::new("Fall again", None).with_deltas(-10, 0),
        ] {
            assert!(matches!(
                engine.apply_decision(&decision),
                Err(EngineError::ChapterIsTerminal(DEATH))
            ));
        }
        assert_eq!(engine.current_chapter().unwrap().id, DEATH);

        assert_eq!(engine.reset_story(StatReset::Preserve).to, FIRST);
        assert_eq!(engine.choose(0).unwrap().to, SHELTER);
    }

    #[test]
    fn out_of_range_choice_is_reported() {
        let mut engine = started();
        assert!(matches!(
            engine.choose(7),
            Err(EngineError::DecisionOutOfRange { chapter: FIRST, index: 7 })
        ));
        engine.choose(1).unwrap();
        assert!(matches!(
            engine.choose(0),
            Err(EngineError::DecisionOutOfRange { chapter: DEATH, .. })
        ));
    }

    #[test]
    fn depleted_energy_is_advisory_by_default() {
        let mut engine = engine_with(
            MemoryStore::default(),
            EngineConfig {
                starting_stats: PlayerStats::new(10, 0),
                ..EngineConfig::default()
            },
        );
        engine.start();
        assert!(engine.player_stats().is_depleted());
        assert_eq!(engine.choose(0).unwrap().to, SHELTER);
    }

    #[test]
    fn enforced_gate_blocks_depleted_player() {
        let mut engine = engine_with(
            MemoryStore::default(),
            EngineConfig {
                starting_stats: PlayerStats::new(10, 0),
                energy_gate: EnergyGate::Enforced,
                ..EngineConfig::default()
            },
        );
        engine.start();
        assert!(matches!(engine.choose(0), Err(EngineError::EnergyDepleted)));
        assert_eq!(engine.current_chapter().unwrap().id, FIRST);

        engine.credit_steps_as_energy(5000, 5000);
        assert_eq!(engine.choose(0).unwrap().to, SHELTER);
    }

    #[test]
    fn reset_relocates_and_counts_attempts() {
        let store = SharedStore::default();
        let mut engine = engine_with(store.clone(), EngineConfig::default());
        engine.start();
        engine.choose(0).unwrap();
        engine.choose(0).unwrap();

        for expected in 1..=3 {
            let transition = engine.reset_story(StatReset::Preserve);
            assert_eq!(transition.kind, TransitionKind::Reset);
            assert_eq!(engine.current_chapter().unwrap().id, FIRST);
            assert_eq!(engine.attempt_count(), expected);
            assert_eq!(engine.completion_percentage(), 0);
        }
        assert_eq!(saved_chapter(&store), Some(11));
        assert_eq!(store.get_int("attempts").unwrap(), Some(3));
    }

    #[test]
    fn reset_preserves_or_restores_stats() {
        let mut engine = started();
        engine.choose(0).unwrap();
        engine.reset_story(StatReset::Preserve);
        assert_eq!(engine.player_stats(), PlayerStats::new(10, 8));

        engine.choose(0).unwrap();
        engine.reset_story(StatReset::Restore);
        assert_eq!(engine.player_stats(), PlayerStats::new(10, 10));
    }

    #[test]
    fn reset_with_config_uses_configured_policy() {
        let mut engine = engine_with(
            MemoryStore::default(),
            EngineConfig {
                reset_stats: StatReset::Restore,
                ..EngineConfig::default()
            },
        );
        engine.start();
        engine.choose(2).unwrap();
        engine.reset_story_with_config();
        assert_eq!(engine.player_stats(), PlayerStats::new(10, 10));
    }

    #[test]
    fn reset_after_death_revives_only_with_restore() {
        let mut engine = started();
        engine
            .apply_decision(&Decision::new("Fall", None).with_deltas(-10, 0))
            .unwrap();
        engine.reset_story(StatReset::Preserve);
        assert_eq!(engine.current_chapter().unwrap().id, FIRST);
        assert_eq!(engine.player_stats().health(), 0);

        engine.reset_story(StatReset::Restore);
        assert_eq!(engine.player_stats().health(), 10);
    }

    #[test]
    fn attempts_survive_restart() {
        let store = SharedStore::default();
        {
            let mut engine = engine_with(store.clone(), EngineConfig::default());
            engine.start();
            engine.reset_story(StatReset::Preserve);
            engine.reset_story(StatReset::Preserve);
            engine.choose(0).unwrap();
        }

        let mut engine = engine_with(store, EngineConfig::default());
        engine.start();
        assert_eq!(engine.attempt_count(), 2);
        assert_eq!(engine.current_chapter().unwrap().id, SHELTER);
    }

    #[test]
    fn reset_before_start_keeps_saved_attempts() {
        let store = SharedStore::default();
        store.clone().set_int("attempts", 4).unwrap();
        store.clone().set_int("current_chapter", 13).unwrap();
        let mut engine = engine_with(store.clone(), EngineConfig::default());

        let transition = engine.reset_story(StatReset::Preserve);
        assert_eq!(transition.from, None);
        assert_eq!(engine.attempt_count(), 5);
        assert_eq!(engine.current_chapter().unwrap().id, FIRST);
        assert_eq!(store.get_int("attempts").unwrap(), Some(5));
    }

    #[test]
    fn resume_jumps_to_externally_saved_checkpoint() {
        let store = SharedStore::default();
        let mut engine = engine_with(store.clone(), EngineConfig::default());
        engine.start();

        store.clone().set_int("current_chapter", 13).unwrap();
        let transition = engine.resume_story().unwrap();
        assert_eq!(transition.kind, TransitionKind::Resumed);
        assert_eq!(transition.from, Some(FIRST));
        assert_eq!(engine.current_chapter().unwrap().id, RIDGE);
        assert_eq!(engine.completion_percentage(), 60);
    }

    #[test]
    fn resume_rejects_missing_or_unknown_checkpoint() {
        let store = SharedStore::default();
        let mut engine = engine_with(store.clone(), EngineConfig::default());
        engine.start();

        store.clone().set_int("current_chapter", 404).unwrap();
        assert!(matches!(
            engine.resume_story(),
            Err(EngineError::ChapterNotFound(ChapterId(404)))
        ));
        store.clone().remove("current_chapter").unwrap();
        assert!(matches!(engine.resume_story(), Err(EngineError::NoCheckpoint)));
        assert_eq!(engine.current_chapter().unwrap().id, FIRST);
    }

    #[test]
    fn resume_reports_unreadable_checkpoint() {
        let mut engine = engine_with(BrokenStore, EngineConfig::default());
        engine.start();
        engine.choose(0).unwrap();

        let err = engine.resume_story().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Checkpoint(CheckpointError::InvalidData(_))
        ));
        assert_eq!(engine.current_chapter().unwrap().id, SHELTER);
    }

    #[test]
    fn credit_pending_steps_runs_commit_protocol() {
        let mut engine = engine_with(
            MemoryStore::default(),
            EngineConfig {
                starting_stats: PlayerStats::new(10, 2),
                ..EngineConfig::default()
            },
        );
        engine.start();
        engine.record_steps(1000);
        engine.record_steps(1500);
        assert_eq!(engine.pending_steps(), 2500);

        let credit = engine.credit_pending_steps(5000);
        assert_eq!(credit, EnergyCredit { earned: 5, energy: 7 });
        assert_eq!(engine.pending_steps(), 0);
        assert_eq!(engine.player_stats().energy(), 7);
    }

    #[test]
    fn credit_steps_clamps_to_full_bar() {
        let mut engine = started();
        let credit = engine.credit_steps_as_energy(7000, 5000);
        assert_eq!(credit.earned, 10);
        assert_eq!(engine.player_stats().energy(), 10);
        assert_eq!(engine.credit_steps_as_energy(7000, 0).earned, 0);
    }

    #[test]
    fn transitions_are_logged() {
        let mut engine = started();
        engine.choose(0).unwrap();
        engine.reset_story(StatReset::Preserve);
        let lines: Vec<&str> = engine.transition_log().collect();
        assert_eq!(
            lines,
            vec![
                "Started: chapter 11",
                "Advanced: chapter 11 -> 12",
                "Reset: chapter 12 -> 11",
            ]
        );
    }

    #[test]
    fn invalid_story_fails_to_load() {
        let mut catalog = test_catalog();
        catalog.chapters.clear();
        let result =
            StoryEngine::new(&catalog, CheckpointStore::in_memory(), EngineConfig::default());
        assert!(matches!(result, Err(StoryDataError::Validation(_))));
    }
}

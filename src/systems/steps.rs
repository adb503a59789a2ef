use bevy_utils::tracing::{debug, warn};
use thiserror::Error;

use crate::core::engine::StoryEngine;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepSourceError {
    #[error("step data access was not granted: {0}")]
    NotAuthorized(String),
    #[error("step data unavailable: {0}")]
    Unavailable(String),
}

/// A source of raw step counts, e.g. a device pedometer.
#[allow(async_fn_in_trait)]
pub trait StepSource {
    async fn authorize(&mut self) -> Result<(), StepSourceError>;

    /// Steps walked since the previous successful call.
    async fn steps_since_last_sync(&mut self) -> Result<i64, StepSourceError>;
}

/// Pull new steps from `source` into the engine's pending pool.
/// A failed sync leaves the pool untouched.
pub async fn sync_steps<S: StepSource>(
    source: &mut S,
    engine: &mut StoryEngine,
) -> Result<i64, StepSourceError> {
    if let Err(err) = source.authorize().await {
        warn!(error = %err, "step source refused authorization");
        return Err(err);
    }
    let steps = source.steps_since_last_sync().await.map_err(|err| {
        warn!(error = %err, "step source fetch failed");
        err
    })?;
    let steps = steps.max(0);
    engine.record_steps(steps);
    debug!(steps, pending = engine.pending_steps(), "steps synced");
    Ok(steps)
}

/// Step source that hands out queued counts; used by the debug host and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedStepSource {
    queued: Vec<i64>,
    denied: bool,
}

impl FixedStepSource {
    pub fn new(steps: impl IntoIterator<Item = i64>) -> Self {
        Self {
            queued: steps.into_iter().collect(),
            denied: false,
        }
    }

    pub fn denied() -> Self {
        Self {
            queued: Vec::new(),
            denied: true,
        }
    }

    pub fn push(&mut self, steps: i64) {
        self.queued.push(steps);
    }
}

impl StepSource for FixedStepSource {
    async fn authorize(&mut self) -> Result<(), StepSourceError> {
        if self.denied {
            Err(StepSourceError::NotAuthorized("permission denied".to_string()))
        } else {
            Ok(())
        }
    }

    async fn steps_since_last_sync(&mut self) -> Result<i64, StepSourceError> {
        if self.queued.is_empty() {
            return Err(StepSourceError::Unavailable("no samples queued".to_string()));
        }
        Ok(self.queued.remove(0))
    }
}

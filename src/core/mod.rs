pub mod config;
pub mod engine;
pub mod snapshot;

pub use config::{load_engine_config, ConfigError, EnergyGate, EngineConfig, StatReset};
pub use engine::{EngineError, StoryEngine, Transition, TransitionKind};
pub use snapshot::{DecisionView, StorySnapshot};

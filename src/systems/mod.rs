pub mod steps;

pub use steps::{sync_steps, FixedStepSource, StepSource, StepSourceError};

pub mod economy;
pub mod ledger;
pub mod progression;

pub use economy::{energy_from_steps, EnergyCredit, PendingSteps};
pub use ledger::{PlayerStats, STAT_MAX, STAT_MIN};
pub use progression::{AttemptCounter, ProgressionState, TransitionLog};

use bevy_ecs::prelude::*;

use crate::simulation::ledger::{PlayerStats, STAT_MAX};

/// Energy earned for walking `steps_to_convert` against `total_steps_goal`.
///
/// Walking the full goal is worth a full energy bar; partial progress is
/// floored to whole points. A non-positive goal earns nothing.
pub fn energy_from_steps(steps_to_convert: i64, total_steps_goal: i64) -> i32 {
    if total_steps_goal <= 0 || steps_to_convert <= 0 {
        return 0;
    }
    let earned = steps_to_convert as i128 * STAT_MAX as i128 / total_steps_goal as i128;
    earned.min(STAT_MAX as i128) as i32
}

/// Steps reported by the step source that have not been turned into energy yet.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingSteps(i64);

impl PendingSteps {
    pub fn record(&mut self, steps: i64) {
        if steps > 0 {
            self.0 = self.0.saturating_add(steps);
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyCredit {
    pub earned: i32,
    pub energy: i32,
}

/// Credit energy for `steps_to_convert`; the ledger is updated before any
/// caller-side pending pool is cleared.
pub fn credit_energy(
    stats: &mut PlayerStats,
    steps_to_convert: i64,
    total_steps_goal: i64,
) -> EnergyCredit {
    let earned = energy_from_steps(steps_to_convert, total_steps_goal);
    stats.set_energy(stats.energy() as i64 + earned as i64);
    EnergyCredit {
        earned,
        energy: stats.energy(),
    }
}

/// Convert the whole pending pool, then empty it. With no usable goal
/// nothing is converted and the pool is kept for the next credit.
pub fn credit_pending(
    stats: &mut PlayerStats,
    pending: &mut PendingSteps,
    total_steps_goal: i64,
) -> EnergyCredit {
    let credit = credit_energy(stats, pending.value(), total_steps_goal);
    if total_steps_goal > 0 {
        pending.clear();
    }
    credit
}

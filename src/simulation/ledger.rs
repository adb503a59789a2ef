use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 10;

fn clamp_stat(value: i64) -> i32 {
    value.clamp(STAT_MIN as i64, STAT_MAX as i64) as i32
}

/// Health and energy of the player, both held in `STAT_MIN..=STAT_MAX`.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    health: i32,
    energy: i32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            health: STAT_MAX,
            energy: STAT_MAX,
        }
    }
}

impl PlayerStats {
    pub fn new(health: i32, energy: i32) -> Self {
        Self {
            health: clamp_stat(health as i64),
            energy: clamp_stat(energy as i64),
        }
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn energy(&self) -> i32 {
        self.energy
    }

    pub fn apply_deltas(&mut self, health_delta: i32, energy_delta: i32) -> PlayerStats {
        self.health = clamp_stat(self.health as i64 + health_delta as i64);
        self.energy = clamp_stat(self.energy as i64 + energy_delta as i64);
        *self
    }

    pub fn set_energy(&mut self, value: i64) {
        self.energy = clamp_stat(value);
    }

    /// Advisory only: decisions are still applied at zero energy unless the
    /// engine is configured to enforce the gate.
    pub fn is_depleted(&self) -> bool {
        self.energy <= 0
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn kill(&mut self) {
        self.health = 0;
    }
}

// Stored configs may carry out-of-range values; clamp on the way in.
impl<'de> Deserialize<'de> for PlayerStats {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            health: i32,
            energy: i32,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(PlayerStats::new(raw.health, raw.energy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_stay_in_bounds_for_extreme_inputs() {
        let deltas = [i32::MIN, -11, -10, -3, 0, 4, 10, 11, i32::MAX];
        for start in STAT_MIN..=STAT_MAX {
            for &dh in &deltas {
                for &de in &deltas {
                    let mut stats = PlayerStats::new(start, start);
                    let result = stats.apply_deltas(dh, de);
                    assert!((STAT_MIN..=STAT_MAX).contains(&result.health()));
                    assert!((STAT_MIN..=STAT_MAX).contains(&result.energy()));
                    assert_eq!(result, stats);
                }
            }
        }
    }

    #[test]
    fn apply_deltas_adds_then_clamps() {
        let mut stats = PlayerStats::new(3, 8);
        let result = stats.apply_deltas(-5, 4);
        assert_eq!(result.health(), 0);
        assert_eq!(result.energy(), 10);
    }

    #[test]
    fn set_energy_clamps() {
        let mut stats = PlayerStats::default();
        stats.set_energy(-4);
        assert_eq!(stats.energy(), 0);
        assert!(stats.is_depleted());
        stats.set_energy(i64::MAX);
        assert_eq!(stats.energy(), 10);
    }

    #[test]
    fn kill_is_idempotent() {
        let mut stats = PlayerStats::new(4, 6);
        stats.kill();
        stats.kill();
        assert_eq!(stats.health(), 0);
        assert_eq!(stats.energy(), 6);
        assert!(stats.is_dead());
    }

    #[test]
    fn deserialize_clamps_out_of_range_values() {
        let stats: PlayerStats = serde_json::from_str(r#"{"health": 42, "energy": -3}"#).unwrap();
        assert_eq!(stats, PlayerStats::new(10, 0));
    }
}

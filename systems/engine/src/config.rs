//! Session tunables loaded from configuration files.

use std::time::Duration;

use candy_quest_core::Stats;
use candy_quest_system_fog::RadiusPolicy;
use candy_quest_system_mapgen::MapgenConfig;
use candy_quest_system_pathing::MovementRules;
use serde::{Deserialize, Serialize};

/// Everything a session needs besides content tables and participants.
///
/// Missing fields fall back to their defaults, so an empty document is a
/// valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Map generator tunables.
    pub mapgen: MapgenConfig,
    /// Seed shared by map generation and site placement.
    pub seed: u64,
    /// Houses placed on room cells.
    pub house_count: u32,
    /// Encounter sites placed on corridor cells.
    pub encounter_count: u32,
    /// Movement budget rules.
    pub movement: MovementRules,
    /// Fog exploration radius policy.
    pub fog: RadiusPolicy,
    /// Pause between the arrival and choice stages of an encounter.
    pub stage_delay_ms: u64,
    /// Stats every character starts with.
    pub starting_stats: Stats,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mapgen: MapgenConfig::default(),
            seed: 31,
            house_count: 4,
            encounter_count: 3,
            movement: MovementRules::default(),
            fog: RadiusPolicy::default(),
            stage_delay_ms: 0,
            starting_stats: Stats::default(),
        }
    }
}

impl SessionConfig {
    /// Pause inserted between encounter stages.
    #[must_use]
    pub fn stage_delay(&self) -> Duration {
        Duration::from_millis(self.stage_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fall_back_to_defaults() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"seed": 9, "fog": {"fixed": 5}, "mapgen": {"columns": 41}, "starting_stats": {"vision": 6}}"#,
        )
        .expect("valid config");

        assert_eq!(config.seed, 9);
        assert_eq!(config.fog, RadiusPolicy::Fixed(5));
        assert_eq!(config.mapgen.columns, 41);
        assert_eq!(config.mapgen.rows, MapgenConfig::default().rows);
        assert_eq!(config.starting_stats.vision, 6);
        assert_eq!(config.starting_stats.health, Stats::default().health);
        assert_eq!(config.house_count, SessionConfig::default().house_count);
        assert_eq!(config.stage_delay(), Duration::ZERO);
    }
}

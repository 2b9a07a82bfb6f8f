use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::types::{MatchType, Turn};

/// Rules of one match. Everything the engine needs besides the seed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchConfig {
    pub match_type: MatchType,
    pub total_turns: Turn,
    /// Cap on ground + airborne food for respawns.
    pub max_food: usize,
    pub food_respawn_probability: f64,
    pub action_energy_cost: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_type: MatchType::DUEL,
            total_turns: TOTAL_TURNS,
            max_food: MAX_FOOD,
            food_respawn_probability: FOOD_RESPAWN_PROBABILITY,
            action_energy_cost: ACTION_ENERGY_COST,
        }
    }
}

impl MatchConfig {
    pub fn with_match_type(match_type: MatchType) -> Self {
        Self {
            match_type,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_constants() {
        let config = MatchConfig::default();
        assert_eq!(config.total_turns, TOTAL_TURNS);
        assert_eq!(config.max_food, MAX_FOOD);
        assert_eq!(config.match_type, MatchType::DUEL);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"totalTurns": 10, "matchType": {"teamCount": 4, "playersPerTeam": 1}}"#;
        let config: MatchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.total_turns, 10);
        assert_eq!(config.match_type, MatchType::FOUR_WAY);
        assert_eq!(config.action_energy_cost, ACTION_ENERGY_COST);
    }
}

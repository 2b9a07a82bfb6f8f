use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use foodfight_core::{MatchConfig, MatchType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default per-match time budget per controller.
pub const TIME_BUDGET_MS: u64 = 60_000;
/// Slack on top of the remaining budget before a call counts as hung.
pub const GRACE_MS: u64 = 250;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("match type {0:?} needs 1 to 26 players and at least one per team")]
    InvalidMatchType(MatchType),
    #[error("a match needs at least one turn")]
    NoTurns,
}

/// Player symbols run 'a'..='z'.
const MAX_PLAYERS: usize = 26;

/// Everything needed to run one match from the command line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostConfig {
    #[serde(rename = "match")]
    pub match_config: MatchConfig,
    pub seed: u64,
    pub time_budget_ms: u64,
    pub grace_ms: u64,
    /// Dispatch all controller calls of a turn before waiting on any.
    pub parallel_controllers: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            seed: 0,
            time_budget_ms: TIME_BUDGET_MS,
            grace_ms: GRACE_MS,
            parallel_controllers: false,
        }
    }
}

impl HostConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject match rules the field generator cannot build a match from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let match_type = self.match_config.match_type;
        if match_type.team_count == 0
            || match_type.players_per_team == 0
            || match_type.player_count() > MAX_PLAYERS
        {
            return Err(ConfigError::InvalidMatchType(match_type));
        }
        if self.match_config.total_turns == 0 {
            return Err(ConfigError::NoTurns);
        }
        Ok(())
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodfight_core::MatchType;
    use std::io::Write;

    #[test]
    fn loads_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"seed": 12,
                "match": {{"totalTurns": 50,
                           "matchType": {{"teamCount": 2, "playersPerTeam": 2}}}}}}"#
        )
        .unwrap();
        let config = HostConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.seed, 12);
        assert_eq!(config.match_config.total_turns, 50);
        assert_eq!(config.match_config.match_type, MatchType::DOUBLES);
        assert_eq!(config.time_budget(), Duration::from_secs(60));
        assert!(!config.parallel_controllers);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = HostConfig::from_json_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    fn load(json: &str) -> Result<HostConfig, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        HostConfig::from_json_file(file.path())
    }

    #[test]
    fn empty_match_type_is_rejected() {
        let err = load(r#"{"match": {"matchType": {"teamCount": 0, "playersPerTeam": 1}}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMatchType(t) if t.team_count == 0));

        let err = load(r#"{"match": {"matchType": {"teamCount": 2, "playersPerTeam": 0}}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMatchType(_)));
    }

    #[test]
    fn too_many_players_is_rejected() {
        let err = load(r#"{"match": {"matchType": {"teamCount": 9, "playersPerTeam": 3}}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMatchType(t) if t.player_count() == 27));
        let full = load(r#"{"match": {"matchType": {"teamCount": 13, "playersPerTeam": 2}}}"#);
        assert!(full.is_ok());
    }

    #[test]
    fn zero_turns_is_rejected() {
        let err = load(r#"{"match": {"totalTurns": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoTurns));
        assert!(HostConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ seed: ").unwrap();
        let err = HostConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}

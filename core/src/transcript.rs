use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::hash::match_digest;
use crate::init::generate_field;
use crate::rng::seeded;
use crate::step::run_turn;
use crate::types::{ActionMap, FieldState};

/// Re-run a match from its inputs. Returns the initial snapshot followed by
/// one snapshot per transcript entry.
pub fn replay(config: &MatchConfig, seed: u64, transcript: &[ActionMap]) -> Vec<FieldState> {
    let mut rng = seeded(seed);
    let mut field = generate_field(config, &mut rng);
    let mut history = Vec::with_capacity(transcript.len() + 1);
    for actions in transcript {
        let next = run_turn(&field, actions, config, &mut rng);
        history.push(field);
        field = next;
    }
    history.push(field);
    history
}

/// Everything a finished match produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub config: MatchConfig,
    pub seed: u64,
    /// Initial snapshot plus one per turn.
    pub history: Vec<FieldState>,
    /// Action map fed to each turn.
    pub transcript: Vec<ActionMap>,
}

impl MatchRecord {
    pub fn final_field(&self) -> Option<&FieldState> {
        self.history.last()
    }

    /// Hex SHA-256 over seed, transcript and final snapshot.
    pub fn digest(&self) -> String {
        match self.final_field() {
            Some(last) => hex::encode(match_digest(self.seed, &self.transcript, last)),
            None => String::new(),
        }
    }

    /// Whether replaying the transcript reproduces the recorded history.
    pub fn verify(&self) -> bool {
        replay(&self.config, self.seed, &self.transcript) == self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, MatchType};

    fn scripted(turns: u32) -> Vec<ActionMap> {
        (0..turns)
            .map(|t| {
                ActionMap::from([
                    ('a', Some(Action::MoveForward)),
                    ('b', if t % 3 == 0 { Some(Action::TurnLeft) } else { None }),
                ])
            })
            .collect()
    }

    #[test]
    fn replay_length_matches_transcript() {
        let config = MatchConfig::default();
        let history = replay(&config, 3, &scripted(25));
        assert_eq!(history.len(), 26);
        for (turn, field) in history.iter().enumerate() {
            assert_eq!(field.turn as usize, turn);
        }
    }

    #[test]
    fn record_verifies_and_digests() {
        let config = MatchConfig {
            total_turns: 30,
            ..MatchConfig::with_match_type(MatchType::DUEL)
        };
        let transcript = scripted(30);
        let record = MatchRecord {
            history: replay(&config, 9, &transcript),
            config,
            seed: 9,
            transcript,
        };
        assert!(record.verify());
        assert_eq!(record.digest().len(), 64);

        let mut tampered = record.clone();
        tampered.transcript[10].insert('a', Some(Action::Duck));
        assert!(!tampered.verify());
        assert_ne!(tampered.digest(), record.digest());
    }
}

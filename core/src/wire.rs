//! JSON shape of a field snapshot, shared by the agent protocol and history
//! export.
//!
//! ```json
//! {"turnNumber": 3,
//!  "teamStates": [{"symbol": "A",
//!                  "playerStates": [{"symbol": "a", "location": [x, y], "height": 50.0,
//!                                    "heading": 1.2, "inventory": {"left": "EGG"},
//!                                    "energy": 99.5}],
//!                  "table": {"location": [x, y], "food": ["HAM"]},
//!                  "score": {"FIRST_MOVE": 1}}],
//!  "foodStates": [{"type": "APPLE", "location": [x, y], "height": 0.0, "heading": 0.0}],
//!  "collisionStates": [{"location": [x, y], "damage": 4.2}]}
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::types::*;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed field JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("field has no teams")]
    NoTeams,
    #[error("team {team:?} has {found} players, expected {expected}")]
    UnevenTeams {
        team: Symbol,
        expected: usize,
        found: usize,
    },
    #[error("table of team {0:?} lists a food type twice")]
    DuplicateTableFood(Symbol),
    #[error("more teams or players than a match type can hold")]
    TooLarge,
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

// ── Wire types ──────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireField {
    pub turn_number: Turn,
    pub team_states: Vec<WireTeam>,
    pub food_states: Vec<WireFood>,
    pub collision_states: Vec<WireCollision>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTeam {
    pub symbol: Symbol,
    pub player_states: Vec<WirePlayer>,
    pub table: WireTable,
    pub score: BTreeMap<EventKind, u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WirePlayer {
    pub symbol: Symbol,
    pub location: [f64; 2],
    pub height: f64,
    pub heading: f64,
    pub inventory: WireInventory,
    pub energy: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireInventory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<FoodType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<FoodType>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireTable {
    pub location: [f64; 2],
    pub food: Vec<FoodType>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireFood {
    #[serde(rename = "type")]
    pub food_type: FoodType,
    pub location: [f64; 2],
    pub height: f64,
    pub heading: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireCollision {
    pub location: [f64; 2],
    pub damage: f64,
}

// ── Conversions ─────────────────────────────────────────────

fn to_pair(v: Vec2) -> [f64; 2] {
    [v.x, v.y]
}

fn from_pair([x, y]: [f64; 2]) -> Vec2 {
    Vec2::new(x, y)
}

pub fn to_wire(field: &FieldState) -> WireField {
    WireField {
        turn_number: field.turn,
        team_states: field
            .teams
            .iter()
            .map(|t| WireTeam {
                symbol: t.symbol,
                player_states: t
                    .players
                    .iter()
                    .map(|p| WirePlayer {
                        symbol: p.symbol,
                        location: to_pair(p.location),
                        height: p.height,
                        heading: p.heading,
                        inventory: WireInventory {
                            left: p.inventory.left,
                            right: p.inventory.right,
                        },
                        energy: p.energy,
                    })
                    .collect(),
                table: WireTable {
                    location: to_pair(t.table.location),
                    food: t.table.food.iter().copied().collect(),
                },
                score: t.score.counts().clone(),
            })
            .collect(),
        food_states: field
            .foods
            .iter()
            .map(|f| WireFood {
                food_type: f.food_type,
                location: to_pair(f.location),
                height: f.height,
                heading: f.heading,
            })
            .collect(),
        collision_states: field
            .collisions
            .iter()
            .map(|c| WireCollision {
                location: to_pair(c.location),
                damage: c.damage,
            })
            .collect(),
    }
}

/// Rebuild a snapshot, inferring the match type from team and player counts.
pub fn from_wire(wire: WireField) -> Result<FieldState, WireError> {
    let first = wire.team_states.first().ok_or(WireError::NoTeams)?;
    let per_team = first.player_states.len();
    let match_type = MatchType::new(
        u8::try_from(wire.team_states.len()).map_err(|_| WireError::TooLarge)?,
        u8::try_from(per_team).map_err(|_| WireError::TooLarge)?,
    );

    let mut teams = Vec::with_capacity(wire.team_states.len());
    for team in wire.team_states {
        if team.player_states.len() != per_team {
            return Err(WireError::UnevenTeams {
                team: team.symbol,
                expected: per_team,
                found: team.player_states.len(),
            });
        }
        let food: BTreeSet<FoodType> = team.table.food.iter().copied().collect();
        if food.len() != team.table.food.len() {
            return Err(WireError::DuplicateTableFood(team.symbol));
        }
        teams.push(TeamState {
            symbol: team.symbol,
            players: team
                .player_states
                .into_iter()
                .map(|p| PlayerState {
                    symbol: p.symbol,
                    location: from_pair(p.location),
                    height: p.height,
                    heading: p.heading,
                    inventory: Inventory {
                        left: p.inventory.left,
                        right: p.inventory.right,
                    },
                    energy: p.energy,
                })
                .collect(),
            table: TableState {
                location: from_pair(team.table.location),
                food,
            },
            score: ScoreState::from_counts(team.score),
        });
    }

    let field = FieldState {
        turn: wire.turn_number,
        match_type,
        teams,
        foods: wire
            .food_states
            .into_iter()
            .map(|f| FoodState {
                food_type: f.food_type,
                location: from_pair(f.location),
                height: f.height,
                heading: f.heading,
            })
            .collect(),
        collisions: wire
            .collision_states
            .into_iter()
            .map(|c| CollisionState {
                location: from_pair(c.location),
                damage: c.damage,
            })
            .collect(),
    };
    field.check_invariants()?;
    Ok(field)
}

pub fn encode_field(field: &FieldState) -> Result<String, WireError> {
    Ok(serde_json::to_string(&to_wire(field))?)
}

pub fn decode_field(json: &str) -> Result<FieldState, WireError> {
    from_wire(serde_json::from_str(json)?)
}

impl Serialize for FieldState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_wire(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireField::deserialize(deserializer)?;
        from_wire(wire).map_err(D::Error::custom)
    }
}

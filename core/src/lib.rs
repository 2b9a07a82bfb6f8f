pub mod actions;
pub mod collisions;
pub mod config;
pub mod constants;
pub mod food;
pub mod hash;
pub mod init;
pub mod physics;
pub mod rng;
pub mod scoring;
pub mod step;
pub mod transcript;
pub mod types;
pub mod wire;

pub use actions::is_valid;
pub use config::MatchConfig;
pub use constants::*;
pub use food::{find_spawn_location, respawn_food, spawn_food};
pub use hash::*;
pub use init::{generate_field, player_symbol, team_symbol};
pub use physics::{move_with_clipping, Rect};
pub use rng::*;
pub use step::run_turn;
pub use transcript::{replay, MatchRecord};
pub use types::*;
pub use wire::{decode_field, encode_field, from_wire, to_wire, WireError, WireField};

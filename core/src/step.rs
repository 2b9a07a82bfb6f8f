use rand::Rng;

use crate::actions::apply_actions;
use crate::collisions::resolve_collisions;
use crate::config::MatchConfig;
use crate::food::{move_food, respawn_food};
use crate::scoring::{break_ties, score_tables};
use crate::types::*;

/// Core deterministic transition function.
///
/// Phase order:
///  0. Validate the snapshot, drop last turn's collisions, advance the turn
///  1. Apply actions (shuffled player order)
///  2. Move airborne food
///  3. Collisions + knockback + damage
///  4. Table scoring
///  5. Tie-break (final turn only)
///  6. Food respawn
pub fn run_turn<R: Rng + ?Sized>(
    prev: &FieldState,
    actions: &ActionMap,
    config: &MatchConfig,
    rng: &mut R,
) -> FieldState {
    // 0. Malformed snapshots are engine bugs, not runtime conditions.
    if let Err(violation) = prev.check_invariants() {
        panic!("turn {} snapshot is malformed: {violation}", prev.turn);
    }
    let mut field = prev.clone();
    field.collisions.clear();
    field.turn += 1;

    // 1. Actions
    field = apply_actions(field, actions, config, rng);

    // 2. Food flight
    field = move_food(field, rng);

    // 3. Collisions
    field = resolve_collisions(field, rng);

    // 4. Tables
    field = score_tables(field);

    // 5. Tie-break
    if field.turn == config.total_turns {
        field = break_ties(field, rng);
    }

    // 6. Respawn
    respawn_food(field, config, rng)
}

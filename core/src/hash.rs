use sha2::{Digest, Sha256};

use crate::types::{ActionMap, FieldState, Vec2};

/// SHA-256 hash of the full action transcript.
pub fn hash_transcript(transcript: &[ActionMap]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for turn_actions in transcript {
        hasher.update((turn_actions.len() as u32).to_le_bytes());
        for (symbol, action) in turn_actions {
            hasher.update((*symbol as u32).to_le_bytes());
            hasher.update([action.map_or(0, |a| a.code())]);
        }
    }
    hasher.finalize().into()
}

/// SHA-256 commitment of the seed.
pub fn hash_seed(seed: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.finalize().into()
}

fn update_vec(hasher: &mut Sha256, v: Vec2) {
    hasher.update(v.x.to_le_bytes());
    hasher.update(v.y.to_le_bytes());
}

/// SHA-256 over every observable value of a snapshot, in storage order.
pub fn hash_field(field: &FieldState) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(field.turn.to_le_bytes());
    for team in &field.teams {
        hasher.update((team.symbol as u32).to_le_bytes());
        for p in &team.players {
            hasher.update((p.symbol as u32).to_le_bytes());
            update_vec(&mut hasher, p.location);
            hasher.update(p.height.to_le_bytes());
            hasher.update(p.heading.to_le_bytes());
            hasher.update(p.energy.to_le_bytes());
            for hand in [p.inventory.left, p.inventory.right] {
                hasher.update([hand.map_or(0, |f| f as u8 + 1)]);
            }
        }
        update_vec(&mut hasher, team.table.location);
        for food in &team.table.food {
            hasher.update([*food as u8]);
        }
        for (kind, count) in team.score.counts() {
            hasher.update([*kind as u8]);
            hasher.update(count.to_le_bytes());
        }
    }
    for food in &field.foods {
        hasher.update([food.food_type as u8]);
        update_vec(&mut hasher, food.location);
        hasher.update(food.height.to_le_bytes());
        hasher.update(food.heading.to_le_bytes());
    }
    for c in &field.collisions {
        update_vec(&mut hasher, c.location);
        hasher.update(c.damage.to_le_bytes());
    }
    hasher.finalize().into()
}

/// Digest binding a match outcome to its inputs.
pub fn match_digest(seed: u64, transcript: &[ActionMap], final_field: &FieldState) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(hash_seed(seed));
    hasher.update(hash_transcript(transcript));
    hasher.update(hash_field(final_field));
    hasher.finalize().into()
}

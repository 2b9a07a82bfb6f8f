use std::collections::BTreeSet;

use rand::Rng;
use tracing::debug;

use crate::constants::*;
use crate::physics::{move_with_clipping, table_obstacles};
use crate::types::*;

/// Point where a player of radius R touches food of radius r.
pub fn contact_point(player: Vec2, food: Vec2, food_radius: f64) -> Vec2 {
    (player * food_radius + food * COLLISION_RADIUS) * (1.0 / (COLLISION_RADIUS + food_radius))
}

/// Displacement a collision at `point` imparts on a player.
pub fn knockback(player: &PlayerState, point: Vec2) -> Vec2 {
    let offset = player.location - point;
    let distance = offset.length();
    let direction = if distance < EPSILON {
        -Vec2::from_angle(player.heading)
    } else {
        offset * (1.0 / distance)
    };
    direction * (COLLISION_RADIUS * (-distance / COLLISION_RADIUS).exp())
}

pub fn affects(player: &PlayerState, collision: &CollisionState) -> bool {
    player.location.distance(collision.location) <= 2.0 * COLLISION_RADIUS
}

/// Phase 3: detect player/player and player/food contacts, then apply
/// knockback, damage and food despawn once for the whole turn.
pub fn resolve_collisions<R: Rng + ?Sized>(mut field: FieldState, rng: &mut R) -> FieldState {
    let players: Vec<(Symbol, PlayerState)> = field.players().map(|(t, p)| (t, *p)).collect();
    let mut collisions = Vec::new();
    let mut events: Vec<(Symbol, EventKind)> = Vec::new();

    // Player–player
    for (i, (team_a, a)) in players.iter().enumerate() {
        for (team_b, b) in &players[i + 1..] {
            if a.location.distance(b.location) >= 2.0 * COLLISION_RADIUS {
                continue;
            }
            collisions.push(CollisionState {
                location: (a.location + b.location) * 0.5,
                damage: PLAYER_COLLISION_DAMAGE.sample(rng),
            });
            let teams: BTreeSet<Symbol> = [*team_a, *team_b].into();
            for team in teams {
                events.push((team, EventKind::FirstPlayerCollision));
                events.push((team, EventKind::EveryPlayerCollision));
            }
        }
    }

    // Player–food
    for (hit_team, player) in &players {
        for food in &field.foods {
            let r = food.food_type.radius();
            if player.height < food.height
                || player.location.distance(food.location) >= COLLISION_RADIUS + r
            {
                continue;
            }
            collisions.push(CollisionState {
                location: contact_point(player.location, food.location, r),
                damage: food.food_type.stats().damage.sample(rng),
            });
            for team in field.teams.iter().filter(|t| t.symbol != *hit_team) {
                events.push((team.symbol, EventKind::FirstFoodCollision));
                events.push((team.symbol, EventKind::EveryFoodCollision));
            }
        }
    }

    if !collisions.is_empty() {
        debug!(turn = field.turn, count = collisions.len(), "collisions");
    }

    // Secondary effects, all computed from pre-knockback positions.
    let obstacles = table_obstacles(&field);
    for (_, before) in &players {
        let hits: Vec<&CollisionState> = collisions.iter().filter(|c| affects(before, c)).collect();
        if hits.is_empty() {
            continue;
        }
        let impulse = hits
            .iter()
            .fold(Vec2::ZERO, |acc, c| acc + knockback(before, c.location));
        let damage: f64 = hits.iter().map(|c| c.damage).sum();
        if let Some(p) = field.player_mut(before.symbol) {
            p.location = move_with_clipping(before.location, impulse, &obstacles);
            p.energy = (p.energy - damage).max(0.0);
        }
    }

    field.foods.retain(|f| {
        let r = f.food_type.radius();
        !collisions.iter().any(|c| c.location.distance(f.location) <= r)
    });

    for (team, kind) in events {
        if let Some(t) = field.team_mut(team) {
            t.record(kind);
        }
    }
    field.collisions = collisions;
    field
}

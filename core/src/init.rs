use std::collections::BTreeSet;
use std::f64::consts::TAU;

use rand::Rng;
use tracing::debug;

use crate::config::MatchConfig;
use crate::constants::*;
use crate::food::spawn_food;
use crate::physics::{table_footprint, Rect};
use crate::types::*;

/// Symbol of the `index`-th team: 'A', 'B', ...
pub fn team_symbol(index: usize) -> Symbol {
    char::from(b'A' + index as u8)
}

/// Symbol of the `index`-th player across all teams: 'a', 'b', ...
pub fn player_symbol(index: usize) -> Symbol {
    char::from(b'a' + index as u8)
}

/// Vertical strip of the field owned by team `index`.
pub fn team_zone(index: usize, team_count: usize) -> Rect {
    let width = FIELD_WIDTH / team_count as f64;
    Rect {
        min: Vec2::new(width * index as f64, 0.0),
        max: Vec2::new(width * (index + 1) as f64, FIELD_DEPTH),
    }
}

fn place_player<R: Rng + ?Sized>(
    zone: &Rect,
    table: &Rect,
    placed: &[PlayerState],
    rng: &mut R,
) -> Vec2 {
    let area = zone.expanded(-COLLISION_RADIUS);
    let mut candidate = area.min;
    for _ in 0..SPAWN_ATTEMPTS {
        candidate = Vec2::new(
            rng.gen_range(area.min.x..=area.max.x),
            rng.gen_range(area.min.y..=area.max.y),
        );
        let clear_of_table = !table.expanded(COLLISION_RADIUS).contains(candidate);
        let clear_of_players = placed
            .iter()
            .all(|p| p.location.distance(candidate) >= 2.0 * COLLISION_RADIUS);
        if clear_of_table && clear_of_players {
            return candidate;
        }
    }
    candidate
}

/// Build the turn-0 snapshot for `config`.
pub fn generate_field<R: Rng + ?Sized>(config: &MatchConfig, rng: &mut R) -> FieldState {
    let team_count = usize::from(config.match_type.team_count);
    let per_team = usize::from(config.match_type.players_per_team);
    assert!(team_count > 0 && per_team > 0, "empty match type");
    assert!(
        config.match_type.player_count() <= 26,
        "at most 26 players fit the symbol alphabet"
    );

    let mut teams = Vec::with_capacity(team_count);
    let mut placed: Vec<PlayerState> = Vec::new();
    for t in 0..team_count {
        let zone = team_zone(t, team_count);
        let table_location = Vec2::new((zone.min.x + zone.max.x) / 2.0, FIELD_DEPTH / 2.0);
        let footprint = table_footprint(table_location);

        let mut players = Vec::with_capacity(per_team);
        for _ in 0..per_team {
            let location = place_player(&zone, &footprint, &placed, rng);
            let player = PlayerState {
                symbol: player_symbol(placed.len()),
                location,
                height: HEIGHT,
                heading: rng.gen_range(0.0..TAU),
                inventory: Inventory::default(),
                energy: MAX_ENERGY,
            };
            placed.push(player);
            players.push(player);
        }

        teams.push(TeamState {
            symbol: team_symbol(t),
            players,
            table: TableState {
                location: table_location,
                food: BTreeSet::new(),
            },
            score: ScoreState::default(),
        });
    }

    let mut field = FieldState {
        turn: 0,
        match_type: config.match_type,
        teams,
        foods: Vec::new(),
        collisions: Vec::new(),
    };
    for _ in 0..config.max_food.min(FOOD_CATALOG.len()) {
        spawn_food(&mut field, rng);
    }
    debug!(
        teams = team_count,
        players = placed.len(),
        foods = field.foods.len(),
        "field generated"
    );
    field
}

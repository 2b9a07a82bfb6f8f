use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::config::MatchConfig;
use crate::constants::*;
use crate::physics::*;
use crate::types::*;

fn move_direction(player: &PlayerState, action: Action) -> Vec2 {
    let forward = Vec2::from_angle(player.heading);
    match action {
        Action::MoveBackward => -forward,
        _ => forward,
    }
}

fn food_in_reach<'a>(
    field: &'a FieldState,
    player: &'a PlayerState,
    hand: Hand,
) -> impl Iterator<Item = &'a FoodState> + 'a {
    field
        .foods
        .iter()
        .filter(move |f| in_reach(player, hand, f.location))
}

/// (team, food) pairs resting on tables the player stands next to.
fn table_food_in_reach(field: &FieldState, player: &PlayerState) -> Vec<(Symbol, FoodType)> {
    field
        .teams
        .iter()
        .filter(|t| table_adjacent(player.location, &t.table))
        .flat_map(|t| t.table.food.iter().map(move |f| (t.symbol, *f)))
        .collect()
}

/// Whether `action` can take effect for `player` in `field`.
pub fn is_valid(field: &FieldState, player: &PlayerState, action: Action) -> bool {
    match action {
        Action::MoveForward | Action::MoveBackward => !move_blocked(
            player.location,
            move_direction(player, action),
            &table_obstacles(field),
        ),
        Action::TurnLeft | Action::TurnRight | Action::Duck => true,
        Action::PickupLeft | Action::PickupRight => {
            let hand = if action == Action::PickupLeft {
                Hand::Left
            } else {
                Hand::Right
            };
            player.inventory.get(hand).is_none()
                && (food_in_reach(field, player, hand).next().is_some()
                    || !table_food_in_reach(field, player).is_empty())
        }
        Action::ThrowLeft | Action::ThrowRight | Action::EatLeft | Action::EatRight => action
            .hand()
            .is_some_and(|hand| player.inventory.get(hand).is_some()),
    }
}

/// Take a food type from the ground/air near `hand`, or failing that from an
/// adjacent table.
fn pick_up<R: Rng + ?Sized>(
    field: &mut FieldState,
    player: &PlayerState,
    hand: Hand,
    rng: &mut R,
) -> Option<FoodType> {
    let loose: Vec<FoodType> = food_in_reach(field, player, hand)
        .map(|f| f.food_type)
        .collect();
    if let Some(&food_type) = loose.choose(rng) {
        field.foods.retain(|f| f.food_type != food_type);
        return Some(food_type);
    }
    let on_tables = table_food_in_reach(field, player);
    let &(table_team, food_type) = on_tables.choose(rng)?;
    if let Some(team) = field.team_mut(table_team) {
        team.table.food.remove(&food_type);
    }
    Some(food_type)
}

/// Resolve one player's action, returning the updated player and any score
/// events for their team.
fn act<R: Rng + ?Sized>(
    field: &mut FieldState,
    player: PlayerState,
    action: Action,
    config: &MatchConfig,
    rng: &mut R,
) -> (PlayerState, Vec<EventKind>) {
    let mut next = player;
    let mut events = Vec::new();

    if action != Action::Duck {
        next.height = HEIGHT;
    }
    if action != Action::Duck && !action.is_eat() {
        next.energy = (next.energy - config.action_energy_cost).max(0.0);
    }

    match action {
        Action::MoveForward | Action::MoveBackward => {
            let speed = MOVE_SPEED.sample(rng) * (player.energy / 100.0 - 1.0).exp();
            let displacement = move_direction(&player, action) * speed;
            next.location =
                move_with_clipping(player.location, displacement, &table_obstacles(field));
            events.push(EventKind::FirstMove);
        }
        Action::TurnLeft => {
            next.heading = normalize_angle(player.heading + TURN_SPEED.sample(rng));
        }
        Action::TurnRight => {
            next.heading = normalize_angle(player.heading - TURN_SPEED.sample(rng));
        }
        Action::Duck => {
            next.height = (player.height - DUCK_SPEED.sample(rng)).max(MIN_HEIGHT);
        }
        Action::PickupLeft | Action::PickupRight => {
            let hand = action.hand().unwrap_or(Hand::Left);
            if let Some(food_type) = pick_up(field, &player, hand, rng) {
                next.inventory = next.inventory.with(hand, Some(food_type));
                events.push(EventKind::FirstPickup);
            }
        }
        Action::ThrowLeft | Action::ThrowRight => {
            let hand = action.hand().unwrap_or(Hand::Left);
            if let Some(food_type) = player.inventory.get(hand) {
                next.inventory = next.inventory.with(hand, None);
                field.foods.push(FoodState {
                    food_type,
                    location: reach_location(&player, hand),
                    height: THROW_HEIGHT.sample(rng),
                    heading: arm_direction(player.heading, hand),
                });
                events.push(EventKind::FirstThrow);
            }
        }
        Action::EatLeft | Action::EatRight => {
            let hand = action.hand().unwrap_or(Hand::Left);
            if let Some(food_type) = player.inventory.get(hand) {
                next.inventory = next.inventory.with(hand, None);
                let health = food_type.stats().health.sample(rng);
                next.energy = (next.energy + health).min(MAX_ENERGY);
                events.push(EventKind::FirstEat);
                events.push(EventKind::EveryEat);
            }
        }
    }

    (next, events)
}

/// Phase 1: every player's action, in a freshly shuffled order.
pub fn apply_actions<R: Rng + ?Sized>(
    mut field: FieldState,
    actions: &ActionMap,
    config: &MatchConfig,
    rng: &mut R,
) -> FieldState {
    let mut order = field.player_symbols();
    order.shuffle(rng);

    for symbol in order {
        let (Some(player), Some(team)) = (field.player(symbol).copied(), field.team_of(symbol))
        else {
            continue;
        };

        let action = match actions.get(&symbol).copied().flatten() {
            Some(action) if is_valid(&field, &player, action) => action,
            other => {
                if let Some(action) = other {
                    warn!(player = %symbol, %action, turn = field.turn, "invalid action, ignored");
                }
                if let Some(p) = field.player_mut(symbol) {
                    p.height = HEIGHT;
                }
                continue;
            }
        };

        let (next, events) = act(&mut field, player, action, config, rng);
        if let Some(p) = field.player_mut(symbol) {
            *p = next;
        }
        if let Some(t) = field.team_mut(team) {
            for kind in events {
                t.record(kind);
            }
        }
    }

    field
}

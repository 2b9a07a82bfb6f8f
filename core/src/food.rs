use std::f64::consts::{PI, TAU};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::MatchConfig;
use crate::constants::*;
use crate::physics::table_footprint;
use crate::types::*;

/// Random ground location for `food_type` that overlaps no player, no other
/// food and no table. `None` once `SPAWN_ATTEMPTS` draws have been rejected.
pub fn find_spawn_location<R: Rng + ?Sized>(
    field: &FieldState,
    food_type: FoodType,
    rng: &mut R,
) -> Option<Vec2> {
    let r = food_type.radius();
    (0..SPAWN_ATTEMPTS)
        .map(|_| {
            Vec2::new(
                rng.gen_range(r..=FIELD_WIDTH - r),
                rng.gen_range(r..=FIELD_DEPTH - r),
            )
        })
        .find(|&candidate| spawn_clear(field, r, candidate))
}

fn spawn_clear(field: &FieldState, r: f64, candidate: Vec2) -> bool {
    let players_clear = field
        .players()
        .all(|(_, p)| p.location.distance(candidate) >= COLLISION_RADIUS + r);
    let food_clear = field
        .foods
        .iter()
        .all(|f| f.location.distance(candidate) >= f.food_type.radius() + r);
    let tables_clear = field
        .teams
        .iter()
        .all(|t| !table_footprint(t.table.location).expanded(r).contains(candidate));
    players_clear && food_clear && tables_clear
}

/// Catalog types absent from the whole field, in catalog order.
pub fn absent_food_types(field: &FieldState) -> Vec<FoodType> {
    let present = field.food_types_in_play();
    FOOD_CATALOG
        .iter()
        .copied()
        .filter(|f| !present.contains(f))
        .collect()
}

/// Place one random absent type on the ground, if there is room for it.
pub fn spawn_food<R: Rng + ?Sized>(field: &mut FieldState, rng: &mut R) -> Option<FoodType> {
    let absent = absent_food_types(field);
    let food_type = *absent.choose(rng)?;
    match find_spawn_location(field, food_type, rng) {
        Some(location) => {
            debug!(?food_type, x = location.x, y = location.y, "food spawned");
            field.foods.push(FoodState {
                food_type,
                location,
                height: 0.0,
                heading: rng.gen_range(0.0..TAU),
            });
            Some(food_type)
        }
        None => {
            debug!(?food_type, "no free spawn location, skipping");
            None
        }
    }
}

/// Per-turn respawn roll.
pub fn respawn_food<R: Rng + ?Sized>(
    mut field: FieldState,
    config: &MatchConfig,
    rng: &mut R,
) -> FieldState {
    if field.foods.len() >= config.max_food || absent_food_types(&field).is_empty() {
        return field;
    }
    if rng.gen::<f64>() < config.food_respawn_probability {
        spawn_food(&mut field, rng);
    }
    field
}

/// Phase 2: airborne food flies, bounces off walls, falls, and may land on a table.
pub fn move_food<R: Rng + ?Sized>(mut field: FieldState, rng: &mut R) -> FieldState {
    let foods = std::mem::take(&mut field.foods);
    for food in foods {
        if !food.is_airborne() {
            field.foods.push(food);
            continue;
        }
        let moved = fly(food, rng);
        let landing = field
            .teams
            .iter_mut()
            .find(|t| table_footprint(t.table.location).contains(moved.location));
        match landing {
            Some(team) => {
                debug!(food = ?moved.food_type, team = %team.symbol, "food landed on table");
                team.table.food.insert(moved.food_type);
            }
            None => field.foods.push(moved),
        }
    }
    field
}

fn fly<R: Rng + ?Sized>(food: FoodState, rng: &mut R) -> FoodState {
    let r = food.food_type.radius();
    let speed = FOOD_SPEED.sample(rng);
    let mut location = food.location + Vec2::from_angle(food.heading) * speed;
    let mut heading = food.heading;

    let (min_x, max_x) = (r, FIELD_WIDTH - r);
    let (min_y, max_y) = (r, FIELD_DEPTH - r);
    if location.x < min_x || location.x > max_x {
        let into_left = location.x < min_x && heading.cos() < 0.0;
        let into_right = location.x > max_x && heading.cos() > 0.0;
        if into_left || into_right {
            heading = PI - heading;
        }
        location.x = if location.x < min_x {
            (2.0 * min_x - location.x).min(max_x)
        } else {
            (2.0 * max_x - location.x).max(min_x)
        };
    }
    if location.y < min_y || location.y > max_y {
        let into_bottom = location.y < min_y && heading.sin() < 0.0;
        let into_top = location.y > max_y && heading.sin() > 0.0;
        if into_bottom || into_top {
            heading = -heading;
        }
        location.y = if location.y < min_y {
            (2.0 * min_y - location.y).min(max_y)
        } else {
            (2.0 * max_y - location.y).max(min_y)
        };
    }

    let height = (food.height - FALL_SPEED.sample(rng)).max(0.0);
    FoodState {
        location,
        heading: normalize_angle(heading),
        height,
        ..food
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::generate_field;
    use crate::rng::seeded;

    fn airborne(food_type: FoodType, location: Vec2, heading: f64) -> FoodState {
        FoodState {
            food_type,
            location,
            height: 30.0,
            heading,
        }
    }

    fn empty_field() -> FieldState {
        let mut field = generate_field(&MatchConfig::default(), &mut seeded(5));
        field.foods.clear();
        field
    }

    #[test]
    fn food_bounces_off_left_wall() {
        let mut field = empty_field();
        field.foods.push(airborne(FoodType::Apple, Vec2::new(5.0, 100.0), PI));
        let next = move_food(field, &mut seeded(1));
        let food = next.food(FoodType::Apple).unwrap();
        assert!(food.heading.cos() > 0.0, "heading reflected: {}", food.heading);
        assert!(food.location.x >= FoodType::Apple.radius());
        assert!(food.height < 30.0);
    }

    #[test]
    fn food_bounces_off_top_wall() {
        let mut field = empty_field();
        field.foods.push(airborne(FoodType::Apple, Vec2::new(200.0, 595.0), PI / 2.0));
        let next = move_food(field, &mut seeded(1));
        let food = next.food(FoodType::Apple).unwrap();
        let r = FoodType::Apple.radius();
        assert!(food.heading.sin() < 0.0, "heading reflected: {}", food.heading);
        assert!(food.location.y >= r && food.location.y <= FIELD_DEPTH - r);
        assert!((food.location.x - 200.0).abs() < 1e-9);
    }

    #[test]
    fn heading_away_from_crossed_wall_is_kept() {
        let mut field = empty_field();
        // Outside the left margin but flying parallel to the wall
        field.foods.push(airborne(FoodType::Apple, Vec2::new(1.0, 100.0), PI / 2.0));
        let next = move_food(field, &mut seeded(2));
        let food = next.food(FoodType::Apple).unwrap();
        let r = FoodType::Apple.radius();
        assert_eq!(food.heading, PI / 2.0);
        assert!(food.location.x >= r && food.location.x <= FIELD_WIDTH - r);
        assert!(food.location.y > 100.0);
    }

    #[test]
    fn grounded_food_stays_put() {
        let mut field = empty_field();
        let food = FoodState {
            height: 0.0,
            ..airborne(FoodType::Ham, Vec2::new(200.0, 100.0), 1.0)
        };
        field.foods.push(food);
        let next = move_food(field, &mut seeded(2));
        assert_eq!(next.food(FoodType::Ham), Some(&food));
    }

    #[test]
    fn food_over_table_lands_on_it() {
        let mut field = empty_field();
        let table = field.teams[0].table.location;
        let start = table + Vec2::new(-TABLE_WIDTH / 2.0 - 3.0, 0.0);
        field.foods.push(airborne(FoodType::Egg, start, 0.0));
        let next = move_food(field, &mut seeded(3));
        assert!(next.food(FoodType::Egg).is_none());
        assert!(next.teams[0].table.food.contains(&FoodType::Egg));
    }

    #[test]
    fn respawn_respects_max_food() {
        let mut field = empty_field();
        let mut rng = seeded(4);
        let config = MatchConfig {
            food_respawn_probability: 1.0,
            max_food: 2,
            ..MatchConfig::default()
        };
        for _ in 0..10 {
            field = respawn_food(field, &config, &mut rng);
        }
        assert_eq!(field.foods.len(), 2);
    }

    #[test]
    fn zero_probability_never_spawns() {
        let mut field = empty_field();
        let mut rng = seeded(6);
        let config = MatchConfig {
            food_respawn_probability: 0.0,
            ..MatchConfig::default()
        };
        for _ in 0..100 {
            field = respawn_food(field, &config, &mut rng);
        }
        assert!(field.foods.is_empty());
    }

    #[test]
    fn no_spawn_when_catalog_in_play() {
        let mut field = empty_field();
        field.teams[0].table.food.extend(FOOD_CATALOG);
        assert!(absent_food_types(&field).is_empty());
        assert_eq!(spawn_food(&mut field, &mut seeded(7)), None);
    }
}

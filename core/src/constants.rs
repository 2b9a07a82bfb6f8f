use std::f64::consts::PI;

use crate::rng::RandomScalar;
use crate::types::{FoodStats, FoodType};

// All distances are field units, all angles radians, all rates per turn.

// Field
pub const FIELD_WIDTH: f64 = 800.0;
pub const FIELD_DEPTH: f64 = 600.0;

// Match rules
pub const TOTAL_TURNS: u32 = 2000;
pub const MAX_FOOD: usize = 4;
pub const FOOD_RESPAWN_PROBABILITY: f64 = 0.02;
pub const SPAWN_ATTEMPTS: usize = 100;

// Player body
pub const COLLISION_RADIUS: f64 = 10.0;
pub const HEIGHT: f64 = 50.0;
pub const MIN_HEIGHT: f64 = 25.0;
pub const MAX_ENERGY: f64 = 100.0;
pub const ACTION_ENERGY_COST: f64 = 0.5;

// Arms
pub const REACH_DISTANCE: f64 = 20.0;
/// Half-angle of the cone a hand can pick food from.
pub const REACH_ANGLE: f64 = PI / 4.0;
/// Offset of each arm from the heading (left is counter-clockwise).
pub const HAND_ANGLE: f64 = PI / 6.0;

// Tables
pub const TABLE_WIDTH: f64 = 60.0;
pub const TABLE_DEPTH: f64 = 40.0;

// Geometry tolerances
pub const EPSILON: f64 = 1e-9;
pub const FLUSH_TOLERANCE: f64 = 1e-6;
pub const MAX_SLIDE_ITERATIONS: usize = 4;

// Sampled physical quantities
pub const MOVE_SPEED: RandomScalar = RandomScalar::new(5.0, 1.0);
pub const TURN_SPEED: RandomScalar = RandomScalar::new(PI / 8.0, PI / 32.0);
pub const DUCK_SPEED: RandomScalar = RandomScalar::new(10.0, 2.0);
pub const THROW_HEIGHT: RandomScalar = RandomScalar::new(40.0, 5.0);
pub const FOOD_SPEED: RandomScalar = RandomScalar::new(10.0, 2.0);
pub const FALL_SPEED: RandomScalar = RandomScalar::new(2.0, 0.5);
pub const PLAYER_COLLISION_DAMAGE: RandomScalar = RandomScalar::new(5.0, 1.0);

pub const FOOD_CATALOG: [FoodType; 8] = [
    FoodType::Apple,
    FoodType::Banana,
    FoodType::Cherry,
    FoodType::Donut,
    FoodType::Egg,
    FoodType::Fish,
    FoodType::Grape,
    FoodType::Ham,
];

pub fn food_stats(food: FoodType) -> FoodStats {
    match food {
        FoodType::Apple => FoodStats {
            radius: 4.0,
            health: RandomScalar::new(10.0, 2.0),
            damage: RandomScalar::new(6.0, 1.5),
        },
        FoodType::Banana => FoodStats {
            radius: 5.0,
            health: RandomScalar::new(12.0, 2.0),
            damage: RandomScalar::new(4.0, 1.0),
        },
        FoodType::Cherry => FoodStats {
            radius: 2.0,
            health: RandomScalar::new(4.0, 1.0),
            damage: RandomScalar::new(2.0, 0.5),
        },
        FoodType::Donut => FoodStats {
            radius: 5.0,
            health: RandomScalar::new(20.0, 4.0),
            damage: RandomScalar::new(5.0, 1.0),
        },
        FoodType::Egg => FoodStats {
            radius: 3.0,
            health: RandomScalar::new(8.0, 1.5),
            damage: RandomScalar::new(8.0, 2.0),
        },
        FoodType::Fish => FoodStats {
            radius: 6.0,
            health: RandomScalar::new(15.0, 3.0),
            damage: RandomScalar::new(10.0, 2.5),
        },
        FoodType::Grape => FoodStats {
            radius: 2.0,
            health: RandomScalar::new(3.0, 0.5),
            damage: RandomScalar::new(1.0, 0.25),
        },
        FoodType::Ham => FoodStats {
            radius: 7.0,
            health: RandomScalar::new(25.0, 5.0),
            damage: RandomScalar::new(12.0, 3.0),
        },
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::TAU;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::food_stats;
use crate::rng::RandomScalar;

// ── Primitives ──────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle`.
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).length()
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Team and player identifier. Single character on the wire.
pub type Symbol = char;
pub type Turn = u32;

/// Wrap an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negatives up to exactly TAU
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

// ── Actions ─────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    MoveForward,
    MoveBackward,
    TurnLeft,
    TurnRight,
    Duck,
    PickupLeft,
    PickupRight,
    ThrowLeft,
    ThrowRight,
    EatLeft,
    EatRight,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::MoveForward,
        Action::MoveBackward,
        Action::TurnLeft,
        Action::TurnRight,
        Action::Duck,
        Action::PickupLeft,
        Action::PickupRight,
        Action::ThrowLeft,
        Action::ThrowRight,
        Action::EatLeft,
        Action::EatRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::MoveForward => "MOVE_FORWARD",
            Action::MoveBackward => "MOVE_BACKWARD",
            Action::TurnLeft => "TURN_LEFT",
            Action::TurnRight => "TURN_RIGHT",
            Action::Duck => "DUCK",
            Action::PickupLeft => "PICKUP_LEFT",
            Action::PickupRight => "PICKUP_RIGHT",
            Action::ThrowLeft => "THROW_LEFT",
            Action::ThrowRight => "THROW_RIGHT",
            Action::EatLeft => "EAT_LEFT",
            Action::EatRight => "EAT_RIGHT",
        }
    }

    /// Stable byte used when hashing transcripts.
    pub fn code(self) -> u8 {
        Action::ALL
            .iter()
            .position(|a| *a == self)
            .map(|i| i as u8 + 1)
            .unwrap_or(0)
    }

    /// The hand a pickup/throw/eat acts with.
    pub fn hand(self) -> Option<Hand> {
        match self {
            Action::PickupLeft | Action::ThrowLeft | Action::EatLeft => Some(Hand::Left),
            Action::PickupRight | Action::ThrowRight | Action::EatRight => Some(Hand::Right),
            _ => None,
        }
    }

    pub fn is_move(self) -> bool {
        matches!(self, Action::MoveForward | Action::MoveBackward)
    }

    pub fn is_eat(self) -> bool {
        matches!(self, Action::EatLeft | Action::EatRight)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: {0:?}")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}

/// One turn's decisions, keyed by player symbol. `None` is a no-op.
pub type ActionMap = BTreeMap<Symbol, Option<Action>>;

// ── Food ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoodType {
    Apple,
    Banana,
    Cherry,
    Donut,
    Egg,
    Fish,
    Grape,
    Ham,
}

impl FoodType {
    pub fn stats(self) -> FoodStats {
        food_stats(self)
    }

    pub fn radius(self) -> f64 {
        food_stats(self).radius
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FoodStats {
    pub radius: f64,
    /// Energy restored when eaten.
    pub health: RandomScalar,
    /// Energy removed from players caught in its collision.
    pub damage: RandomScalar,
}

/// A piece on the ground (`height == 0`) or in the air.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoodState {
    pub food_type: FoodType,
    pub location: Vec2,
    pub height: f64,
    pub heading: f64,
}

impl FoodState {
    pub fn is_airborne(&self) -> bool {
        self.height > 0.0
    }
}

// ── Player ──────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    pub left: Option<FoodType>,
    pub right: Option<FoodType>,
}

impl Inventory {
    pub fn get(&self, hand: Hand) -> Option<FoodType> {
        match hand {
            Hand::Left => self.left,
            Hand::Right => self.right,
        }
    }

    pub fn with(self, hand: Hand, food: Option<FoodType>) -> Self {
        match hand {
            Hand::Left => Inventory { left: food, ..self },
            Hand::Right => Inventory { right: food, ..self },
        }
    }

    pub fn items(&self) -> impl Iterator<Item = FoodType> {
        self.left.into_iter().chain(self.right)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerState {
    pub symbol: Symbol,
    pub location: Vec2,
    pub height: f64,
    pub heading: f64,
    pub inventory: Inventory,
    pub energy: f64,
}

// ── Table ───────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct TableState {
    pub location: Vec2,
    pub food: BTreeSet<FoodType>,
}

// ── Collisions ──────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionState {
    pub location: Vec2,
    pub damage: f64,
}

// ── Score ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    FirstMove,
    FirstPickup,
    FirstThrow,
    FirstEat,
    EveryEat,
    FirstPlayerCollision,
    EveryPlayerCollision,
    FirstFoodCollision,
    EveryFoodCollision,
    FoodOnTable,
    TieBreak,
}

impl EventKind {
    pub fn points(self) -> u64 {
        match self {
            EventKind::FirstMove => 1,
            EventKind::FirstPickup => 5,
            EventKind::FirstThrow => 5,
            EventKind::FirstEat => 5,
            EventKind::EveryEat => 1,
            EventKind::FirstPlayerCollision => 5,
            EventKind::EveryPlayerCollision => 1,
            EventKind::FirstFoodCollision => 10,
            EventKind::EveryFoodCollision => 2,
            EventKind::FoodOnTable => 1,
            EventKind::TieBreak => 1,
        }
    }

    /// One-time events count at most once per team.
    pub fn is_one_time(self) -> bool {
        matches!(
            self,
            EventKind::FirstMove
                | EventKind::FirstPickup
                | EventKind::FirstThrow
                | EventKind::FirstEat
                | EventKind::FirstPlayerCollision
                | EventKind::FirstFoodCollision
        )
    }
}

/// Event counts with a cached point total.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScoreState {
    counts: BTreeMap<EventKind, u32>,
    total: u64,
}

impl ScoreState {
    /// Build from raw counts; one-time kinds are capped at 1.
    pub fn from_counts(counts: BTreeMap<EventKind, u32>) -> Self {
        let counts: BTreeMap<EventKind, u32> = counts
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .map(|(kind, n)| (kind, if kind.is_one_time() { n.min(1) } else { n }))
            .collect();
        let total = counts
            .iter()
            .map(|(kind, n)| kind.points() * u64::from(*n))
            .sum();
        Self { counts, total }
    }

    /// A new score with one more occurrence of `kind`.
    pub fn with_event(&self, kind: EventKind) -> Self {
        let current = self.count(kind);
        if kind.is_one_time() && current >= 1 {
            return self.clone();
        }
        let mut counts = self.counts.clone();
        counts.insert(kind, current + 1);
        Self {
            counts,
            total: self.total + kind.points(),
        }
    }

    pub fn count(&self, kind: EventKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<EventKind, u32> {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

// ── Teams ───────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct TeamState {
    pub symbol: Symbol,
    pub players: Vec<PlayerState>,
    pub table: TableState,
    pub score: ScoreState,
}

impl TeamState {
    pub(crate) fn record(&mut self, kind: EventKind) {
        self.score = self.score.with_event(kind);
    }
}

// ── Match type ──────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchType {
    pub team_count: u8,
    pub players_per_team: u8,
}

impl MatchType {
    pub const SOLO: MatchType = MatchType::new(1, 1);
    pub const DUEL: MatchType = MatchType::new(2, 1);
    pub const DOUBLES: MatchType = MatchType::new(2, 2);
    pub const FOUR_WAY: MatchType = MatchType::new(4, 1);

    pub const fn new(team_count: u8, players_per_team: u8) -> Self {
        Self {
            team_count,
            players_per_team,
        }
    }

    pub fn player_count(self) -> usize {
        usize::from(self.team_count) * usize::from(self.players_per_team)
    }
}

// ── Field ───────────────────────────────────────────────────

/// Snapshot invariants broken by a malformed field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("duplicate team symbol {0:?}")]
    DuplicateTeam(Symbol),
    #[error("duplicate player symbol {0:?}")]
    DuplicatePlayer(Symbol),
    #[error("food type {0:?} present more than once")]
    DuplicateFood(FoodType),
    #[error("expected {expected} teams, found {found}")]
    TeamCount { expected: usize, found: usize },
    #[error("team {team:?} has {found} players, expected {expected}")]
    PlayerCount {
        team: Symbol,
        expected: usize,
        found: usize,
    },
}

/// One immutable instant of the arena.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldState {
    pub turn: Turn,
    pub match_type: MatchType,
    pub teams: Vec<TeamState>,
    /// Ground and airborne food only.
    pub foods: Vec<FoodState>,
    /// Produced by the previous turn; cleared every turn.
    pub collisions: Vec<CollisionState>,
}

impl FieldState {
    /// All players paired with their team symbol, in team order.
    pub fn players(&self) -> impl Iterator<Item = (Symbol, &PlayerState)> {
        self.teams
            .iter()
            .flat_map(|t| t.players.iter().map(move |p| (t.symbol, p)))
    }

    pub fn player_symbols(&self) -> Vec<Symbol> {
        self.players().map(|(_, p)| p.symbol).collect()
    }

    pub fn player(&self, symbol: Symbol) -> Option<&PlayerState> {
        self.players().map(|(_, p)| p).find(|p| p.symbol == symbol)
    }

    pub(crate) fn player_mut(&mut self, symbol: Symbol) -> Option<&mut PlayerState> {
        self.teams
            .iter_mut()
            .flat_map(|t| t.players.iter_mut())
            .find(|p| p.symbol == symbol)
    }

    pub fn team(&self, symbol: Symbol) -> Option<&TeamState> {
        self.teams.iter().find(|t| t.symbol == symbol)
    }

    pub(crate) fn team_mut(&mut self, symbol: Symbol) -> Option<&mut TeamState> {
        self.teams.iter_mut().find(|t| t.symbol == symbol)
    }

    /// Team symbol owning `player`.
    pub fn team_of(&self, player: Symbol) -> Option<Symbol> {
        self.players()
            .find(|(_, p)| p.symbol == player)
            .map(|(team, _)| team)
    }

    pub fn food(&self, food_type: FoodType) -> Option<&FoodState> {
        self.foods.iter().find(|f| f.food_type == food_type)
    }

    /// Every food type anywhere on the field: ground, air, tables, hands.
    pub fn food_types_in_play(&self) -> BTreeSet<FoodType> {
        let mut types: BTreeSet<FoodType> = self.foods.iter().map(|f| f.food_type).collect();
        for team in &self.teams {
            types.extend(team.table.food.iter().copied());
            for player in &team.players {
                types.extend(player.inventory.items());
            }
        }
        types
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let expected_teams = usize::from(self.match_type.team_count);
        if self.teams.len() != expected_teams {
            return Err(InvariantViolation::TeamCount {
                expected: expected_teams,
                found: self.teams.len(),
            });
        }

        let mut team_symbols = BTreeSet::new();
        let mut player_symbols = BTreeSet::new();
        let mut food_types = BTreeSet::new();
        let mut claim_food = |food: FoodType| {
            if food_types.insert(food) {
                Ok(())
            } else {
                Err(InvariantViolation::DuplicateFood(food))
            }
        };

        for team in &self.teams {
            if !team_symbols.insert(team.symbol) {
                return Err(InvariantViolation::DuplicateTeam(team.symbol));
            }
            let expected = usize::from(self.match_type.players_per_team);
            if team.players.len() != expected {
                return Err(InvariantViolation::PlayerCount {
                    team: team.symbol,
                    expected,
                    found: team.players.len(),
                });
            }
            for player in &team.players {
                if !player_symbols.insert(player.symbol) {
                    return Err(InvariantViolation::DuplicatePlayer(player.symbol));
                }
                for food in player.inventory.items() {
                    claim_food(food)?;
                }
            }
            for food in &team.table.food {
                claim_food(*food)?;
            }
        }
        for food in &self.foods {
            claim_food(food.food_type)?;
        }
        Ok(())
    }
}

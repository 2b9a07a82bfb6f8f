use std::f64::consts::{PI, TAU};

use crate::constants::*;
use crate::types::*;

// ── Rectangles ──────────────────────────────────────────────

/// Axis-aligned rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn expanded(self, margin: f64) -> Rect {
        Rect {
            min: Vec2::new(self.min.x - margin, self.min.y - margin),
            max: Vec2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Closed containment: points on the edge count as inside.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Strictly inside by more than `margin` on every side.
    pub fn contains_strict(&self, p: Vec2, margin: f64) -> bool {
        p.x > self.min.x + margin
            && p.x < self.max.x - margin
            && p.y > self.min.y + margin
            && p.y < self.max.y - margin
    }

    /// Euclidean distance from `p` to the closest point of the rectangle.
    pub fn distance_to(&self, p: Vec2) -> f64 {
        let dx = (self.min.x - p.x).max(0.0).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(0.0).max(p.y - self.max.y);
        dx.hypot(dy)
    }
}

/// Footprint of a table centred on `location`.
pub fn table_footprint(location: Vec2) -> Rect {
    let half = Vec2::new(TABLE_WIDTH / 2.0, TABLE_DEPTH / 2.0);
    Rect {
        min: location - half,
        max: location + half,
    }
}

/// Region a player centre may occupy inside the field walls.
pub fn walkable_bounds() -> Rect {
    Rect {
        min: Vec2::new(COLLISION_RADIUS, COLLISION_RADIUS),
        max: Vec2::new(FIELD_WIDTH - COLLISION_RADIUS, FIELD_DEPTH - COLLISION_RADIUS),
    }
}

/// Table footprints grown by the player radius, one per team.
pub fn table_obstacles(field: &FieldState) -> Vec<Rect> {
    field
        .teams
        .iter()
        .map(|t| table_footprint(t.table.location).expanded(COLLISION_RADIUS))
        .collect()
}

// ── Hands ───────────────────────────────────────────────────

/// Signed difference `a - b` wrapped into `(-π, π]`.
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    if d > PI {
        d - TAU
    } else {
        d
    }
}

/// Arm direction: left is counter-clockwise from the heading.
pub fn arm_direction(heading: f64, hand: Hand) -> f64 {
    match hand {
        Hand::Left => normalize_angle(heading + HAND_ANGLE),
        Hand::Right => normalize_angle(heading - HAND_ANGLE),
    }
}

pub fn reach_location(player: &PlayerState, hand: Hand) -> Vec2 {
    let arm = Vec2::from_angle(arm_direction(player.heading, hand));
    player.location + arm * (COLLISION_RADIUS + REACH_DISTANCE)
}

/// Whether `point` lies inside the reach cone of `hand`.
pub fn in_reach(player: &PlayerState, hand: Hand, point: Vec2) -> bool {
    let offset = point - player.location;
    let distance = offset.length();
    if distance > COLLISION_RADIUS + REACH_DISTANCE {
        return false;
    }
    if distance < EPSILON {
        return true;
    }
    let arm = arm_direction(player.heading, hand);
    angle_difference(offset.angle(), arm).abs() <= REACH_ANGLE
}

pub fn table_adjacent(location: Vec2, table: &TableState) -> bool {
    table_footprint(table.location).distance_to(location) <= COLLISION_RADIUS + REACH_DISTANCE
}

// ── Move with clipping ──────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
enum Axis {
    X,
    Y,
}

struct Hit {
    t: f64,
    axis: Axis,
}

fn component(v: Vec2, axis: Axis) -> f64 {
    match axis {
        Axis::X => v.x,
        Axis::Y => v.y,
    }
}

fn without(v: Vec2, axis: Axis) -> Vec2 {
    match axis {
        Axis::X => Vec2::new(0.0, v.y),
        Axis::Y => Vec2::new(v.x, 0.0),
    }
}

/// First time the segment `pos + t·d` (t ∈ [0, 1]) leaves the walkable bounds.
fn wall_hit(pos: Vec2, d: Vec2, bounds: &Rect) -> Option<Hit> {
    let mut best: Option<Hit> = None;
    for axis in [Axis::X, Axis::Y] {
        let p = component(pos, axis);
        let v = component(d, axis);
        let (lo, hi) = (component(bounds.min, axis), component(bounds.max, axis));
        let t = if v > EPSILON && p + v > hi {
            (hi - p) / v
        } else if v < -EPSILON && p + v < lo {
            (lo - p) / v
        } else {
            continue;
        };
        let t = t.clamp(0.0, 1.0);
        if best.as_ref().map_or(true, |b| t < b.t) {
            best = Some(Hit { t, axis });
        }
    }
    best
}

/// Liang–Barsky entry of the segment into the open interior of `rect`.
fn obstacle_hit(pos: Vec2, d: Vec2, rect: &Rect) -> Option<Hit> {
    // Starting inside: let the mover walk out.
    if rect.contains_strict(pos, FLUSH_TOLERANCE) {
        return None;
    }
    let mut t_enter = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;
    let mut enter_axis = Axis::X;
    for axis in [Axis::X, Axis::Y] {
        let p = component(pos, axis);
        let v = component(d, axis);
        let (lo, hi) = (component(rect.min, axis), component(rect.max, axis));
        if v.abs() < EPSILON {
            // Parallel to this slab: only a path strictly between the faces can enter.
            if p <= lo + FLUSH_TOLERANCE || p >= hi - FLUSH_TOLERANCE {
                return None;
            }
            continue;
        }
        let t1 = (lo - p) / v;
        let t2 = (hi - p) / v;
        let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
        if near > t_enter {
            t_enter = near;
            enter_axis = axis;
        }
        t_exit = t_exit.min(far);
    }
    if t_enter >= t_exit || t_exit <= 0.0 || t_enter > 1.0 {
        return None;
    }
    Some(Hit {
        t: t_enter.max(0.0),
        axis: enter_axis,
    })
}

/// Push a centre that ended a hair inside an obstacle back onto its face.
fn settle(pos: Vec2, obstacles: &[Rect]) -> Vec2 {
    let mut pos = pos;
    for rect in obstacles {
        if !rect.contains_strict(pos, 0.0) || rect.contains_strict(pos, FLUSH_TOLERANCE) {
            continue;
        }
        let candidates = [
            (pos.x - rect.min.x, Vec2::new(rect.min.x, pos.y)),
            (rect.max.x - pos.x, Vec2::new(rect.max.x, pos.y)),
            (pos.y - rect.min.y, Vec2::new(pos.x, rect.min.y)),
            (rect.max.y - pos.y, Vec2::new(pos.x, rect.max.y)),
        ];
        if let Some((_, face)) = candidates
            .iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
        {
            pos = *face;
        }
    }
    let bounds = walkable_bounds();
    Vec2::new(
        pos.x.clamp(bounds.min.x, bounds.max.x),
        pos.y.clamp(bounds.min.y, bounds.max.y),
    )
}

/// Move a player-sized body from `start` by `displacement`, sliding along
/// field walls and table obstacles instead of passing through them.
pub fn move_with_clipping(start: Vec2, displacement: Vec2, obstacles: &[Rect]) -> Vec2 {
    let bounds = walkable_bounds();
    let mut pos = start;
    let mut d = displacement;

    for _ in 0..MAX_SLIDE_ITERATIONS {
        if d.length() < EPSILON {
            break;
        }
        let mut hit = wall_hit(pos, d, &bounds);
        for rect in obstacles {
            if let Some(h) = obstacle_hit(pos, d, rect) {
                if hit.as_ref().map_or(true, |b| h.t < b.t) {
                    hit = Some(h);
                }
            }
        }
        match hit {
            None => {
                pos += d;
                break;
            }
            Some(h) => {
                pos += d * h.t;
                d = without(d * (1.0 - h.t), h.axis);
            }
        }
    }

    settle(pos, obstacles)
}

/// Whether a move from `location` along `direction` pushes into a wall or
/// table face the body is already flush against.
pub fn move_blocked(location: Vec2, direction: Vec2, obstacles: &[Rect]) -> bool {
    let bounds = walkable_bounds();
    let tol = FLUSH_TOLERANCE;
    if (location.x <= bounds.min.x + tol && direction.x < -EPSILON)
        || (location.x >= bounds.max.x - tol && direction.x > EPSILON)
        || (location.y <= bounds.min.y + tol && direction.y < -EPSILON)
        || (location.y >= bounds.max.y - tol && direction.y > EPSILON)
    {
        return true;
    }

    obstacles.iter().any(|r| {
        let within_x = location.x > r.min.x + tol && location.x < r.max.x - tol;
        let within_y = location.y > r.min.y + tol && location.y < r.max.y - tol;
        (within_y && (location.x - r.min.x).abs() <= tol && direction.x > EPSILON)
            || (within_y && (location.x - r.max.x).abs() <= tol && direction.x < -EPSILON)
            || (within_x && (location.y - r.min.y).abs() <= tol && direction.y > EPSILON)
            || (within_x && (location.y - r.max.y).abs() <= tol && direction.y < -EPSILON)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle_at(x: f64, y: f64) -> Rect {
        table_footprint(Vec2::new(x, y)).expanded(COLLISION_RADIUS)
    }

    #[test]
    fn free_move_is_unchanged() {
        let end = move_with_clipping(Vec2::new(100.0, 100.0), Vec2::new(5.0, -3.0), &[]);
        assert!((end.x - 105.0).abs() < 1e-12);
        assert!((end.y - 97.0).abs() < 1e-12);
    }

    #[test]
    fn wall_stops_normal_component_and_slides() {
        let start = Vec2::new(COLLISION_RADIUS + 2.0, 300.0);
        let end = move_with_clipping(start, Vec2::new(-6.0, 4.0), &[]);
        assert!((end.x - COLLISION_RADIUS).abs() < 1e-9);
        assert!((end.y - 304.0).abs() < 1e-9, "tangential motion kept: {end:?}");
    }

    #[test]
    fn table_face_blocks_entry() {
        let rect = obstacle_at(400.0, 300.0);
        let start = Vec2::new(rect.min.x - 3.0, 300.0);
        let end = move_with_clipping(start, Vec2::new(10.0, 2.0), &[rect]);
        assert!((end.x - rect.min.x).abs() < 1e-9);
        assert!(end.y > 300.0);
        assert!(!rect.contains_strict(end, 0.0));
    }

    #[test]
    fn corner_graze_passes() {
        let rect = obstacle_at(400.0, 300.0);
        let start = Vec2::new(rect.min.x - 5.0, rect.min.y);
        let end = move_with_clipping(start, Vec2::new(10.0, 0.0), &[rect]);
        assert!((end.x - (rect.min.x + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn flush_detection() {
        let rect = obstacle_at(400.0, 300.0);
        let flush = Vec2::new(rect.min.x, 300.0);
        assert!(move_blocked(flush, Vec2::new(1.0, 0.0), &[rect]));
        assert!(!move_blocked(flush, Vec2::new(-1.0, 0.0), &[rect]));
        assert!(!move_blocked(flush, Vec2::new(0.0, 1.0), &[rect]));

        let wall = Vec2::new(FIELD_WIDTH - COLLISION_RADIUS, 200.0);
        assert!(move_blocked(wall, Vec2::new(0.5, 0.5), &[]));
        assert!(!move_blocked(wall, Vec2::new(-0.5, 0.5), &[]));
    }

    #[test]
    fn reach_cone_follows_arm() {
        let player = PlayerState {
            symbol: 'a',
            location: Vec2::new(100.0, 100.0),
            height: HEIGHT,
            heading: 0.0,
            inventory: Inventory::default(),
            energy: MAX_ENERGY,
        };
        let left_target = player.location + Vec2::from_angle(HAND_ANGLE) * 15.0;
        assert!(in_reach(&player, Hand::Left, left_target));
        let behind = player.location + Vec2::new(-15.0, 0.0);
        assert!(!in_reach(&player, Hand::Left, behind));
        assert!(!in_reach(&player, Hand::Right, behind));
        let far = player.location + Vec2::new(COLLISION_RADIUS + REACH_DISTANCE + 1.0, 0.0);
        assert!(!in_reach(&player, Hand::Right, far));
    }

    #[test]
    fn angle_difference_wraps() {
        assert!((angle_difference(0.1, TAU - 0.1) - 0.2).abs() < 1e-12);
        assert!((angle_difference(TAU - 0.1, 0.1) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn table_adjacency_uses_footprint_distance() {
        let table = TableState {
            location: Vec2::new(400.0, 300.0),
            food: Default::default(),
        };
        let reach = COLLISION_RADIUS + REACH_DISTANCE;
        let edge = 400.0 + TABLE_WIDTH / 2.0;
        assert!(table_adjacent(Vec2::new(edge + reach, 300.0), &table));
        assert!(!table_adjacent(Vec2::new(edge + reach + 0.5, 300.0), &table));
    }
}

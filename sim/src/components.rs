//! ECS components for the Moonbase Apollo simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems and in the `SpaceWorld` reactions.

use crate::collision::{CollisionGroups, Role};
use crate::registry::ObjectClass;
use crate::ships::ShipModel;
use crate::spatial::Rect;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// 2D position in world space (y grows "up" the screen).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        self.distance2_to(other).sqrt()
    }

    pub fn distance2_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// 2D velocity vector.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    pub fn magnitude(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    pub fn normalized(&self) -> Self {
        let mag = self.magnitude();
        if mag < 0.0001 {
            Self::default()
        } else {
            Self {
                vx: self.vx / mag,
                vy: self.vy / mag,
            }
        }
    }
}

/// Sprite rotation in degrees, clockwise from "up".
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading(pub f32);

impl Heading {
    /// Unit vector the nose points along.
    pub fn direction(&self) -> (f32, f32) {
        let r = self.0.to_radians();
        (r.sin(), r.cos())
    }
}

/// Angular velocity in degrees per second.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Spin(pub f32);

/// Rotate (x, y) anticlockwise by `degrees`.
pub fn rotate(x: f32, y: f32, degrees: f32) -> (f32, f32) {
    let (s, c) = degrees.to_radians().sin_cos();
    (x * c - y * s, x * s + y * c)
}

// ============================================================================
// COLLISION COMPONENTS
// ============================================================================

/// Circle collider with group/mask filtering.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub radius: f32,
    /// Groups this entity belongs to.
    pub group: CollisionGroups,
    /// Groups this entity reacts to when it is the moving party.
    pub mask: CollisionGroups,
}

impl Collider {
    pub fn new(radius: f32, group: CollisionGroups, mask: CollisionGroups) -> Self {
        Self { radius, group, mask }
    }

    /// A passive body: others may hit it, it never probes.
    pub fn passive(radius: f32, group: CollisionGroups) -> Self {
        Self::new(radius, group, CollisionGroups::empty())
    }
}

/// Oversized rectangle an entity is registered under in the spatial index.
///
/// Invariant: `rect` contains the circle at `anchor` grown by the margin, so
/// the true position stays inside `rect` until it drifts more than the
/// margin from `anchor` on either axis.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct FatBounds {
    pub rect: Rect,
    pub anchor: Position,
    pub radius: f32,
}

impl FatBounds {
    pub fn compute(pos: Position, radius: f32, margin: f32) -> Self {
        Self {
            rect: Rect::around_circle(pos.x, pos.y, radius + margin),
            anchor: pos,
            radius,
        }
    }

    /// Whether the stored rect must be recomputed to keep containing the body.
    pub fn is_stale(&self, pos: Position, radius: f32, margin: f32) -> bool {
        (pos.x - self.anchor.x).abs() > margin
            || (pos.y - self.anchor.y).abs() > margin
            || radius > self.radius
    }
}

/// Marker for entities that look for contacts each tick (the "moving party").
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Probe;

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Symbolic class tag of an object.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Class(pub ObjectClass);

/// Display name (ships, astronauts, labels).
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

/// Mission-assigned stable identifier.
#[derive(Component, Debug, Clone, PartialEq, Eq, Hash)]
pub struct StableId(pub String);

// ============================================================================
// ACTOR COMPONENTS
// ============================================================================

/// The player-controlled ship.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Handling characteristics of a ship.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Ship(pub ShipModel);

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Mass(pub f32);

/// Tractor beam held by a ship.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tether {
    pub item: Entity,
}

/// Back link on the towed item.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tethered {
    pub by: Entity,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projectile {
    pub owner: Entity,
}

/// Asteroid that breaks off fragments of `yields` when shot.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rock {
    pub yields: ObjectClass,
}

/// Hostile drone that fires at the player.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Droid {
    pub cooldown: f32,
}

/// Towable item that can be delivered to a collector.
#[derive(Component, Debug, Clone, PartialEq, Eq, Default)]
pub struct Cargo {
    pub value: u32,
    /// Only a collector with this stable id accepts the item; `None` = any.
    pub destination: Option<String>,
}

impl Cargo {
    /// Destination filter.
    pub fn accepted_by(&self, collector_id: Option<&str>) -> bool {
        match &self.destination {
            None => true,
            Some(dest) => collector_id == Some(dest.as_str()),
        }
    }
}

/// Item collected by flying through it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pickup {
    pub value: u32,
}

/// Parked ship the player can swap into.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Swappable {
    pub model: ShipModel,
    pub swapped: bool,
}

/// Accepts cargo that passes its destination filter.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Collector;

// ============================================================================
// EFFECT / ATTACHMENT COMPONENTS
// ============================================================================

/// Remaining lifetime in seconds.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Lifetime(pub f32);

/// Rigidly attached to a rotating parent (moonbase on the moon).
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Mounted {
    pub parent: Entity,
    pub offset: (f32, f32),
}

/// Tracks a target's position; dies with the target.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Follow {
    pub target: Entity,
    pub offset: (f32, f32),
}

// ============================================================================
// BUNDLES
// ============================================================================

/// Everything a collidable body needs.
#[derive(Bundle, Debug, Clone)]
pub struct BodyBundle {
    pub class: Class,
    pub role: Role,
    pub position: Position,
    pub velocity: Velocity,
    pub heading: Heading,
    pub spin: Spin,
    pub collider: Collider,
}

impl BodyBundle {
    pub fn new(class: ObjectClass, role: Role, position: Position, collider: Collider) -> Self {
        Self {
            class: Class(class),
            role,
            position,
            velocity: Velocity::default(),
            heading: Heading::default(),
            spin: Spin::default(),
            collider,
        }
    }

    pub fn with_velocity(mut self, velocity: Velocity) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_heading(mut self, degrees: f32) -> Self {
        self.heading = Heading(degrees);
        self
    }

    pub fn with_spin(mut self, degrees_per_sec: f32) -> Self {
        self.spin = Spin(degrees_per_sec);
        self
    }
}

/// Non-collidable text that follows another entity.
#[derive(Bundle, Debug, Clone)]
pub struct LabelBundle {
    pub class: Class,
    pub name: Name,
    pub position: Position,
    pub follow: Follow,
}

impl LabelBundle {
    pub fn new(class: ObjectClass, text: impl Into<String>, target: Entity, offset: (f32, f32)) -> Self {
        Self {
            class: Class(class),
            name: Name(text.into()),
            position: Position::default(),
            follow: Follow { target, offset },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_turn() {
        let (x, y) = rotate(0.0, 220.0, 90.0);
        assert!((x + 220.0).abs() < 0.001);
        assert!(y.abs() < 0.001);
    }

    #[test]
    fn test_heading_direction() {
        let (dx, dy) = Heading(0.0).direction();
        assert!(dx.abs() < 1e-6 && (dy - 1.0).abs() < 1e-6);
        let (dx, dy) = Heading(90.0).direction();
        assert!((dx - 1.0).abs() < 1e-6 && dy.abs() < 1e-5);
    }

    #[test]
    fn test_fat_bounds_staleness() {
        let fb = FatBounds::compute(Position::new(0.0, 0.0), 10.0, 16.0);
        assert!(fb.rect.contains_point(25.0, 25.0));
        assert!(!fb.is_stale(Position::new(16.0, -16.0), 10.0, 16.0));
        assert!(fb.is_stale(Position::new(16.5, 0.0), 10.0, 16.0));
        assert!(fb.is_stale(Position::new(0.0, 0.0), 12.0, 16.0));
    }

    #[test]
    fn test_cargo_destination_filter() {
        let any = Cargo { value: 10, destination: None };
        let moonbase = Cargo { value: 10, destination: Some("moonbase".into()) };
        assert!(any.accepted_by(Some("comm-station-4")));
        assert!(any.accepted_by(None));
        assert!(!moonbase.accepted_by(Some("comm-station-4")));
        assert!(moonbase.accepted_by(Some("moonbase")));
    }
}

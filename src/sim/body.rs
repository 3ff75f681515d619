//! Common body state shared by ships, asteroids, the planet and projectiles

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::torus::Field;

/// Handle to an entity in the world.
///
/// Handles are never reused within a world, so a handle whose entity has been
/// deactivated or removed simply fails to resolve. Projectiles hold handles to
/// their owner and target; those are non-owning and resolve to "none" once the
/// entity is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Monotonic handle allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Allocate a new entity ID
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// A circle moving on the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Inactive bodies take no part in collisions and are dropped at the end
    /// of the tick
    pub active: bool,
}

impl Body {
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        debug_assert!(radius >= 0.0, "negative body radius");
        Self {
            id,
            pos,
            vel,
            radius,
            active: true,
        }
    }

    /// Advance position by velocity and wrap into the field
    #[inline]
    pub fn integrate(&mut self, dt: f32, field: &Field) {
        self.pos = field.wrap_position(self.pos + self.vel * dt);
    }

    /// Wrapped overlap test against another body
    pub fn overlaps(&self, other: &Body, field: &Field) -> bool {
        field.distance(self.pos, other.pos) < self.radius + other.radius
    }
}

/// Anything built around a [`Body`]
pub trait HasBody {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    fn id(&self) -> EntityId {
        self.body().id
    }

    fn is_active(&self) -> bool {
        self.body().active
    }
}

impl HasBody for Body {
    fn body(&self) -> &Body {
        self
    }

    fn body_mut(&mut self) -> &mut Body {
        self
    }
}

/// Mutable access to two distinct elements of a slice
pub fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    assert_ne!(i, j, "pair_mut needs distinct indices");
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

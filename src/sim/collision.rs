//! Pairwise collision detection and response on the torus
//!
//! Every check measures the wrapped delta between centres, so two bodies on
//! opposite sides of a seam collide exactly as they would mid-field. Pairs
//! split the positional correction evenly and exchange the normal component
//! of their velocities (equal masses). The planet never moves: a ship that
//! touches it takes the whole correction plus a bounce.

use glam::Vec2;

use super::body::Body;
use super::ship::Ship;
use super::torus::Field;
use crate::consts::*;

/// Normal used when two centres coincide exactly
pub const FALLBACK_NORMAL: Vec2 = Vec2::X;

/// Overlap between two circles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector from the first body toward the second
    pub normal: Vec2,
    /// How far the circles overlap
    pub penetration: f32,
}

/// Overlap test between `a` and `b`; `None` when they are apart
pub fn contact(a: &Body, b: &Body, field: &Field) -> Option<Contact> {
    let d = field.delta(a.pos, b.pos);
    let dist = d.length();
    let min_dist = a.radius + b.radius;
    if dist >= min_dist {
        return None;
    }
    let normal = if dist > 0.0 { d / dist } else { FALLBACK_NORMAL };
    Some(Contact {
        normal,
        penetration: min_dist - dist,
    })
}

/// Reflect velocity off a surface with the given unit normal
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Separate two overlapping bodies 50/50 and swap the normal components of
/// their velocities. Returns true if they were touching.
pub fn resolve_elastic(a: &mut Body, b: &mut Body, field: &Field) -> bool {
    let Some(Contact {
        normal,
        penetration,
    }) = contact(a, b, field)
    else {
        return false;
    };
    let half = normal * (penetration / 2.0);
    a.pos = field.wrap_position(a.pos - half);
    b.pos = field.wrap_position(b.pos + half);

    let closing = (b.vel - a.vel).dot(normal);
    a.vel += normal * closing;
    b.vel -= normal * closing;
    true
}

/// Outcome of a ship touching the planet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanetContact {
    Clear,
    /// Pushed out and bounced; no damage this time
    Bounced,
    /// Pushed out, bounced and lost a crew member
    Damaged,
}

/// Push a ship out of the planet, bounce it, and apply the rate-limited
/// contact damage. `now` is the simulation time.
pub fn resolve_planet_contact(
    ship: &mut Ship,
    planet: &Body,
    field: &Field,
    now: f32,
) -> PlanetContact {
    let Some(Contact {
        normal,
        penetration,
    }) = contact(planet, &ship.body, field)
    else {
        return PlanetContact::Clear;
    };
    let body = &mut ship.body;
    body.pos = field.wrap_position(body.pos + normal * penetration);
    body.vel = reflect_velocity(body.vel, normal);
    body.vel += normal * PLANET_BOUNCE_IMPULSE * ship.stats.thrust_increment;

    let due = ship
        .last_planet_damage
        .is_none_or(|last| now - last > PLANET_DAMAGE_INTERVAL);
    if !due {
        return PlanetContact::Bounced;
    }
    ship.last_planet_damage = Some(now);
    if ship.take_damage(1) {
        PlanetContact::Damaged
    } else {
        PlanetContact::Bounced
    }
}

//! Planet gravity
//!
//! Radial pull toward the planet for bodies within range. Ships feel it, as do
//! mines still in their launching phase. Homing projectiles steer on their own
//! and ignore it.

use glam::Vec2;

use super::body::Body;
use super::torus::Field;
use crate::config::GravityModel;

/// Acceleration magnitude at distance `d` from the planet centre.
///
/// Returns 0 outside the model's range and at the exact centre.
pub fn acceleration(model: &GravityModel, d: f32) -> f32 {
    if d <= 0.0 || d >= model.range() {
        return 0.0;
    }
    match *model {
        GravityModel::Linear {
            strength,
            range,
            multiplier,
        } => strength * (1.0 - d / range) * multiplier,
        GravityModel::InverseSquare {
            strength, epsilon, ..
        } => strength / ((d + epsilon) * (d + epsilon)),
    }
}

/// Pull `body` toward `planet` for `dt` seconds.
///
/// Returns true if the body is inside the field (and was accelerated).
pub fn apply_gravity(
    body: &mut Body,
    planet: &Body,
    model: &GravityModel,
    field: &Field,
    dt: f32,
) -> bool {
    let to_planet = field.delta(body.pos, planet.pos);
    let d = to_planet.length();
    let accel = acceleration(model, d);
    if accel == 0.0 {
        return false;
    }
    let inward: Vec2 = to_planet / d;
    body.vel += inward * accel * dt;
    true
}

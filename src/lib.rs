//! Gravwell - ship combat on a toroidal field around a gravity well
//!
//! Core modules:
//! - `sim`: Simulation (toroidal geometry, gravity, collisions, weapons, AI, tick)
//! - `config`: Data-driven round setup
//! - `error`: Configuration errors

pub mod config;
pub mod error;
pub mod sim;

pub use config::{GravityModel, SimConfig};
pub use error::ConfigError;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference timestep for the headless runner (60 Hz, one tick per frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Field dimensions
    pub const FIELD_W: f32 = 3000.0;
    pub const FIELD_H: f32 = 3000.0;
    /// Visible window of the field (asteroids respawn outside it)
    pub const VIEWPORT_W: f32 = 1000.0;
    pub const VIEWPORT_H: f32 = 800.0;
    /// Keep spawned ships fully inside the field rectangle
    pub const SPAWN_MARGIN: f32 = 15.0;

    /// Planet
    pub const PLANET_RADIUS: f32 = 30.0;
    /// Minimum time between planet contact damage for one ship (seconds)
    pub const PLANET_DAMAGE_INTERVAL: f32 = 0.5;
    /// Post-bounce impulse, as a multiple of the ship's thrust increment
    pub const PLANET_BOUNCE_IMPULSE: f32 = 8.0;

    /// Gravity defaults
    pub const GRAVITY_RANGE: f32 = 500.0;
    pub const GRAVITY_STRENGTH: f32 = 120.0;
    pub const GRAVITY_LINEAR_MULTIPLIER: f32 = 1.5;
    pub const GRAVITY_INVERSE_SQUARE_STRENGTH: f32 = 1.5e6;
    pub const GRAVITY_EPSILON: f32 = 10.0;

    /// Asteroids
    pub const ASTEROID_COUNT: usize = 5;
    pub const ASTEROID_MIN_RADIUS: u32 = 8;
    pub const ASTEROID_MAX_RADIUS: u32 = 12;
    pub const ASTEROID_MAX_SPEED: f32 = 50.0;
    pub const ASTEROID_MIN_SPIN: f32 = 50.0; // degrees per second
    pub const ASTEROID_MAX_SPIN: f32 = 180.0;
    pub const ASTEROID_MAX_HEALTH: u32 = 5;
    /// Extra distance beyond the viewport edge for off-screen respawns
    pub const ASTEROID_RESPAWN_MARGIN: f32 = 20.0;

    /// Ships
    pub const SHIP_RADIUS: f32 = 15.0;
    /// Braking impulses (against current motion) are stronger
    pub const BRAKING_MULTIPLIER: f32 = 2.0;
    /// Laser beam segment display time (seconds)
    pub const LASER_TTL: f32 = 0.1;
    /// Laser reach as a multiple of ship radius
    pub const LASER_RANGE_FACTOR: f32 = 2.2 * 2.0;

    /// Missiles
    pub const MISSILE_RADIUS: f32 = 5.0;
    pub const MISSILE_DAMAGE: i32 = 4;
    pub const MISSILE_SPEED: f32 = 300.0;
    pub const MISSILE_HOMING: f32 = 2.0;
    pub const MISSILE_LIFETIME: f32 = 3.0;
    pub const MISSILE_MUZZLE_SPEED: f32 = 50.0;
    pub const TWIN_MISSILE_DAMAGE: i32 = 1;

    /// Mines
    pub const MINE_RADIUS: f32 = 5.0;
    pub const MINE_DAMAGE: i32 = 4;
    pub const MINE_SPEED: f32 = 200.0;
    pub const MINE_HOMING: f32 = 1.0;
    pub const MINE_MUZZLE_SPEED: f32 = 150.0;
    /// Tracking radius as a multiple of the mine radius (12 mine diameters)
    pub const MINE_TRACKING_FACTOR: f32 = 24.0;
    pub const MAX_DEPLOYED_MINES: usize = 8;

    /// Plasmoid ring
    pub const RING_SIZE: usize = 16;
    pub const RING_SCALING: f32 = 1.5;
    pub const PLASMOID_ORBIT_SPEED: f32 = 50.0;
    pub const PLASMOID_BASE_RADIUS: f32 = 4.0;
    pub const PLASMOID_GROWTH_DIVISOR: f32 = 50.0;
    pub const PLASMOID_DAMAGE: i32 = 3;
    pub const PLASMOID_LIFETIME: f32 = 1.0;

    /// Shield invulnerability window (seconds)
    pub const SHIELD_DURATION: f32 = 0.5;

    /// AI tuning
    pub const AI_OBSTACLE_MARGIN: f32 = 50.0;
    pub const AI_DODGE_RADIUS: f32 = 100.0;
    pub const AI_DODGE_CONE_DEG: f32 = 30.0;
    pub const AI_FIRE_CONE_DEG: f32 = 30.0;
    pub const AI_MISSILE_RANGE: f32 = 700.0;
    pub const AI_SECONDARY_RANGE: f32 = 300.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed smallest rotation taking `from` onto `to`, in [-π, π)
#[inline]
pub fn angle_diff(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Bearing of a vector (radians, 0 along +x)
#[inline]
pub fn bearing(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Unit vector for a heading (radians, 0 along +x)
#[inline]
pub fn heading_vector(heading: f32) -> Vec2 {
    Vec2::new(heading.cos(), heading.sin())
}

//! Round setup configuration
//!
//! Supplied once before a round starts, never mutated mid-tick. Every field
//! defaults to the compile-time constant in [`crate::consts`], so a JSON file
//! only needs the keys it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::ai::Difficulty;
use crate::sim::ship::Archetype;

/// Falloff model for the planet's gravity field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum GravityModel {
    /// `strength * (1 - d/range) * multiplier`
    Linear {
        strength: f32,
        range: f32,
        multiplier: f32,
    },
    /// `strength / (d + epsilon)^2`
    InverseSquare {
        strength: f32,
        range: f32,
        epsilon: f32,
    },
}

impl Default for GravityModel {
    fn default() -> Self {
        GravityModel::Linear {
            strength: GRAVITY_STRENGTH,
            range: GRAVITY_RANGE,
            multiplier: GRAVITY_LINEAR_MULTIPLIER,
        }
    }
}

impl GravityModel {
    /// Default inverse-square model with the same reach as the linear one
    pub fn inverse_square() -> Self {
        GravityModel::InverseSquare {
            strength: GRAVITY_INVERSE_SQUARE_STRENGTH,
            range: GRAVITY_RANGE,
            epsilon: GRAVITY_EPSILON,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GravityModel::Linear { .. } => "linear",
            GravityModel::InverseSquare { .. } => "inverse_square",
        }
    }

    /// Maximum distance at which the field acts
    pub fn range(&self) -> f32 {
        match *self {
            GravityModel::Linear { range, .. } | GravityModel::InverseSquare { range, .. } => range,
        }
    }
}

/// Who flies a side's ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pilot {
    /// Control intents written by an external input layer
    Human,
    /// Rule-based controller at the given tier
    Ai(Difficulty),
}

impl Default for Pilot {
    fn default() -> Self {
        Pilot::Ai(Difficulty::default())
    }
}

impl Pilot {
    /// Difficulty if the pilot is an AI
    pub fn difficulty(&self) -> Option<Difficulty> {
        match self {
            Pilot::Human => None,
            Pilot::Ai(d) => Some(*d),
        }
    }
}

/// One side's roster and pilot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    pub pilot: Pilot,
    pub roster: Vec<Archetype>,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            pilot: Pilot::default(),
            roster: Archetype::ALL.to_vec(),
        }
    }
}

/// Complete round configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for spawns, asteroid respawns and AI rolls
    pub seed: u64,

    // === Field ===
    pub field_width: f32,
    pub field_height: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,

    // === Planet ===
    pub planet_radius: f32,
    pub gravity: GravityModel,

    // === Asteroids ===
    pub asteroid_count: usize,
    pub asteroid_min_radius: u32,
    pub asteroid_max_radius: u32,
    pub asteroid_max_speed: f32,

    // === Teams ===
    pub teams: [TeamConfig; 2],
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,

            field_width: FIELD_W,
            field_height: FIELD_H,
            viewport_width: VIEWPORT_W,
            viewport_height: VIEWPORT_H,

            planet_radius: PLANET_RADIUS,
            gravity: GravityModel::default(),

            asteroid_count: ASTEROID_COUNT,
            asteroid_min_radius: ASTEROID_MIN_RADIUS,
            asteroid_max_radius: ASTEROID_MAX_RADIUS,
            asteroid_max_speed: ASTEROID_MAX_SPEED,

            teams: [TeamConfig::default(), TeamConfig::default()],
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!(
            "Loaded config from {} (gravity: {})",
            path.display(),
            config.gravity.as_str()
        );
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    name,
                    value,
                    reason: "must be positive and finite",
                })
            }
        }

        positive("field_width", self.field_width)?;
        positive("field_height", self.field_height)?;
        positive("viewport_width", self.viewport_width)?;
        positive("viewport_height", self.viewport_height)?;
        positive("gravity.range", self.gravity.range())?;

        if !(self.planet_radius >= 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "planet_radius",
                value: self.planet_radius,
                reason: "radius must be >= 0",
            });
        }
        if let GravityModel::InverseSquare { epsilon, .. } = self.gravity {
            positive("gravity.epsilon", epsilon)?;
        }
        if self.asteroid_min_radius > self.asteroid_max_radius {
            return Err(ConfigError::InvalidValue {
                name: "asteroid_min_radius",
                value: self.asteroid_min_radius as f32,
                reason: "must not exceed asteroid_max_radius",
            });
        }
        if !(self.asteroid_max_speed >= 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "asteroid_max_speed",
                value: self.asteroid_max_speed,
                reason: "must be >= 0",
            });
        }
        if let Some(side) = self.teams.iter().position(|t| t.roster.is_empty()) {
            return Err(ConfigError::InvalidValue {
                name: "teams.roster",
                value: side as f32,
                reason: "every side needs at least one ship",
            });
        }
        if self.viewport_width >= self.field_width || self.viewport_height >= self.field_height {
            log::warn!("Viewport covers the whole field; asteroid respawns cannot be off-screen");
        }
        Ok(())
    }
}

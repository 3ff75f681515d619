//! World state and core simulation types
//!
//! Everything a tick reads or writes lives in [`World`]. Entities sit in
//! plain vectors in spawn order; handles ([`EntityId`]) are never reused, so a
//! lookup for a removed entity simply returns `None`.

use std::collections::HashMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::ai::AiController;
use super::body::{Body, EntityId, HasBody, IdAllocator};
use super::projectile::{MinePhase, Projectile, ProjectileKind};
use super::ship::{Archetype, Ship, Side};
use super::tick::{TickInput, tick};
use super::torus::Field;
use super::weapon::LaserSegment;
use crate::config::{GravityModel, Pilot, SimConfig};
use crate::consts::*;
use crate::error::ConfigError;

/// Attempts at finding an off-screen respawn point before falling back
const RESPAWN_ATTEMPTS: usize = 64;

/// A drifting rock
#[derive(Debug, Clone)]
pub struct Asteroid {
    pub body: Body,
    /// Display rotation (radians)
    pub angle: f32,
    /// Radians per second
    pub spin: f32,
    pub health: u32,
}

impl HasBody for Asteroid {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Asteroid {
    /// Any hit destroys an asteroid, whatever the amount
    pub fn take_damage(&mut self, _amount: i32) {
        self.health = 0;
        self.body.active = false;
    }

    pub fn update(&mut self, dt: f32, field: &Field) {
        self.angle = crate::normalize_angle(self.angle + self.spin * dt);
        self.body.integrate(dt, field);
    }
}

/// View window that follows the fight
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Camera {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Camera {
    /// Centre on the wrapped midpoint of the live ships
    pub fn follow(&mut self, a: Option<Vec2>, b: Option<Vec2>, field: &Field) {
        match (a, b) {
            (Some(a), Some(b)) => self.pos = field.midpoint(a, b),
            (Some(p), None) | (None, Some(p)) => self.pos = p,
            (None, None) => {}
        }
    }
}

/// Things that happened during a tick, for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    ShipDestroyed {
        id: EntityId,
        side: Side,
        archetype: Archetype,
    },
    ShipDamaged {
        id: EntityId,
        side: Side,
        amount: i32,
        crew: i32,
    },
    AsteroidDestroyed {
        id: EntityId,
    },
    /// `old` touched the planet and was replaced by `id` off-screen
    AsteroidRespawned {
        old: EntityId,
        id: EntityId,
        pos: Vec2,
    },
    ProjectileFired {
        owner: EntityId,
        count: usize,
    },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub config: SimConfig,
    pub field: Field,
    pub gravity: GravityModel,
    pub planet: Body,
    pub asteroids: Vec<Asteroid>,
    pub ships: Vec<Ship>,
    pub projectiles: Vec<Projectile>,
    pub ids: IdAllocator,
    pub rng: Pcg32,
    /// Simulated seconds since the round began
    pub time: f32,
    pub camera: Camera,
    /// Pending events, oldest first
    pub events: Vec<GameEvent>,
    /// Per-side "ship destroyed" flags, latched until polled
    pub destroyed: [bool; 2],
    /// Side of every ship ever launched, including ones since removed
    ship_sides: HashMap<EntityId, Side>,
}

impl World {
    /// Build a round: planet at the field centre plus the initial asteroids.
    /// Ships are added with [`World::spawn_ship`].
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let field = Field::new(config.field_width, config.field_height);
        let mut ids = IdAllocator::default();
        let planet = Body::new(ids.next_id(), field.center(), Vec2::ZERO, config.planet_radius);
        let mut world = Self {
            gravity: config.gravity,
            field,
            planet,
            asteroids: Vec::with_capacity(config.asteroid_count),
            ships: Vec::with_capacity(2),
            projectiles: Vec::new(),
            ids,
            rng: Pcg32::seed_from_u64(config.seed),
            time: 0.0,
            camera: Camera {
                pos: field.center(),
                size: Vec2::new(config.viewport_width, config.viewport_height),
            },
            events: Vec::new(),
            destroyed: [false; 2],
            ship_sides: HashMap::new(),
            config,
        };
        for _ in 0..world.config.asteroid_count {
            let pos = Vec2::new(
                world.rng.random_range(0.0..world.field.width),
                world.rng.random_range(0.0..world.field.height),
            );
            let asteroid = world.random_asteroid(pos);
            world.asteroids.push(asteroid);
        }
        log::info!(
            "World {}x{} ready: {} asteroids, {} gravity",
            world.field.width,
            world.field.height,
            world.asteroids.len(),
            world.gravity.as_str()
        );
        Ok(world)
    }

    /// Advance the whole simulation by `dt` seconds using the control intents
    /// already written on the ships
    pub fn step(&mut self, dt: f32) {
        tick(self, &TickInput::default(), dt);
    }

    /// Add a ship for `side` at a random in-bounds point
    pub fn spawn_ship(&mut self, side: Side, archetype: Archetype, pilot: Pilot) -> EntityId {
        let pos = self.random_spawn_point();
        let id = self.ids.next_id();
        let mut ship = Ship::new(id, side, archetype, pos);
        if let Some(difficulty) = pilot.difficulty() {
            ship = ship.with_ai(AiController::for_archetype(archetype, difficulty));
        }
        log::info!(
            "{:?} launches {} (id {}) at ({:.0}, {:.0})",
            side,
            archetype.as_str(),
            id.0,
            pos.x,
            pos.y
        );
        self.ships.push(ship);
        self.ship_sides.insert(id, side);
        id
    }

    /// Side a ship flew for, even after it was removed
    pub fn side_of(&self, id: EntityId) -> Option<Side> {
        self.ship_sides.get(&id).copied()
    }

    /// Random point at least `SPAWN_MARGIN` from the field edges
    pub fn random_spawn_point(&mut self) -> Vec2 {
        let x = margin_sample(&mut self.rng, self.field.width);
        let y = margin_sample(&mut self.rng, self.field.height);
        Vec2::new(x, y)
    }

    /// Random point outside the camera's viewport (plus margin). Falls back to
    /// the point opposite the camera when no such point turns up.
    pub fn offscreen_point(&mut self) -> Vec2 {
        let window = self.camera.size + Vec2::splat(2.0 * ASTEROID_RESPAWN_MARGIN);
        for _ in 0..RESPAWN_ATTEMPTS {
            let p = Vec2::new(
                self.rng.random_range(0.0..self.field.width),
                self.rng.random_range(0.0..self.field.height),
            );
            if !self.field.in_window(self.camera.pos, window, p) {
                return p;
            }
        }
        let opposite = self.camera.pos + Vec2::new(self.field.width, self.field.height) / 2.0;
        self.field.wrap_position(opposite)
    }

    /// Fresh asteroid at `pos` with random size, drift and spin
    pub fn random_asteroid(&mut self, pos: Vec2) -> Asteroid {
        let rng = &mut self.rng;
        let radius = rng.random_range(self.config.asteroid_min_radius..=self.config.asteroid_max_radius);
        let max_speed = self.config.asteroid_max_speed;
        let vel = Vec2::new(
            rng.random_range(-max_speed..=max_speed),
            rng.random_range(-max_speed..=max_speed),
        );
        let spin_sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let spin = rng
            .random_range(ASTEROID_MIN_SPIN..=ASTEROID_MAX_SPIN)
            .to_radians()
            * spin_sign;
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        Asteroid {
            body: Body::new(self.ids.next_id(), pos, vel, radius as f32),
            angle,
            spin,
            health: ASTEROID_MAX_HEALTH,
        }
    }

    /// Live ship by handle
    pub fn ship(&self, id: EntityId) -> Option<&Ship> {
        find_live(&self.ships, id)
    }

    /// Live ship flying for `side`
    pub fn ship_on(&self, side: Side) -> Option<&Ship> {
        self.ships.iter().find(|s| s.side == side && s.body.active)
    }

    pub fn ship_on_mut(&mut self, side: Side) -> Option<&mut Ship> {
        self.ships.iter_mut().find(|s| s.side == side && s.body.active)
    }

    pub fn projectile(&self, id: EntityId) -> Option<&Projectile> {
        find_live(&self.projectiles, id)
    }

    pub fn asteroid(&self, id: EntityId) -> Option<&Asteroid> {
        find_live(&self.asteroids, id)
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read and clear the per-side destroyed flags
    pub fn take_destroyed(&mut self) -> [bool; 2] {
        std::mem::take(&mut self.destroyed)
    }

    /// Presentation view of every live body
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time: self.time,
            camera: self.camera,
            planet: BodyView::from(&self.planet),
            asteroids: self
                .asteroids
                .iter()
                .filter(|a| a.body.active)
                .map(|a| AsteroidView {
                    body: BodyView::from(&a.body),
                    angle: a.angle,
                })
                .collect(),
            ships: self
                .ships
                .iter()
                .filter(|s| s.body.active)
                .map(|s| ShipView {
                    body: BodyView::from(&s.body),
                    side: s.side,
                    archetype: s.archetype,
                    heading: s.heading,
                    crew: s.crew,
                    energy: s.energy,
                    shielded: s.shielded(),
                    lasers: s.lasers.clone(),
                })
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .filter(|p| p.body.active)
                .map(|p| ProjectileView {
                    body: BodyView::from(&p.body),
                    kind: projectile_label(&p.kind),
                    owner: p.owner,
                })
                .collect(),
        }
    }
}

/// Active entity with handle `id`; removed or deactivated ones read as none
fn find_live<T: HasBody>(items: &[T], id: EntityId) -> Option<&T> {
    items.iter().find(|e| e.id() == id && e.is_active())
}

/// Uniform sample in `[SPAWN_MARGIN, span - SPAWN_MARGIN)`, or the whole axis
/// when the field is too small for the margin
fn margin_sample(rng: &mut Pcg32, span: f32) -> f32 {
    if span > 2.0 * SPAWN_MARGIN {
        rng.random_range(SPAWN_MARGIN..span - SPAWN_MARGIN)
    } else {
        rng.random_range(0.0..span)
    }
}

fn projectile_label(kind: &ProjectileKind) -> &'static str {
    match kind {
        ProjectileKind::Missile { .. } => "missile",
        ProjectileKind::Mine {
            phase: MinePhase::Launching,
            ..
        } => "mine_launching",
        ProjectileKind::Mine {
            phase: MinePhase::Homing,
            ..
        } => "mine",
        ProjectileKind::Plasmoid { .. } => "plasmoid",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BodyView {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl From<&Body> for BodyView {
    fn from(body: &Body) -> Self {
        Self {
            id: body.id,
            pos: body.pos,
            vel: body.vel,
            radius: body.radius,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AsteroidView {
    pub body: BodyView,
    pub angle: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipView {
    pub body: BodyView,
    pub side: Side,
    pub archetype: Archetype,
    pub heading: f32,
    pub crew: i32,
    pub energy: u32,
    pub shielded: bool,
    pub lasers: Vec<LaserSegment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub body: BodyView,
    pub kind: &'static str,
    pub owner: Option<EntityId>,
}

/// Read-only state for drawing, refreshed once per tick
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub time: f32,
    pub camera: Camera,
    pub planet: BodyView,
    pub asteroids: Vec<AsteroidView>,
    pub ships: Vec<ShipView>,
    pub projectiles: Vec<ProjectileView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ai::Difficulty;

    fn world() -> World {
        World::new(SimConfig::default()).unwrap()
    }

    #[test]
    fn test_new_world_layout() {
        let w = world();
        assert_eq!(w.asteroids.len(), ASTEROID_COUNT);
        assert_eq!(w.planet.pos, w.field.center());
        for a in &w.asteroids {
            assert!((8.0..=12.0).contains(&a.body.radius));
            assert_eq!(a.body.radius.fract(), 0.0);
            assert!(a.body.vel.x.abs() <= 50.0 && a.body.vel.y.abs() <= 50.0);
            let spin = a.spin.abs().to_degrees();
            assert!((50.0 - 1e-3..=180.0 + 1e-3).contains(&spin));
            assert_eq!(a.health, ASTEROID_MAX_HEALTH);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            field_width: -1.0,
            ..Default::default()
        };
        assert!(World::new(config).is_err());
    }

    #[test]
    fn test_spawned_ship_respects_margin_and_pilot() {
        let mut w = world();
        for _ in 0..50 {
            let p = w.random_spawn_point();
            assert!(p.x >= SPAWN_MARGIN && p.x < FIELD_W - SPAWN_MARGIN);
            assert!(p.y >= SPAWN_MARGIN && p.y < FIELD_H - SPAWN_MARGIN);
        }
        let ai = w.spawn_ship(Side::One, Archetype::Cruiser, Pilot::Ai(Difficulty::Hard));
        let human = w.spawn_ship(Side::Two, Archetype::Marauder, Pilot::Human);
        assert!(w.ship(ai).unwrap().ai.is_some());
        assert!(w.ship(human).unwrap().ai.is_none());
        assert_eq!(w.ship_on(Side::Two).unwrap().body.id, human);
    }

    #[test]
    fn test_offscreen_point_outside_viewport() {
        let mut w = world();
        w.camera.pos = Vec2::new(100.0, 100.0);
        let window = w.camera.size + Vec2::splat(2.0 * ASTEROID_RESPAWN_MARGIN);
        for _ in 0..100 {
            let p = w.offscreen_point();
            assert!(!w.field.in_window(w.camera.pos, window, p));
        }
    }

    #[test]
    fn test_offscreen_fallback_when_viewport_covers_field() {
        let config = SimConfig {
            viewport_width: 4000.0,
            viewport_height: 4000.0,
            ..Default::default()
        };
        let mut w = World::new(config).unwrap();
        w.camera.pos = Vec2::new(100.0, 200.0);
        let p = w.offscreen_point();
        assert!((p - Vec2::new(1600.0, 1700.0)).length() < 1e-3);
    }

    #[test]
    fn test_camera_follows_wrapped_midpoint() {
        let field = Field::new(1000.0, 1000.0);
        let mut cam = Camera {
            pos: Vec2::ZERO,
            size: Vec2::splat(100.0),
        };
        cam.follow(Some(Vec2::new(950.0, 500.0)), Some(Vec2::new(30.0, 500.0)), &field);
        assert!((cam.pos - Vec2::new(990.0, 500.0)).length() < 1e-3);
        cam.follow(None, Some(Vec2::new(10.0, 20.0)), &field);
        assert_eq!(cam.pos, Vec2::new(10.0, 20.0));
        cam.follow(None, None, &field);
        assert_eq!(cam.pos, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_asteroid_one_hit_destroy() {
        let mut w = world();
        let a = &mut w.asteroids[0];
        a.take_damage(1);
        assert!(!a.body.active);
        assert_eq!(a.health, 0);
    }

    #[test]
    fn test_snapshot_serializes_live_bodies() {
        let mut w = world();
        w.spawn_ship(Side::One, Archetype::Terminator, Pilot::Human);
        w.asteroids[0].body.active = false;
        let snap = w.snapshot();
        assert_eq!(snap.ships.len(), 1);
        assert_eq!(snap.asteroids.len(), ASTEROID_COUNT - 1);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["ships"][0]["archetype"], "terminator");
        assert_eq!(json["ships"][0]["crew"], 20);
    }
}

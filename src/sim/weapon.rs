//! Weapons: energy/cooldown gating and the per-archetype firing patterns
//!
//! A ship's primary and secondary weapons each carry a [`WeaponTimer`]. Firing
//! is allowed only when the timer is clear and the ship has the energy; a
//! successful shot debits energy and re-arms the timer. The patterns below
//! only build what a shot produces; applying it to the world is the tick's
//! job.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{EntityId, IdAllocator};
use super::projectile::Projectile;
use super::torus::Field;
use crate::consts::*;
use crate::heading_vector;

/// Energy cost plus cooldown for one weapon slot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeaponTimer {
    pub energy_cost: u32,
    /// Cooldown armed after each shot (seconds)
    pub wait: f32,
    /// Remaining cooldown (seconds)
    pub cooldown: f32,
}

impl WeaponTimer {
    pub fn new(energy_cost: u32, wait: f32) -> Self {
        Self {
            energy_cost,
            wait,
            cooldown: 0.0,
        }
    }

    /// Cooldown clear and enough energy
    #[inline]
    pub fn ready(&self, energy: u32) -> bool {
        self.cooldown <= 0.0 && energy >= self.energy_cost
    }

    /// Debit energy and arm the cooldown. Returns false (and changes nothing)
    /// if the weapon is not ready.
    pub fn try_fire(&mut self, energy: &mut u32) -> bool {
        if !self.ready(*energy) {
            return false;
        }
        *energy -= self.energy_cost;
        self.cooldown = self.wait;
        true
    }

    pub fn tick(&mut self, dt: f32) {
        if self.cooldown > 0.0 {
            self.cooldown -= dt;
        }
    }
}

/// Primary weapon patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryWeapon {
    /// One homing missile from the nose
    MissileLauncher,
    /// Two untargeted low-damage missiles from the bow corners
    TwinMissiles,
    /// Fire-and-release mines
    MineLayer,
}

/// Secondary weapon patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecondaryWeapon {
    /// Short-range beams against anything nearby
    LaserDefense,
    /// Expanding ring of 16 plasmoids
    PlasmoidRing,
    /// Temporary invulnerability
    Shield,
}

/// What a laser can lock on to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Ship,
    Asteroid,
    Projectile,
}

/// Candidate target handed to secondary weapons
#[derive(Debug, Clone, Copy)]
pub struct TargetInfo {
    pub id: EntityId,
    pub kind: TargetKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Spawn time for projectiles
    pub launch_time: Option<f32>,
}

/// One beam from a laser defense shot
#[derive(Debug, Clone, Copy)]
pub struct LaserStrike {
    pub target: EntityId,
    pub kind: TargetKind,
    pub pos: Vec2,
    /// Projectile spawned before the shot (only these can be shot down)
    pub destroys_projectile: bool,
}

/// Beam segment kept on the ship for display
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LaserSegment {
    pub to: Vec2,
    pub ttl: f32,
}

/// Result of a successful shot
#[derive(Debug, Clone)]
pub enum WeaponEffect {
    /// New free-flying projectiles
    Projectiles(Vec<Projectile>),
    /// A mine entering its launching phase
    MineLaunched(Projectile),
    /// Beams to resolve against the struck entities
    Laser(Vec<LaserStrike>),
    /// Invulnerability window armed on the firing ship
    Shield,
}

/// Where a shot leaves the hull
#[derive(Debug, Clone, Copy)]
pub struct Muzzle {
    pub owner: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub heading: f32,
    pub radius: f32,
}

impl Muzzle {
    fn forward(&self) -> Vec2 {
        heading_vector(self.heading)
    }

    fn nose(&self, field: &Field) -> Vec2 {
        field.wrap_position(self.pos + self.forward() * self.radius)
    }
}

/// Single homing missile, inheriting ship velocity plus muzzle speed
pub fn launch_missile(
    muzzle: &Muzzle,
    target: Option<EntityId>,
    now: f32,
    ids: &mut IdAllocator,
    field: &Field,
) -> Projectile {
    let vel = muzzle.vel + muzzle.forward() * MISSILE_MUZZLE_SPEED;
    Projectile::missile(
        ids.next_id(),
        muzzle.nose(field),
        vel,
        target,
        Some(muzzle.owner),
        now,
    )
}

/// Left and right bow missiles with no homing target
pub fn launch_twin_missiles(
    muzzle: &Muzzle,
    now: f32,
    ids: &mut IdAllocator,
    field: &Field,
) -> Vec<Projectile> {
    let forward = muzzle.forward();
    let right = forward.perp();
    let vel = muzzle.vel + forward * MISSILE_MUZZLE_SPEED;
    [-1.0, 1.0]
        .into_iter()
        .map(|side| {
            let pos = field
                .wrap_position(muzzle.pos + forward * muzzle.radius + right * side * muzzle.radius);
            let mut missile =
                Projectile::missile(ids.next_id(), pos, vel, None, Some(muzzle.owner), now);
            missile.damage = TWIN_MISSILE_DAMAGE;
            missile
        })
        .collect()
}

/// Mine in launching phase, thrown forward hard
pub fn launch_mine(
    muzzle: &Muzzle,
    target: Option<EntityId>,
    now: f32,
    ids: &mut IdAllocator,
    field: &Field,
) -> Projectile {
    let vel = muzzle.vel + muzzle.forward() * MINE_MUZZLE_SPEED;
    Projectile::mine(
        ids.next_id(),
        muzzle.nose(field),
        vel,
        target,
        Some(muzzle.owner),
        now,
    )
}

/// Ring burst centred on the ship
pub fn launch_plasmoid_ring(muzzle: &Muzzle, now: f32, ids: &mut IdAllocator) -> Vec<Projectile> {
    Projectile::plasmoid_ring(
        ids,
        muzzle.owner,
        muzzle.pos,
        now,
        PLASMOID_ORBIT_SPEED,
        PLASMOID_LIFETIME,
    )
}

/// Targets a laser defense shot from `muzzle` would strike
pub fn laser_strikes(
    muzzle: &Muzzle,
    targets: &[TargetInfo],
    now: f32,
    field: &Field,
) -> Vec<LaserStrike> {
    let reach = muzzle.radius * LASER_RANGE_FACTOR;
    targets
        .iter()
        .filter(|t| t.id != muzzle.owner)
        .filter(|t| field.distance(muzzle.pos, t.pos) - t.radius <= reach)
        .map(|t| LaserStrike {
            target: t.id,
            kind: t.kind,
            pos: t.pos,
            destroys_projectile: t.kind == TargetKind::Projectile
                && t.launch_time.is_some_and(|launched| launched < now),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn muzzle(heading: f32) -> Muzzle {
        Muzzle {
            owner: EntityId(1),
            pos: Vec2::splat(500.0),
            vel: Vec2::new(10.0, 0.0),
            heading,
            radius: 15.0,
        }
    }

    #[test]
    fn test_timer_gates_energy_and_cooldown() {
        let mut timer = WeaponTimer::new(9, 0.5);
        let mut energy = 10;
        assert!(timer.try_fire(&mut energy));
        assert_eq!(energy, 1);
        assert!(timer.cooldown > 0.0);
        // Cooling down
        energy = 18;
        assert!(!timer.try_fire(&mut energy));
        assert_eq!(energy, 18);
        timer.tick(0.6);
        assert!(timer.try_fire(&mut energy));
        assert_eq!(energy, 9);
        timer.tick(0.6);
        assert!(timer.try_fire(&mut energy));
        assert_eq!(energy, 0);
        // Not enough energy
        timer.tick(0.6);
        assert!(!timer.try_fire(&mut energy));
        assert_eq!(energy, 0);
    }

    #[test]
    fn test_missile_leaves_nose_with_muzzle_velocity() {
        let mut ids = IdAllocator::default();
        let field = Field::new(3000.0, 3000.0);
        let m = launch_missile(&muzzle(0.0), Some(EntityId(2)), 1.0, &mut ids, &field);
        assert!((m.body.pos - Vec2::new(515.0, 500.0)).length() < 1e-4);
        assert!((m.body.vel - Vec2::new(60.0, 0.0)).length() < 1e-4);
        assert_eq!(m.target, Some(EntityId(2)));
        assert_eq!(m.owner, Some(EntityId(1)));
    }

    #[test]
    fn test_twin_missiles_straddle_bow() {
        let mut ids = IdAllocator::default();
        let field = Field::new(3000.0, 3000.0);
        let pair = launch_twin_missiles(&muzzle(0.0), 0.0, &mut ids, &field);
        assert_eq!(pair.len(), 2);
        assert!((pair[0].body.pos.y - 485.0).abs() < 1e-4);
        assert!((pair[1].body.pos.y - 515.0).abs() < 1e-4);
        assert!(pair.iter().all(|m| m.target.is_none() && m.damage == TWIN_MISSILE_DAMAGE));
        assert_ne!(pair[0].body.id, pair[1].body.id);
    }

    #[test]
    fn test_laser_reach_and_projectile_age() {
        let field = Field::new(3000.0, 3000.0);
        let m = muzzle(0.0);
        let targets = [
            TargetInfo {
                id: EntityId(2),
                kind: TargetKind::Projectile,
                pos: Vec2::new(560.0, 500.0),
                radius: 5.0,
                launch_time: Some(0.5),
            },
            TargetInfo {
                id: EntityId(3),
                kind: TargetKind::Projectile,
                pos: Vec2::new(500.0, 540.0),
                radius: 5.0,
                launch_time: Some(1.0),
            },
            TargetInfo {
                id: EntityId(4),
                kind: TargetKind::Ship,
                pos: Vec2::new(700.0, 500.0),
                radius: 15.0,
                launch_time: None,
            },
        ];
        let strikes = laser_strikes(&m, &targets, 1.0, &field);
        assert_eq!(strikes.len(), 2);
        assert!(strikes[0].destroys_projectile);
        // Spawned this instant: beam drawn but the projectile survives
        assert!(!strikes[1].destroys_projectile);
    }
}

//! Ships: archetypes, flight model, energy and weapon slots

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ai::AiController;
use super::body::{Body, EntityId, HasBody, IdAllocator};
use super::torus::Field;
use super::weapon::{
    LaserSegment, Muzzle, PrimaryWeapon, SecondaryWeapon, TargetInfo, WeaponEffect, WeaponTimer,
    launch_mine, launch_missile, launch_plasmoid_ring, launch_twin_missiles, laser_strikes,
};
use crate::consts::*;
use crate::{angle_diff, heading_vector, normalize_angle};

/// Which team a ship flies for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::One, Side::Two];

    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

/// Ship archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Homing missiles and laser point defense
    Cruiser,
    /// Mines and plasmoid ring bursts
    Marauder,
    /// Twin missiles and a shield
    Terminator,
}

/// Per-archetype tuning
#[derive(Debug, Clone, Copy)]
pub struct ShipStats {
    pub crew: i32,
    pub energy: u32,
    pub energy_regen: u32,
    pub energy_interval: f32,
    pub primary: PrimaryWeapon,
    pub primary_cost: u32,
    pub primary_wait: f32,
    pub secondary: SecondaryWeapon,
    pub secondary_cost: u32,
    pub secondary_wait: f32,
    pub max_thrust: f32,
    pub thrust_increment: f32,
    pub thrust_wait: f32,
    /// Radians per second
    pub turn_rate: f32,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Cruiser, Archetype::Marauder, Archetype::Terminator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Cruiser => "Cruiser",
            Archetype::Marauder => "Marauder",
            Archetype::Terminator => "Terminator",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cruiser" => Some(Archetype::Cruiser),
            "marauder" => Some(Archetype::Marauder),
            "terminator" => Some(Archetype::Terminator),
            _ => None,
        }
    }

    pub fn stats(&self) -> ShipStats {
        match self {
            Archetype::Cruiser => ShipStats {
                crew: 18,
                energy: 18,
                energy_regen: 1,
                energy_interval: 8.0 / 60.0,
                primary: PrimaryWeapon::MissileLauncher,
                primary_cost: 9,
                primary_wait: 10.0 / 60.0,
                secondary: SecondaryWeapon::LaserDefense,
                secondary_cost: 4,
                secondary_wait: 9.0 / 60.0,
                max_thrust: 24.0,
                thrust_increment: 3.0,
                thrust_wait: 4.0 / 60.0,
                turn_rate: 180f32.to_radians(),
            },
            Archetype::Marauder => ShipStats {
                crew: 42,
                energy: 42,
                energy_regen: 1,
                energy_interval: 4.0 / 60.0,
                primary: PrimaryWeapon::MineLayer,
                primary_cost: 6,
                primary_wait: 6.0 / 60.0,
                secondary: SecondaryWeapon::PlasmoidRing,
                secondary_cost: 21,
                secondary_wait: 9.0 / 60.0,
                max_thrust: 30.0,
                thrust_increment: 3.0,
                thrust_wait: 4.0 / 60.0,
                turn_rate: 90f32.to_radians(),
            },
            Archetype::Terminator => ShipStats {
                crew: 20,
                energy: 10,
                energy_regen: 2,
                energy_interval: 6.0 / 60.0,
                primary: PrimaryWeapon::TwinMissiles,
                primary_cost: 1,
                primary_wait: 0.0,
                secondary: SecondaryWeapon::Shield,
                secondary_cost: 3,
                secondary_wait: 2.0 / 60.0,
                max_thrust: 30.0,
                thrust_increment: 6.0,
                thrust_wait: 2.0 / 60.0,
                turn_rate: 90f32.to_radians(),
            },
        }
    }
}

/// Heading after turning from `current` toward `target` at `rate` rad/s
/// for `dt` seconds, stopping on the target
pub fn turn_step(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    let diff = angle_diff(current, target);
    let max_step = rate * dt;
    if diff.abs() <= max_step {
        normalize_angle(target)
    } else {
        normalize_angle(current + max_step.copysign(diff))
    }
}

/// Control intents for one ship.
///
/// `turn`, `goal_heading` and `thrust` persist until rewritten. The fire and
/// release requests are one-shot: the tick consumes and clears them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ShipControl {
    /// -1 (counter-clockwise) ..= 1 (clockwise), scaled by turn rate
    pub turn: f32,
    /// Heading to rotate toward at the turn rate; takes precedence over `turn`
    pub goal_heading: Option<f32>,
    pub thrust: bool,
    pub fire_primary: bool,
    pub fire_secondary: bool,
    pub release_mine: bool,
}

/// Result of releasing a mine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MineRelease {
    pub released: EntityId,
    /// Oldest deployed mine pushed out of the ring buffer
    pub evicted: Option<EntityId>,
}

/// A ship entity
#[derive(Debug, Clone)]
pub struct Ship {
    pub body: Body,
    pub side: Side,
    pub archetype: Archetype,
    pub stats: ShipStats,
    /// Radians, 0 along +x
    pub heading: f32,
    pub crew: i32,
    pub energy: u32,
    energy_timer: f32,
    pub primary: WeaponTimer,
    pub secondary: WeaponTimer,
    thrust_timer: f32,
    /// Set by the gravity stage each tick; lets thrust exceed `max_thrust`
    pub in_gravity_field: bool,
    /// Remaining invulnerability (seconds)
    pub shield_timer: f32,
    /// Time of the last planet contact damage
    pub last_planet_damage: Option<f32>,
    /// Mine currently in its launching phase
    pub current_mine: Option<EntityId>,
    /// Released mines, oldest first
    pub deployed_mines: VecDeque<EntityId>,
    /// Beam segments for display
    pub lasers: Vec<LaserSegment>,
    pub control: ShipControl,
    pub ai: Option<AiController>,
    /// Crew reached zero
    pub dead: bool,
}

impl HasBody for Ship {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Ship {
    pub fn new(id: EntityId, side: Side, archetype: Archetype, pos: Vec2) -> Self {
        let stats = archetype.stats();
        Self {
            body: Body::new(id, pos, Vec2::ZERO, SHIP_RADIUS),
            side,
            archetype,
            stats,
            heading: 0.0,
            crew: stats.crew,
            energy: stats.energy,
            energy_timer: stats.energy_interval,
            primary: WeaponTimer::new(stats.primary_cost, stats.primary_wait),
            secondary: WeaponTimer::new(stats.secondary_cost, stats.secondary_wait),
            thrust_timer: 0.0,
            in_gravity_field: false,
            shield_timer: 0.0,
            last_planet_damage: None,
            current_mine: None,
            deployed_mines: VecDeque::new(),
            lasers: Vec::new(),
            control: ShipControl::default(),
            ai: None,
            dead: false,
        }
    }

    pub fn with_ai(mut self, ai: AiController) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn forward(&self) -> Vec2 {
        heading_vector(self.heading)
    }

    pub fn shielded(&self) -> bool {
        self.shield_timer > 0.0
    }

    fn muzzle(&self) -> Muzzle {
        Muzzle {
            owner: self.body.id,
            pos: self.body.pos,
            vel: self.body.vel,
            heading: self.heading,
            radius: self.body.radius,
        }
    }

    /// Apply crew damage. Returns false when the shield absorbed it or the
    /// ship was already dead.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if self.dead || self.shielded() {
            return false;
        }
        self.crew -= amount;
        if self.crew <= 0 {
            self.crew = 0;
            self.dead = true;
            self.body.active = false;
            log::info!(
                "{} {:?} (id {}) destroyed",
                self.archetype.as_str(),
                self.side,
                self.body.id.0
            );
        }
        true
    }

    /// One tick of turning from the control intents
    pub fn apply_turn(&mut self, dt: f32) {
        if let Some(goal) = self.control.goal_heading {
            self.turn_towards(goal, dt);
            return;
        }
        let turn = self.control.turn.clamp(-1.0, 1.0);
        if turn != 0.0 {
            self.heading = normalize_angle(self.heading + turn * self.stats.turn_rate * dt);
        }
    }

    /// Rotate toward `target` at the turn rate without overshooting
    pub fn turn_towards(&mut self, target: f32, dt: f32) {
        self.heading = turn_step(self.heading, target, self.stats.turn_rate, dt);
    }

    /// Primary fire. `None` means the weapon did not fire.
    pub fn fire_primary(
        &mut self,
        target: Option<EntityId>,
        now: f32,
        ids: &mut IdAllocator,
        field: &Field,
    ) -> Option<WeaponEffect> {
        if self.dead {
            return None;
        }
        // One mine in flight at a time
        if self.stats.primary == PrimaryWeapon::MineLayer && self.current_mine.is_some() {
            return None;
        }
        if !self.primary.try_fire(&mut self.energy) {
            return None;
        }
        let muzzle = self.muzzle();
        let effect = match self.stats.primary {
            PrimaryWeapon::MissileLauncher => {
                WeaponEffect::Projectiles(vec![launch_missile(&muzzle, target, now, ids, field)])
            }
            PrimaryWeapon::TwinMissiles => {
                WeaponEffect::Projectiles(launch_twin_missiles(&muzzle, now, ids, field))
            }
            PrimaryWeapon::MineLayer => {
                let mine = launch_mine(&muzzle, target, now, ids, field);
                self.current_mine = Some(mine.body.id);
                WeaponEffect::MineLaunched(mine)
            }
        };
        log::debug!("{} fired {:?}", self.archetype.as_str(), self.stats.primary);
        Some(effect)
    }

    /// Secondary fire against candidate `targets`. `None` means the weapon
    /// did not fire.
    pub fn fire_secondary(
        &mut self,
        targets: &[TargetInfo],
        now: f32,
        ids: &mut IdAllocator,
        field: &Field,
    ) -> Option<WeaponEffect> {
        if self.dead {
            return None;
        }
        let muzzle = self.muzzle();
        let effect = match self.stats.secondary {
            SecondaryWeapon::LaserDefense => {
                let strikes = laser_strikes(&muzzle, targets, now, field);
                if strikes.is_empty() || !self.secondary.try_fire(&mut self.energy) {
                    return None;
                }
                self.lasers.extend(strikes.iter().map(|s| LaserSegment {
                    to: s.pos,
                    ttl: LASER_TTL,
                }));
                WeaponEffect::Laser(strikes)
            }
            SecondaryWeapon::PlasmoidRing => {
                if !self.secondary.try_fire(&mut self.energy) {
                    return None;
                }
                WeaponEffect::Projectiles(launch_plasmoid_ring(&muzzle, now, ids))
            }
            SecondaryWeapon::Shield => {
                if !self.secondary.try_fire(&mut self.energy) {
                    return None;
                }
                self.shield_timer = SHIELD_DURATION;
                WeaponEffect::Shield
            }
        };
        log::debug!("{} fired {:?}", self.archetype.as_str(), self.stats.secondary);
        Some(effect)
    }

    /// End the current mine launch. The caller parks the returned mine and
    /// deactivates any evicted one.
    pub fn release_mine(&mut self) -> Option<MineRelease> {
        debug_assert_eq!(
            self.stats.primary,
            PrimaryWeapon::MineLayer,
            "release_mine on an archetype without a mine layer"
        );
        let released = self.current_mine.take()?;
        self.deployed_mines.push_back(released);
        let evicted = if self.deployed_mines.len() > MAX_DEPLOYED_MINES {
            self.deployed_mines.pop_front()
        } else {
            None
        };
        Some(MineRelease { released, evicted })
    }

    /// Forget a projectile that no longer exists
    pub fn forget_projectile(&mut self, id: EntityId) {
        if self.current_mine == Some(id) {
            self.current_mine = None;
        }
        self.deployed_mines.retain(|&m| m != id);
    }

    /// Quantised thrust along the heading
    fn apply_thrust(&mut self, dt: f32) {
        let wait = self.stats.thrust_wait;
        self.thrust_timer += dt;
        let mut impulses = 0;
        while self.thrust_timer >= wait && impulses < 64 {
            self.thrust_timer -= wait;
            impulses += 1;

            let dir = self.forward();
            let vel = self.body.vel;
            let speed = vel.length();
            let along = vel.dot(dir);
            if speed > self.stats.max_thrust && along > 0.0 && !self.in_gravity_field {
                continue;
            }
            let scale = if along / speed.max(1.0) < 0.0 {
                BRAKING_MULTIPLIER
            } else {
                1.0
            };
            self.body.vel += dir * self.stats.thrust_increment * scale;
            if wait <= 0.0 {
                self.thrust_timer = 0.0;
                break;
            }
        }
    }

    /// Advance timers, thrust, and position
    pub fn advance(&mut self, dt: f32, field: &Field) {
        if self.dead {
            return;
        }
        self.energy_timer -= dt;
        if self.energy_timer <= 0.0 {
            self.energy = (self.energy + self.stats.energy_regen).min(self.stats.energy);
            self.energy_timer = self.stats.energy_interval;
        }
        self.primary.tick(dt);
        self.secondary.tick(dt);
        if self.shield_timer > 0.0 {
            self.shield_timer -= dt;
        }
        self.lasers.retain_mut(|l| {
            l.ttl -= dt;
            l.ttl > 0.0
        });

        if self.control.thrust {
            self.apply_thrust(dt);
        }
        self.body.integrate(dt, field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::weapon::TargetKind;

    fn field() -> Field {
        Field::new(3000.0, 3000.0)
    }

    fn ship(archetype: Archetype) -> Ship {
        Ship::new(EntityId(1), Side::One, archetype, Vec2::splat(1000.0))
    }

    #[test]
    fn test_primary_gated_by_energy_and_cooldown() {
        let mut ids = IdAllocator::default();
        let mut s = ship(Archetype::Cruiser);
        assert!(s.fire_primary(Some(EntityId(2)), 0.0, &mut ids, &field()).is_some());
        assert_eq!(s.energy, 9);
        // Cooling down
        assert!(s.fire_primary(Some(EntityId(2)), 0.0, &mut ids, &field()).is_none());
        assert_eq!(s.energy, 9);
        s.primary.cooldown = 0.0;
        assert!(s.fire_primary(Some(EntityId(2)), 0.0, &mut ids, &field()).is_some());
        s.primary.cooldown = 0.0;
        // Out of energy
        assert!(s.fire_primary(Some(EntityId(2)), 0.0, &mut ids, &field()).is_none());
    }

    #[test]
    fn test_energy_regenerates_to_cap() {
        let mut s = ship(Archetype::Terminator);
        s.energy = 0;
        for _ in 0..120 {
            s.advance(1.0 / 60.0, &field());
        }
        assert_eq!(s.energy, s.stats.energy);
    }

    #[test]
    fn test_mine_layer_one_in_flight_and_ring_buffer() {
        let mut ids = IdAllocator::default();
        let mut s = ship(Archetype::Marauder);
        s.energy = 1000;
        let mut first = None;
        for i in 0..9 {
            s.primary.cooldown = 0.0;
            let Some(WeaponEffect::MineLaunched(mine)) =
                s.fire_primary(Some(EntityId(2)), i as f32, &mut ids, &field())
            else {
                panic!("mine layer should launch");
            };
            first.get_or_insert(mine.body.id);
            s.primary.cooldown = 0.0;
            assert!(s.fire_primary(Some(EntityId(2)), i as f32, &mut ids, &field()).is_none());
            let release = s.release_mine().unwrap();
            assert_eq!(release.released, mine.body.id);
            if i < 8 {
                assert_eq!(release.evicted, None);
            } else {
                assert_eq!(release.evicted, first);
            }
        }
        assert_eq!(s.deployed_mines.len(), 8);
        assert!(s.release_mine().is_none());
    }

    #[test]
    fn test_shield_absorbs_damage() {
        let mut ids = IdAllocator::default();
        let mut s = ship(Archetype::Terminator);
        assert!(matches!(
            s.fire_secondary(&[], 0.0, &mut ids, &field()),
            Some(WeaponEffect::Shield)
        ));
        assert!(!s.take_damage(5));
        assert_eq!(s.crew, 20);
        for _ in 0..31 {
            s.advance(1.0 / 60.0, &field());
        }
        assert!(s.take_damage(5));
        assert_eq!(s.crew, 15);
    }

    #[test]
    fn test_laser_needs_a_target_in_reach() {
        let mut ids = IdAllocator::default();
        let mut s = ship(Archetype::Cruiser);
        assert!(s.fire_secondary(&[], 1.0, &mut ids, &field()).is_none());
        assert_eq!(s.energy, 18);
        let near = TargetInfo {
            id: EntityId(7),
            kind: TargetKind::Asteroid,
            pos: s.body.pos + Vec2::new(40.0, 0.0),
            radius: 10.0,
            launch_time: None,
        };
        assert!(matches!(
            s.fire_secondary(&[near], 1.0, &mut ids, &field()),
            Some(WeaponEffect::Laser(strikes)) if strikes.len() == 1
        ));
        assert_eq!(s.energy, 14);
        assert_eq!(s.lasers.len(), 1);
    }

    #[test]
    fn test_death_at_zero_crew() {
        let mut s = ship(Archetype::Cruiser);
        assert!(s.take_damage(17));
        assert!(!s.dead);
        assert!(s.take_damage(4));
        assert!(s.dead);
        assert!(!s.body.active);
        assert_eq!(s.crew, 0);
        assert!(!s.take_damage(1));
    }

    #[test]
    fn test_thrust_capped_outside_gravity() {
        let mut s = ship(Archetype::Cruiser);
        s.control.thrust = true;
        for _ in 0..600 {
            s.advance(1.0 / 60.0, &field());
        }
        let capped = s.body.vel.length();
        assert!(capped <= s.stats.max_thrust + s.stats.thrust_increment + 1e-3);

        // Inside a gravity well the cap no longer applies
        for _ in 0..60 {
            s.in_gravity_field = true;
            s.advance(1.0 / 60.0, &field());
        }
        assert!(s.body.vel.length() > capped + 10.0);
    }

    #[test]
    fn test_braking_is_stronger() {
        let mut s = ship(Archetype::Cruiser);
        s.body.vel = Vec2::new(-20.0, 0.0);
        s.control.thrust = true;
        s.advance(4.0 / 60.0 + 1e-4, &field());
        assert!((s.body.vel.x - (-20.0 + 6.0)).abs() < 1e-3);
    }

    #[test]
    fn test_turn_towards_does_not_overshoot() {
        let mut s = ship(Archetype::Marauder);
        s.turn_towards(0.1, 1.0);
        assert!((s.heading - 0.1).abs() < 1e-6);
        s.turn_towards(std::f32::consts::PI / 2.0 + 0.1, 0.5);
        assert!((s.heading - (0.1 + std::f32::consts::FRAC_PI_4)).abs() < 1e-5);
    }
}

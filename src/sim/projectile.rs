//! Projectiles: homing missiles, two-phase mines and plasmoid ring elements
//!
//! Projectiles hold non-owning handles to their target and owner. The tick
//! resolves those handles each frame and passes in the positions of whatever
//! is still alive; a handle that no longer resolves behaves as "no target" or
//! "no owner".

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, EntityId, HasBody, IdAllocator};
use super::torus::Field;
use crate::consts::*;
use crate::heading_vector;

/// Mine lifecycle.
///
/// `Launching -> Homing` on the release command. A mine leaves `Homing` only
/// by being destroyed (impact) or expired (evicted from its layer's ring of
/// deployed mines), both of which deactivate the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinePhase {
    /// Flying ballistically on its launch velocity; feels gravity
    Launching,
    /// Parked; chases the target only inside the tracking radius
    Homing,
}

/// Projectile variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProjectileKind {
    Missile {
        speed: f32,
        homing_strength: f32,
        lifetime: f32,
    },
    Mine {
        phase: MinePhase,
        speed: f32,
        homing_strength: f32,
    },
    Plasmoid {
        /// Angle of this element around the owner (radians)
        orbit_angle: f32,
        /// Shared by every element of one ring
        ring_start: f32,
        orbit_speed: f32,
        base_radius: f32,
        lifetime: f32,
    },
}

/// A projectile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub body: Body,
    pub kind: ProjectileKind,
    pub damage: i32,
    pub target: Option<EntityId>,
    pub owner: Option<EntityId>,
    /// Simulation time at spawn
    pub launch_time: f32,
}

impl HasBody for Projectile {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

/// First-order lag of `vel` toward `speed` along `to_target`.
///
/// Returns `vel` unchanged when the target is exactly on top of us.
#[inline]
pub fn steer_toward(vel: Vec2, to_target: Vec2, speed: f32, strength: f32, dt: f32) -> Vec2 {
    let Some(dir) = to_target.try_normalize() else {
        return vel;
    };
    let desired = dir * speed;
    vel + (desired - vel) * (strength * dt).min(1.0)
}

impl Projectile {
    /// Homing missile with the standard launcher parameters
    pub fn missile(
        id: EntityId,
        pos: Vec2,
        vel: Vec2,
        target: Option<EntityId>,
        owner: Option<EntityId>,
        now: f32,
    ) -> Self {
        Self {
            body: Body::new(id, pos, vel, MISSILE_RADIUS),
            kind: ProjectileKind::Missile {
                speed: MISSILE_SPEED,
                homing_strength: MISSILE_HOMING,
                lifetime: MISSILE_LIFETIME,
            },
            damage: MISSILE_DAMAGE,
            target,
            owner,
            launch_time: now,
        }
    }

    /// Mine in its launching phase
    pub fn mine(
        id: EntityId,
        pos: Vec2,
        vel: Vec2,
        target: Option<EntityId>,
        owner: Option<EntityId>,
        now: f32,
    ) -> Self {
        Self {
            body: Body::new(id, pos, vel, MINE_RADIUS),
            kind: ProjectileKind::Mine {
                phase: MinePhase::Launching,
                speed: MINE_SPEED,
                homing_strength: MINE_HOMING,
            },
            damage: MINE_DAMAGE,
            target,
            owner,
            launch_time: now,
        }
    }

    /// A full ring of plasmoids around `center`, all sharing `now` as the
    /// ring start time
    pub fn plasmoid_ring(
        ids: &mut IdAllocator,
        owner: EntityId,
        center: Vec2,
        now: f32,
        orbit_speed: f32,
        lifetime: f32,
    ) -> Vec<Projectile> {
        let step = std::f32::consts::TAU / RING_SIZE as f32;
        (0..RING_SIZE)
            .map(|i| Projectile {
                body: Body::new(ids.next_id(), center, Vec2::ZERO, PLASMOID_BASE_RADIUS),
                kind: ProjectileKind::Plasmoid {
                    orbit_angle: i as f32 * step,
                    ring_start: now,
                    orbit_speed,
                    base_radius: PLASMOID_BASE_RADIUS,
                    lifetime,
                },
                damage: PLASMOID_DAMAGE,
                target: None,
                owner: Some(owner),
                launch_time: now,
            })
            .collect()
    }

    pub fn mine_phase(&self) -> Option<MinePhase> {
        match self.kind {
            ProjectileKind::Mine { phase, .. } => Some(phase),
            _ => None,
        }
    }

    /// Whether gravity acts on this projectile this tick
    pub fn feels_gravity(&self) -> bool {
        self.mine_phase() == Some(MinePhase::Launching)
    }

    /// Tracking radius for mines
    pub fn tracking_radius(&self) -> f32 {
        MINE_TRACKING_FACTOR * self.body.radius
    }

    /// Switch a launching mine to homing, parking it where it is.
    ///
    /// Returns false if this is not a launching mine.
    pub fn release(&mut self) -> bool {
        match &mut self.kind {
            ProjectileKind::Mine { phase, .. } if *phase == MinePhase::Launching => {
                *phase = MinePhase::Homing;
                self.body.vel = Vec2::ZERO;
                true
            }
            _ => false,
        }
    }

    /// Whether this projectile threatens the ship `ship`
    pub fn is_hostile_to(&self, ship: EntityId) -> bool {
        match self.owner {
            Some(owner) => owner != ship,
            None => self.target == Some(ship),
        }
    }

    /// Advance one tick.
    ///
    /// `target_pos` is the position of the resolved, still-active target;
    /// `owner_pos` likewise for the owner. `now` is the simulation time after
    /// this tick's advance.
    pub fn update(
        &mut self,
        dt: f32,
        now: f32,
        target_pos: Option<Vec2>,
        owner_pos: Option<Vec2>,
        field: &Field,
    ) {
        if !self.body.active {
            return;
        }
        let tracking = self.tracking_radius();
        match &mut self.kind {
            ProjectileKind::Missile {
                speed,
                homing_strength,
                lifetime,
            } => {
                *lifetime -= dt;
                if *lifetime <= 0.0 {
                    self.body.active = false;
                    return;
                }
                if let Some(tp) = target_pos {
                    let to_target = field.delta(self.body.pos, tp);
                    self.body.vel =
                        steer_toward(self.body.vel, to_target, *speed, *homing_strength, dt);
                }
                self.body.integrate(dt, field);
            }
            ProjectileKind::Mine {
                phase,
                speed,
                homing_strength,
            } => {
                if *phase == MinePhase::Homing {
                    let chase = target_pos
                        .map(|tp| field.delta(self.body.pos, tp))
                        .filter(|d| {
                            let dist = d.length();
                            dist > 0.0 && dist <= tracking
                        });
                    self.body.vel = match chase {
                        Some(to_target) => {
                            steer_toward(self.body.vel, to_target, *speed, *homing_strength, dt)
                        }
                        None => Vec2::ZERO,
                    };
                }
                self.body.integrate(dt, field);
            }
            ProjectileKind::Plasmoid {
                orbit_angle,
                ring_start,
                orbit_speed,
                base_radius,
                lifetime,
            } => {
                *lifetime -= dt;
                if *lifetime <= 0.0 {
                    self.body.active = false;
                    return;
                }
                let dir = heading_vector(*orbit_angle);
                let orbit_distance = RING_SCALING * (now - *ring_start) * *orbit_speed;
                match owner_pos {
                    Some(center) => {
                        self.body.pos = field.wrap_position(center + dir * orbit_distance);
                    }
                    None => {
                        // Owner gone: keep drifting outward
                        self.body.pos = field.wrap_position(self.body.pos + dir * *orbit_speed * dt);
                    }
                }
                self.body.radius = *base_radius + orbit_distance / PLASMOID_GROWTH_DIVISOR;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Field {
        Field::new(3000.0, 3000.0)
    }

    #[test]
    fn test_missile_expires_after_lifetime() {
        let mut m = Projectile::missile(EntityId(1), Vec2::splat(100.0), Vec2::X * 50.0, None, None, 0.0);
        let dt = 0.1;
        let mut t = 0.0;
        for _ in 0..29 {
            t += dt;
            m.update(dt, t, None, None, &field());
        }
        assert!(m.body.active);
        for _ in 0..2 {
            t += dt;
            m.update(dt, t, None, None, &field());
        }
        assert!(!m.body.active);
    }

    #[test]
    fn test_missile_without_target_flies_straight() {
        let mut m = Projectile::missile(EntityId(1), Vec2::splat(100.0), Vec2::new(50.0, 0.0), None, None, 0.0);
        m.update(1.0, 1.0, None, None, &field());
        assert_eq!(m.body.vel, Vec2::new(50.0, 0.0));
        assert!((m.body.pos - Vec2::new(150.0, 100.0)).length() < 1e-4);
    }

    #[test]
    fn test_missile_blends_toward_target() {
        let mut m = Projectile::missile(EntityId(1), Vec2::splat(100.0), Vec2::new(50.0, 0.0), Some(EntityId(9)), None, 0.0);
        let target = Vec2::new(100.0, 400.0);
        m.update(0.1, 0.1, Some(target), None, &field());
        // 20% of the way from (50,0) to (0,300)
        assert!((m.body.vel - Vec2::new(40.0, 60.0)).length() < 1e-3);
    }

    #[test]
    fn test_mine_launch_phase_ignores_target() {
        let launch_vel = Vec2::new(0.0, -150.0);
        let mut mine = Projectile::mine(EntityId(1), Vec2::splat(1000.0), launch_vel, Some(EntityId(9)), None, 0.0);
        let target = Vec2::new(2000.0, 1000.0); // 1000 units away
        for i in 0..30 {
            mine.update(1.0 / 60.0, i as f32 / 60.0, Some(target), None, &field());
            assert_eq!(mine.body.vel, launch_vel);
        }
        assert_eq!(mine.mine_phase(), Some(MinePhase::Launching));
        assert!(mine.feels_gravity());
    }

    #[test]
    fn test_released_mine_rests_out_of_range_then_homes() {
        let mut mine = Projectile::mine(EntityId(1), Vec2::splat(1000.0), Vec2::new(0.0, -150.0), Some(EntityId(9)), None, 0.0);
        assert!(mine.release());
        assert!(!mine.release());
        assert!(!mine.feels_gravity());
        let dt = 1.0 / 60.0;

        // Target far away: stays parked
        let far = Vec2::new(2000.0, 1000.0);
        mine.update(dt, dt, Some(far), None, &field());
        assert_eq!(mine.body.vel, Vec2::ZERO);

        // Drifting sideways with the target inside 24 x radius: the angle
        // between velocity and line of sight shrinks every step
        mine.body.vel = Vec2::new(0.0, 50.0);
        let near = mine.body.pos + Vec2::new(100.0, 0.0);
        assert!(field().distance(mine.body.pos, near) <= mine.tracking_radius());
        let error_to = |m: &Projectile| {
            let to_target = field().delta(m.body.pos, near);
            m.body.vel.perp_dot(to_target).atan2(m.body.vel.dot(to_target)).abs()
        };
        let first = error_to(&mine);
        let mut last = first;
        for _ in 0..30 {
            mine.update(dt, dt, Some(near), None, &field());
            let error = error_to(&mine);
            assert!(error < last, "error grew from {last} to {error}");
            last = error;
        }
        assert!(last < first * 0.5);
    }

    #[test]
    fn test_mine_stops_when_target_lost() {
        let mut mine = Projectile::mine(EntityId(1), Vec2::splat(1000.0), Vec2::ZERO, Some(EntityId(9)), None, 0.0);
        mine.release();
        mine.body.vel = Vec2::new(30.0, 0.0);
        mine.update(0.1, 0.1, None, None, &field());
        assert_eq!(mine.body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_plasmoid_ring_geometry() {
        let mut ids = IdAllocator::default();
        let owner_pos = Vec2::splat(1500.0);
        let t0 = 10.0;
        let mut ring = Projectile::plasmoid_ring(&mut ids, EntityId(99), owner_pos, t0, 50.0, 2.0);
        assert_eq!(ring.len(), 16);

        let dt = 0.1;
        let mut t = t0;
        for _ in 0..10 {
            t += dt;
            for p in ring.iter_mut() {
                p.update(dt, t, None, Some(owner_pos), &field());
            }
        }
        for (i, p) in ring.iter().enumerate() {
            let offset = field().delta(owner_pos, p.body.pos);
            assert!((offset.length() - 75.0).abs() < 1e-2, "distance {}", offset.length());
            let expected = crate::normalize_angle(i as f32 * 22.5f32.to_radians());
            let actual = crate::bearing(offset);
            assert!(crate::angle_diff(expected, actual).abs() < 1e-3);
            assert!((p.body.radius - (4.0 + 75.0 / 50.0)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_plasmoid_expires() {
        let mut ids = IdAllocator::default();
        let mut ring = Projectile::plasmoid_ring(&mut ids, EntityId(99), Vec2::splat(10.0), 0.0, 50.0, 1.0);
        let p = &mut ring[0];
        p.update(0.6, 0.6, None, Some(Vec2::splat(10.0)), &field());
        assert!(p.body.active);
        p.update(0.6, 1.2, None, Some(Vec2::splat(10.0)), &field());
        assert!(!p.body.active);
    }

    #[test]
    fn test_hostility() {
        let owned = Projectile::missile(EntityId(1), Vec2::ZERO, Vec2::ZERO, None, Some(EntityId(5)), 0.0);
        assert!(owned.is_hostile_to(EntityId(6)));
        assert!(!owned.is_hostile_to(EntityId(5)));
        let targeted = Projectile::missile(EntityId(2), Vec2::ZERO, Vec2::ZERO, Some(EntityId(6)), None, 0.0);
        assert!(targeted.is_hostile_to(EntityId(6)));
        assert!(!targeted.is_hostile_to(EntityId(5)));
    }
}

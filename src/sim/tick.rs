//! Fixed-order simulation tick
//!
//! One call advances the world by `dt`. The stage order matters: gravity must
//! flag ships before thrust reads the flag, projectiles must move before they
//! are tested for hits, and nothing is removed until every stage has seen it.

use glam::Vec2;

use super::ai::{AiView, Obstacle, Threat};
use super::body::{EntityId, pair_mut};
use super::collision::{PlanetContact, resolve_elastic, resolve_planet_contact};
use super::gravity::apply_gravity;
use super::projectile::Projectile;
use super::ship::{Ship, ShipControl, Side};
use super::state::{GameEvent, World};
use super::weapon::{
    LaserStrike, PrimaryWeapon, SecondaryWeapon, TargetInfo, TargetKind, WeaponEffect,
};

/// External input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Intents for human-flown ships, indexed by [`Side::index`]. Ships with
    /// an AI controller ignore these.
    pub controls: [Option<ShipControl>; 2],
}

impl TickInput {
    pub fn for_side(side: Side, control: ShipControl) -> Self {
        let mut input = Self::default();
        input.controls[side.index()] = Some(control);
        input
    }
}

/// Advance the world by one step
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    if !(dt > 0.0) {
        return;
    }
    world.time += dt;
    let now = world.time;

    for ship in &mut world.ships {
        ship.in_gravity_field = false;
        if ship.ai.is_none() {
            if let Some(control) = input.controls[ship.side.index()] {
                ship.control = control;
            }
        }
    }

    run_ai(world, dt);
    apply_intents(world, dt, now);
    apply_gravity_stage(world, dt);
    integrate(world, dt, now);

    resolve_projectile_hits(world);
    resolve_projectile_environment(world);
    resolve_projectile_clashes(world);

    resolve_body_collisions(world, now);
    respawn_planet_asteroids(world);
    remove_inactive(world);

    let one = world.ship_on(Side::One).map(|s| s.body.pos);
    let two = world.ship_on(Side::Two).map(|s| s.body.pos);
    let field = world.field;
    world.camera.follow(one, two, &field);
}

/// Let every AI pilot read the world and write its ship's intents
fn run_ai(world: &mut World, dt: f32) {
    let obstacles: Vec<Obstacle> = world
        .asteroids
        .iter()
        .filter(|a| a.body.active)
        .map(|a| Obstacle {
            pos: a.body.pos,
            radius: a.body.radius,
        })
        .chain(std::iter::once(Obstacle {
            pos: world.planet.pos,
            radius: world.planet.radius,
        }))
        .collect();

    for i in 0..world.ships.len() {
        if world.ships[i].dead {
            continue;
        }
        let Some(mut ai) = world.ships[i].ai.take() else {
            continue;
        };
        let me = world.ships[i].body.id;
        let enemy_side = world.ships[i].side.opponent();
        let threats: Vec<Threat> = world
            .projectiles
            .iter()
            .filter(|p| p.body.active && p.is_hostile_to(me))
            .map(|p| Threat {
                pos: p.body.pos,
                vel: p.body.vel,
            })
            .collect();

        let decision = {
            let view = AiView {
                ship: &world.ships[i],
                enemy: world
                    .ships
                    .iter()
                    .find(|s| s.side == enemy_side && s.body.active),
                obstacles: &obstacles,
                threats: &threats,
                field: &world.field,
            };
            ai.update(dt, &view, &mut world.rng)
        };

        let ship = &mut world.ships[i];
        if let Some(d) = decision {
            ship.control.goal_heading = Some(d.goal_heading);
            ship.control.turn = 0.0;
            ship.control.thrust = d.thrust;
            ship.control.fire_primary |= d.fire_primary;
            ship.control.fire_secondary |= d.fire_secondary;
            ship.control.release_mine |= d.release_mine;
        }
        ship.ai = Some(ai);
    }
}

/// Turning, firing and mine release. Fire and release requests are consumed.
fn apply_intents(world: &mut World, dt: f32, now: f32) {
    for i in 0..world.ships.len() {
        if world.ships[i].dead {
            continue;
        }
        let control = world.ships[i].control;
        let owner = world.ships[i].body.id;
        let enemy_side = world.ships[i].side.opponent();
        world.ships[i].apply_turn(dt);

        if control.fire_primary {
            let target = world.ship_on(enemy_side).map(|s| s.body.id);
            let ship = &mut world.ships[i];
            if let Some(effect) = ship.fire_primary(target, now, &mut world.ids, &world.field) {
                apply_effect(world, owner, effect);
            }
        }

        if control.fire_secondary {
            let targets = if world.ships[i].stats.secondary == SecondaryWeapon::LaserDefense {
                laser_targets(world, owner)
            } else {
                Vec::new()
            };
            let ship = &mut world.ships[i];
            if let Some(effect) = ship.fire_secondary(&targets, now, &mut world.ids, &world.field)
            {
                apply_effect(world, owner, effect);
            }
        }

        if control.release_mine && world.ships[i].stats.primary == PrimaryWeapon::MineLayer {
            if let Some(release) = world.ships[i].release_mine() {
                for p in &mut world.projectiles {
                    if p.body.id == release.released {
                        p.release();
                    } else if Some(p.body.id) == release.evicted {
                        p.body.active = false;
                    }
                }
            }
        }

        let c = &mut world.ships[i].control;
        c.fire_primary = false;
        c.fire_secondary = false;
        c.release_mine = false;
    }
}

/// Everything a laser on `owner` could strike, minus projectiles launched by
/// its side (including those of ships it replaced)
fn laser_targets(world: &World, owner: EntityId) -> Vec<TargetInfo> {
    let side = world.side_of(owner);
    let friendly = |p: &Projectile| match p.owner {
        Some(o) => o == owner || (side.is_some() && world.side_of(o) == side),
        None => false,
    };
    let ships = world
        .ships
        .iter()
        .filter(|s| s.body.active && s.body.id != owner)
        .map(|s| TargetInfo {
            id: s.body.id,
            kind: TargetKind::Ship,
            pos: s.body.pos,
            radius: s.body.radius,
            launch_time: None,
        });
    let asteroids = world
        .asteroids
        .iter()
        .filter(|a| a.body.active)
        .map(|a| TargetInfo {
            id: a.body.id,
            kind: TargetKind::Asteroid,
            pos: a.body.pos,
            radius: a.body.radius,
            launch_time: None,
        });
    let projectiles = world
        .projectiles
        .iter()
        .filter(|p| p.body.active && !friendly(p))
        .map(|p| TargetInfo {
            id: p.body.id,
            kind: TargetKind::Projectile,
            pos: p.body.pos,
            radius: p.body.radius,
            launch_time: Some(p.launch_time),
        });
    ships.chain(asteroids).chain(projectiles).collect()
}

fn apply_effect(world: &mut World, owner: EntityId, effect: WeaponEffect) {
    match effect {
        WeaponEffect::Projectiles(list) => {
            world.events.push(GameEvent::ProjectileFired {
                owner,
                count: list.len(),
            });
            world.projectiles.extend(list);
        }
        WeaponEffect::MineLaunched(mine) => {
            world
                .events
                .push(GameEvent::ProjectileFired { owner, count: 1 });
            world.projectiles.push(mine);
        }
        WeaponEffect::Laser(strikes) => {
            for strike in &strikes {
                apply_laser_strike(world, strike);
            }
        }
        WeaponEffect::Shield => {}
    }
}

fn apply_laser_strike(world: &mut World, strike: &LaserStrike) {
    match strike.kind {
        TargetKind::Ship => {
            if let Some(ship) = world
                .ships
                .iter_mut()
                .find(|s| s.body.id == strike.target && s.body.active)
            {
                if ship.take_damage(1) {
                    world.events.push(damaged(ship, 1));
                }
            }
        }
        TargetKind::Asteroid => {
            if let Some(asteroid) = world
                .asteroids
                .iter_mut()
                .find(|a| a.body.id == strike.target && a.body.active)
            {
                asteroid.take_damage(1);
                world.events.push(GameEvent::AsteroidDestroyed {
                    id: asteroid.body.id,
                });
            }
        }
        TargetKind::Projectile => {
            if strike.destroys_projectile {
                if let Some(p) = world
                    .projectiles
                    .iter_mut()
                    .find(|p| p.body.id == strike.target)
                {
                    p.body.active = false;
                }
            }
        }
    }
}

fn damaged(ship: &Ship, amount: i32) -> GameEvent {
    GameEvent::ShipDamaged {
        id: ship.body.id,
        side: ship.side,
        amount,
        crew: ship.crew,
    }
}

fn apply_gravity_stage(world: &mut World, dt: f32) {
    let (planet, model, field) = (&world.planet, &world.gravity, &world.field);
    for ship in world.ships.iter_mut().filter(|s| !s.dead) {
        ship.in_gravity_field = apply_gravity(&mut ship.body, planet, model, field, dt);
    }
    for p in world
        .projectiles
        .iter_mut()
        .filter(|p| p.body.active && p.feels_gravity())
    {
        apply_gravity(&mut p.body, planet, model, field, dt);
    }
}

fn integrate(world: &mut World, dt: f32, now: f32) {
    let field = world.field;
    for ship in &mut world.ships {
        ship.advance(dt, &field);
    }
    for asteroid in world.asteroids.iter_mut().filter(|a| a.body.active) {
        asteroid.update(dt, &field);
    }
    let ships = &world.ships;
    for p in &mut world.projectiles {
        let target_pos = p.target.and_then(|id| live_ship_pos(ships, id));
        let owner_pos = p.owner.and_then(|id| live_ship_pos(ships, id));
        p.update(dt, now, target_pos, owner_pos, &field);
    }
}

fn live_ship_pos(ships: &[Ship], id: EntityId) -> Option<Vec2> {
    ships
        .iter()
        .find(|s| s.body.id == id && s.body.active)
        .map(|s| s.body.pos)
}

/// Ship a projectile can damage: its live target, else the live ship
/// opposing its live owner
fn victim_index(ships: &[Ship], p: &Projectile) -> Option<usize> {
    let live = |id: EntityId| ships.iter().position(|s| s.body.id == id && s.body.active);
    if let Some(i) = p.target.and_then(live) {
        return Some(i);
    }
    let owner_side = ships[live(p.owner?)?].side;
    ships
        .iter()
        .position(|s| s.side == owner_side.opponent() && s.body.active)
}

fn resolve_projectile_hits(world: &mut World) {
    let field = world.field;
    for p in world.projectiles.iter_mut().filter(|p| p.body.active) {
        let Some(victim) = victim_index(&world.ships, p) else {
            continue;
        };
        let ship = &mut world.ships[victim];
        if !p.body.overlaps(&ship.body, &field) {
            continue;
        }
        p.body.active = false;
        if ship.take_damage(p.damage) {
            world.events.push(damaged(ship, p.damage));
        }
    }
}

/// Asteroid and planet hits: the projectile is spent either way
fn resolve_projectile_environment(world: &mut World) {
    let field = world.field;
    for p in world.projectiles.iter_mut().filter(|p| p.body.active) {
        if let Some(asteroid) = world
            .asteroids
            .iter_mut()
            .find(|a| a.body.active && p.body.overlaps(&a.body, &field))
        {
            asteroid.take_damage(p.damage);
            p.body.active = false;
            world.events.push(GameEvent::AsteroidDestroyed {
                id: asteroid.body.id,
            });
        }
        if p.body.overlaps(&world.planet, &field) {
            p.body.active = false;
        }
    }
}

/// Projectiles from different owners annihilate on contact
fn resolve_projectile_clashes(world: &mut World) {
    let field = world.field;
    let n = world.projectiles.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = pair_mut(&mut world.projectiles, i, j);
            if !a.body.active || !b.body.active {
                continue;
            }
            let rivals = matches!((a.owner, b.owner), (Some(x), Some(y)) if x != y);
            if rivals && field.distance(a.body.pos, b.body.pos) <= a.body.radius + b.body.radius {
                a.body.active = false;
                b.body.active = false;
            }
        }
    }
}

fn resolve_body_collisions(world: &mut World, now: f32) {
    let field = world.field;
    for ship in world.ships.iter_mut().filter(|s| s.body.active) {
        if resolve_planet_contact(ship, &world.planet, &field, now) == PlanetContact::Damaged {
            world.events.push(damaged(ship, 1));
        }
        if !ship.body.active {
            continue;
        }
        for asteroid in world.asteroids.iter_mut().filter(|a| a.body.active) {
            resolve_elastic(&mut ship.body, &mut asteroid.body, &field);
        }
    }

    for i in 0..world.ships.len() {
        for j in (i + 1)..world.ships.len() {
            let (a, b) = pair_mut(&mut world.ships, i, j);
            if a.body.active && b.body.active {
                resolve_elastic(&mut a.body, &mut b.body, &field);
            }
        }
    }

    for i in 0..world.asteroids.len() {
        for j in (i + 1)..world.asteroids.len() {
            let (a, b) = pair_mut(&mut world.asteroids, i, j);
            if a.body.active && b.body.active {
                resolve_elastic(&mut a.body, &mut b.body, &field);
            }
        }
    }
}

/// Asteroids touching the planet are replaced off-screen
fn respawn_planet_asteroids(world: &mut World) {
    for i in 0..world.asteroids.len() {
        let asteroid = &world.asteroids[i];
        if !asteroid.body.active || !asteroid.body.overlaps(&world.planet, &world.field) {
            continue;
        }
        let old = asteroid.body.id;
        let pos = world.offscreen_point();
        let fresh = world.random_asteroid(pos);
        log::debug!(
            "Asteroid {} hit the planet, respawned as {} at ({:.0}, {:.0})",
            old.0,
            fresh.body.id.0,
            pos.x,
            pos.y
        );
        world.events.push(GameEvent::AsteroidRespawned {
            old,
            id: fresh.body.id,
            pos,
        });
        world.asteroids[i] = fresh;
    }
}

fn remove_inactive(world: &mut World) {
    let gone: Vec<EntityId> = world
        .projectiles
        .iter()
        .filter(|p| !p.body.active)
        .map(|p| p.body.id)
        .collect();
    if !gone.is_empty() {
        world.projectiles.retain(|p| p.body.active);
        for ship in &mut world.ships {
            for &id in &gone {
                ship.forget_projectile(id);
            }
        }
    }

    for ship in world.ships.iter().filter(|s| s.dead) {
        world.destroyed[ship.side.index()] = true;
        world.events.push(GameEvent::ShipDestroyed {
            id: ship.body.id,
            side: ship.side,
            archetype: ship.archetype,
        });
    }
    world.ships.retain(|s| !s.dead);
    world.asteroids.retain(|a| a.body.active);
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, input or platform dependencies

pub mod ai;
pub mod body;
pub mod collision;
pub mod fleet;
pub mod gravity;
pub mod projectile;
pub mod ship;
pub mod state;
pub mod tick;
pub mod torus;
pub mod weapon;

pub use ai::{AiController, Behavior, Difficulty};
pub use body::{Body, EntityId, HasBody, IdAllocator};
pub use collision::{Contact, PlanetContact, reflect_velocity, resolve_elastic};
pub use fleet::{Fleet, Match, Outcome};
pub use gravity::apply_gravity;
pub use projectile::{MinePhase, Projectile, ProjectileKind};
pub use ship::{Archetype, Ship, ShipControl, Side};
pub use state::{Asteroid, Camera, GameEvent, Snapshot, World};
pub use tick::{TickInput, tick};
pub use torus::{Field, wrap_delta};
pub use weapon::{PrimaryWeapon, SecondaryWeapon, WeaponEffect};

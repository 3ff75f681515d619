//! Rule-based pilot for non-human ships
//!
//! The controller only decides once per reaction interval; in between, the
//! ship keeps turning toward its last goal heading at its own turn rate. A decision runs four checks in a
//! fixed order, each able to override the previous one:
//!
//! 1. base movement for the archetype's behaviour (head for the enemy)
//! 2. obstacle avoidance (turn 90° off any asteroid or the planet nearby)
//! 3. dodge (roll against the tier's dodge chance for incoming projectiles)
//! 4. fire control for the behaviour
//!
//! The only state carried between decisions is the reaction timer and the
//! behaviour's secondary-weapon cooldown.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ship::{Archetype, Ship};
use super::torus::Field;
use super::weapon::PrimaryWeapon;
use crate::consts::*;
use crate::{angle_diff, bearing, normalize_angle};

/// Difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" | "weak" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" | "awesome" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Seconds between decisions
    pub fn reaction_time(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Medium => 0.3,
            Difficulty::Hard => 0.1,
        }
    }

    /// Chance to dodge each incoming projectile
    pub fn dodge_chance(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.3,
            Difficulty::Medium => 0.6,
            Difficulty::Hard => 1.0,
        }
    }

    /// Aggressive behaviour: time between secondary bursts
    pub fn secondary_cooldown(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.5,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 0.8,
        }
    }
}

/// Archetype-specific movement and fire rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Close on the enemy; fire primary when lined up and in range
    Pursuit,
    /// Close on the enemy; keep the primary busy, burst the secondary up close
    Aggressive,
}

impl Behavior {
    pub fn for_archetype(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Cruiser | Archetype::Terminator => Behavior::Pursuit,
            Archetype::Marauder => Behavior::Aggressive,
        }
    }
}

/// Something to steer around
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub pos: Vec2,
    pub radius: f32,
}

/// A hostile projectile as the pilot sees it
#[derive(Debug, Clone, Copy)]
pub struct Threat {
    pub pos: Vec2,
    pub vel: Vec2,
}

/// Read-only world view for one decision
pub struct AiView<'a> {
    pub ship: &'a Ship,
    pub enemy: Option<&'a Ship>,
    pub obstacles: &'a [Obstacle],
    pub threats: &'a [Threat],
    pub field: &'a Field,
}

/// Intents produced by one decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Heading to steer toward; the tick turns the ship at its turn rate
    pub goal_heading: f32,
    pub thrust: bool,
    pub fire_primary: bool,
    pub fire_secondary: bool,
    pub release_mine: bool,
}

/// Decision-maker bound to one ship
#[derive(Debug, Clone)]
pub struct AiController {
    pub difficulty: Difficulty,
    pub behavior: Behavior,
    pub reaction_time: f32,
    pub dodge_chance: f32,
    reaction_timer: f32,
    secondary_cooldown: f32,
}

/// Tolerance so that e.g. six 0.05 s steps reach a 0.3 s interval
const TIMER_EPSILON: f32 = 1e-5;

impl AiController {
    pub fn new(difficulty: Difficulty, behavior: Behavior) -> Self {
        Self {
            difficulty,
            behavior,
            reaction_time: difficulty.reaction_time(),
            dodge_chance: difficulty.dodge_chance(),
            reaction_timer: 0.0,
            secondary_cooldown: 0.0,
        }
    }

    pub fn for_archetype(archetype: Archetype, difficulty: Difficulty) -> Self {
        Self::new(difficulty, Behavior::for_archetype(archetype))
    }

    /// Accumulate `dt`; decide once the reaction interval has elapsed.
    ///
    /// Returns `None` on ticks where the pilot is still "reacting".
    pub fn update(&mut self, dt: f32, view: &AiView<'_>, rng: &mut Pcg32) -> Option<Decision> {
        self.reaction_timer += dt;
        if self.reaction_timer + TIMER_EPSILON < self.reaction_time {
            return None;
        }
        self.reaction_timer = 0.0;
        let ship = view.ship;

        let (mut goal, mut thrust) = self.determine_movement(view);

        if let Some(avoid) = self.avoid_obstacles(view) {
            goal = avoid;
            thrust = true;
        }

        if self.check_dodge_needed(ship.body.pos, view.threats, view.field, rng) {
            let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            goal = normalize_angle(ship.heading + side * std::f32::consts::FRAC_PI_2);
            thrust = true;
        }

        let mut decision = Decision {
            goal_heading: goal,
            thrust,
            fire_primary: false,
            fire_secondary: false,
            release_mine: false,
        };
        self.fire_weapons(view, &mut decision);
        log::debug!(
            "AI {:?} decided goal heading {:.2} thrust {} fire {}/{}",
            ship.side,
            decision.goal_heading,
            decision.thrust,
            decision.fire_primary,
            decision.fire_secondary
        );
        Some(decision)
    }

    /// Goal heading and thrust before overrides
    fn determine_movement(&self, view: &AiView<'_>) -> (f32, bool) {
        match (self.behavior, view.enemy) {
            (Behavior::Pursuit | Behavior::Aggressive, Some(enemy)) => {
                let to_enemy = view.field.delta(view.ship.body.pos, enemy.body.pos);
                (bearing(to_enemy), true)
            }
            // Nobody to chase: hold course, coast
            (_, None) => (view.ship.heading, false),
        }
    }

    /// Heading 90° off the first obstacle within its radius + ours + margin
    pub fn avoid_obstacles(&self, view: &AiView<'_>) -> Option<f32> {
        let ship = &view.ship.body;
        view.obstacles.iter().find_map(|obs| {
            let d = view.field.delta(ship.pos, obs.pos);
            let safe = obs.radius + ship.radius + AI_OBSTACLE_MARGIN;
            (d.length_squared() < safe * safe)
                .then(|| normalize_angle(bearing(d) + std::f32::consts::FRAC_PI_2))
        })
    }

    /// Whether any threat within the dodge radius is flying at us, with one
    /// roll against the dodge chance per such threat
    pub fn check_dodge_needed(
        &self,
        ship_pos: Vec2,
        threats: &[Threat],
        field: &Field,
        rng: &mut Pcg32,
    ) -> bool {
        let cone = AI_DODGE_CONE_DEG.to_radians();
        for threat in threats {
            let to_ship = field.delta(threat.pos, ship_pos);
            if to_ship.length_squared() >= AI_DODGE_RADIUS * AI_DODGE_RADIUS {
                continue;
            }
            if threat.vel.length_squared() == 0.0 {
                continue;
            }
            let off_course = angle_diff(bearing(threat.vel), bearing(to_ship)).abs();
            if off_course < cone && rng.random::<f32>() < self.dodge_chance {
                return true;
            }
        }
        false
    }

    fn fire_weapons(&mut self, view: &AiView<'_>, decision: &mut Decision) {
        let Some(enemy) = view.enemy else {
            return;
        };
        let ship = view.ship;
        let to_enemy = view.field.delta(ship.body.pos, enemy.body.pos);
        let distance = to_enemy.length();

        match self.behavior {
            Behavior::Pursuit => {
                let off_bore = angle_diff(ship.heading, bearing(to_enemy)).abs();
                if off_bore < AI_FIRE_CONE_DEG.to_radians() && distance <= AI_MISSILE_RANGE {
                    decision.fire_primary = true;
                }
            }
            Behavior::Aggressive => {
                // A mine in flight is parked on the next decision, freeing the layer
                if ship.stats.primary == PrimaryWeapon::MineLayer && ship.current_mine.is_some() {
                    decision.release_mine = true;
                } else {
                    decision.fire_primary = true;
                }
                if distance < AI_SECONDARY_RANGE && self.secondary_cooldown <= 0.0 {
                    decision.fire_secondary = true;
                    self.secondary_cooldown = self.difficulty.secondary_cooldown();
                }
                if self.secondary_cooldown > 0.0 {
                    self.secondary_cooldown -= self.reaction_time;
                }
            }
        }
    }
}

//! Rosters, ship replacement and round outcome

use serde::Serialize;

use super::ship::{Archetype, Side};
use super::state::World;
use crate::config::{Pilot, SimConfig};
use crate::error::ConfigError;

/// One side's ordered roster with per-slot availability
#[derive(Debug, Clone)]
pub struct Fleet {
    pub side: Side,
    pub pilot: Pilot,
    roster: Vec<Archetype>,
    available: Vec<bool>,
}

impl Fleet {
    pub fn new(side: Side, pilot: Pilot, roster: Vec<Archetype>) -> Self {
        let available = vec![true; roster.len()];
        Self {
            side,
            pilot,
            roster,
            available,
        }
    }

    pub fn roster(&self) -> &[Archetype] {
        &self.roster
    }

    /// Slots not yet flown
    pub fn remaining(&self) -> usize {
        self.available.iter().filter(|&&a| a).count()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Claim the first available slot
    pub fn take_next(&mut self) -> Option<Archetype> {
        let slot = self.available.iter().position(|&a| a)?;
        self.available[slot] = false;
        Some(self.roster[slot])
    }

    /// Claim the first available slot holding `archetype`
    pub fn take(&mut self, archetype: Archetype) -> Option<Archetype> {
        let slot = self
            .roster
            .iter()
            .zip(&self.available)
            .position(|(&a, &free)| free && a == archetype)?;
        self.available[slot] = false;
        Some(archetype)
    }
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Winner(Side),
    /// Both sides lost their last ship on the same tick
    Draw,
}

/// A round: the world plus both fleets
#[derive(Debug, Clone)]
pub struct Match {
    pub world: World,
    pub fleets: [Fleet; 2],
    outcome: Option<Outcome>,
}

impl Match {
    /// Build the world and launch each side's first ship
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let fleets = [Side::One, Side::Two].map(|side| {
            let team = &config.teams[side.index()];
            Fleet::new(side, team.pilot, team.roster.clone())
        });
        let world = World::new(config)?;
        let mut round = Self {
            world,
            fleets,
            outcome: None,
        };
        for side in Side::BOTH {
            round.launch_next(side);
        }
        Ok(round)
    }

    /// Round result, once decided
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Tick the world, then replace destroyed ships or settle the round.
    /// Once decided, further calls do nothing.
    pub fn step(&mut self, dt: f32) -> Option<Outcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }
        self.world.step(dt);

        let destroyed = self.world.take_destroyed();
        let mut lost = [false; 2];
        for side in Side::BOTH {
            if destroyed[side.index()] && !self.launch_next(side) {
                lost[side.index()] = true;
            }
        }
        self.outcome = match lost {
            [true, true] => Some(Outcome::Draw),
            [true, false] => Some(Outcome::Winner(Side::Two)),
            [false, true] => Some(Outcome::Winner(Side::One)),
            [false, false] => None,
        };
        if let Some(outcome) = self.outcome {
            log::info!(
                "Round over after {:.1}s: {:?}",
                self.world.time,
                outcome
            );
        }
        self.outcome
    }

    /// Spawn the side's next ship. Returns false when its roster is empty.
    fn launch_next(&mut self, side: Side) -> bool {
        let fleet = &mut self.fleets[side.index()];
        let Some(archetype) = fleet.take_next() else {
            log::info!("{:?} has no ships left", side);
            return false;
        };
        let pilot = fleet.pilot;
        self.world.spawn_ship(side, archetype, pilot);
        true
    }
}

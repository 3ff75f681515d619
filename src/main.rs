//! Gravwell headless runner
//!
//! `gravwell [config.json] [seconds]` plays an AI-vs-AI round at a fixed
//! 60 Hz step and prints the final state as JSON. Set `RUST_LOG=debug` for
//! per-event logging.

#[cfg(not(target_arch = "wasm32"))]
use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
use gravwell::config::Pilot;
#[cfg(not(target_arch = "wasm32"))]
use gravwell::consts::SIM_DT;
#[cfg(not(target_arch = "wasm32"))]
use gravwell::sim::{Difficulty, GameEvent, Match};
#[cfg(not(target_arch = "wasm32"))]
use gravwell::SimConfig;

/// Round length when none is given
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_SECONDS: f32 = 120.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on wasm; nothing to run headless
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => SimConfig::load(&path)?,
        None => SimConfig::default(),
    };
    let seconds: f32 = match args.next() {
        Some(s) => s.parse()?,
        None => DEFAULT_SECONDS,
    };

    // Nobody is at the keyboard
    for team in &mut config.teams {
        if team.pilot == Pilot::Human {
            team.pilot = Pilot::Ai(Difficulty::default());
        }
    }
    log::info!("Gravwell (headless) starting: seed {:#x}, {seconds}s", config.seed);

    let mut round = Match::new(config)?;
    let steps = (seconds / SIM_DT).round() as u64;
    for _ in 0..steps {
        let outcome = round.step(SIM_DT);
        for event in round.world.drain_events() {
            log_event(&event);
        }
        if outcome.is_some() {
            break;
        }
    }

    match round.outcome() {
        Some(outcome) => log::info!("Result after {:.1}s: {:?}", round.world.time, outcome),
        None => log::info!("Time up after {:.1}s, no winner", round.world.time),
    }
    println!("{}", serde_json::to_string_pretty(&round.world.snapshot())?);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn log_event(event: &GameEvent) {
    match event {
        GameEvent::ShipDestroyed {
            id,
            side,
            archetype,
        } => log::info!("{side:?} lost {} (id {})", archetype.as_str(), id.0),
        GameEvent::ShipDamaged {
            id,
            amount,
            crew,
            ..
        } => log::debug!("Ship {} took {amount} damage, crew {crew}", id.0),
        GameEvent::AsteroidDestroyed { id } => log::debug!("Asteroid {} destroyed", id.0),
        GameEvent::AsteroidRespawned { old, id, .. } => {
            log::debug!("Asteroid {} respawned as {}", old.0, id.0)
        }
        GameEvent::ProjectileFired { owner, count } => {
            log::trace!("Ship {} fired {count} projectile(s)", owner.0)
        }
    }
}

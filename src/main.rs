//! Beetle Bubble headless runner
//!
//! Plays a full session (lobby, match, win screen) with bots in every slot
//! and reports the winner. Useful for balance checks and determinism soaks.
//!
//! # Usage
//!
//! ```bash
//! beetle-bubble --players 4 --seed 7
//! beetle-bubble --tuning balance.json --events
//! RUST_LOG=debug beetle-bubble --preset wide --dump
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use beetle_bubble::bot::{Bot, spawn_bots};
use beetle_bubble::consts::{MAX_PLAYERS, MAX_SUBSTEPS, SIM_DT};
use beetle_bubble::sim::{MatchEvent, PlayerInput, Session, SessionPhase, TickInput};
use beetle_bubble::{ArenaPreset, Tuning};

#[derive(Parser)]
#[command(name = "beetle-bubble")]
#[command(author, version, about = "Beetle Bubble - headless bot match runner")]
struct Args {
    /// Tuning JSON file (missing fields keep their defaults)
    #[arg(long, short = 't')]
    tuning: Option<PathBuf>,

    /// Arena preset when no tuning file is given (small, classic, wide)
    #[arg(long, default_value = "classic")]
    preset: String,

    /// Session seed
    #[arg(long, short = 's', default_value = "1")]
    seed: u64,

    /// Number of bot players (2-4)
    #[arg(long, short = 'p', default_value = "4")]
    players: usize,

    /// Give up after this many simulation ticks
    #[arg(long, default_value = "36000")]
    ticks: u64,

    /// Simulated host frame time in milliseconds
    #[arg(long, default_value = "16.667")]
    frame_ms: f32,

    /// Print every match event as a JSON line
    #[arg(long)]
    events: bool,

    /// Print the final match state as JSON
    #[arg(long)]
    dump: bool,
}

/// Session plus the bots driving it
struct Game {
    session: Session,
    bots: Vec<Bot>,
    rng: Pcg32,
    accumulator: f32,
    ticks: u64,
    print_events: bool,
    /// Last match snapshot, kept for `--dump`
    snapshot: Option<String>,
}

impl Game {
    fn new(tuning: Tuning, seed: u64, players: usize, print_events: bool) -> Self {
        let mut session = Session::new(tuning, seed);
        for _ in 0..players {
            session.join();
        }
        Self {
            session,
            bots: Vec::new(),
            rng: Pcg32::seed_from_u64(seed.rotate_left(17)),
            accumulator: 0.0,
            ticks: 0,
            print_events,
            snapshot: None,
        }
    }

    fn gather_input(&mut self) -> TickInput {
        let mut input = TickInput::default();
        match self.session.phase() {
            SessionPhase::Lobby => {
                // First player holds charge to start
                input.set(
                    0,
                    PlayerInput {
                        charge: true,
                        ..Default::default()
                    },
                );
            }
            SessionPhase::Playing => {
                if let Some(state) = self.session.current_match() {
                    for bot in &mut self.bots {
                        let player = bot.tick(state, SIM_DT, &mut self.rng);
                        input.set(bot.slot, player);
                    }
                }
            }
            SessionPhase::WinScreen { .. } => {}
        }
        input
    }

    /// Run simulation ticks for one host frame; returns false once done
    fn update(&mut self, dt: f32, max_ticks: u64) -> Result<bool> {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let before = self.session.phase();
            let input = self.gather_input();
            let events = self.session.tick(&input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            self.ticks += 1;

            if before == SessionPhase::Lobby && self.session.phase() == SessionPhase::Playing {
                let slots: Vec<usize> = self
                    .session
                    .current_match()
                    .map(|state| state.bubbles.iter().map(|b| b.slot).collect())
                    .unwrap_or_default();
                self.bots = spawn_bots(&slots, &mut self.rng);
            }
            self.report(&events)?;

            if let Some(state) = self.session.current_match() {
                if state.is_finished() && self.snapshot.is_none() {
                    self.snapshot = Some(state.to_json()?);
                }
            }
            // One match and its win screen, then stop
            if self.snapshot.is_some() && self.session.phase() == SessionPhase::Lobby {
                return Ok(false);
            }
            if self.ticks >= max_ticks {
                log::warn!("Tick limit {} reached without a finished session", max_ticks);
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn report(&self, events: &[MatchEvent]) -> Result<()> {
        for event in events {
            match event {
                MatchEvent::Eliminated { actor } => log::info!("[tick {}] bubble {} out", self.ticks, actor),
                MatchEvent::Won { slot, .. } => log::info!("[tick {}] match decided: {:?}", self.ticks, slot),
                _ => {}
            }
            if self.print_events {
                println!("{}", serde_json::to_string(event)?);
            }
        }
        Ok(())
    }
}

fn load_tuning(args: &Args) -> Result<Tuning> {
    match &args.tuning {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading tuning file {}", path.display()))?;
            let tuning = Tuning::from_json_str(&text)
                .with_context(|| format!("loading tuning file {}", path.display()))?;
            Ok(tuning)
        }
        None => {
            let Some(preset) = ArenaPreset::from_str(&args.preset) else {
                bail!("unknown arena preset '{}'", args.preset);
            };
            Ok(Tuning::from_preset(preset))
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if !(2..=MAX_PLAYERS).contains(&args.players) {
        bail!("players must be between 2 and {}", MAX_PLAYERS);
    }
    if args.frame_ms <= 0.0 {
        bail!("frame time must be positive");
    }

    let tuning = load_tuning(&args)?;
    log::info!(
        "Beetle Bubble starting: {} players, seed {}, {} arena",
        args.players,
        args.seed,
        tuning.arena.preset.as_str()
    );

    let mut game = Game::new(tuning, args.seed, args.players, args.events);
    let frame_dt = args.frame_ms / 1000.0;
    while game.update(frame_dt, args.ticks)? {}

    match game.session.winner_banner() {
        Some(banner) => println!("{} ({} ticks)", banner, game.ticks),
        None => println!("No winner after {} ticks", game.ticks),
    }
    if args.dump {
        if let Some(snapshot) = &game.snapshot {
            println!("{}", snapshot);
        }
    }
    Ok(())
}

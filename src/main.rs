mod bell;
mod display;

use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use serpentine::audio::AudioSink;
use serpentine::compute::{apply_direction, init_state, tick, toggle_pause};
use serpentine::config::{GameConfig, FRAME_INTERVAL};
use serpentine::entities::{Direction, GameSession, Phase};
use serpentine::levels::BuiltinLevels;

use bell::TerminalBell;

#[derive(Parser, Debug)]
#[command(name = "serpentine", version, about = "Terminal serpent maze arcade game")]
struct Cli {
    /// YAML file with game settings; missing keys take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Level to start on (overrides the config file).
    #[arg(long)]
    level: Option<u32>,

    /// Seed for the enemy AI, for reproducible games.
    #[arg(long)]
    seed: Option<u64>,

    /// Where log output goes; the terminal itself is busy drawing the game.
    #[arg(long, default_value = "serpentine.log")]
    log_file: PathBuf,

    /// Start with the bell muted.
    #[arg(long)]
    mute: bool,
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(level) = cli.level {
        config.level = level;
    }
    Ok(config)
}

fn new_session(config: &GameConfig) -> anyhow::Result<GameSession> {
    init_state(config, &BuiltinLevels).context("failed to start session")
}

// ── Input ─────────────────────────────────────────────────────────────────────

fn direction_for(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::UP),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::DOWN),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::LEFT),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::RIGHT),
        _ => None,
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Runs until the user quits. Only the most recent direction key pressed
/// during a frame is applied.
fn game_loop<W: Write>(
    out: &mut W,
    config: &GameConfig,
    rx: &mpsc::Receiver<Event>,
    rng: &mut StdRng,
    audio: &mut TerminalBell,
) -> anyhow::Result<()> {
    let mut state = new_session(config)?;
    let start = Instant::now();

    loop {
        let frame_start = Instant::now();
        let mut intent: Option<Direction> = None;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(key) = ev else { continue };
            if key.kind == KeyEventKind::Release {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(());
                }
                KeyCode::Char('p') | KeyCode::Char('P') if key.kind == KeyEventKind::Press => {
                    state = toggle_pause(&state);
                }
                KeyCode::Char('m') | KeyCode::Char('M') if key.kind == KeyEventKind::Press => {
                    audio.toggle_mute();
                }
                KeyCode::Char('r') | KeyCode::Char('R') if state.phase == Phase::GameOver => {
                    info!("Restarting");
                    state = new_session(config)?;
                }
                code => {
                    if let Some(direction) = direction_for(code) {
                        intent = Some(direction);
                    }
                }
            }
        }

        if let Some(direction) = intent {
            state = apply_direction(&state, direction);
        }

        state = tick(&state, start.elapsed(), rng);
        audio.notify_all(&state.events);

        display::render(out, &state, audio.is_muted())?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_INTERVAL {
            thread::sleep(FRAME_INTERVAL - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let config = load_config(&cli)?;
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut audio = TerminalBell::new(cli.mute);
    info!("Starting level {} (seed {:?})", config.level, cli.seed);

    let mut out = BufWriter::new(stdout());

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Key-release reporting where the terminal supports it; others fall back.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Blocking event reads live on their own thread so the frame loop never
    // waits on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break;
            }
        }
    });

    let result = game_loop(&mut out, &config, &rx, &mut rng, &mut audio);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(err) = &result {
        log::error!("{:#}", err);
    }
    info!("Exiting");
    result
}

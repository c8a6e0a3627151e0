use fret_quiz::autoplay::Autoplay;
use fret_quiz::command_reader::CommandReader;
use fret_quiz::config::{Configuration, RoundTiming};
use fret_quiz::console_display;
use fret_quiz::error::FretResult;
use fret_quiz::fretboard::standard_tuning;
use fret_quiz::game::GameLoop;
use fret_quiz::jsonl_writer::JsonlWriter;
use fret_quiz::round::Round;
use fret_quiz::types::*;

use clap::Parser;
use crossbeam_channel::{bounded, unbounded};
use log::{error, info};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::io;
use std::path::PathBuf;
use std::process;
use std::thread;

#[derive(Parser)]
#[command(name = "fret-quiz")]
#[command(about = "Guitar fretboard note-recognition trivia game")]
struct Cli {
    /// Highest fret a target can land on (5, 12, 15, 22 or 24)
    #[arg(long, default_value_t = 12)]
    frets: u8,

    /// Lowest-pitched string in play (6 = low E)
    #[arg(long, default_value_t = 6)]
    start_string: u8,

    /// Highest-pitched string in play (1 = high E)
    #[arg(long, default_value_t = 1)]
    end_string: u8,

    /// JSON configuration file; overrides --frets and the string range
    #[arg(long)]
    config: Option<PathBuf>,

    /// Round length in seconds
    #[arg(long, default_value_t = ROUND_SECONDS, value_parser = clap::value_parser!(u32).range(1..))]
    round_seconds: u32,

    /// Print every note of the fretboard and exit
    #[arg(long)]
    show_notes: bool,

    /// Stream frames as JSON lines on stdout instead of the console display
    #[arg(long)]
    json: bool,

    /// Disable ANSI colors in the console display
    #[arg(long)]
    no_color: bool,

    /// Let a bot play instead of reading commands from stdin
    #[arg(long)]
    autoplay: bool,

    /// Autoplay probability of a correct answer (0.0 to 1.0)
    #[arg(long, default_value_t = 0.8, value_parser = parse_accuracy)]
    accuracy: f64,

    /// Autoplay rounds before quitting
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// RNG seed for reproducible target sequences
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_accuracy(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is not between 0.0 and 1.0", s))
    }
}

/// The `--config` file when it loads, else the validated command-line range.
fn resolve_config(cli: &Cli) -> FretResult<Configuration> {
    match cli.config.as_deref().and_then(Configuration::load) {
        Some(c) => Ok(c),
        None => Configuration::new(cli.frets, cli.start_string, cli.end_string),
    }
}

fn main() {
    let cli = Cli::parse();

    // The console display owns the terminal; keep routine logs out of it.
    let default_filter = if cli.json || cli.show_notes { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    let tuning = standard_tuning();

    let config = match resolve_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };
    if cli.show_notes {
        print!("{}", console_display::render_note_map(&tuning, config.fret_length));
        return;
    }

    let timing = RoundTiming {
        round_seconds: cli.round_seconds,
        ..RoundTiming::default()
    };
    let seed = cli.seed.unwrap_or_else(rand::random);

    info!("═══════════════════════════════════════════════");
    info!("  FRET QUIZ v{}", env!("CARGO_PKG_VERSION"));
    info!("  Tuning: {}", tuning.name);
    info!(
        "  Strings {}-{}, frets 1-{}, {}s rounds",
        config.end_string, config.start_string, config.fret_length, timing.round_seconds
    );
    info!("  Input: {}", if cli.autoplay { "AUTOPLAY" } else { "STDIN" });
    info!("  Output: {}", if cli.json { "JSON lines" } else { "console" });
    info!("  Seed: {}", seed);
    info!("═══════════════════════════════════════════════");

    // Channel: input → game loop
    let (cmd_tx, cmd_rx) = bounded::<Command>(64);

    // Channels: game loop → consumers
    let mut frame_txs = Vec::new();
    let mut handles = Vec::new();

    // ─── Output ─────────────────────────────────────────────────────
    if cli.json {
        let (tx, rx) = unbounded::<GameFrame>();
        frame_txs.push(tx);
        let tuning = tuning.clone();
        handles.push(thread::Builder::new().name("jsonl".into()).spawn(move || {
            if let Err(e) = JsonlWriter::new(rx, io::stdout()).run(&tuning, &config) {
                error!("JSON output stopped: {}", e);
            }
        }).unwrap());
    } else {
        let (tx, rx) = unbounded::<GameFrame>();
        frame_txs.push(tx);
        let color = !cli.no_color;
        handles.push(thread::Builder::new().name("display".into()).spawn(move || {
            console_display::ConsoleDisplay::new(rx, color).run();
        }).unwrap());
    }

    // ─── Input ──────────────────────────────────────────────────────
    if cli.autoplay {
        let (tx, rx) = unbounded::<GameFrame>();
        frame_txs.push(tx);
        let bot_tx = cmd_tx.clone();
        let rng = Pcg32::seed_from_u64(seed.wrapping_add(1));
        let accuracy = cli.accuracy;
        let rounds = cli.rounds;
        handles.push(thread::Builder::new().name("autoplay".into()).spawn(move || {
            let scores = Autoplay::new(rx, bot_tx, accuracy, rng).with_rounds(rounds).run();
            info!("Autoplay finished: scores {:?}", scores);
        }).unwrap());
    } else {
        // Not joined: it may sit in a blocking read after the game has quit.
        let stdin_tx = cmd_tx.clone();
        thread::Builder::new().name("stdin".into()).spawn(move || {
            CommandReader::new(io::stdin().lock(), stdin_tx).run();
        }).unwrap();
    }
    drop(cmd_tx);

    // ─── Game loop ──────────────────────────────────────────────────
    let round = Round::new(config, timing, tuning, Pcg32::seed_from_u64(seed));
    let game = thread::Builder::new().name("game".into()).spawn(move || {
        GameLoop::new(cmd_rx, frame_txs, round).run();
    }).unwrap();

    if let Err(e) = game.join() {
        error!("Game loop panicked: {:?}", e);
        process::exit(1);
    }
    for h in handles {
        let _ = h.join();
    }
}

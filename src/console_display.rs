use crate::fretboard::Tuning;
use crate::types::*;
use crossbeam_channel::Receiver;
use std::io::{self, Write};

/// Frets that carry an inlay dot on a real neck.
const INLAY_FRETS: [u8; 10] = [3, 5, 7, 9, 12, 15, 17, 19, 21, 24];
const RESET: &str = "\x1b[0m";

/// Renders the game as a terminal dashboard, redrawn on every frame.
pub struct ConsoleDisplay {
    rx: Receiver<GameFrame>,
    color: bool,
}

impl ConsoleDisplay {
    pub fn new(rx: Receiver<GameFrame>, color: bool) -> Self {
        Self { rx, color }
    }

    /// Blocks until the game loop closes the frame channel.
    pub fn run(&self) {
        let mut stdout = io::stdout();
        for frame in self.rx.iter() {
            // Clear screen and move cursor home
            print!("\x1b[2J\x1b[H");
            print!("{}", render_frame(&frame, self.color));
            let _ = stdout.flush();
        }
    }
}

/// Full dashboard for one frame.
pub fn render_frame(frame: &GameFrame, color: bool) -> String {
    let state = &frame.state;
    let config = &frame.config;
    let mut out = String::new();

    out.push_str("╔══════════════════════════════════════════════════════════╗\n");
    out.push_str("║  FRET QUIZ                                               ║\n");
    out.push_str("╚══════════════════════════════════════════════════════════╝\n");

    let last = match state.last_guess_correct {
        Some(true) => TargetLabel::Correct.symbol(),
        Some(false) => TargetLabel::Incorrect.symbol(),
        None => " ",
    };
    let fraction = state.seconds_remaining as f32
        / frame.round_seconds.max(state.seconds_remaining).max(1) as f32;
    out.push_str(&format!(
        "  Score: {:<4} Time: {} {:>2}s   {}\n",
        state.score,
        make_bar(fraction, 20),
        state.seconds_remaining,
        last
    ));
    out.push_str(&format!(
        "  Strings {}-{}, frets 1-{}\n\n",
        config.end_string, config.start_string, config.fret_length
    ));

    out.push_str(&render_fretboard(config.fret_length, frame.target.as_ref(), color));
    out.push('\n');

    match state.status {
        RoundStatus::Idle => {
            out.push_str("  Type 'start' to begin. 'frets <n>' / 'strings <from> <to>' to configure.\n");
        }
        RoundStatus::Active => {
            let names: Vec<&str> = CHROMATIC_SCALE.iter().map(|n| n.as_str()).collect();
            out.push_str(&format!("  Name the note: {}\n", names.join(" ")));
        }
        RoundStatus::Ended => {
            let accuracy = match state.accuracy() {
                Some(a) => format!("{:.0}%", a * 100.0),
                None => "---".to_string(),
            };
            out.push_str(&format!(
                "  Round over. Score {} from {} guesses ({} accuracy).\n",
                state.score, state.guesses, accuracy
            ));
            out.push_str("  'start' to play again, 'reset' to clear the board.\n");
        }
    }
    out
}

/// Six strings across `1..=fret_length` with the target marked by its label.
pub fn render_fretboard(fret_length: u8, target: Option<&TargetNote>, color: bool) -> String {
    let mut out = String::new();
    for (i, name) in STRING_NAMES.iter().enumerate() {
        let string = i as u8 + 1;
        out.push_str(&format!("  {:>4} ║", name));
        for fret in 1..=fret_length {
            let cell = match target {
                Some(t) if t.position == FretPosition::new(string, fret) => {
                    if color {
                        format!("─{}{}{}─│", t.color.ansi(), t.label.symbol(), RESET)
                    } else {
                        format!("─{}─│", t.label.symbol())
                    }
                }
                _ => "───│".to_string(),
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }
    out.push_str(&fret_numbers(fret_length, 4));
    out
}

/// Static display: every position labelled with its note name.
pub fn render_note_map(tuning: &Tuning, fret_length: u8) -> String {
    let map = tuning.note_map(0, fret_length);
    let mut out = format!("  {} tuning, frets 0-{}\n\n", tuning.name, fret_length);
    for string in 1..=STRING_COUNT {
        out.push_str(&format!("  {:>4} ", STRING_NAMES[(string - 1) as usize]));
        for (pos, note) in map.iter().filter(|(p, _)| p.string == string) {
            if pos.fret == 0 {
                out.push_str(&format!("{:<2}║", note.as_str()));
            } else {
                out.push_str(&format!("{:^4}│", note.as_str()));
            }
        }
        out.push('\n');
    }
    out.push_str(&fret_numbers(fret_length, 5));
    out
}

/// Fret number ruler; only inlay frets are numbered.
fn fret_numbers(fret_length: u8, cell: usize) -> String {
    let mut out = String::from("        ");
    if cell == 5 {
        // Open-string column of the note map
        out.push_str("  ");
    }
    for fret in 1..=fret_length {
        if INLAY_FRETS.contains(&fret) {
            out.push_str(&format!("{:^width$}", fret, width = cell));
        } else {
            out.push_str(&" ".repeat(cell));
        }
    }
    out.push('\n');
    out
}

fn make_bar(val: f32, width: usize) -> String {
    let filled = (val.clamp(0.0, 1.0) * width as f32).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

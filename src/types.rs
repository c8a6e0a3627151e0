use crate::config::Configuration;
use crate::error::FretError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Pitch classes ──────────────────────────────────────────────────────────

/// One of the 12 pitch classes, spelled with sharps.
/// Serializes as the display spelling ("A", "A#", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
}

/// The chromatic cycle, starting from A. Index arithmetic wraps modulo 12.
pub const CHROMATIC_SCALE: [NoteName; 12] = [
    NoteName::A,
    NoteName::ASharp,
    NoteName::B,
    NoteName::C,
    NoteName::CSharp,
    NoteName::D,
    NoteName::DSharp,
    NoteName::E,
    NoteName::F,
    NoteName::FSharp,
    NoteName::G,
    NoteName::GSharp,
];

impl NoteName {
    /// Position in `CHROMATIC_SCALE`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Note at `index` steps above A, wrapping.
    pub fn from_index(index: usize) -> Self {
        CHROMATIC_SCALE[index % 12]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
        }
    }

    /// Exact, case-sensitive lookup of a spelling. Flats are not accepted.
    pub fn parse(s: &str) -> Option<Self> {
        CHROMATIC_SCALE.iter().copied().find(|n| n.as_str() == s)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Fretboard positions ────────────────────────────────────────────────────

/// A string/fret pair. String 1 is the high E, string 6 the low E.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FretPosition {
    pub string: u8,
    pub fret: u8,
}

impl FretPosition {
    pub fn new(string: u8, fret: u8) -> Self {
        Self { string, fret }
    }
}

impl fmt::Display for FretPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "string {} fret {}", self.string, self.fret)
    }
}

// ─── Target ─────────────────────────────────────────────────────────────────

/// What the highlighted target currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetLabel {
    /// Waiting for a guess
    Neutral,
    /// Last guess matched
    Correct,
    /// Last guess missed
    Incorrect,
}

impl TargetLabel {
    pub fn symbol(self) -> &'static str {
        match self {
            TargetLabel::Neutral => "?",
            TargetLabel::Correct => "✓",
            TargetLabel::Incorrect => "✗",
        }
    }

    pub fn highlight(self) -> Highlight {
        match self {
            TargetLabel::Neutral => Highlight::Neutral,
            TargetLabel::Correct => Highlight::Correct,
            TargetLabel::Incorrect => Highlight::Incorrect,
        }
    }
}

/// Highlight color of the target marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    Neutral,
    Correct,
    Incorrect,
}

impl Highlight {
    /// ANSI SGR sequence for the console renderer.
    pub fn ansi(self) -> &'static str {
        match self {
            Highlight::Neutral => "\x1b[1;33m",
            Highlight::Correct => "\x1b[1;32m",
            Highlight::Incorrect => "\x1b[1;31m",
        }
    }
}

/// The position the player must name, plus how it is currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetNote {
    pub position: FretPosition,
    pub note: NoteName,
    pub label: TargetLabel,
    pub color: Highlight,
    /// Sounding pitch in standard tuning
    pub pitch_hz: f64,
}

impl TargetNote {
    pub fn new(position: FretPosition, note: NoteName, pitch_hz: f64) -> Self {
        Self {
            position,
            note,
            label: TargetLabel::Neutral,
            color: Highlight::Neutral,
            pitch_hz,
        }
    }

    /// Set the label and its matching color together.
    pub fn mark(&mut self, label: TargetLabel) {
        self.label = label;
        self.color = label.highlight();
    }
}

// ─── Round state ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    Idle,
    Active,
    Ended,
}

/// Observable state of the current (or last) round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub status: RoundStatus,
    pub score: u32,
    pub seconds_remaining: u32,
    pub timer_running: bool,
    /// None until a guess is made, and again once its result has been shown.
    pub last_guess_correct: Option<bool>,
    pub guesses: u32,
    pub misses: u32,
}

impl RoundState {
    pub fn idle() -> Self {
        Self {
            status: RoundStatus::Idle,
            score: 0,
            seconds_remaining: ROUND_SECONDS,
            timer_running: false,
            last_guess_correct: None,
            guesses: 0,
            misses: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RoundStatus::Active
    }

    pub fn is_ended(&self) -> bool {
        self.status == RoundStatus::Ended
    }

    /// Fraction of guesses that were correct, None before the first guess.
    pub fn accuracy(&self) -> Option<f32> {
        if self.guesses == 0 {
            None
        } else {
            Some(self.score as f32 / self.guesses as f32)
        }
    }
}

impl Default for RoundState {
    fn default() -> Self {
        Self::idle()
    }
}

// ─── Published snapshot ─────────────────────────────────────────────────────

/// Complete game snapshot, published by the game loop after every transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameFrame {
    /// Monotonic frame counter
    pub seq: u64,
    pub config: Configuration,
    /// Full length of a round, for scaling the clock
    pub round_seconds: u32,
    pub state: RoundState,
    pub target: Option<TargetNote>,
}

impl fmt::Display for GameFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            Some(t) => format!("{} [{}]", t.position, t.label.symbol()),
            None => "---".to_string(),
        };
        write!(
            f,
            "#{:<5} {:?} score={} t={}s target={}",
            self.seq, self.state.status, self.state.score, self.state.seconds_remaining, target,
        )
    }
}

/// Short-key representation for the JSON-lines stream.
/// Field mapping: n=seq, st=status, sc=score, s=seconds_remaining,
/// tr=timer_running, lg=last_guess_correct, g=guesses, ts=target string,
/// tf=target fret, tn=target note, tl=target label symbol, tc=target color
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactFrame {
    pub n: u64,
    pub st: RoundStatus,
    pub sc: u32,
    pub s: u32,
    pub tr: bool,
    pub lg: Option<bool>,
    pub g: u32,
    pub ts: Option<u8>,
    pub tf: Option<u8>,
    pub tn: Option<NoteName>,
    pub tl: Option<String>,
    pub tc: Option<Highlight>,
}

impl From<&GameFrame> for CompactFrame {
    fn from(f: &GameFrame) -> Self {
        Self {
            n: f.seq,
            st: f.state.status,
            sc: f.state.score,
            s: f.state.seconds_remaining,
            tr: f.state.timer_running,
            lg: f.state.last_guess_correct,
            g: f.state.guesses,
            ts: f.target.map(|t| t.position.string),
            tf: f.target.map(|t| t.position.fret),
            tn: f.target.map(|t| t.note),
            tl: f.target.map(|t| t.label.symbol().to_string()),
            tc: f.target.map(|t| t.color),
        }
    }
}

// ─── Inter-thread messages ──────────────────────────────────────────────────

/// User actions fed to the game loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    /// Raw guess text; anything outside the note alphabet scores as a miss.
    Guess(String),
    End,
    Reset,
    SetFrets(u8),
    SetStrings { start: u8, end: u8 },
    Quit,
}

impl FromStr for Command {
    type Err = FretError;

    /// `start`, `end`, `reset`, `quit`, `frets <n>`, `strings <start> <end>`;
    /// any other single token is a guess.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let unknown = || FretError::UnknownCommand(line.trim().to_string());
        let mut words = line.split_whitespace();
        let head = words.next().ok_or_else(unknown)?;
        let args: Vec<&str> = words.collect();

        let parse_num = |s: &str| s.parse::<u8>().map_err(|_| unknown());

        match (head, args.as_slice()) {
            ("start", []) => Ok(Command::Start),
            ("end", []) => Ok(Command::End),
            ("reset", []) => Ok(Command::Reset),
            ("quit", []) | ("exit", []) => Ok(Command::Quit),
            ("frets", [n]) => Ok(Command::SetFrets(parse_num(*n)?)),
            ("strings", [start, end]) => Ok(Command::SetStrings {
                start: parse_num(*start)?,
                end: parse_num(*end)?,
            }),
            (guess, []) => Ok(Command::Guess(guess.to_string())),
            _ => Err(unknown()),
        }
    }
}

// ─── Constants ──────────────────────────────────────────────────────────────

pub const STRING_COUNT: u8 = 6;
pub const ROUND_SECONDS: u32 = 60;
pub const RESOLVE_DELAY_MS: u64 = 1000;
pub const STRING_NAMES: [&str; 6] = ["1:E4", "2:B3", "3:G3", "4:D3", "5:A2", "6:E2"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chromatic_scale_is_indexed_in_order() {
        for (i, n) in CHROMATIC_SCALE.iter().enumerate() {
            assert_eq!(n.index(), i);
            assert_eq!(NoteName::from_index(i + 12), *n);
        }
    }

    #[test]
    fn test_note_parse_is_case_sensitive() {
        assert_eq!(NoteName::parse("C#"), Some(NoteName::CSharp));
        assert_eq!(NoteName::parse("c#"), None);
        assert_eq!(NoteName::parse("Db"), None);
    }

    #[test]
    fn test_note_serializes_as_spelling() {
        let json = serde_json::to_string(&NoteName::FSharp).unwrap();
        assert_eq!(json, "\"F#\"");
        let back: NoteName = serde_json::from_str("\"G#\"").unwrap();
        assert_eq!(back, NoteName::GSharp);
    }

    #[test]
    fn test_mark_sets_label_and_color() {
        let mut t = TargetNote::new(FretPosition::new(6, 3), NoteName::G, 98.0);
        assert_eq!(t.label.symbol(), "?");
        t.mark(TargetLabel::Incorrect);
        assert_eq!(t.label.symbol(), "✗");
        assert_eq!(t.color, Highlight::Incorrect);
        t.mark(TargetLabel::Correct);
        assert_eq!(t.color, Highlight::Correct);
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!("start".parse::<Command>(), Ok(Command::Start));
        assert_eq!("  end ".parse::<Command>(), Ok(Command::End));
        assert_eq!("frets 22".parse::<Command>(), Ok(Command::SetFrets(22)));
        assert_eq!(
            "strings 6 3".parse::<Command>(),
            Ok(Command::SetStrings { start: 6, end: 3 })
        );
        assert_eq!("A#".parse::<Command>(), Ok(Command::Guess("A#".into())));
        // Unknown single tokens still reach the round as (wrong) guesses
        assert_eq!("H".parse::<Command>(), Ok(Command::Guess("H".into())));
        assert!("frets twelve".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
        assert!("play the blues".parse::<Command>().is_err());
    }

    #[test]
    fn test_accuracy() {
        let mut s = RoundState::idle();
        assert_eq!(s.accuracy(), None);
        s.guesses = 4;
        s.score = 3;
        assert!((s.accuracy().unwrap() - 0.75).abs() < 1e-6);
    }
}

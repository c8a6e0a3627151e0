use crate::types::*;
use crossbeam_channel::{Receiver, Sender};
use log::info;
use rand::Rng;
use rand_pcg::Pcg32;
use std::thread;
use std::time::Duration;

/// Headless player: watches frames and answers every neutral target,
/// exercising the full game without a keyboard.
pub struct Autoplay {
    rx: Receiver<GameFrame>,
    tx: Sender<Command>,
    /// Probability of naming the target correctly.
    accuracy: f64,
    /// Pause before each answer.
    think: Duration,
    rounds: u32,
    rng: Pcg32,
}

impl Autoplay {
    pub fn new(rx: Receiver<GameFrame>, tx: Sender<Command>, accuracy: f64, rng: Pcg32) -> Self {
        Self {
            rx,
            tx,
            // NaN would make gen_bool panic
            accuracy: if accuracy.is_nan() { 0.0 } else { accuracy.clamp(0.0, 1.0) },
            think: Duration::from_millis(700),
            rounds: 1,
            rng,
        }
    }

    pub fn with_think_time(mut self, think: Duration) -> Self {
        self.think = think;
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    /// Play `rounds` rounds, then send `Quit`. Blocks the calling thread.
    /// Returns the final score of each round played.
    pub fn run(&mut self) -> Vec<u32> {
        info!(
            "Autoplay: {} round(s), accuracy {:.0}%",
            self.rounds,
            self.accuracy * 100.0
        );
        let mut scores = Vec::new();
        let mut answered: Option<(FretPosition, u32)> = None;
        let mut prev_status = RoundStatus::Idle;

        if self.tx.send(Command::Start).is_err() {
            return scores;
        }

        while let Ok(frame) = self.rx.recv() {
            let status = frame.state.status;
            match status {
                RoundStatus::Active => {
                    if let Some(target) = frame.target {
                        let key = (target.position, frame.state.guesses);
                        if target.label == TargetLabel::Neutral && answered != Some(key) {
                            answered = Some(key);
                            thread::sleep(self.think);
                            let guess = self.answer(target.note);
                            info!("  {} → {}", target.position, guess);
                            if self.tx.send(Command::Guess(guess.to_string())).is_err() {
                                break;
                            }
                        }
                    }
                }
                RoundStatus::Ended if prev_status == RoundStatus::Active => {
                    scores.push(frame.state.score);
                    info!("  round {} score: {}", scores.len(), frame.state.score);
                    let next = if scores.len() as u32 >= self.rounds {
                        Command::Quit
                    } else {
                        Command::Start
                    };
                    let quit = next == Command::Quit;
                    if self.tx.send(next).is_err() || quit {
                        break;
                    }
                }
                _ => {}
            }
            prev_status = status;
        }
        scores
    }

    /// The right note with probability `accuracy`, otherwise a different one.
    fn answer(&mut self, note: NoteName) -> NoteName {
        if self.rng.gen_bool(self.accuracy) {
            note
        } else {
            NoteName::from_index(note.index() + self.rng.gen_range(1..12))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use rand::SeedableRng;

    fn bot(accuracy: f64) -> Autoplay {
        let (_ftx, frx) = unbounded();
        let (ctx, _crx) = unbounded();
        Autoplay::new(frx, ctx, accuracy, Pcg32::seed_from_u64(9))
    }

    #[test]
    fn test_perfect_accuracy_always_right() {
        let mut b = bot(1.0);
        for n in CHROMATIC_SCALE {
            assert_eq!(b.answer(n), n);
        }
    }

    #[test]
    fn test_zero_accuracy_always_wrong() {
        let mut b = bot(0.0);
        for _ in 0..100 {
            for n in CHROMATIC_SCALE {
                assert_ne!(b.answer(n), n);
            }
        }
    }

    #[test]
    fn test_accuracy_is_clamped() {
        assert_eq!(bot(3.0).accuracy, 1.0);
        assert_eq!(bot(-1.0).accuracy, 0.0);
    }

    #[test]
    fn test_nan_accuracy_answers_wrong() {
        let mut b = bot(f64::NAN);
        assert_eq!(b.accuracy, 0.0);
        for n in CHROMATIC_SCALE {
            assert_ne!(b.answer(n), n);
        }
    }
}

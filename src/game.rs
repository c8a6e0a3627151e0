use crate::round::{Round, TaskId};
use crate::types::*;
use crossbeam_channel::{at, never, select, Receiver, Sender};
use log::{debug, info, trace, warn};
use rand::Rng;
use rand_pcg::Pcg32;
use std::time::{Duration, Instant};

/// A scheduled wake-up for one of the round's tasks.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    id: TaskId,
    at: Instant,
}

impl Deadline {
    fn receiver(slot: &Option<Deadline>) -> Receiver<Instant> {
        match slot {
            Some(d) => at(d.at),
            None => never(),
        }
    }
}

/// Keep `slot` in step with the task the round currently owns: a new id arms
/// a fresh deadline `delay` from now, a vanished id cancels it.
fn sync_deadline(slot: &mut Option<Deadline>, task: Option<TaskId>, now: Instant, delay: Duration) {
    match (task, slot.as_ref()) {
        (Some(id), Some(d)) if d.id == id => {}
        (Some(id), _) => *slot = Some(Deadline { id, at: now + delay }),
        (None, _) => *slot = None,
    }
}

/// The game loop owns the round and is the only thread that touches it.
///
/// It multiplexes three sources on one timeline:
///   1. `Command`s from the input thread (start, guess, end, ...)
///   2. the countdown deadline, once per tick while a round is active
///   3. the pending guess-resolution deadline
///
/// After every transition a `GameFrame` goes to each consumer channel.
/// The loop stops on `Command::Quit` or when every command sender is gone.
pub struct GameLoop<R: Rng = Pcg32> {
    cmd_rx: Receiver<Command>,
    frame_txs: Vec<Sender<GameFrame>>,
    round: Round<R>,
    seq: u64,
}

impl<R: Rng> GameLoop<R> {
    pub fn new(cmd_rx: Receiver<Command>, frame_txs: Vec<Sender<GameFrame>>, round: Round<R>) -> Self {
        Self {
            cmd_rx,
            frame_txs,
            round,
            seq: 0,
        }
    }

    pub fn round(&self) -> &Round<R> {
        &self.round
    }

    pub fn run(&mut self) {
        info!("Game loop running (tuning: {})", self.round.tuning().name);

        let cmd_rx = self.cmd_rx.clone();
        let tick = self.round.timing().tick;
        let resolve_delay = self.round.timing().resolve_delay;
        let mut countdown: Option<Deadline> = None;
        let mut resolution: Option<Deadline> = None;

        self.publish();

        loop {
            let now = Instant::now();
            sync_deadline(&mut countdown, self.round.countdown(), now, tick);
            sync_deadline(
                &mut resolution,
                self.round.pending().map(|(id, _)| id),
                now,
                resolve_delay,
            );

            let tick_rx = Deadline::receiver(&countdown);
            let resolve_rx = Deadline::receiver(&resolution);

            select! {
                recv(cmd_rx) -> msg => match msg {
                    Ok(Command::Quit) => {
                        info!("Quit requested");
                        break;
                    }
                    Ok(cmd) => self.apply(cmd),
                    Err(_) => {
                        debug!("Command channel closed");
                        break;
                    }
                },
                recv(tick_rx) -> _ => {
                    // Next deadline counts from the previous one, not from
                    // now, so slow iterations do not stretch the round.
                    if let Some(d) = countdown.as_mut() {
                        d.at += tick;
                    }
                    self.round.tick();
                    self.publish();
                },
                recv(resolve_rx) -> _ => {
                    if let Some(d) = resolution.take() {
                        self.round.resolve(d.id);
                    }
                    self.publish();
                },
            }
        }

        info!("Game loop shutting down after {} frames", self.seq);
    }

    /// Apply one user command to the round and publish the result.
    pub fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Start => self.round.start(),
            Command::Guess(text) => {
                if self.round.guess(&text).is_none() {
                    debug!("Guess {:?} ignored: no target", text);
                }
            }
            Command::End => self.round.end(),
            Command::Reset => self.round.reset(),
            Command::SetFrets(n) => {
                let result = self
                    .round
                    .config()
                    .with_fret_length(n)
                    .and_then(|c| self.round.configure(c));
                if let Err(e) = result {
                    warn!("{}", e);
                }
            }
            Command::SetStrings { start, end } => {
                let result = self
                    .round
                    .config()
                    .with_strings(start, end)
                    .and_then(|c| self.round.configure(c));
                if let Err(e) = result {
                    warn!("{}", e);
                }
            }
            Command::Quit => {}
        }
        self.publish();
    }

    /// Snapshot of the current game state.
    pub fn frame(&self) -> GameFrame {
        GameFrame {
            seq: self.seq,
            config: *self.round.config(),
            round_seconds: self.round.timing().round_seconds,
            state: *self.round.state(),
            target: self.round.target().copied(),
        }
    }

    fn publish(&mut self) {
        self.seq += 1;
        let frame = self.frame();
        trace!("Frame: {}", frame);
        for tx in &self.frame_txs {
            let _ = tx.send(frame.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, RoundTiming};
    use crate::fretboard::standard_tuning;
    use crossbeam_channel::unbounded;
    use rand::SeedableRng;

    fn game() -> (GameLoop, Receiver<GameFrame>) {
        let (_cmd_tx, cmd_rx) = unbounded();
        let (frame_tx, frame_rx) = unbounded();
        let round = Round::new(
            Configuration::default(),
            RoundTiming::default(),
            standard_tuning(),
            Pcg32::seed_from_u64(5),
        );
        (GameLoop::new(cmd_rx, vec![frame_tx], round), frame_rx)
    }

    #[test]
    fn test_sync_deadline_arms_and_cancels() {
        let now = Instant::now();
        let mut slot = None;
        let a = TaskId::from_raw(1);
        sync_deadline(&mut slot, Some(a), now, Duration::from_secs(1));
        let armed = slot.unwrap();
        assert_eq!(armed.at, now + Duration::from_secs(1));

        // Same task: deadline untouched
        sync_deadline(&mut slot, Some(a), now + Duration::from_millis(500), Duration::from_secs(1));
        assert_eq!(slot.unwrap().at, armed.at);

        // Replaced task: re-armed from the new "now"
        let b = TaskId::from_raw(2);
        let later = now + Duration::from_millis(700);
        sync_deadline(&mut slot, Some(b), later, Duration::from_secs(1));
        assert_eq!(slot.unwrap().id, b);
        assert_eq!(slot.unwrap().at, later + Duration::from_secs(1));

        sync_deadline(&mut slot, None, later, Duration::from_secs(1));
        assert!(slot.is_none());
    }

    #[test]
    fn test_apply_publishes_each_command() {
        let (mut g, rx) = game();
        g.apply(Command::Start);
        g.apply(Command::Guess("X".into()));
        g.apply(Command::End);
        let frames: Vec<GameFrame> = rx.try_iter().collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].state.status, RoundStatus::Active);
        assert!(frames[0].target.is_some());
        assert_eq!(frames[1].state.last_guess_correct, Some(false));
        assert_eq!(frames[2].state.status, RoundStatus::Ended);
        assert!(frames[0].seq < frames[1].seq && frames[1].seq < frames[2].seq);
    }

    #[test]
    fn test_set_frets_rejected_while_active() {
        let (mut g, _rx) = game();
        g.apply(Command::Start);
        g.apply(Command::SetFrets(24));
        assert_eq!(g.round().config().fret_length, 12);
        g.apply(Command::End);
        g.apply(Command::SetFrets(24));
        assert_eq!(g.round().config().fret_length, 24);
        g.apply(Command::SetFrets(7));
        assert_eq!(g.round().config().fret_length, 24, "unsupported length ignored");
    }

    #[test]
    fn test_set_strings() {
        let (mut g, _rx) = game();
        g.apply(Command::SetStrings { start: 3, end: 1 });
        let c = g.round().config();
        assert_eq!((c.start_string, c.end_string), (3, 1));
        g.apply(Command::SetStrings { start: 1, end: 3 });
        assert_eq!(g.round().config().start_string, 3, "inverted range ignored");
    }

    #[test]
    fn test_frame_reflects_round() {
        let (mut g, _rx) = game();
        g.apply(Command::Start);
        let f = g.frame();
        assert_eq!(f.state, *g.round().state());
        assert_eq!(f.target, g.round().target().copied());
        assert_eq!(f.config, Configuration::default());
        assert_eq!(f.round_seconds, 60);
    }

    #[test]
    fn test_frame_carries_round_length() {
        let (_cmd_tx, cmd_rx) = unbounded();
        let timing = RoundTiming {
            round_seconds: 30,
            ..RoundTiming::default()
        };
        let round = Round::new(Configuration::default(), timing, standard_tuning(), Pcg32::seed_from_u64(5));
        let mut g = GameLoop::new(cmd_rx, vec![], round);
        g.apply(Command::Start);
        let f = g.frame();
        assert_eq!(f.round_seconds, 30);
        assert_eq!(f.state.seconds_remaining, 30);
    }
}

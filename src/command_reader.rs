//! Line-oriented command input — one command per line from any `BufRead`
//! (stdin in the binary, in-memory buffers in tests).

use crate::types::Command;
use crossbeam_channel::Sender;
use log::{debug, info, warn};
use std::io::BufRead;

pub struct CommandReader<R: BufRead> {
    reader: R,
    tx: Sender<Command>,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(reader: R, tx: Sender<Command>) -> Self {
        Self { reader, tx }
    }

    /// Read until EOF, `quit`, or the game loop goes away. Blocks the calling
    /// thread. Returns the number of commands forwarded.
    pub fn run(mut self) -> usize {
        let mut line = String::new();
        let mut sent = 0;
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    debug!("Command input closed");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Command input error: {}", e);
                    break;
                }
            }
            if line.trim().is_empty() {
                continue;
            }
            let cmd = match line.parse::<Command>() {
                Ok(cmd) => cmd,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };
            let quit = cmd == Command::Quit;
            if self.tx.send(cmd).is_err() {
                break;
            }
            sent += 1;
            if quit {
                break;
            }
        }
        info!("Command reader stopped after {} commands", sent);
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::io::Cursor;

    #[test]
    fn test_reads_commands_and_skips_garbage() {
        let input = "frets 5\n\nstart\nC#\nnot a command\nend\n";
        let (tx, rx) = unbounded();
        let sent = CommandReader::new(Cursor::new(input), tx).run();
        assert_eq!(sent, 4);
        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(
            cmds,
            vec![
                Command::SetFrets(5),
                Command::Start,
                Command::Guess("C#".into()),
                Command::End,
            ]
        );
    }

    #[test]
    fn test_stops_at_quit() {
        let (tx, rx) = unbounded();
        CommandReader::new(Cursor::new("start\nquit\nstart\n"), tx).run();
        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(cmds, vec![Command::Start, Command::Quit]);
    }

    #[test]
    fn test_stops_when_receiver_dropped() {
        let (tx, rx) = unbounded();
        drop(rx);
        assert_eq!(CommandReader::new(Cursor::new("start\nend\n"), tx).run(), 0);
    }
}

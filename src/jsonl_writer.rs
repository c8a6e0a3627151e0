//! JSON-lines frame stream for external presentation layers.
//!
//! First line is a header (format, version, tuning, configuration); every
//! following line is one `CompactFrame`.

use crate::config::Configuration;
use crate::fretboard::Tuning;
use crate::types::{CompactFrame, GameFrame};
use crossbeam_channel::Receiver;
use log::{error, info};
use serde_json::json;
use std::io::{self, Write};

pub struct JsonlWriter<W: Write> {
    rx: Receiver<GameFrame>,
    out: W,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(rx: Receiver<GameFrame>, out: W) -> Self {
        Self { rx, out }
    }

    /// Write the header, then one line per frame until the channel closes.
    /// Blocks the calling thread; returns the sink and the frame count.
    pub fn run(mut self, tuning: &Tuning, config: &Configuration) -> io::Result<(W, u64)> {
        self.write_header(tuning, config)?;
        let mut count: u64 = 0;
        for frame in self.rx.iter() {
            let line = serde_json::to_string(&CompactFrame::from(&frame)).map_err(io::Error::other)?;
            if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
                error!("Frame stream write failed: {}", e);
                return Err(e);
            }
            count += 1;
        }
        info!("Frame stream closed after {} frames", count);
        Ok((self.out, count))
    }

    fn write_header(&mut self, tuning: &Tuning, config: &Configuration) -> io::Result<()> {
        let header = json!({
            "format": "fret-quiz",
            "version": env!("CARGO_PKG_VERSION"),
            "tuning": {
                "name": tuning.name,
                "open_strings": tuning.open_strings,
            },
            "config": config,
        });
        writeln!(self.out, "{}", header)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fretboard::standard_tuning;
    use crate::types::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_header_then_frames() {
        let (tx, rx) = unbounded();
        let config = Configuration::default();
        let tuning = standard_tuning();
        let target = tuning.target_at(FretPosition::new(6, 3)).unwrap();
        let mut state = RoundState::idle();
        state.status = RoundStatus::Active;
        state.score = 2;
        tx.send(GameFrame { seq: 1, config, round_seconds: 60, state, target: Some(target) }).unwrap();
        tx.send(GameFrame { seq: 2, config, round_seconds: 60, state: RoundState::idle(), target: None })
            .unwrap();
        drop(tx);

        let (buf, count) = JsonlWriter::new(rx, Vec::new()).run(&tuning, &config).unwrap();
        assert_eq!(count, 2);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        let header: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(header["format"], "fret-quiz");
        assert_eq!(header["config"]["fret_length"], 12);
        assert_eq!(header["tuning"]["open_strings"][5], 40);

        let first: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first["st"], "Active");
        assert_eq!(first["sc"], 2);
        assert_eq!(first["ts"], 6);
        assert_eq!(first["tf"], 3);
        assert_eq!(first["tn"], "G");
        assert_eq!(first["tl"], "?");
        assert_eq!(first["tc"], "neutral");

        let second: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert!(second["tn"].is_null());
    }
}

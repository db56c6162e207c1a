/// Line-oriented JSON session
///
/// Commands are read one JSON object per line; published player events and
/// command rejections are written back one JSON object per line.
use crate::error::Result;
use cadence_playback::{PlaybackCoordinator, PlayerEvent};
use crossbeam_channel::Receiver;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Reply written when a command cannot be carried out
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommandReply {
    CommandRejected { line: usize, error: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub accepted: usize,
    pub rejected: usize,
}

/// Feed every command line from `input` to the coordinator
///
/// Blank lines and lines starting with `#` are skipped. Returns once `input`
/// is exhausted.
pub fn run_commands<R: BufRead, W: Write>(
    coordinator: &PlaybackCoordinator,
    input: R,
    mut replies: W,
) -> Result<SessionStats> {
    let mut stats = SessionStats::default();

    for (number, line) in input.lines().enumerate() {
        let line = line?;
        let command = line.trim();
        if command.is_empty() || command.starts_with('#') {
            continue;
        }

        match coordinator.dispatch_json(command) {
            Ok(()) => stats.accepted += 1,
            Err(e) => {
                stats.rejected += 1;
                warn!(line = number + 1, error = %e, "command rejected");

                let reply = CommandReply::CommandRejected {
                    line: number + 1,
                    error: e.to_string(),
                };
                writeln!(replies, "{}", serde_json::to_string(&reply)?)?;
                replies.flush()?;
            }
        }
    }

    debug!(accepted = stats.accepted, rejected = stats.rejected, "command input closed");
    Ok(stats)
}

/// Write every event from `events` to `out` on a dedicated thread
///
/// The thread exits when the event hub goes away or `out` fails.
pub fn spawn_event_printer<W: Write + Send + 'static>(
    events: Receiver<PlayerEvent>,
    mut out: W,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("cadence-events-out".to_string())
        .spawn(move || {
            for event in events.iter() {
                let line = match serde_json::to_string(&event) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize event");
                        continue;
                    }
                };
                if let Err(e) = writeln!(out, "{}", line).and_then(|()| out.flush()) {
                    warn!(error = %e, "event output closed");
                    break;
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_playback::{PlaybackConfig, PlaybackPhase};
    use std::io::Cursor;

    struct NullEngine;

    impl cadence_playback::AudioEngine for NullEngine {
        fn open(&mut self, _uri: &str) -> std::result::Result<(), cadence_playback::EngineError> {
            Ok(())
        }
        fn start(&mut self) -> std::result::Result<(), cadence_playback::EngineError> {
            Ok(())
        }
        fn pause(&mut self) -> std::result::Result<(), cadence_playback::EngineError> {
            Ok(())
        }
        fn stop(&mut self) -> std::result::Result<(), cadence_playback::EngineError> {
            Ok(())
        }
        fn seek_to(&mut self, _position_ms: u64) -> std::result::Result<(), cadence_playback::EngineError> {
            Ok(())
        }
        fn is_playing(&self) -> std::result::Result<bool, cadence_playback::EngineError> {
            Ok(false)
        }
        fn current_position(&self) -> std::result::Result<i64, cadence_playback::EngineError> {
            Ok(0)
        }
        fn duration(&self) -> std::result::Result<i64, cadence_playback::EngineError> {
            Ok(0)
        }
    }

    fn coordinator() -> PlaybackCoordinator {
        PlaybackCoordinator::new(Box::new(NullEngine), &PlaybackConfig::default())
    }

    #[test]
    fn commands_are_dispatched_line_by_line() {
        let coordinator = coordinator();
        let input = Cursor::new(
            "# start a playlist\n\
             {\"method\":\"play\",\"playlistId\":7,\"index\":0,\"tracks\":[{\"title\":\"A\",\"uri\":\"/a.mp3\"}]}\n\
             \n\
             {\"method\":\"toggleShuffle\"}\n",
        );
        let mut replies = Vec::new();

        let stats = run_commands(&coordinator, input, &mut replies).unwrap();

        assert_eq!(stats, SessionStats { accepted: 2, rejected: 0 });
        assert!(replies.is_empty());
        assert_eq!(coordinator.phase(), PlaybackPhase::Preparing);
        assert!(coordinator.is_shuffled());
    }

    #[test]
    fn rejected_commands_get_a_reply() {
        let coordinator = coordinator();
        let input = Cursor::new("{\"method\":\"rewind\"}\n{\"method\":\"play\",\"playlistId\":1,\"index\":3,\"tracks\":[]}\n");
        let mut replies = Vec::new();

        let stats = run_commands(&coordinator, input, &mut replies).unwrap();

        assert_eq!(stats.rejected, 2);
        let text = String::from_utf8(replies).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "commandRejected");
        assert_eq!(lines[1]["line"], 2);
    }

    #[test]
    fn printer_writes_one_json_object_per_event() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let buffer = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));

        struct Shared(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let printer = spawn_event_printer(rx, Shared(std::sync::Arc::clone(&buffer))).unwrap();
        tx.send(PlayerEvent::Prepared).unwrap();
        tx.send(PlayerEvent::TrackChanged { track: None }).unwrap();
        drop(tx);
        printer.join().unwrap();

        let text = String::from_utf8(buffer.lock().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![r#"{"type":"prepared"}"#, r#"{"type":"trackChanged","track":null}"#]);
    }
}

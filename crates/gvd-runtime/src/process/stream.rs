//! Merged output reader (non-UTF8-safe).
//!
//! The child's stdout and stderr share one pipe, so the kernel keeps the
//! order of its writes and a single reader sees them as produced.
//!
//! Media tools can emit non-UTF8 bytes (file names, console code pages).
//! Lines are read as bytes and decoded lossily instead of failing the reader.

use std::io::{BufRead, BufReader, Read};

use tokio::sync::mpsc;
use tracing::debug;

use super::runner::OutputLine;

/// Read `pipe` to EOF on a blocking thread, sending each line to `tx`.
///
/// EOF arrives once every copy of the write end is closed, which is when
/// the child (and anything it spawned with the same descriptors) has exited.
pub(super) fn spawn_pipe_reader(
    pipe: impl Read + Send + 'static,
    pid: Option<u32>,
    tx: mpsc::UnboundedSender<OutputLine>,
) {
    tokio::task::spawn_blocking(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let text = String::from_utf8_lossy(&buf).into_owned();
                    // Receiver gone; keep draining so the child never blocks on a full pipe.
                    let _ = tx.send(OutputLine { text });
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(?pid, error = %e, "output reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(?pid, "output reader exiting");
    });
}

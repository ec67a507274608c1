//! Output pumps: one reader thread per child stream
//!
//! A pump reads its stream a line at a time, decodes each line with the
//! protocol codec and posts the resulting event to the surface. The stdout
//! pump also watches for continuation prompts. End of stream and read errors
//! both end the pump quietly; the cause is reported back for logging.

use std::io::{self, BufRead, BufReader, Read};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::protocol::{self, ConsoleColor, OutputEvent};
use crate::surface::SurfaceHandle;

/// Which child stream a pump reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn name(self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpConfig {
    pub stream: StreamKind,
    pub default_color: ConsoleColor,
    /// Arm the continuation gate on lines containing `prompt_marker`
    pub detect_prompt: bool,
    pub prompt_marker: String,
}

impl PumpConfig {
    /// White text, prompt detection on.
    pub fn stdout(prompt_marker: impl Into<String>) -> Self {
        Self {
            stream: StreamKind::Stdout,
            default_color: ConsoleColor::White,
            detect_prompt: true,
            prompt_marker: prompt_marker.into(),
        }
    }

    /// Red text, no prompt detection.
    pub fn stderr() -> Self {
        Self {
            stream: StreamKind::Stderr,
            default_color: ConsoleColor::Red,
            detect_prompt: false,
            prompt_marker: String::new(),
        }
    }
}

/// Why a pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpEnd {
    EndOfStream,
    ReadError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpReport {
    pub stream: StreamKind,
    pub lines: usize,
    pub ended: PumpEnd,
}

/// Lazy sequence of raw lines, decoded lossily as UTF-8 with the line
/// terminator stripped. Stops at end of stream or on the first read error.
pub struct RawLines<R> {
    reader: R,
    buf: Vec<u8>,
    ended: Option<PumpEnd>,
}

impl<R: BufRead> RawLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            ended: None,
        }
    }

    /// How the sequence ended, once it has.
    pub fn ended(&self) -> Option<PumpEnd> {
        self.ended
    }
}

impl<R: BufRead> Iterator for RawLines<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.ended.is_some() {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.ended = Some(PumpEnd::EndOfStream);
                None
            }
            Ok(_) => {
                let line = strip_terminator(&self.buf);
                Some(String::from_utf8_lossy(line).into_owned())
            }
            Err(e) => {
                debug!(error = %e, "Stream read failed");
                self.ended = Some(PumpEnd::ReadError);
                None
            }
        }
    }
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Read `reader` to the end, posting every decoded line to `surface`.
pub fn run_pump<R: BufRead>(reader: R, config: &PumpConfig, surface: &SurfaceHandle) -> PumpReport {
    let mut lines = RawLines::new(reader);
    let mut count = 0usize;

    for raw in lines.by_ref() {
        count += 1;
        let event = protocol::decode(&raw, config.default_color);
        if config.stream == StreamKind::Stderr {
            debug!(target: "SCRIPT", stream = "stderr", "{}", raw);
        }

        let is_text = matches!(event, OutputEvent::TextLine { .. });
        surface.append(event);

        if config.detect_prompt && is_text && protocol::is_continue_prompt(&raw, &config.prompt_marker)
        {
            surface.show_continue(raw);
        }
    }

    PumpReport {
        stream: config.stream,
        lines: count,
        ended: lines.ended().unwrap_or(PumpEnd::EndOfStream),
    }
}

/// Run a pump for `stream` on its own named thread.
pub fn spawn_pump<R>(
    stream: R,
    config: PumpConfig,
    surface: SurfaceHandle,
) -> io::Result<JoinHandle<PumpReport>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("pump-{}", config.stream.name()))
        .spawn(move || {
            let report = run_pump(BufReader::new(stream), &config, &surface);
            if report.ended == PumpEnd::ReadError {
                warn!(stream = report.stream.name(), lines = report.lines, "Pump stopped on read error");
            } else {
                debug!(stream = report.stream.name(), lines = report.lines, "Pump reached end of stream");
            }
            report
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::KeyInput;
    use crate::surface::{RenderSurface, SurfaceOptions, SurfaceUpdate};
    use std::io::Cursor;

    /// Yields its data, then fails instead of reporting end of stream.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")),
                n => Ok(n),
            }
        }
    }

    /// Serves each chunk from one `read` call; `None` is an interrupted read.
    struct ChunkedReader {
        chunks: std::collections::VecDeque<Option<&'static [u8]>>,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                None => Ok(0),
                Some(None) => Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
                Some(Some(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(chunk);
                    Ok(chunk.len())
                }
            }
        }
    }

    fn texts(surface: &RenderSurface) -> Vec<String> {
        surface
            .buffer()
            .lines()
            .map(|line| line.text.to_string())
            .collect()
    }

    #[test]
    fn test_raw_lines_strip_terminators() {
        let input = Cursor::new(b"one\r\ntwo\nthree".to_vec());
        let lines: Vec<String> = RawLines::new(input).collect();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_raw_lines_keep_blank_lines() {
        let input = Cursor::new(b"\n\r\nx\n".to_vec());
        let lines: Vec<String> = RawLines::new(input).collect();
        assert_eq!(lines, vec!["", "", "x"]);
    }

    #[test]
    fn test_raw_lines_decode_invalid_utf8_lossily() {
        let input = Cursor::new(b"caf\xe9\n".to_vec());
        let lines: Vec<String> = RawLines::new(input).collect();
        assert_eq!(lines, vec!["caf\u{fffd}"]);
    }

    #[test]
    fn test_raw_lines_stop_on_read_error() {
        let reader = BufReader::new(FailingReader {
            data: Cursor::new(b"partial\nrest".to_vec()),
        });
        let mut lines = RawLines::new(reader);
        assert_eq!(lines.next().as_deref(), Some("partial"));
        assert_eq!(lines.next(), None);
        assert_eq!(lines.ended(), Some(PumpEnd::ReadError));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_raw_lines_keep_partial_line_across_interrupted_read() {
        let reader = BufReader::new(ChunkedReader {
            chunks: [Some(&b"par"[..]), None, Some(&b"tial\nnext\n"[..])]
                .into_iter()
                .collect(),
        });
        let mut lines = RawLines::new(reader);
        assert_eq!(lines.next().as_deref(), Some("partial"));
        assert_eq!(lines.next().as_deref(), Some("next"));
        assert_eq!(lines.next(), None);
        assert_eq!(lines.ended(), Some(PumpEnd::EndOfStream));
    }

    #[test]
    fn test_stdout_pump_decodes_and_arms_gate() {
        let (mut surface, handle) = RenderSurface::new(SurfaceOptions::default());
        let input = Cursor::new(
            b"TMS_STATUS|Green|1/2\nTMS_STATUS|Green|2/2\nplain\nPress Enter to continue\n".to_vec(),
        );
        let report = run_pump(input, &PumpConfig::stdout("Press Enter"), &handle);
        assert_eq!(
            report,
            PumpReport {
                stream: StreamKind::Stdout,
                lines: 4,
                ended: PumpEnd::EndOfStream,
            }
        );

        surface.drain_pending();
        assert_eq!(texts(&surface), vec!["2/2", "plain", "Press Enter to continue"]);
        assert!(surface.is_awaiting_continue());
    }

    #[test]
    fn test_prompt_is_shown_before_gate_arms() {
        let (mut surface, handle) = RenderSurface::new(SurfaceOptions::default());
        run_pump(
            Cursor::new(b"press enter when ready\n".to_vec()),
            &PumpConfig::stdout("Press Enter"),
            &handle,
        );

        // First command displays the line, second arms the gate
        let first = surface.commands().try_recv().expect("append queued");
        assert_eq!(surface.apply(first), SurfaceUpdate::Content);
        assert!(!surface.is_awaiting_continue());
        let second = surface.commands().try_recv().expect("show continue queued");
        surface.apply(second);
        assert!(surface.is_awaiting_continue());
    }

    #[test]
    fn test_status_directive_with_marker_does_not_arm() {
        let (mut surface, handle) = RenderSurface::new(SurfaceOptions::default());
        run_pump(
            Cursor::new(b"TMS_STATUS|White|Press Enter soon\n".to_vec()),
            &PumpConfig::stdout("Press Enter"),
            &handle,
        );
        surface.drain_pending();
        assert!(!surface.is_awaiting_continue());
    }

    #[test]
    fn test_stderr_pump_never_arms_and_defaults_red() {
        let (mut surface, handle) = RenderSurface::new(SurfaceOptions::default());
        run_pump(
            Cursor::new(b"Press Enter to continue\n".to_vec()),
            &PumpConfig::stderr(),
            &handle,
        );
        surface.drain_pending();
        assert!(!surface.is_awaiting_continue());
        let line = surface.buffer().lines().next().expect("stderr line");
        assert_eq!(line.foreground, ConsoleColor::Red);
        assert_eq!(surface.handle_key(KeyInput::Enter), crate::continuation::KeyDisposition::PassThrough);
    }

    #[test]
    fn test_spawned_pump_reports_on_join() {
        let (mut surface, handle) = RenderSurface::new(SurfaceOptions::default());
        let pump = spawn_pump(
            Cursor::new(b"a\nb\n".to_vec()),
            PumpConfig::stdout("Press Enter"),
            handle,
        )
        .expect("spawn pump thread");
        let report = pump.join().expect("pump thread");
        assert_eq!(report.lines, 2);

        surface.drain_pending();
        assert_eq!(texts(&surface), vec!["a", "b"]);
    }

    #[test]
    fn test_pump_keeps_running_after_surface_is_gone() {
        let (surface, handle) = RenderSurface::new(SurfaceOptions::default());
        drop(surface);
        let report = run_pump(
            Cursor::new(b"x\ny\nz\n".to_vec()),
            &PumpConfig::stdout("Press Enter"),
            &handle,
        );
        assert_eq!(report.lines, 3);
    }
}

//! Console front end
//!
//! Drives a `RenderSurface` on the calling thread without a window. Each
//! content change is echoed as a line to the given writer; a status overwrite
//! is echoed as a fresh line. Lines typed on stdin count as Enter presses.

use std::io::{self, BufRead, Write};
use std::thread;

use tracing::{debug, info};

use crate::continuation::KeyInput;
use crate::error::{HostError, ResultExt};
use crate::supervisor::{LaunchSpec, ProcessSupervisor, SessionOutcome};
use crate::surface::{RenderSurface, SurfaceHandle, SurfaceUpdate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessOptions {
    /// Read stdin on a background thread and post each line as an Enter press
    pub forward_stdin: bool,
    /// Release every continuation prompt immediately
    pub auto_continue: bool,
}

#[derive(Debug)]
pub struct HeadlessReport {
    pub outcome: SessionOutcome,
    /// Every line echoed, in order
    pub transcript: Vec<String>,
    /// Buffer contents when the session ended
    pub final_lines: Vec<String>,
}

/// Echoes the tail of the buffer each time the buffer changes.
struct ConsoleEcho<W> {
    out: W,
    revision: u64,
    transcript: Vec<String>,
}

impl<W: Write> ConsoleEcho<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            revision: 0,
            transcript: Vec::new(),
        }
    }

    fn refresh(&mut self, surface: &RenderSurface) -> io::Result<()> {
        let buffer = surface.buffer();
        if buffer.revision() == self.revision {
            return Ok(());
        }
        self.revision = buffer.revision();

        // A clear leaves nothing to echo
        if let Some(tail) = buffer.lines().last() {
            writeln!(self.out, "{}", tail.text)?;
            self.out.flush()?;
            self.transcript.push(tail.text.to_string());
        }
        Ok(())
    }
}

/// Forward stdin lines as Enter presses until stdin closes or the surface is gone.
fn spawn_stdin_forwarder(handle: SurfaceHandle) -> io::Result<()> {
    thread::Builder::new()
        .name("stdin-keys".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                if line.is_err() || !handle.key(KeyInput::Enter) {
                    break;
                }
            }
            debug!("Stdin forwarder finished");
        })
        .map(|_| ())
}

/// Run one session to completion, echoing output to `out`.
///
/// A `launch` error is reported like a failed spawn: one red line, then the
/// session ends.
pub fn run<W: Write>(
    mut surface: RenderSurface,
    handle: SurfaceHandle,
    supervisor: ProcessSupervisor,
    launch: Result<LaunchSpec, HostError>,
    options: HeadlessOptions,
    out: W,
) -> io::Result<HeadlessReport> {
    if options.forward_stdin {
        spawn_stdin_forwarder(handle.clone()).warn_on_err();
    }

    // A failed start leaves the session open; nobody is watching here, so end it
    let ender = handle;
    let session = thread::Builder::new()
        .name("supervisor".to_string())
        .spawn(move || {
            let outcome = supervisor.start_launch(launch);
            if matches!(outcome, SessionOutcome::StartupFailed(_)) {
                ender.end_session();
            }
            outcome
        })?;

    let mut echo = ConsoleEcho::new(out);
    let mut write_error = None;
    surface.run_until_ended(|surface, update| {
        match update {
            SurfaceUpdate::Content => {
                if let Err(e) = echo.refresh(surface) {
                    if write_error.is_none() {
                        write_error = Some(e);
                    }
                }
            }
            SurfaceUpdate::Title => info!(title = %surface.title(), "Title changed"),
            _ => {}
        }
        if options.auto_continue && surface.is_awaiting_continue() {
            surface.handle_key(KeyInput::Enter);
        }
    });

    let outcome = session
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "supervisor thread panicked"))?;
    if let Some(e) = write_error {
        return Err(e);
    }

    Ok(HeadlessReport {
        outcome,
        transcript: echo.transcript,
        final_lines: surface
            .buffer()
            .lines()
            .map(|line| line.text.to_string())
            .collect(),
    })
}

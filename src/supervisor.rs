//! Process supervisor: runs one child and bridges it to the surface
//!
//! `ProcessSupervisor::start` consumes the supervisor, so each instance hosts
//! exactly one child. The sequence is fixed:
//!
//! 1. resolve and spawn the program with piped stdio and no console window
//! 2. bind the resume and close actions on the surface
//! 3. start the stdout and stderr pumps
//! 4. wait for exit, join both pumps
//! 5. post `ProcessExited`, then `EndSession`
//!
//! A startup failure is reported as a single red line; no pumps are started
//! and the session is left open for the front end to decide.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::config::InterpreterConfig;
use crate::error::{HostError, Result, ResultExt};
use crate::logging;
use crate::protocol::{ConsoleColor, OutputEvent, DEFAULT_PROMPT_MARKER};
use crate::pump::{spawn_pump, PumpConfig, PumpReport};
use crate::surface::SurfaceHandle;

/// Environment variable telling the hosted script it runs under the window host.
pub const HOST_UI_ENV: &str = "TMS_HOST_UI";
pub const HOST_UI_VALUE: &str = "gui";

/// Grace period after SIGTERM before escalating to SIGKILL (milliseconds)
const TERM_GRACE_MS: u64 = 250;
/// How often to check if the process group has exited during the grace period
const POLL_INTERVAL_MS: u64 = 25;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[cfg(unix)]
mod unix_process {
    use libc::{c_int, pid_t, ESRCH};

    /// Send a signal to a process group (negative PID targets the group)
    pub fn kill_process_group(pgid: u32, signal: c_int) -> Result<(), &'static str> {
        // Safety: kill() is a plain syscall with no memory safety concerns
        let rc = unsafe { libc::kill(-(pgid as pid_t), signal) };
        if rc == 0 {
            Ok(())
        } else {
            let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
            match errno {
                libc::ESRCH => Err("No such process group"),
                libc::EPERM => Err("Permission denied"),
                libc::EINVAL => Err("Invalid signal"),
                _ => Err("Unknown error"),
            }
        }
    }

    /// Whether any process in the group is alive. EPERM counts as alive.
    pub fn process_group_alive(pgid: u32) -> bool {
        // Safety: signal 0 only checks existence
        let rc = unsafe { libc::kill(-(pgid as pid_t), 0) };
        if rc == 0 {
            true
        } else {
            let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
            errno != ESRCH
        }
    }

    pub const SIGTERM: c_int = libc::SIGTERM;
    pub const SIGKILL: c_int = libc::SIGKILL;
}

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Bare name (looked up on the search path) or a path
    pub program: OsString,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(OsString, OsString)>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Launch `script` with the configured interpreter.
    ///
    /// The script must exist. It runs from its own directory with
    /// `TMS_HOST_UI=gui` set.
    pub fn for_script(interpreter: &InterpreterConfig, script: &Path) -> Result<Self> {
        let script = if script.is_absolute() {
            script.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(script))
                .unwrap_or_else(|_| script.to_path_buf())
        };
        if !script.is_file() {
            return Err(HostError::ScriptNotFound { path: script });
        }

        let program = resolve_interpreter(interpreter)?;
        let mut spec = LaunchSpec::new(program)
            .args(interpreter.args.iter())
            .arg(script.as_os_str())
            .env(HOST_UI_ENV, HOST_UI_VALUE);
        if let Some(dir) = script.parent() {
            spec = spec.working_dir(dir);
        }
        Ok(spec)
    }

    fn display_program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// First configured interpreter found on the search path.
pub fn resolve_interpreter(config: &InterpreterConfig) -> Result<PathBuf> {
    let candidates = config.candidates();
    for name in &candidates {
        match which::which(name) {
            Ok(path) => {
                debug!(interpreter = %name, path = %path.display(), "Resolved interpreter");
                return Ok(path);
            }
            Err(e) => debug!(interpreter = %name, error = %e, "Interpreter not on search path"),
        }
    }
    Err(HostError::InterpreterNotFound {
        tried: candidates.iter().map(|name| name.to_string()).collect(),
    })
}

/// Search path lookup for bare names; existence check for paths.
fn resolve_program(program: &OsString) -> Result<PathBuf> {
    let path = Path::new(program);
    let not_found = |detail: String| HostError::Spawn {
        program: program.to_string_lossy().into_owned(),
        source: io::Error::new(io::ErrorKind::NotFound, detail),
    };

    if path.components().count() > 1 || path.is_absolute() {
        if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(not_found("no such file".to_string()))
        }
    } else {
        which::which(path).map_err(|e| not_found(e.to_string()))
    }
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The child ran and exited. `None` when it was ended by a signal.
    Exited { exit_code: Option<i32> },
    StartupFailed(HostError),
}

impl SessionOutcome {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SessionOutcome::Exited { exit_code } => *exit_code,
            SessionOutcome::StartupFailed(_) => None,
        }
    }
}

/// Shared state behind the resume and close actions.
#[derive(Debug)]
struct ProcessControl {
    pid: u32,
    stdin: Mutex<Option<ChildStdin>>,
    running: AtomicBool,
    killed: AtomicBool,
    exit_code: OnceLock<Option<i32>>,
}

impl ProcessControl {
    /// Feed one blank line to the child. Errors are swallowed.
    fn resume(&self) {
        if !self.running.load(Ordering::SeqCst) {
            debug!(pid = self.pid, "Resume after exit ignored");
            return;
        }
        let mut stdin = self.stdin.lock();
        if let Some(stdin) = stdin.as_mut() {
            stdin
                .write_all(b"\n")
                .and_then(|_| stdin.flush())
                .warn_on_err();
        }
    }

    /// Terminate the whole process tree. Errors are swallowed.
    fn terminate(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        if self.killed.swap(true, Ordering::SeqCst) {
            debug!(pid = self.pid, "Process already being terminated");
            return;
        }
        kill_process_tree(self.pid);
    }

    fn mark_exited(&self, exit_code: Option<i32>) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.exit_code.set(exit_code);
        // Close our end so nothing more is written to a dead pipe
        self.stdin.lock().take();
    }
}

/// Handle to the running child: pid, stdin, running flag and exit code.
#[derive(Debug, Clone)]
pub struct ChildProcessHandle {
    control: Arc<ProcessControl>,
}

impl ChildProcessHandle {
    fn new(pid: u32, stdin: ChildStdin) -> Self {
        Self {
            control: Arc::new(ProcessControl {
                pid,
                stdin: Mutex::new(Some(stdin)),
                running: AtomicBool::new(true),
                killed: AtomicBool::new(false),
                exit_code: OnceLock::new(),
            }),
        }
    }

    pub fn pid(&self) -> u32 {
        self.control.pid
    }

    pub fn is_running(&self) -> bool {
        self.control.running.load(Ordering::SeqCst)
    }

    /// Exit code once the child has exited (`Some(None)` for a signal).
    pub fn exit_code(&self) -> Option<Option<i32>> {
        self.control.exit_code.get().copied()
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn terminate(&self) {
        self.control.terminate();
    }
}

/// Kill the process group with graceful escalation (Unix) or the process tree via taskkill (Windows)
fn kill_process_tree(pid: u32) {
    #[cfg(unix)]
    {
        use unix_process::{kill_process_group, process_group_alive, SIGKILL, SIGTERM};

        // Spawned with process_group(0): the PGID equals the PID
        let pgid = pid;
        match kill_process_group(pgid, SIGTERM) {
            Ok(()) => debug!(pgid, "SIGTERM sent"),
            Err("No such process group") => {
                debug!(pgid, "Process group already exited");
                return;
            }
            Err(e) => warn!(pgid, error = e, "Failed to send SIGTERM"),
        }

        let start = std::time::Instant::now();
        let grace = std::time::Duration::from_millis(TERM_GRACE_MS);
        let poll = std::time::Duration::from_millis(POLL_INTERVAL_MS);
        while start.elapsed() < grace {
            if !process_group_alive(pgid) {
                info!(pgid, "Process group terminated after SIGTERM");
                return;
            }
            thread::sleep(poll);
        }

        info!(pgid, grace_ms = TERM_GRACE_MS, "Process group still alive, escalating to SIGKILL");
        match kill_process_group(pgid, SIGKILL) {
            Ok(()) => info!(pgid, "Process group killed"),
            Err("No such process group") => debug!(pgid, "Process group exited just before SIGKILL"),
            Err(e) => warn!(pgid, error = e, "SIGKILL failed"),
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;

        let pid_arg = pid.to_string();
        let status = Command::new("taskkill")
            .args(["/T", "/F", "/PID", pid_arg.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .creation_flags(CREATE_NO_WINDOW)
            .status();
        match status {
            Ok(status) => info!(pid, success = status.success(), "taskkill finished"),
            Err(e) => warn!(pid, error = %e, "taskkill failed"),
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        warn!(pid, "Process tree termination not supported on this platform");
    }
}

pub struct ProcessSupervisor {
    surface: SurfaceHandle,
    prompt_marker: String,
}

impl ProcessSupervisor {
    pub fn new(surface: SurfaceHandle) -> Self {
        Self {
            surface,
            prompt_marker: DEFAULT_PROMPT_MARKER.to_string(),
        }
    }

    pub fn with_prompt_marker(mut self, marker: impl Into<String>) -> Self {
        self.prompt_marker = marker.into();
        self
    }

    /// Run `start` on a dedicated thread.
    pub fn spawn(self, spec: LaunchSpec) -> io::Result<JoinHandle<SessionOutcome>> {
        thread::Builder::new()
            .name("supervisor".to_string())
            .spawn(move || self.start(spec))
    }

    /// `start` when a launch spec could be built; otherwise report the
    /// launch error exactly like a failed spawn.
    pub fn start_launch(self, launch: Result<LaunchSpec>) -> SessionOutcome {
        match launch {
            Ok(spec) => self.start(spec),
            Err(e) => self.startup_failed(e),
        }
    }

    /// Run the child to completion. Blocks until it exits and both pumps drain.
    #[instrument(skip_all, fields(program = %spec.display_program()))]
    pub fn start(self, spec: LaunchSpec) -> SessionOutcome {
        let (mut child, stdin) = match launch(&spec) {
            Ok(launched) => launched,
            Err(e) => return self.startup_failed(e),
        };

        let pid = child.id();
        let handle = ChildProcessHandle::new(pid, stdin);
        logging::log("EXEC", &format!("Process spawned with PID: {} (PGID: {})", pid, pid));

        let resume = handle.clone();
        self.surface.bind_resume(Box::new(move || resume.resume()));
        let close = handle.clone();
        self.surface
            .bind_close_handler(Box::new(move || close.terminate()));

        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.extend(
                spawn_pump(stdout, PumpConfig::stdout(&self.prompt_marker), self.surface.clone())
                    .log_err(),
            );
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.extend(spawn_pump(stderr, PumpConfig::stderr(), self.surface.clone()).log_err());
        }

        let exit_code = match child.wait() {
            Ok(status) => status.code(),
            Err(e) => {
                warn!(pid, error = %e, "Failed to wait for child");
                None
            }
        };
        handle.control.mark_exited(exit_code);
        info!(pid, exit_code = ?exit_code, "Child exited");

        for pump in pumps {
            match pump.join() {
                Ok(PumpReport { stream, lines, ended }) => {
                    debug!(stream = stream.name(), lines, ended = ?ended, "Pump drained")
                }
                Err(_) => error!("Pump thread panicked"),
            }
        }

        self.surface.process_exited(exit_code);
        self.surface.end_session();
        SessionOutcome::Exited { exit_code }
    }

    fn startup_failed(&self, e: HostError) -> SessionOutcome {
        error!(error = %e, "Startup failed");
        self.surface
            .append(OutputEvent::text(e.user_message(), ConsoleColor::Red));
        SessionOutcome::StartupFailed(e)
    }
}

/// Spawn the child with piped stdio in its own process group (Unix) or
/// without a console window (Windows).
fn launch(spec: &LaunchSpec) -> Result<(Child, ChildStdin)> {
    let program = resolve_program(&spec.program)?;
    debug!(program = %program.display(), args = ?spec.args, "Spawning child process");

    let mut command = Command::new(&program);
    command
        .args(&spec.args)
        .envs(spec.env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    let mut child = command.spawn().map_err(|source| HostError::Spawn {
        program: program.display().to_string(),
        source,
    })?;

    let Some(stdin) = child.stdin.take() else {
        child.kill().warn_on_err();
        child.wait().warn_on_err();
        return Err(HostError::MissingPipe("stdin"));
    };
    if child.stdout.is_none() || child.stderr.is_none() {
        child.kill().warn_on_err();
        child.wait().warn_on_err();
        return Err(HostError::MissingPipe("output"));
    }
    Ok((child, stdin))
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;

// No console window behind the host window on Windows
#![cfg_attr(all(windows, feature = "gui"), windows_subsystem = "windows")]

use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use tms_host::config::{self, HostConfig};
use tms_host::headless::{self, HeadlessOptions};
use tms_host::logging;
use tms_host::supervisor::{LaunchSpec, ProcessSupervisor, SessionOutcome};
use tms_host::surface::{RenderSurface, SurfaceOptions};

#[derive(Parser, Debug)]
#[command(name = "tms-host", version, about = "Run a script in a fixed-size console window")]
struct Cli {
    /// Script to run
    script: PathBuf,

    /// Grid width in characters
    #[arg(long)]
    columns: Option<u16>,

    /// Grid height in lines
    #[arg(long)]
    rows: Option<u16>,

    /// Initial window title
    #[arg(long)]
    title: Option<String>,

    /// Config file (default: ~/.tms-host/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interpreter to run the script with, instead of the configured ones
    #[arg(long)]
    interpreter: Option<String>,

    /// Echo output to this console instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Headless only: answer every continuation prompt immediately
    #[arg(long, requires = "headless")]
    auto_continue: bool,
}

impl Cli {
    /// CLI values win over the config file.
    fn apply_overrides(&self, config: &mut HostConfig) {
        if let Some(columns) = self.columns {
            config.columns = columns;
        }
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(title) = &self.title {
            config.title = title.clone();
        }
        if let Some(interpreter) = &self.interpreter {
            config.interpreter.preferred = interpreter.clone();
            config.interpreter.fallback = None;
        }
    }
}

fn surface_options(config: &HostConfig) -> SurfaceOptions {
    SurfaceOptions {
        title: config.title.clone(),
        columns: config.columns.max(1),
        rows: config.rows.max(1),
        font_family: config.font.family.clone(),
        font_sizes: config.font.sizes(),
        max_retained_lines: config.max_retained_lines,
        ..SurfaceOptions::default()
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("tms-host: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

/// Returns the process exit code. The logging guard is dropped (and flushed) on return.
fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    let _guard = logging::init();

    let mut config = config::load_config(cli.config.as_deref());
    cli.apply_overrides(&mut config);
    info!(
        script = %cli.script.display(),
        columns = config.columns,
        rows = config.rows,
        headless = cli.headless,
        "Starting host"
    );
    logging::log_session_event("starting", &cli.script.to_string_lossy(), None);

    let launch = LaunchSpec::for_script(&config.interpreter, &cli.script);

    #[cfg(feature = "gui")]
    if !cli.headless {
        tms_host::window::run(tms_host::window::WindowSession {
            surface: surface_options(&config),
            launch,
            prompt_marker: config.prompt_marker.clone(),
        })?;
        logging::log_session_event("closed", &cli.script.to_string_lossy(), None);
        return Ok(0);
    }

    let (surface, handle) = RenderSurface::new(surface_options(&config));
    let supervisor =
        ProcessSupervisor::new(handle.clone()).with_prompt_marker(config.prompt_marker.clone());
    let report = headless::run(
        surface,
        handle,
        supervisor,
        launch,
        HeadlessOptions {
            forward_stdin: !cli.auto_continue,
            auto_continue: cli.auto_continue,
        },
        io::stdout().lock(),
    )?;

    let script = cli.script.to_string_lossy();
    match report.outcome {
        SessionOutcome::Exited { exit_code } => {
            logging::log_session_event("exited", &script, exit_code);
            Ok(exit_code.unwrap_or(1))
        }
        SessionOutcome::StartupFailed(e) => {
            error!(error = %e, severity = ?e.severity(), "Session failed to start");
            logging::log_session_event("startup_failed", &script, None);
            Ok(1)
        }
    }
}

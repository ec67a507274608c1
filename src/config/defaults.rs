//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Default window title
pub const DEFAULT_TITLE: &str = "Script Host";

/// Default fixed grid
pub const DEFAULT_COLUMNS: u16 = 120;
pub const DEFAULT_ROWS: u16 = 30;

/// Default font family and size sequence (points)
pub const DEFAULT_FONT_FAMILY: &str = "Consolas";
pub const DEFAULT_FONT_MAX_SIZE: f32 = 10.0;
pub const DEFAULT_FONT_MIN_SIZE: f32 = 6.0;
pub const DEFAULT_FONT_STEP: f32 = 0.5;

/// Default script interpreter, tried in order
pub const DEFAULT_INTERPRETER: &str = "pwsh";
pub const DEFAULT_INTERPRETER_FALLBACK: &str = "powershell";
pub const DEFAULT_INTERPRETER_ARGS: &[&str] = &["-NoProfile", "-ExecutionPolicy", "Bypass", "-File"];

/// Substring that marks a continuation prompt on stdout
pub const DEFAULT_PROMPT_MARKER: &str = crate::protocol::DEFAULT_PROMPT_MARKER;

/// Lines kept in the display buffer
pub const DEFAULT_MAX_RETAINED_LINES: usize = crate::surface::DEFAULT_MAX_RETAINED_LINES;

/// Config file location, relative to the home directory
pub const CONFIG_PATH: &str = "~/.tms-host/config.json";

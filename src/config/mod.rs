//! Configuration module - host settings
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.tms-host/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions (HostConfig, FontConfig, InterpreterConfig)
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{DEFAULT_COLUMNS, DEFAULT_ROWS};

pub use types::{FontConfig, HostConfig, InterpreterConfig};

pub use loader::{default_config_path, load_config, parse_config};

#[cfg(test)]
pub use defaults::{
    DEFAULT_FONT_FAMILY, DEFAULT_INTERPRETER, DEFAULT_INTERPRETER_FALLBACK,
    DEFAULT_MAX_RETAINED_LINES, DEFAULT_PROMPT_MARKER,
};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

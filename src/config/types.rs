//! Configuration type definitions

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::font_fit::SizeSequence;

/// Monospace font used for the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontConfig {
    #[serde(default = "default_font_family")]
    pub family: String,
    #[serde(default = "default_font_max_size")]
    pub max_size: f32,
    #[serde(default = "default_font_min_size")]
    pub min_size: f32,
    #[serde(default = "default_font_step")]
    pub step: f32,
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}
fn default_font_max_size() -> f32 {
    DEFAULT_FONT_MAX_SIZE
}
fn default_font_min_size() -> f32 {
    DEFAULT_FONT_MIN_SIZE
}
fn default_font_step() -> f32 {
    DEFAULT_FONT_STEP
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: default_font_family(),
            max_size: DEFAULT_FONT_MAX_SIZE,
            min_size: DEFAULT_FONT_MIN_SIZE,
            step: DEFAULT_FONT_STEP,
        }
    }
}

impl FontConfig {
    pub fn sizes(&self) -> SizeSequence {
        SizeSequence {
            max_size: self.max_size,
            min_size: self.min_size,
            step: self.step,
        }
    }
}

/// Program that runs the hosted script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpreterConfig {
    #[serde(default = "default_interpreter")]
    pub preferred: String,
    /// Tried when `preferred` is not on the search path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// Arguments placed before the script path
    #[serde(default = "default_interpreter_args")]
    pub args: Vec<String>,
}

fn default_interpreter() -> String {
    DEFAULT_INTERPRETER.to_string()
}
fn default_interpreter_args() -> Vec<String> {
    DEFAULT_INTERPRETER_ARGS
        .iter()
        .map(|arg| arg.to_string())
        .collect()
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            preferred: default_interpreter(),
            fallback: Some(DEFAULT_INTERPRETER_FALLBACK.to_string()),
            args: default_interpreter_args(),
        }
    }
}

impl InterpreterConfig {
    /// Candidate programs in lookup order.
    pub fn candidates(&self) -> Vec<&str> {
        std::iter::once(self.preferred.as_str())
            .chain(self.fallback.as_deref())
            .filter(|name| !name.trim().is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_columns")]
    pub columns: u16,
    #[serde(default = "default_rows")]
    pub rows: u16,
    #[serde(default)]
    pub font: FontConfig,
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    #[serde(default = "default_prompt_marker")]
    pub prompt_marker: String,
    #[serde(default = "default_max_retained_lines")]
    pub max_retained_lines: usize,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}
fn default_columns() -> u16 {
    DEFAULT_COLUMNS
}
fn default_rows() -> u16 {
    DEFAULT_ROWS
}
fn default_prompt_marker() -> String {
    DEFAULT_PROMPT_MARKER.to_string()
}
fn default_max_retained_lines() -> usize {
    DEFAULT_MAX_RETAINED_LINES
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            font: FontConfig::default(),
            interpreter: InterpreterConfig::default(),
            prompt_marker: default_prompt_marker(),
            max_retained_lines: DEFAULT_MAX_RETAINED_LINES,
        }
    }
}

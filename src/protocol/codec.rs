//! Decoding of single output lines into display events
//!
//! `decode` is total: every input line maps to some `OutputEvent`. A line
//! with a recognized prefix but a malformed payload is shown as plain text.

use super::types::{ConsoleColor, OutputEvent};

pub const CLEAR_DIRECTIVE: &str = "TMS_CLEAR";
pub const COLOR_PREFIX: &str = "TMS_COLOR|";
pub const STATUS_PREFIX: &str = "TMS_STATUS|";
pub const TITLE_PREFIX: &str = "TMS_TITLE|";

/// Marker that makes a stdout line arm the continuation gate.
pub const DEFAULT_PROMPT_MARKER: &str = "Press Enter";

/// Decode one line (without its line terminator) into a display event.
///
/// `default_color` is the stream's color: used for plain text and for
/// directives naming an unknown color.
pub fn decode(line: &str, default_color: ConsoleColor) -> OutputEvent {
    if line == CLEAR_DIRECTIVE {
        return OutputEvent::ClearScreen;
    }

    if let Some((color, text)) = line.strip_prefix(COLOR_PREFIX).and_then(split_payload) {
        return OutputEvent::TextLine {
            content: text.to_string(),
            foreground: map_color(color, default_color),
            background: ConsoleColor::Black,
            centered: false,
        };
    }

    if let Some((color, text)) = line.strip_prefix(STATUS_PREFIX).and_then(split_payload) {
        return OutputEvent::StatusLine {
            content: text.to_string(),
            foreground: map_color(color, default_color),
            centered: true,
        };
    }

    if let Some(title) = line.strip_prefix(TITLE_PREFIX) {
        return OutputEvent::TitleChange {
            text: title.to_string(),
        };
    }

    OutputEvent::text(line, default_color)
}

/// Case-insensitive palette lookup falling back to `default_color`.
pub fn map_color(name: &str, default_color: ConsoleColor) -> ConsoleColor {
    ConsoleColor::from_name(name).unwrap_or(default_color)
}

/// Whether `raw_line` asks the user to press a key (case-insensitive substring match).
pub fn is_continue_prompt(raw_line: &str, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    raw_line
        .to_lowercase()
        .contains(&marker.to_lowercase())
}

fn split_payload(rest: &str) -> Option<(&str, &str)> {
    rest.split_once('|')
}

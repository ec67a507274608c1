//! Protocol types: the console color palette and decoded display events.

use serde::{Deserialize, Serialize};

/// The 16-color console palette scripts can name in directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkCyan,
    DarkRed,
    DarkMagenta,
    DarkYellow,
    Gray,
    DarkGray,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Yellow,
    White,
}

impl ConsoleColor {
    /// Every palette entry, in console index order.
    pub const ALL: [ConsoleColor; 16] = [
        ConsoleColor::Black,
        ConsoleColor::DarkBlue,
        ConsoleColor::DarkGreen,
        ConsoleColor::DarkCyan,
        ConsoleColor::DarkRed,
        ConsoleColor::DarkMagenta,
        ConsoleColor::DarkYellow,
        ConsoleColor::Gray,
        ConsoleColor::DarkGray,
        ConsoleColor::Blue,
        ConsoleColor::Green,
        ConsoleColor::Cyan,
        ConsoleColor::Red,
        ConsoleColor::Magenta,
        ConsoleColor::Yellow,
        ConsoleColor::White,
    ];

    /// Canonical name as written in directives.
    pub fn name(self) -> &'static str {
        match self {
            ConsoleColor::Black => "Black",
            ConsoleColor::DarkBlue => "DarkBlue",
            ConsoleColor::DarkGreen => "DarkGreen",
            ConsoleColor::DarkCyan => "DarkCyan",
            ConsoleColor::DarkRed => "DarkRed",
            ConsoleColor::DarkMagenta => "DarkMagenta",
            ConsoleColor::DarkYellow => "DarkYellow",
            ConsoleColor::Gray => "Gray",
            ConsoleColor::DarkGray => "DarkGray",
            ConsoleColor::Blue => "Blue",
            ConsoleColor::Green => "Green",
            ConsoleColor::Cyan => "Cyan",
            ConsoleColor::Red => "Red",
            ConsoleColor::Magenta => "Magenta",
            ConsoleColor::Yellow => "Yellow",
            ConsoleColor::White => "White",
        }
    }

    /// Case-insensitive lookup by name. Surrounding whitespace is ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|color| color.name().eq_ignore_ascii_case(name))
    }

    /// 0xRRGGBB value from the classic console palette.
    pub fn rgb(self) -> u32 {
        match self {
            ConsoleColor::Black => 0x000000,
            ConsoleColor::DarkBlue => 0x000080,
            ConsoleColor::DarkGreen => 0x008000,
            ConsoleColor::DarkCyan => 0x008080,
            ConsoleColor::DarkRed => 0x800000,
            ConsoleColor::DarkMagenta => 0x800080,
            ConsoleColor::DarkYellow => 0x808000,
            ConsoleColor::Gray => 0xC0C0C0,
            ConsoleColor::DarkGray => 0x808080,
            ConsoleColor::Blue => 0x0000FF,
            ConsoleColor::Green => 0x00FF00,
            ConsoleColor::Cyan => 0x00FFFF,
            ConsoleColor::Red => 0xFF0000,
            ConsoleColor::Magenta => 0xFF00FF,
            ConsoleColor::Yellow => 0xFFFF00,
            ConsoleColor::White => 0xFFFFFF,
        }
    }
}

/// A decoded output line, ready to be applied to the render surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Append a line at the tail of the buffer
    TextLine {
        content: String,
        foreground: ConsoleColor,
        background: ConsoleColor,
        centered: bool,
    },
    /// Write or overwrite the status line region
    StatusLine {
        content: String,
        foreground: ConsoleColor,
        centered: bool,
    },
    /// Empty the buffer and forget the status region
    ClearScreen,
    /// Change the window title
    TitleChange { text: String },
}

impl OutputEvent {
    /// A left-aligned line on the default black background.
    pub fn text(content: impl Into<String>, foreground: ConsoleColor) -> Self {
        OutputEvent::TextLine {
            content: content.into(),
            foreground,
            background: ConsoleColor::Black,
            centered: false,
        }
    }

    /// Short variant name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutputEvent::TextLine { .. } => "text",
            OutputEvent::StatusLine { .. } => "status",
            OutputEvent::ClearScreen => "clear",
            OutputEvent::TitleChange { .. } => "title",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(ConsoleColor::from_name("red"), Some(ConsoleColor::Red));
        assert_eq!(ConsoleColor::from_name("DARKYELLOW"), Some(ConsoleColor::DarkYellow));
        assert_eq!(ConsoleColor::from_name(" Cyan "), Some(ConsoleColor::Cyan));
        assert_eq!(ConsoleColor::from_name("Orange"), None);
        assert_eq!(ConsoleColor::from_name(""), None);
    }

    #[test]
    fn test_every_palette_name_resolves_to_itself() {
        for color in ConsoleColor::ALL {
            assert_eq!(ConsoleColor::from_name(color.name()), Some(color));
            assert_eq!(
                ConsoleColor::from_name(&color.name().to_lowercase()),
                Some(color)
            );
        }
    }

    #[test]
    fn test_palette_values_are_distinct() {
        let mut values: Vec<u32> = ConsoleColor::ALL.iter().map(|c| c.rgb()).collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), 16);
    }
}

//! Line protocol spoken by hosted scripts
//!
//! Scripts print ordinary text to stdout/stderr. A handful of prefixed lines
//! are interpreted as display directives instead of being shown verbatim.
//!
//! # Directives
//!
//! - `TMS_CLEAR`: clear the display
//! - `TMS_COLOR|<Color>|<text>`: append `text` in the named console color
//! - `TMS_STATUS|<Color>|<text>`: write (or overwrite) the centered status line
//! - `TMS_TITLE|<text>`: change the window title
//!
//! Anything else, including a directive with a malformed payload, is shown as
//! plain text in the stream's default color.
//!
//! # Module Structure
//!
//! - `types`: `ConsoleColor` palette and the `OutputEvent` enum
//! - `codec`: `decode()` and the continuation prompt heuristic

mod codec;
mod types;

pub use codec::*;
pub use types::*;

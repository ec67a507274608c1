#![allow(unexpected_cfgs)]

//! tms-host - hosts a long-running script in a fixed-size console window
//!
//! The child's stdout and stderr are read line by line, decoded through a
//! small out-of-band protocol (`TMS_CLEAR`, `TMS_COLOR|..`, `TMS_STATUS|..`,
//! `TMS_TITLE|..`) and rendered on a fixed character grid. A stdout line
//! asking the user to press Enter pauses until Enter is pressed, then feeds a
//! blank line to the child.

pub mod config;
pub mod continuation;
pub mod error;
pub mod font_fit;
pub mod headless;
pub mod logging;
pub mod platform;
pub mod protocol;
pub mod pump;
pub mod supervisor;
pub mod surface;

// gpui window front end
#[cfg(feature = "gui")]
pub mod window;

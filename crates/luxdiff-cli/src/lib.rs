//! luxdiff CLI library.
//!
//! The binary in `main.rs` only parses arguments; everything it dispatches
//! to lives here so the commands stay unit-testable.

pub mod commands;
pub mod input;
pub mod oiio;
pub mod paths;

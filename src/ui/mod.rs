//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and log initialization
//! - [`progress`] - Download progress counter
//! - [`prompts`] - Masked token prompt
//!
//! # Design
//!
//! All terminal interaction goes through this module so quiet mode and
//! non-interactive sessions are handled in one place.

pub mod output;
pub mod progress;
pub mod prompts;

//! ui::prompts
//!
//! Interactive prompts.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode. In non-interactive mode,
//! operations requiring user input must either have defaults or fail
//! with a clear error message.

use std::io::IsTerminal;

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Whether stdin is attached to a terminal.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// Prompt for masked input (e.g., tokens).
///
/// The input is not echoed to the terminal. Surrounding whitespace is
/// trimmed; an empty answer counts as cancellation.
pub fn password(message: &str, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }

    let answer = rpassword::prompt_password(message)
        .map_err(|e| PromptError::IoError(e.to_string()))?;
    let answer = answer.trim();

    if answer.is_empty() {
        return Err(PromptError::Cancelled);
    }

    Ok(answer.to_string())
}

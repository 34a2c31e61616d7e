//! The interactive surface between the resolver and a human.
//!
//! The resolver never reads the terminal directly. Everything it needs from
//! the operator goes through [`Operator`], which [`TerminalOperator`]
//! implements on top of `dialoguer`.

use dialoguer::console::Term;
use dialoguer::{Input, Password};

use crate::error::{ConfigError, Result};

/// Asks the operator for values and tells them what is happening.
pub trait Operator: Send + Sync {
    /// Reads one line of visible input.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Prompt`] if the terminal cannot be read.
    fn prompt_line(&self, prompt: &str) -> Result<String>;

    /// Reads one line of input without echoing it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Prompt`] if the terminal cannot be read.
    fn prompt_secret(&self, prompt: &str) -> Result<String>;

    /// Shows `message` and waits until the operator presses a key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Prompt`] if the terminal cannot be read.
    fn acknowledge(&self, message: &str) -> Result<()>;

    /// Shows `message`.
    fn notify(&self, message: &str);
}

/// An [`Operator`] backed by the controlling terminal.
///
/// Prompts and messages go to stderr so that stdout stays machine-readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalOperator;

impl TerminalOperator {
    /// Creates a terminal operator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn prompt_error(what: &str, source: dialoguer::Error) -> ConfigError {
    ConfigError::Prompt {
        what: what.to_string(),
        source: std::io::Error::other(source),
    }
}

impl Operator for TerminalOperator {
    fn prompt_line(&self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| prompt_error(prompt, e))
    }

    fn prompt_secret(&self, prompt: &str) -> Result<String> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| prompt_error(prompt, e))
    }

    /// Returns at once when stderr is not a terminal.
    fn acknowledge(&self, message: &str) -> Result<()> {
        let term = Term::stderr();
        term.write_line(message)
            .and_then(|()| term.read_key())
            .map_err(|source| ConfigError::Prompt {
                what: "confirmation".to_string(),
                source,
            })?;
        Ok(())
    }

    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

//! Snapshot of the host process environment.
//!
//! Resolution never reads the process environment directly. The binary
//! captures a [`HostEnv`] once at startup and hands it to the resolver, which
//! keeps the resolver testable without mutating global state.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::{ConfigError, Result};

/// Deprecated variable that overrides the stored GitHub token.
pub const OAUTH_TOKEN_VAR: &str = "OAUTH_TOKEN";

/// Variable naming the user-global settings file.
pub const CONFIG_PATH_VAR: &str = "GHSTACKRC_PATH";

/// The parts of the host environment that configuration depends on.
#[derive(Debug, Clone, Default)]
pub struct HostEnv {
    /// The directory the search for a local settings file starts from.
    pub cwd: PathBuf,
    /// The user's home directory, if it is known.
    pub home: Option<PathBuf>,
    /// The value of `OAUTH_TOKEN`, if set.
    pub oauth_token: Option<SecretString>,
    /// The value of `GHSTACKRC_PATH`, if set.
    pub config_path: Option<String>,
}

impl HostEnv {
    /// Captures the environment of the running process.
    ///
    /// Variables that are unset or not valid Unicode are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CurrentDir`] if the working directory cannot
    /// be determined.
    pub fn from_process() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Ok(Self {
            cwd,
            home: dirs::home_dir(),
            oauth_token: std::env::var(OAUTH_TOKEN_VAR).ok().map(SecretString::from),
            config_path: std::env::var(CONFIG_PATH_VAR).ok(),
        })
    }

    /// Creates an environment rooted at `cwd` with no variables set.
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            ..Self::default()
        }
    }

    /// Sets the home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Sets the `OAUTH_TOKEN` override.
    #[must_use]
    pub fn with_oauth_token(mut self, token: impl Into<String>) -> Self {
        self.oauth_token = Some(SecretString::from(token.into()));
        self
    }

    /// Sets the `GHSTACKRC_PATH` override.
    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }
}

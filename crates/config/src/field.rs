//! Configuration fields, their lookup chains, and provenance.

use std::fmt;

use ghstack_github::device::TOKEN_LABEL;

/// The placeholder that replaces the CircleCI token in log output.
pub const CIRCLE_TOKEN_LABEL: &str = "<CIRCLE_TOKEN>";

/// A setting in the `[ghstack]` section.
///
/// Variants are declared in resolution order: later fields may depend on
/// earlier ones (the username lookup needs the host and the token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// The GitHub domain.
    GithubUrl,
    /// The GitHub OAuth token.
    GithubOauth,
    /// The CircleCI API token.
    CircleToken,
    /// The GitHub login.
    GithubUsername,
    /// The proxy for GitHub connections.
    Proxy,
    /// The fbsource checkout.
    FbsourcePath,
    /// The git checkout.
    GithubPath,
    /// The project directory inside fbsource.
    DefaultProjectDir,
    /// The upstream remote.
    RemoteName,
}

impl Field {
    /// Every field, in resolution order.
    pub const ALL: [Self; 9] = [
        Self::GithubUrl,
        Self::GithubOauth,
        Self::CircleToken,
        Self::GithubUsername,
        Self::Proxy,
        Self::FbsourcePath,
        Self::GithubPath,
        Self::DefaultProjectDir,
        Self::RemoteName,
    ];

    /// The key this field is stored under.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::GithubUrl => "github_url",
            Self::GithubOauth => "github_oauth",
            Self::CircleToken => "circle_token",
            Self::GithubUsername => "github_username",
            Self::Proxy => "proxy",
            Self::FbsourcePath => "fbsource_path",
            Self::GithubPath => "github_path",
            Self::DefaultProjectDir => "default_project_dir",
            Self::RemoteName => "remote_name",
        }
    }

    /// The strategies tried for this field, in order.
    #[must_use]
    pub fn chain(self) -> &'static [Strategy] {
        use Strategy::{Default, Environment, File, Network, Prompt};

        match self {
            Self::GithubUrl | Self::CircleToken => &[File, Prompt],
            Self::GithubOauth => &[Environment, File, Network],
            Self::GithubUsername => &[File, Network, Prompt],
            Self::Proxy => &[File],
            Self::FbsourcePath | Self::GithubPath | Self::DefaultProjectDir | Self::RemoteName => {
                &[File, Default]
            }
        }
    }

    /// The log placeholder for secret fields, `None` for the rest.
    #[must_use]
    pub fn redaction_label(self) -> Option<&'static str> {
        match self {
            Self::GithubOauth => Some(TOKEN_LABEL),
            Self::CircleToken => Some(CIRCLE_TOKEN_LABEL),
            _ => None,
        }
    }

    /// Returns `true` if values of this field must never be displayed.
    #[must_use]
    pub fn is_secret(self) -> bool {
        self.redaction_label().is_some()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A way of obtaining a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// A process environment variable.
    Environment,
    /// The settings file.
    File,
    /// A request to GitHub.
    Network,
    /// Asking the operator.
    Prompt,
    /// A built-in value.
    Default,
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// A process environment variable.
    Environment,
    /// The settings file.
    File,
    /// A request to GitHub.
    Network,
    /// The operator.
    Prompt,
    /// A built-in value.
    Default,
    /// Every strategy was skipped or came up empty.
    Absent,
}

impl Source {
    /// Returns `true` for values learned during this run.
    ///
    /// Only these are written back to the settings file.
    #[must_use]
    pub fn is_newly_learned(self) -> bool {
        matches!(self, Self::Network | Self::Prompt)
    }
}

impl From<Strategy> for Source {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Environment => Self::Environment,
            Strategy::File => Self::File,
            Strategy::Network => Self::Network,
            Strategy::Prompt => Self::Prompt,
            Strategy::Default => Self::Default,
        }
    }
}

//! The resolved configuration record.
//!
//! This module provides [`Config`], the immutable result of a resolution.
//! It is only ever built complete by
//! [`ConfigResolver`](crate::resolver::ConfigResolver).

use std::fmt;
use std::path::{Path, PathBuf};

use ghstack_github::device::TOKEN_LABEL;
use secrecy::{ExposeSecret, SecretString};

use crate::field::{CIRCLE_TOKEN_LABEL, Field};

/// The configuration ghstack runs with.
///
/// Secrets are held as [`SecretString`], so neither `Debug` nor `Display`
/// ever prints them.
///
/// # Examples
///
/// ```no_run
/// use ghstack_config::{ConfigResolver, ResolveOptions, TerminalOperator};
/// use ghstack_config::env::HostEnv;
/// use ghstack_github::ReqwestTransport;
/// use ghstack_redact::Redactor;
///
/// # async fn example() -> ghstack_config::Result<()> {
/// let transport = ReqwestTransport::new();
/// let operator = TerminalOperator::new();
/// let resolver = ConfigResolver::new(
///     &transport,
///     &operator,
///     Redactor::new(),
///     HostEnv::from_process()?,
/// );
///
/// let config = resolver.resolve(&ResolveOptions::default()).await?.into_config();
/// println!("pushing as {} to {}", config.github_username(), config.github_url());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) proxy: Option<String>,
    pub(crate) github_oauth: Option<SecretString>,
    pub(crate) github_username: String,
    pub(crate) circle_token: Option<SecretString>,
    pub(crate) fbsource_path: PathBuf,
    pub(crate) github_path: PathBuf,
    pub(crate) default_project_dir: String,
    pub(crate) github_url: String,
    pub(crate) remote_name: String,
}

impl Config {
    /// The proxy to use for GitHub connections, if any.
    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// The OAuth token to authenticate to GitHub with.
    ///
    /// `None` only when no token was stored and none was requested.
    #[must_use]
    pub fn github_oauth(&self) -> Option<&SecretString> {
        self.github_oauth.as_ref()
    }

    /// The GitHub login, used to namespace pushed branches.
    #[must_use]
    pub fn github_username(&self) -> &str {
        &self.github_username
    }

    /// The token to authenticate to CircleCI with, if any.
    #[must_use]
    pub fn circle_token(&self) -> Option<&SecretString> {
        self.circle_token.as_ref()
    }

    /// The fbsource checkout.
    #[must_use]
    pub fn fbsource_path(&self) -> &Path {
        &self.fbsource_path
    }

    /// The git checkout.
    #[must_use]
    pub fn github_path(&self) -> &Path {
        &self.github_path
    }

    /// The project directory inside fbsource to use when detection fails.
    #[must_use]
    pub fn default_project_dir(&self) -> &str {
        &self.default_project_dir
    }

    /// The GitHub domain, `github.com` for the public service.
    #[must_use]
    pub fn github_url(&self) -> &str {
        &self.github_url
    }

    /// The name of the upstream remote.
    #[must_use]
    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }
}

/// Writes one `key = value` line per field, secrets shown as their labels.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn secret(token: Option<&SecretString>, label: &str) -> String {
            match token {
                Some(t) if t.expose_secret().is_empty() => String::new(),
                Some(_) => label.to_string(),
                None => String::new(),
            }
        }

        let lines = [
            (Field::GithubUrl, self.github_url.clone()),
            (Field::GithubOauth, secret(self.github_oauth(), TOKEN_LABEL)),
            (Field::CircleToken, secret(self.circle_token(), CIRCLE_TOKEN_LABEL)),
            (Field::GithubUsername, self.github_username.clone()),
            (Field::Proxy, self.proxy.clone().unwrap_or_default()),
            (Field::FbsourcePath, self.fbsource_path.display().to_string()),
            (Field::GithubPath, self.github_path.display().to_string()),
            (Field::DefaultProjectDir, self.default_project_dir.clone()),
            (Field::RemoteName, self.remote_name.clone()),
        ];
        for (field, value) in lines {
            writeln!(f, "{field} = {value}")?;
        }
        Ok(())
    }
}

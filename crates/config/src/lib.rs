//! Configuration resolution for ghstack.
//!
//! This crate finds the settings file, merges it with the environment, and
//! fills in whatever is missing by asking GitHub or the operator. Values
//! learned along the way are saved so they are never asked for twice.
//!
//! # Overview
//!
//! The crate is organized into the following modules:
//!
//! - [`config`]: The immutable [`Config`] record
//! - [`resolver`]: [`ConfigResolver`], which builds a [`Config`]
//! - [`field`]: The fields, their lookup chains, and provenance
//! - [`auth`]: GitHub token and username acquisition
//! - [`persistence`]: Settings file location, reading and writing
//! - [`validate`]: Checks for domains and usernames
//! - [`operator`]: The interactive prompt seam
//! - [`env`]: The captured host environment
//! - [`error`]: Error types for configuration operations
//!
//! # Configuration Sources (Priority)
//!
//! Each field has its own chain (see [`Field::chain`]). In general:
//!
//! 1. `OAUTH_TOKEN` (the GitHub token only, deprecated)
//! 2. The `[ghstack]` section of the settings file
//! 3. GitHub: the device flow for the token, the user endpoint for the
//!    username
//! 4. The operator, for the domain, the username, and the CircleCI token
//! 5. Built-in defaults
//!
//! # Settings File
//!
//! The first `.ghstackrc` found in the current directory or an ancestor is
//! used. Failing that, `$GHSTACKRC_PATH`, then `~/.ghstackrc`.
//!
//! ```ini
//! [ghstack]
//! github_url = github.com
//! github_username = alice
//! github_oauth = <token>
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use ghstack_config::{ConfigResolver, ResolveOptions, TerminalOperator};
//! use ghstack_config::env::HostEnv;
//! use ghstack_github::ReqwestTransport;
//! use ghstack_redact::Redactor;
//!
//! # async fn example() -> ghstack_config::Result<()> {
//! let transport = ReqwestTransport::new();
//! let operator = TerminalOperator::new();
//! let resolver = ConfigResolver::new(
//!     &transport,
//!     &operator,
//!     Redactor::new(),
//!     HostEnv::from_process()?,
//! );
//!
//! let resolution = resolver
//!     .resolve(&ResolveOptions {
//!         request_github_token: true,
//!         request_circle_token: true,
//!     })
//!     .await?;
//! if resolution.written_back() {
//!     println!("saved to {}", resolution.path().path.display());
//! }
//! println!("{}", resolution.config());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod env;
pub mod error;
pub mod field;
pub mod operator;
pub mod persistence;
pub mod resolver;
pub mod validate;

// Re-export primary types at crate root for convenience
pub use config::Config;
pub use env::HostEnv;
pub use error::{ConfigError, Result};
pub use field::{Field, Source, Strategy};
pub use operator::{Operator, TerminalOperator};
pub use persistence::{PathOrigin, ResolvedPath};
pub use resolver::{ConfigResolver, ResolveOptions, Resolution};

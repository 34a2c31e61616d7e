//! ghstack - Resolves ghstack configuration and GitHub credentials.
//!
//! This binary runs one configuration resolution and prints the result with
//! secrets masked. Missing values are obtained from GitHub or asked for, then
//! saved to the settings file.
//!
//! # Environment Variables
//!
//! - `GHSTACKRC_PATH`: Settings file to use when no local `.ghstackrc` exists
//! - `OAUTH_TOKEN`: Deprecated override for the stored GitHub token
//! - `RUST_LOG`: Log filter (default: `info`, or `debug` with `--verbose`)

use anyhow::{Context, Result};
use clap::Parser;
use ghstack_config::persistence::{ConfigFile, resolve_config_path};
use ghstack_config::{ConfigResolver, Field, HostEnv, ResolveOptions, TerminalOperator};
use ghstack_github::ReqwestTransport;
use ghstack_redact::{RedactingMakeWriter, Redactor};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Resolve ghstack configuration and GitHub credentials
#[derive(Parser, Debug)]
#[command(name = "ghstack")]
#[command(version, about, long_about = None)]
struct Args {
    /// Do not run the GitHub device flow if no token is stored
    #[arg(long)]
    no_github_token: bool,

    /// Ask for a CircleCI token if none is stored
    #[arg(long)]
    circle_token: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn options(&self) -> ResolveOptions {
        ResolveOptions {
            request_github_token: !self.no_github_token,
            request_circle_token: self.circle_token,
        }
    }
}

/// Installs a stderr subscriber whose output passes through `redactor`.
fn setup_tracing(verbose: bool, redactor: &Redactor) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(RedactingMakeWriter::new(std::io::stderr, redactor.clone())),
        )
        .init();
}

/// Builds the transport, routed through the settings file's proxy if it
/// names one.
fn transport_for(env: &HostEnv) -> Result<ReqwestTransport> {
    let path = resolve_config_path(env).path;
    let file = ConfigFile::load(&path)?;
    match file.get(Field::Proxy.key()) {
        Some(proxy) => {
            debug!("routing GitHub requests through the configured proxy");
            Ok(ReqwestTransport::with_proxy(proxy)?)
        }
        None => Ok(ReqwestTransport::new()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let redactor = Redactor::new();
    setup_tracing(args.verbose, &redactor);

    let env = HostEnv::from_process().context("failed to read the environment")?;
    let transport = transport_for(&env)?;
    let operator = TerminalOperator::new();
    let resolver = ConfigResolver::new(&transport, &operator, redactor.clone(), env);

    let options = args.options();
    debug!(?options, "resolving configuration");
    match resolver.resolve(&options).await {
        Ok(resolution) => {
            print!("{}", resolution.config());
            Ok(())
        }
        // Error chains may quote response bodies, so they are redacted too.
        Err(err) => Err(anyhow::anyhow!(
            "{}",
            redactor.redact(&format!("{:#}", anyhow::Error::new(err)))
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env_with_rc(content: &str) -> (TempDir, HostEnv) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".ghstackrc"), content).unwrap();
        let env = HostEnv::new(dir.path()).with_home(dir.path());
        (dir, env)
    }

    #[test]
    fn transport_uses_configured_proxy() {
        let (_dir, env) = env_with_rc("[ghstack]\nproxy = http://127.0.0.1:3128\n");
        assert!(transport_for(&env).is_ok());
    }

    #[test]
    fn invalid_proxy_is_reported() {
        let (_dir, env) = env_with_rc("[ghstack]\nproxy = http://[::1\n");
        let err = transport_for(&env).unwrap_err();
        assert!(format!("{err:#}").contains("invalid proxy"));
    }

    #[test]
    fn default_options_request_only_the_github_token() {
        let args = Args::parse_from(["ghstack"]);
        assert_eq!(args.options(), ResolveOptions::default());
        assert!(!args.verbose);
    }

    #[test]
    fn flags_map_to_options() {
        let args = Args::parse_from(["ghstack", "--no-github-token", "--circle-token", "-v"]);
        let options = args.options();
        assert!(!options.request_github_token);
        assert!(options.request_circle_token);
        assert!(args.verbose);
    }
}

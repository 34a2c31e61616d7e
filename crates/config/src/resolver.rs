//! Per-field resolution and write-back.
//!
//! [`ConfigResolver`] walks the fields in [`Field::ALL`] order. For each
//! one it tries the strategies of [`Field::chain`] until one yields a value,
//! and records which one did. Values learned from GitHub or from the
//! operator are written back to the settings file once, at the end, so the
//! next run finds them there.

use std::collections::BTreeMap;

use ghstack_github::{Endpoints, HttpTransport, PUBLIC_HOST};
use ghstack_redact::Redactor;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument};

use crate::auth::{device_login, env_token, lookup_username};
use crate::config::Config;
use crate::env::HostEnv;
use crate::error::Result;
use crate::field::{Field, Source, Strategy};
use crate::operator::Operator;
use crate::persistence::{ConfigFile, ResolvedPath, resolve_config_path};
use crate::validate::{validate_domain, validate_username};

const DOMAIN_PROMPT: &str = "GitHub enterprise domain (leave blank for OSS GitHub)";
const CIRCLE_TOKEN_PROMPT: &str =
    "CircleCI Personal API token (make one at https://circleci.com/account/api )";
const USERNAME_PROMPT: &str = "GitHub username";

const DEFAULT_FBSOURCE_PATH: &str = "local/fbsource";
const DEFAULT_GITHUB_PATH: &str = "local/ghstack-pytorch";
const DEFAULT_PROJECT_DIR: &str = "fbcode/caffe2";
const DEFAULT_REMOTE_NAME: &str = "origin";

/// Which credentials a resolution may acquire interactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Run the device flow if no GitHub token is stored.
    pub request_github_token: bool,
    /// Prompt for a CircleCI token if none is stored.
    pub request_circle_token: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            request_github_token: true,
            request_circle_token: false,
        }
    }
}

/// The outcome of a resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    config: Config,
    provenance: BTreeMap<Field, Source>,
    path: ResolvedPath,
    written_back: bool,
}

impl Resolution {
    /// The resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consumes the resolution, returning the configuration.
    #[must_use]
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Where the value of `field` came from.
    #[must_use]
    pub fn source(&self, field: Field) -> Source {
        self.provenance.get(&field).copied().unwrap_or(Source::Absent)
    }

    /// The source of every field.
    #[must_use]
    pub fn provenance(&self) -> &BTreeMap<Field, Source> {
        &self.provenance
    }

    /// The settings file that was read and, if needed, written.
    #[must_use]
    pub fn path(&self) -> &ResolvedPath {
        &self.path
    }

    /// Returns `true` if newly learned values were saved.
    #[must_use]
    pub fn written_back(&self) -> bool {
        self.written_back
    }
}

enum Value {
    Plain(String),
    Secret(SecretString),
}

impl Value {
    fn for_field(field: Field, raw: String) -> Self {
        if field.is_secret() {
            Self::Secret(SecretString::from(raw))
        } else {
            Self::Plain(raw)
        }
    }

    fn expose(&self) -> &str {
        match self {
            Self::Plain(s) => s,
            Self::Secret(s) => s.expose_secret(),
        }
    }
}

#[derive(Default)]
struct State {
    values: BTreeMap<Field, Value>,
    provenance: BTreeMap<Field, Source>,
}

impl State {
    fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(Value::expose)
    }

    fn secret(&self, field: Field) -> Option<&SecretString> {
        match self.values.get(&field)? {
            Value::Secret(s) => Some(s),
            Value::Plain(_) => None,
        }
    }

    fn take_string(&mut self, field: Field) -> Option<String> {
        match self.values.remove(&field)? {
            Value::Plain(s) => Some(s),
            Value::Secret(s) => Some(s.expose_secret().to_string()),
        }
    }

    fn take_secret(&mut self, field: Field) -> Option<SecretString> {
        match self.values.remove(&field)? {
            Value::Plain(s) => Some(SecretString::from(s)),
            Value::Secret(s) => Some(s),
        }
    }

    fn newly_learned(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.provenance
            .iter()
            .filter(|(_, source)| source.is_newly_learned())
            .filter_map(|(&field, _)| Some((field, self.get(field)?)))
    }

    /// Builds the record. Required fields have chains ending in a strategy
    /// that always yields, so their fallbacks are never used.
    fn into_config(mut self) -> (Config, BTreeMap<Field, Source>) {
        let config = Config {
            proxy: self.take_string(Field::Proxy),
            github_oauth: self.take_secret(Field::GithubOauth),
            github_username: self.take_string(Field::GithubUsername).unwrap_or_default(),
            circle_token: self.take_secret(Field::CircleToken),
            fbsource_path: self.take_string(Field::FbsourcePath).unwrap_or_default().into(),
            github_path: self.take_string(Field::GithubPath).unwrap_or_default().into(),
            default_project_dir: self.take_string(Field::DefaultProjectDir).unwrap_or_default(),
            github_url: self
                .take_string(Field::GithubUrl)
                .unwrap_or_else(|| PUBLIC_HOST.to_string()),
            remote_name: self.take_string(Field::RemoteName).unwrap_or_default(),
        };
        (config, self.provenance)
    }
}

/// Resolves the configuration from the settings file, the environment,
/// GitHub, and the operator.
///
/// See [`Config`] for an example.
#[derive(Debug)]
pub struct ConfigResolver<'a, T, O: ?Sized> {
    transport: &'a T,
    operator: &'a O,
    redactor: Redactor,
    env: HostEnv,
}

impl<'a, T, O> ConfigResolver<'a, T, O>
where
    T: HttpTransport,
    O: Operator + ?Sized,
{
    /// Creates a resolver.
    ///
    /// Every secret the resolver sees is registered with `redactor`.
    #[must_use]
    pub fn new(transport: &'a T, operator: &'a O, redactor: Redactor, env: HostEnv) -> Self {
        Self {
            transport,
            operator,
            redactor,
            env,
        }
    }

    /// Resolves every field and saves whatever was newly learned.
    ///
    /// Each call reads the settings file afresh and writes it at most once.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read, parsed, or
    /// written, if the operator enters an invalid domain or username, or if
    /// a request to GitHub fails. Nothing is written when an error occurs.
    #[instrument(skip_all)]
    pub async fn resolve(&self, options: &ResolveOptions) -> Result<Resolution> {
        let path = resolve_config_path(&self.env);
        debug!(path = %path.path.display(), origin = ?path.origin, "resolved config path");

        let mut file = ConfigFile::load(&path.path)?;
        if !file.has_section() {
            debug!("config file has no [ghstack] section");
        }

        let mut state = State::default();
        for field in Field::ALL {
            self.resolve_field(field, &file, &mut state, options).await?;
        }

        let mut written_back = false;
        for (field, value) in state.newly_learned() {
            file.set(field.key(), value);
            written_back = true;
        }
        if written_back {
            file.save(&path.path)?;
            info!("configuration saved to {}", path.path.display());
        }

        let (config, provenance) = state.into_config();
        debug!(?config, "resolved configuration");

        Ok(Resolution {
            config,
            provenance,
            path,
            written_back,
        })
    }

    async fn resolve_field(
        &self,
        field: Field,
        file: &ConfigFile,
        state: &mut State,
        options: &ResolveOptions,
    ) -> Result<()> {
        for &strategy in field.chain() {
            let Some(value) = self.attempt(field, strategy, file, state, options).await? else {
                continue;
            };
            // Applies whatever the source, the settings file included.
            match field {
                Field::GithubUrl => validate_domain(value.expose())?,
                Field::GithubUsername => validate_username(value.expose())?,
                _ => {}
            }
            if let (Some(label), Value::Secret(secret)) = (field.redaction_label(), &value) {
                self.redactor.register(secret.expose_secret(), label);
            }
            let source = Source::from(strategy);
            debug!(%field, ?source, "resolved field");
            state.values.insert(field, value);
            state.provenance.insert(field, source);
            return Ok(());
        }

        debug!(%field, "field left unset");
        state.provenance.insert(field, Source::Absent);
        Ok(())
    }

    async fn attempt(
        &self,
        field: Field,
        strategy: Strategy,
        file: &ConfigFile,
        state: &State,
        options: &ResolveOptions,
    ) -> Result<Option<Value>> {
        match strategy {
            Strategy::Environment => Ok(match field {
                Field::GithubOauth => env_token(&self.env).map(Value::Secret),
                _ => None,
            }),
            Strategy::File => Ok(file
                .get(field.key())
                .map(|raw| Value::for_field(field, raw.to_string()))),
            Strategy::Network => self.fetch(field, state, options).await,
            Strategy::Prompt => self.prompt(field, options),
            Strategy::Default => Ok(self.default_value(field).map(Value::Plain)),
        }
    }

    async fn fetch(
        &self,
        field: Field,
        state: &State,
        options: &ResolveOptions,
    ) -> Result<Option<Value>> {
        match field {
            Field::GithubOauth if options.request_github_token => {
                let endpoints = endpoints(state)?;
                let token =
                    device_login(self.transport, self.operator, &endpoints, &self.redactor).await?;
                Ok(Some(Value::Secret(token)))
            }
            Field::GithubUsername => {
                let Some(token) = state.secret(Field::GithubOauth) else {
                    return Ok(None);
                };
                let endpoints = endpoints(state)?;
                let login = lookup_username(self.transport, &endpoints, token).await?;
                Ok(Some(Value::Plain(login)))
            }
            _ => Ok(None),
        }
    }

    fn prompt(&self, field: Field, options: &ResolveOptions) -> Result<Option<Value>> {
        match field {
            Field::GithubUrl => {
                let input = self.operator.prompt_line(DOMAIN_PROMPT)?;
                let domain = match input.trim() {
                    "" => PUBLIC_HOST,
                    domain => domain,
                };
                Ok(Some(Value::Plain(domain.to_string())))
            }
            Field::CircleToken if options.request_circle_token => {
                let input = self.operator.prompt_secret(CIRCLE_TOKEN_PROMPT)?;
                let token = SecretString::from(input.trim().to_string());
                Ok(Some(Value::Secret(token)))
            }
            Field::GithubUsername => {
                let input = self.operator.prompt_line(USERNAME_PROMPT)?;
                Ok(Some(Value::Plain(input.trim().to_string())))
            }
            _ => Ok(None),
        }
    }

    fn default_value(&self, field: Field) -> Option<String> {
        let in_home = |relative: &str| match &self.env.home {
            Some(home) => home.join(relative).display().to_string(),
            None => format!("~/{relative}"),
        };

        match field {
            Field::FbsourcePath => Some(in_home(DEFAULT_FBSOURCE_PATH)),
            Field::GithubPath => Some(in_home(DEFAULT_GITHUB_PATH)),
            Field::DefaultProjectDir => Some(DEFAULT_PROJECT_DIR.to_string()),
            Field::RemoteName => Some(DEFAULT_REMOTE_NAME.to_string()),
            _ => None,
        }
    }
}

fn endpoints(state: &State) -> Result<Endpoints> {
    let host = state.get(Field::GithubUrl).unwrap_or(PUBLIC_HOST);
    Ok(Endpoints::for_host(host)?)
}

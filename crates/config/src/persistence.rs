//! Configuration file location, reading and writing.
//!
//! Settings live in an INI file with a single `[ghstack]` section:
//!
//! ```ini
//! [ghstack]
//! github_url = github.com
//! github_username = alice
//! github_oauth = <token>
//! ```
//!
//! # File Locations
//!
//! The file is searched in the following order:
//!
//! 1. Local: `.ghstackrc` in the current directory or any ancestor, stopping
//!    before the filesystem root
//! 2. Override: the path named by `$GHSTACKRC_PATH`
//! 3. User: `~/.ghstackrc`
//!
//! Writes replace the file atomically, so a crash never leaves a truncated
//! settings file behind.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use ini::{Ini, WriteOption};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::env::HostEnv;
use crate::error::{ConfigError, Result};

/// The name of the settings file.
pub const CONFIG_FILE_NAME: &str = ".ghstackrc";

/// The section all settings live in.
pub const SECTION: &str = "ghstack";

/// Where a resolved settings path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOrigin {
    /// Found by searching upward from the current directory.
    Local,
    /// Named by `$GHSTACKRC_PATH`.
    EnvOverride,
    /// The per-user default, `~/.ghstackrc`.
    Default,
}

/// A settings file path together with how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// The path to read from and write back to.
    pub path: PathBuf,
    /// How the path was chosen.
    pub origin: PathOrigin,
}

/// Chooses the settings file for `env`.
///
/// The chosen file need not exist. This function never fails: without a
/// home directory the default is a relative `.ghstackrc`.
///
/// # Examples
///
/// ```
/// use ghstack_config::env::HostEnv;
/// use ghstack_config::persistence::{PathOrigin, resolve_config_path};
///
/// let env = HostEnv::new("/nonexistent/project")
///     .with_home("/home/alice")
///     .with_config_path("~/settings/ghstackrc");
///
/// let resolved = resolve_config_path(&env);
/// assert_eq!(resolved.origin, PathOrigin::EnvOverride);
/// assert_eq!(resolved.path.to_str(), Some("/home/alice/settings/ghstackrc"));
/// ```
#[must_use]
pub fn resolve_config_path(env: &HostEnv) -> ResolvedPath {
    if let Some(path) = find_local_config(&env.cwd) {
        return ResolvedPath {
            path,
            origin: PathOrigin::Local,
        };
    }

    if let Some(raw) = &env.config_path {
        let expanded = expand_tilde(raw, env.home.as_deref());
        return ResolvedPath {
            path: normalize(&env.cwd.join(expanded)),
            origin: PathOrigin::EnvOverride,
        };
    }

    let path = match &env.home {
        Some(home) => home.join(CONFIG_FILE_NAME),
        None => PathBuf::from(CONFIG_FILE_NAME),
    };
    ResolvedPath {
        path,
        origin: PathOrigin::Default,
    }
}

/// Searches `start` and its ancestors for a settings file.
///
/// The filesystem root itself is never checked.
fn find_local_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take_while(|dir| dir.parent().is_some())
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.exists())
}

fn expand_tilde(raw: &str, home: Option<&Path>) -> PathBuf {
    match (raw.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home.to_path_buf(),
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(raw),
    }
}

/// Removes `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    if out.has_root() {
                        continue;
                    }
                    out.push("..");
                } else {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// The parsed contents of a settings file.
///
/// Sections and keys this program does not know about are kept, so they
/// survive a write-back.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    ini: Ini,
}

impl ConfigFile {
    /// Reads the settings file at `path`.
    ///
    /// A missing file reads as an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadFile`] if the file exists but cannot be
    /// read, [`ConfigError::Parse`] if it is not valid INI, and
    /// [`ConfigError::MissingSectionHeader`] if a key precedes every section
    /// header.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file does not exist");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::ReadFile {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let ini = Ini::load_from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        if let Some((key, _)) = ini.general_section().iter().next() {
            return Err(ConfigError::MissingSectionHeader {
                path: path.to_path_buf(),
                key: key.to_string(),
            });
        }
        Ok(Self { ini })
    }

    /// Returns `true` if the file has a `[ghstack]` section.
    #[must_use]
    pub fn has_section(&self) -> bool {
        self.ini.section(Some(SECTION)).is_some()
    }

    /// Returns the value of `key` in the `[ghstack]` section.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.ini.section(Some(SECTION))?.get(key)
    }

    /// Sets `key` in the `[ghstack]` section, creating the section if needed.
    pub fn set(&mut self, key: &str, value: &str) {
        self.ini.with_section(Some(SECTION)).set(key, value);
    }

    /// Serializes the file as `key = value` lines.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let options = WriteOption {
            kv_separator: " = ",
            ..WriteOption::default()
        };
        self.ini.write_to_opt(writer, options)
    }

    /// Atomically replaces the file at `path` with these contents.
    ///
    /// Parent directories are created as needed. The new file is readable
    /// only by its owner on Unix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WriteFile`] if any step fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write_err = |source| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        self.write_to(&mut tmp).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        debug!(path = %path.display(), "wrote config file");
        Ok(())
    }
}

//! Error types for configuration operations.
//!
//! This module defines the error types that can occur while resolving the
//! configuration: reading and writing the settings file, parsing it,
//! validating domains and usernames, talking to GitHub, and prompting.

use std::path::PathBuf;

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a configuration file.
    #[error("failed to write config file at {path}: {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid INI.
    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        /// The path of the malformed file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: ini::ParseError,
    },

    /// The configuration file has keys before its first section header.
    #[error("config file at {path} has key {key:?} outside of any section header")]
    MissingSectionHeader {
        /// The path of the malformed file.
        path: PathBuf,
        /// The first key found outside a section.
        key: String,
    },

    /// A GitHub domain is malformed.
    #[error("{value:?} is not a valid domain name: {rule}")]
    InvalidDomain {
        /// The rejected input.
        value: String,
        /// The rule it broke.
        rule: &'static str,
    },

    /// A GitHub username is malformed.
    #[error("{value:?} is not a valid GitHub username: {rule}")]
    InvalidUsername {
        /// The rejected input.
        value: String,
        /// The rule it broke.
        rule: &'static str,
    },

    /// A request to GitHub failed.
    #[error(transparent)]
    GitHub(#[from] ghstack_github::Error),

    /// Reading from or writing to the terminal failed.
    #[error("failed to prompt for {what}: {source}")]
    Prompt {
        /// What was being asked for.
        what: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The current working directory could not be determined.
    #[error("could not determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

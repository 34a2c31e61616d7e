//! Error types for GitHub operations.
//!
//! This module defines the error types that can occur while talking to a
//! GitHub host: transport failures, unsuccessful HTTP statuses, undecodable
//! bodies, and refused device authorizations.

/// Errors that can occur during GitHub operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be sent or its response could not be read.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The configured proxy could not be used.
    #[error("invalid proxy {proxy:?}: {source}")]
    Proxy {
        /// The proxy as configured.
        proxy: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned {status}{}", format_body(.body))]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status returned.
        status: http::StatusCode,
        /// The response body, if any.
        body: String,
    },

    /// The response body was not the JSON we expected.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// The URL that was requested.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A required field was absent from an otherwise valid response.
    #[error("response from {url} has no `{field}` field")]
    MissingField {
        /// The URL that was requested.
        url: String,
        /// The name of the missing field.
        field: &'static str,
    },

    /// The device authorization was not granted.
    ///
    /// This occurs when the token endpoint reports an OAuth error such as
    /// `authorization_pending` or `access_denied` instead of a token.
    #[error("device authorization failed: {error}{}", format_description(.description.as_deref()))]
    Authorization {
        /// The OAuth error code.
        error: String,
        /// The human-readable description, if provided.
        description: Option<String>,
    },

    /// A host name could not be turned into a valid URL.
    #[error("invalid GitHub URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

fn format_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

fn format_description(description: Option<&str>) -> String {
    match description {
        Some(description) => format!(" ({description})"),
        None => String::new(),
    }
}

/// A specialized Result type for GitHub operations.
pub type Result<T> = std::result::Result<T, Error>;

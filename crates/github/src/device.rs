//! OAuth 2.0 device authorization grant.
//!
//! The flow has three steps, each represented by a type:
//!
//! 1. [`DeviceAuthClient::request_code`] returns a [`DeviceCodeSession`]
//!    holding the device code and the user code to show the operator.
//! 2. Once the operator reports that they entered the code,
//!    [`DeviceCodeSession::authorized`] turns the session into an
//!    [`AuthorizedSession`].
//! 3. [`DeviceAuthClient::exchange`] trades the authorized session for an
//!    access token.
//!
//! Dropping a session abandons the flow. Nothing is persisted between runs,
//! nothing is polled, and failures are not retried.

use ghstack_redact::Redactor;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::endpoints::Endpoints;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpTransport};

/// The OAuth application ghstack authorizes as.
pub const CLIENT_ID: &str = "89cc88ca50efbe86907a";

/// The only scope ghstack asks for.
pub const SCOPE: &str = "repo";

/// The grant type for exchanging a device code.
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// The placeholder that replaces the access token in log output.
pub const TOKEN_LABEL: &str = "<GITHUB_OAUTH>";

/// A device code waiting for the operator to authorize it.
#[derive(Debug)]
pub struct DeviceCodeSession {
    device_code: String,
    user_code: String,
    verification_uri: String,
}

impl DeviceCodeSession {
    /// The short code the operator types into the browser.
    #[must_use]
    pub fn user_code(&self) -> &str {
        &self.user_code
    }

    /// The page where the operator enters the user code.
    #[must_use]
    pub fn verification_uri(&self) -> &str {
        &self.verification_uri
    }

    /// Marks the session as authorized by the operator.
    #[must_use]
    pub fn authorized(self) -> AuthorizedSession {
        AuthorizedSession {
            device_code: self.device_code,
        }
    }
}

/// A device code the operator says they have authorized.
#[derive(Debug)]
pub struct AuthorizedSession {
    device_code: String,
}

#[derive(Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    #[serde(default)]
    verification_uri: Option<String>,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for the device authorization grant.
///
/// Every token obtained is registered with the [`Redactor`] before it is
/// returned or logged.
///
/// # Examples
///
/// ```no_run
/// use ghstack_github::{DeviceAuthClient, Endpoints, ReqwestTransport};
/// use ghstack_redact::Redactor;
///
/// # async fn example() -> ghstack_github::Result<()> {
/// let transport = ReqwestTransport::new();
/// let client = DeviceAuthClient::new(
///     &transport,
///     Endpoints::for_host("github.com")?,
///     Redactor::new(),
/// );
///
/// let session = client.request_code().await?;
/// println!("Enter {} at {}", session.user_code(), session.verification_uri());
/// // ... wait for the operator ...
/// let token = client.exchange(session.authorized()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DeviceAuthClient<'a, T> {
    transport: &'a T,
    endpoints: Endpoints,
    redactor: Redactor,
}

impl<'a, T: HttpTransport> DeviceAuthClient<'a, T> {
    /// Creates a client for the host described by `endpoints`.
    #[must_use]
    pub fn new(transport: &'a T, endpoints: Endpoints, redactor: Redactor) -> Self {
        Self {
            transport,
            endpoints,
            redactor,
        }
    }

    /// Requests a device code and a user code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the body is not the expected JSON.
    #[instrument(skip(self), fields(url = %self.endpoints.device_code()))]
    pub async fn request_code(&self) -> Result<DeviceCodeSession> {
        let req = HttpRequest::post(self.endpoints.device_code().clone())
            .accept("application/json")
            .with_form([("client_id", CLIENT_ID), ("scope", SCOPE)]);

        let response = self.transport.send(req).await?.error_for_status()?;
        let body: DeviceCodeResponse = response.json()?;
        debug!(user_code = %body.user_code, "received device code");

        Ok(DeviceCodeSession {
            device_code: body.device_code,
            user_code: body.user_code,
            verification_uri: body
                .verification_uri
                .unwrap_or_else(|| self.endpoints.verification().to_string()),
        })
    }

    /// Exchanges an authorized device code for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authorization`] if the server reports an OAuth error
    /// (for instance because the operator never entered the code), and the
    /// usual transport, status, or decoding errors otherwise.
    #[instrument(skip_all, fields(url = %self.endpoints.access_token()))]
    pub async fn exchange(&self, session: AuthorizedSession) -> Result<SecretString> {
        let req = HttpRequest::post(self.endpoints.access_token().clone())
            .accept("application/json")
            .with_form([
                ("client_id", CLIENT_ID),
                ("device_code", session.device_code.as_str()),
                ("grant_type", DEVICE_CODE_GRANT_TYPE),
            ]);

        let response = self.transport.send(req).await?.error_for_status()?;
        let body: AccessTokenResponse = response.json()?;

        if let Some(error) = body.error {
            return Err(Error::Authorization {
                error,
                description: body.error_description,
            });
        }

        let token = body.access_token.ok_or_else(|| Error::MissingField {
            url: response.url.to_string(),
            field: "access_token",
        })?;
        let token = SecretString::from(token);
        self.redactor.register(token.expose_secret(), TOKEN_LABEL);
        info!("obtained GitHub access token");

        Ok(token)
    }
}

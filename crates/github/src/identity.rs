//! Authenticated user lookup.

use http::header::{AUTHORIZATION, HeaderName, HeaderValue, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::endpoints::Endpoints;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpTransport};

/// The REST API version requested from GitHub.
pub const API_VERSION: &str = "2022-11-28";

#[derive(Deserialize)]
struct User {
    #[serde(default)]
    login: Option<String>,
}

/// Resolves the login name behind an access token.
///
/// # Examples
///
/// ```no_run
/// use ghstack_github::{Endpoints, IdentityClient, ReqwestTransport};
/// use secrecy::SecretString;
///
/// # async fn example() -> ghstack_github::Result<()> {
/// let transport = ReqwestTransport::new();
/// let client = IdentityClient::new(&transport, Endpoints::for_host("github.com")?);
///
/// let token = SecretString::from("ghp_xxx".to_string());
/// let login = client.lookup_login(&token).await?;
/// println!("Authenticated as {login}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct IdentityClient<'a, T> {
    transport: &'a T,
    endpoints: Endpoints,
}

impl<'a, T: HttpTransport> IdentityClient<'a, T> {
    /// Creates a client for the host described by `endpoints`.
    #[must_use]
    pub fn new(transport: &'a T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Returns the `login` of the user the token belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Status`] for any non-2xx answer (an invalid token
    /// included), and transport or decoding errors otherwise.
    #[instrument(skip_all, fields(url = %self.endpoints.user()))]
    pub async fn lookup_login(&self, token: &SecretString) -> Result<String> {
        let bearer = HeaderValue::try_from(format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Transport {
                url: self.endpoints.user().to_string(),
                source: Box::new(e),
            })?;

        let req = HttpRequest::get(self.endpoints.user().clone())
            .accept("application/vnd.github+json")
            .with_sensitive_header(AUTHORIZATION, bearer)
            .with_header(
                HeaderName::from_static("x-github-api-version"),
                HeaderValue::from_static(API_VERSION),
            )
            .with_header(USER_AGENT, HeaderValue::from_static("ghstack"));

        let response = self.transport.send(req).await?.error_for_status()?;
        let user: User = response.json()?;
        let login = user.login.ok_or_else(|| Error::MissingField {
            url: response.url.to_string(),
            field: "login",
        })?;
        debug!(%login, "resolved GitHub login");

        Ok(login)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::transport::HttpResponse;

    struct Canned {
        status: u16,
        body: &'static str,
        seen: Mutex<Option<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: Mutex::new(None),
            }
        }
    }

    impl HttpTransport for Canned {
        async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
            let url = req.url.clone();
            *self.seen.lock().unwrap() = Some(req);
            Ok(HttpResponse::new(
                url,
                http::StatusCode::from_u16(self.status).unwrap(),
                http::HeaderMap::new(),
                self.body.as_bytes().to_vec(),
            ))
        }
    }

    #[tokio::test]
    async fn public_host_uses_api_subdomain() {
        let transport = Canned::new(200, r#"{"login":"alice","id":1}"#);
        let client = IdentityClient::new(&transport, Endpoints::for_host("github.com").unwrap());

        let login = client
            .lookup_login(&SecretString::from("tok_abc".to_string()))
            .await
            .unwrap();
        assert_eq!(login, "alice");

        let seen = transport.seen.lock().unwrap();
        let req = seen.as_ref().unwrap();
        assert_eq!(req.method, http::Method::GET);
        assert_eq!(req.url.as_str(), "https://api.github.com/user");
        assert_eq!(req.headers[AUTHORIZATION], "Bearer tok_abc");
        assert_eq!(req.headers["x-github-api-version"], API_VERSION);
        assert_eq!(
            req.headers[http::header::ACCEPT],
            "application/vnd.github+json"
        );
    }

    #[tokio::test]
    async fn enterprise_host_uses_api_prefix() {
        let transport = Canned::new(200, r#"{"login":"bob"}"#);
        let client = IdentityClient::new(
            &transport,
            Endpoints::for_host("github.example.com").unwrap(),
        );

        let login = client
            .lookup_login(&SecretString::from("tok_abc".to_string()))
            .await
            .unwrap();
        assert_eq!(login, "bob");

        let seen = transport.seen.lock().unwrap();
        assert_eq!(
            seen.as_ref().unwrap().url.as_str(),
            "https://github.example.com/api/v3/user"
        );
    }

    #[tokio::test]
    async fn unauthorized_is_fatal() {
        let transport = Canned::new(401, r#"{"message":"Bad credentials"}"#);
        let client = IdentityClient::new(&transport, Endpoints::for_host("github.com").unwrap());

        let err = client
            .lookup_login(&SecretString::from("tok_bad".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Status { status, .. } if status == http::StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn missing_login_is_fatal() {
        let transport = Canned::new(200, r#"{"id":1}"#);
        let client = IdentityClient::new(&transport, Endpoints::for_host("github.com").unwrap());

        let err = client
            .lookup_login(&SecretString::from("tok_abc".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "login", .. }));
    }
}

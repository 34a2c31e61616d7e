//! GitHub token and identity acquisition.
//!
//! The token is resolved with the following fallback chain:
//!
//! 1. The deprecated `OAUTH_TOKEN` environment variable
//! 2. `github_oauth` from the settings file
//! 3. The OAuth device flow, if a token was requested
//!
//! Once a token is known the username can be looked up from GitHub instead
//! of being asked for.

use ghstack_github::{DeviceAuthClient, Endpoints, HttpTransport, IdentityClient};
use ghstack_redact::Redactor;
use secrecy::SecretString;
use tracing::{instrument, warn};

use crate::env::{HostEnv, OAUTH_TOKEN_VAR};
use crate::error::Result;
use crate::operator::Operator;

/// Returns the token from the environment, warning that it is deprecated.
///
/// # Examples
///
/// ```
/// use ghstack_config::auth::env_token;
/// use ghstack_config::env::HostEnv;
///
/// let env = HostEnv::new("/work").with_oauth_token("tok_env");
/// assert!(env_token(&env).is_some());
/// assert!(env_token(&HostEnv::new("/work")).is_none());
/// ```
#[must_use]
pub fn env_token(env: &HostEnv) -> Option<SecretString> {
    let token = env.oauth_token.clone()?;
    warn!(
        "Deprecated {OAUTH_TOKEN_VAR} environment variable used to populate github_oauth; \
         this is probably not what you intended. Unset {OAUTH_TOKEN_VAR} to use the \
         setting in .ghstackrc instead."
    );
    Some(token)
}

/// Walks the operator through the device flow and returns a fresh token.
///
/// The operator is shown the user code and the verification page, and the
/// exchange happens once they confirm. The token is registered with
/// `redactor` before this returns.
///
/// # Errors
///
/// Returns an error if either request fails, the operator does not
/// authorize the device, or the terminal cannot be read.
#[instrument(skip_all, fields(url = %endpoints.device_code()))]
pub async fn device_login<T, O>(
    transport: &T,
    operator: &O,
    endpoints: &Endpoints,
    redactor: &Redactor,
) -> Result<SecretString>
where
    T: HttpTransport,
    O: Operator + ?Sized,
{
    operator.notify("Generating GitHub access token...");

    let client = DeviceAuthClient::new(transport, endpoints.clone(), redactor.clone());
    let session = client.request_code().await?;

    operator.notify(&format!("User verification code: {}", session.user_code()));
    operator.notify(&format!(
        "Go to {} and enter the code.",
        session.verification_uri()
    ));
    operator.acknowledge("Once you've authorized ghstack, press any key to continue...")?;

    Ok(client.exchange(session.authorized()).await?)
}

/// Returns the login of the user `token` belongs to.
///
/// # Errors
///
/// Returns an error if the request fails or GitHub rejects the token.
pub async fn lookup_username<T: HttpTransport>(
    transport: &T,
    endpoints: &Endpoints,
    token: &SecretString,
) -> Result<String> {
    let login = IdentityClient::new(transport, endpoints.clone())
        .lookup_login(token)
        .await?;
    Ok(login)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ghstack_github::{HttpRequest, HttpResponse};
    use secrecy::ExposeSecret;

    use super::*;

    struct Replay {
        responses: Mutex<Vec<&'static str>>,
    }

    impl Replay {
        fn new(mut responses: Vec<&'static str>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    impl HttpTransport for Replay {
        async fn send(&self, req: HttpRequest) -> ghstack_github::Result<HttpResponse> {
            let body = self.responses.lock().unwrap().pop().unwrap();
            Ok(HttpResponse::new(
                req.url,
                http::StatusCode::OK,
                http::HeaderMap::new(),
                body.as_bytes().to_vec(),
            ))
        }
    }

    #[derive(Default)]
    struct Transcript {
        lines: Mutex<Vec<String>>,
    }

    impl Operator for Transcript {
        fn prompt_line(&self, prompt: &str) -> Result<String> {
            panic!("unexpected prompt: {prompt}");
        }

        fn prompt_secret(&self, prompt: &str) -> Result<String> {
            panic!("unexpected prompt: {prompt}");
        }

        fn acknowledge(&self, message: &str) -> Result<()> {
            self.lines.lock().unwrap().push(format!("ack: {message}"));
            Ok(())
        }

        fn notify(&self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
    }

    #[tokio::test]
    async fn device_login_shows_code_then_exchanges() {
        let transport = Replay::new(vec![
            r#"{"device_code":"D1","user_code":"U1","verification_uri":"https://github.com/login/device"}"#,
            r#"{"access_token":"tok_abc"}"#,
        ]);
        let operator = Transcript::default();
        let redactor = Redactor::new();
        let endpoints = Endpoints::for_host("github.com").unwrap();

        let token = device_login(&transport, &operator, &endpoints, &redactor)
            .await
            .unwrap();

        assert_eq!(token.expose_secret(), "tok_abc");
        assert_eq!(redactor.redact("tok_abc"), "<GITHUB_OAUTH>");
        let lines = operator.lines.lock().unwrap();
        assert_eq!(lines[0], "Generating GitHub access token...");
        assert_eq!(lines[1], "User verification code: U1");
        assert_eq!(lines[2], "Go to https://github.com/login/device and enter the code.");
        assert_eq!(
            lines[3],
            "ack: Once you've authorized ghstack, press any key to continue..."
        );
    }

    #[tokio::test]
    async fn lookup_username_returns_login() {
        let transport = Replay::new(vec![r#"{"login":"alice","id":1}"#]);
        let endpoints = Endpoints::for_host("github.com").unwrap();
        let token = SecretString::from("tok_abc".to_string());

        let login = lookup_username(&transport, &endpoints, &token).await.unwrap();
        assert_eq!(login, "alice");
    }

    #[test]
    fn env_token_absent_without_variable() {
        assert!(env_token(&HostEnv::new("/work")).is_none());
    }
}

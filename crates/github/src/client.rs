//! Production transport implementation.
//!
//! This module provides [`ReqwestTransport`], the [`HttpTransport`] used
//! outside of tests. Requests are sent one at a time and awaited to
//! completion; there is no client-side timeout or retry.

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// HTTP transport backed by `reqwest`.
///
/// # Examples
///
/// ```no_run
/// use ghstack_github::{HttpRequest, HttpTransport, ReqwestTransport};
///
/// # async fn example() -> ghstack_github::Result<()> {
/// let transport = ReqwestTransport::new();
/// let url = url::Url::parse("https://api.github.com/zen")?;
/// let response = transport.send(HttpRequest::get(url)).await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with reqwest's default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that sends every request through `proxy`.
    ///
    /// A proxy without a scheme is taken to be `http://`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Proxy`] if `proxy` is not a usable proxy URL.
    pub fn with_proxy(proxy: &str) -> Result<Self> {
        let invalid = |source| Error::Proxy {
            proxy: proxy.to_string(),
            source,
        };
        let client = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all(proxy).map_err(invalid)?)
            .build()
            .map_err(invalid)?;
        Ok(Self::from_client(client))
    }

    /// Creates a transport from an existing reqwest client.
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, req), fields(method = %req.method, url = %req.url))]
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        let url = req.url.clone();
        let mut builder = self.inner.request(req.method, req.url).headers(req.headers);
        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let transport_error = |e: reqwest::Error| Error::Transport {
            url: url.to_string(),
            source: Box::new(e),
        };

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport_error)?.to_vec();
        debug!(%status, bytes = body.len(), "received response");

        Ok(HttpResponse::new(url, status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ACCEPT, CONTENT_TYPE};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_form_post_and_buffers_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/device/code"))
            .and(header(ACCEPT.as_str(), "application/json"))
            .and(header(
                CONTENT_TYPE.as_str(),
                "application/x-www-form-urlencoded",
            ))
            .and(body_string("client_id=abc&scope=repo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let url = url::Url::parse(&format!("{}/login/device/code", server.uri())).unwrap();
        let req = HttpRequest::post(url)
            .accept("application/json")
            .with_form([("client_id", "abc"), ("scope", "repo")]);

        let response = ReqwestTransport::new().send(req).await.unwrap();
        assert!(response.status.is_success());
        assert_eq!(response.text(), r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn error_statuses_are_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let url = url::Url::parse(&format!("{}/user", server.uri())).unwrap();
        let response = ReqwestTransport::new()
            .send(HttpRequest::get(url))
            .await
            .unwrap();

        assert_eq!(response.status, http::StatusCode::UNAUTHORIZED);
        assert!(matches!(
            response.error_for_status(),
            Err(Error::Status { .. })
        ));
    }

    #[test]
    fn proxy_is_accepted_with_or_without_scheme() {
        assert!(ReqwestTransport::with_proxy("http://127.0.0.1:3128").is_ok());
        assert!(ReqwestTransport::with_proxy("proxy.corp.example.com:8080").is_ok());
    }

    #[test]
    fn unparseable_proxy_is_rejected() {
        let err = ReqwestTransport::with_proxy("http://[::1").unwrap_err();
        assert!(matches!(err, Error::Proxy { ref proxy, .. } if proxy == "http://[::1"));
    }

    #[test]
    fn transport_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestTransport>();
    }
}

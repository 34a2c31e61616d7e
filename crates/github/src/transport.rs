//! HTTP request/response types and the transport trait.
//!
//! The GitHub clients in this crate never talk to the network directly. They
//! build an [`HttpRequest`], hand it to an [`HttpTransport`], and interpret
//! the buffered [`HttpResponse`]. Production code uses
//! [`ReqwestTransport`](crate::ReqwestTransport); tests substitute a fake.

use std::future::Future;

use http::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};

/// An HTTP request to be sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: http::Method,
    /// Target URL.
    pub url: Url,
    /// Headers to send.
    pub headers: HeaderMap,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: http::Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(http::Method::GET, url)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(url: Url) -> Self {
        Self::new(http::Method::POST, url)
    }

    /// Adds a header, appending if the name is already present.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Adds a header whose value is never shown in `Debug` output.
    #[must_use]
    pub fn with_sensitive_header(self, name: HeaderName, mut value: HeaderValue) -> Self {
        value.set_sensitive(true);
        self.with_header(name, value)
    }

    /// Sets the `Accept` header.
    #[must_use]
    pub fn accept(self, media_type: &'static str) -> Self {
        self.with_header(ACCEPT, HeaderValue::from_static(media_type))
    }

    /// Sets an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn with_form<'p>(mut self, pairs: impl IntoIterator<Item = (&'p str, &'p str)>) -> Self {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self.body = Some(body.into_bytes());
        self
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The URL the response came from.
    pub url: Url,
    /// HTTP status code.
    pub status: http::StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new response.
    #[must_use]
    pub fn new(url: Url, status: http::StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            url,
            status,
            headers,
            body,
        }
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turns a non-2xx status into [`Error::Status`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Status`] unless the status is a success.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                url: self.url.to_string(),
                status: self.status,
                body: self.text(),
            })
        }
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| Error::Decode {
            url: self.url.to_string(),
            source,
        })
    }
}

/// Sends HTTP requests on behalf of the GitHub clients.
///
/// Implementations only report failures to exchange bytes with the server;
/// status handling belongs to the callers.
///
/// # Example
///
/// ```
/// use ghstack_github::{HttpRequest, HttpResponse, HttpTransport, Result};
///
/// struct Canned(Vec<u8>);
///
/// impl HttpTransport for Canned {
///     async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
///         Ok(HttpResponse::new(
///             req.url,
///             http::StatusCode::OK,
///             http::HeaderMap::new(),
///             self.0.clone(),
///         ))
///     }
/// }
/// ```
pub trait HttpTransport: Send + Sync {
    /// Sends a request and buffers the whole response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the exchange itself fails.
    fn send(&self, req: HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::AUTHORIZATION;

    fn url() -> Url {
        Url::parse("https://github.com/login/device/code").unwrap()
    }

    #[test]
    fn form_body_is_urlencoded() {
        let req = HttpRequest::post(url()).with_form([
            ("client_id", "abc"),
            ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
        ]);

        assert_eq!(
            String::from_utf8(req.body.unwrap()).unwrap(),
            "client_id=abc&grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Adevice_code"
        );
        assert_eq!(
            req.headers[CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn sensitive_header_is_hidden_from_debug() {
        let req = HttpRequest::get(url()).with_sensitive_header(
            AUTHORIZATION,
            HeaderValue::from_static("Bearer ghp_secret"),
        );

        let debug = format!("{req:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(req.headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn error_for_status_passes_success_through() {
        let resp = HttpResponse::new(url(), http::StatusCode::OK, HeaderMap::new(), b"{}".to_vec());
        assert!(resp.error_for_status().is_ok());
    }

    #[test]
    fn error_for_status_reports_failure() {
        let resp = HttpResponse::new(
            url(),
            http::StatusCode::INTERNAL_SERVER_ERROR,
            HeaderMap::new(),
            b"oops".to_vec(),
        );

        match resp.error_for_status() {
            Err(Error::Status { status, body, url }) => {
                assert_eq!(status, http::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "oops");
                assert_eq!(url, "https://github.com/login/device/code");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn json_reports_malformed_body() {
        let resp = HttpResponse::new(
            url(),
            http::StatusCode::OK,
            HeaderMap::new(),
            b"<html>".to_vec(),
        );

        let result: Result<serde_json::Value> = resp.json();
        assert!(matches!(result, Err(Error::Decode { .. })));
    }
}

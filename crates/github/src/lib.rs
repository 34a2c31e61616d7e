//! GitHub client for ghstack.
//!
//! This crate talks to a GitHub host (github.com or a GitHub Enterprise
//! Server) to obtain an access token through the OAuth device authorization
//! grant and to look up the login of the token's owner.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - [`HttpTransport`], [`HttpRequest`] and [`HttpResponse`]: the seam every
//!   request goes through, with [`ReqwestTransport`] as the real implementation
//! - [`Endpoints`]: the URLs of a host, public or enterprise
//! - [`DeviceAuthClient`]: the two-step device authorization grant
//! - [`IdentityClient`]: the authenticated user lookup
//! - [`Error`]: Error types for GitHub operations
//!
//! # Secrets
//!
//! Tokens are handled as [`secrecy::SecretString`] so they never show up in
//! `Debug` output, and every token minted by [`DeviceAuthClient`] is
//! registered with a [`ghstack_redact::Redactor`] before it is returned.
//!
//! # Failure model
//!
//! Every call is made once. A non-2xx status, an undecodable body, or a
//! refused authorization is returned as an error; nothing is retried.
//!
//! # Examples
//!
//! ```no_run
//! use ghstack_github::{DeviceAuthClient, Endpoints, IdentityClient, ReqwestTransport};
//! use ghstack_redact::Redactor;
//!
//! # async fn example() -> ghstack_github::Result<()> {
//! let transport = ReqwestTransport::new();
//! let endpoints = Endpoints::for_host("github.com")?;
//!
//! let device = DeviceAuthClient::new(&transport, endpoints.clone(), Redactor::new());
//! let session = device.request_code().await?;
//! println!("User verification code: {}", session.user_code());
//! let token = device.exchange(session.authorized()).await?;
//!
//! let login = IdentityClient::new(&transport, endpoints)
//!     .lookup_login(&token)
//!     .await?;
//! println!("Hello, {login}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod device;
pub mod endpoints;
pub mod error;
pub mod identity;
pub mod transport;

pub use client::ReqwestTransport;
pub use device::{AuthorizedSession, DeviceAuthClient, DeviceCodeSession};
pub use endpoints::{Endpoints, PUBLIC_HOST, is_public_host};
pub use error::{Error, Result};
pub use identity::IdentityClient;
pub use transport::{HttpRequest, HttpResponse, HttpTransport};

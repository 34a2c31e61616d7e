//! Secret redaction for ghstack.
//!
//! This crate provides the [`Redactor`], a registry of secret values that
//! must never appear in rendered log output, and a [`RedactingMakeWriter`]
//! that plugs the registry into a `tracing-subscriber` formatter.
//!
//! # Overview
//!
//! - [`redactor`]: The secret registry and the substitution logic
//! - [`writer`]: A `MakeWriter` wrapper that redacts every rendered line
//!
//! A [`Redactor`] is a cheap, cloneable handle. The same handle is given to
//! the logging setup and to every component that learns a secret, so a value
//! registered anywhere is masked everywhere.
//!
//! # Examples
//!
//! ```
//! use ghstack_redact::Redactor;
//!
//! let redactor = Redactor::new();
//! redactor.register("abc123", "<TOKEN>");
//!
//! assert_eq!(redactor.redact("token=abc123"), "token=<TOKEN>");
//! ```

pub mod redactor;
pub mod writer;

pub use redactor::Redactor;
pub use writer::{RedactingMakeWriter, RedactingWriter};

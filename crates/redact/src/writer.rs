//! A `tracing-subscriber` writer that masks registered secrets.
//!
//! The formatter hands each event to a fresh writer. [`RedactingWriter`]
//! buffers the whole event and only redacts and forwards it on flush or drop,
//! so a secret split across several `write` calls is still caught.

use std::io::{self, Write};

use tracing_subscriber::fmt::MakeWriter;

use crate::Redactor;

/// Wraps another [`MakeWriter`] and redacts everything written through it.
///
/// # Examples
///
/// ```
/// use ghstack_redact::{RedactingMakeWriter, Redactor};
///
/// let redactor = Redactor::new();
/// let make_writer = RedactingMakeWriter::new(std::io::stderr, redactor.clone());
///
/// let _subscriber = tracing_subscriber::fmt()
///     .with_writer(make_writer)
///     .finish();
/// ```
#[derive(Debug, Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
    redactor: Redactor,
}

impl<M> RedactingMakeWriter<M> {
    /// Creates a writer factory that redacts with `redactor` before
    /// forwarding to `inner`.
    #[must_use]
    pub fn new(inner: M, redactor: Redactor) -> Self {
        Self { inner, redactor }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new(self.inner.make_writer(), self.redactor.clone())
    }
}

/// A buffering writer that redacts its contents before forwarding them.
#[derive(Debug)]
pub struct RedactingWriter<W: Write> {
    inner: W,
    redactor: Redactor,
    buf: Vec<u8>,
}

impl<W: Write> RedactingWriter<W> {
    /// Creates a writer forwarding redacted output to `inner`.
    #[must_use]
    pub fn new(inner: W, redactor: Redactor) -> Self {
        Self {
            inner,
            redactor,
            buf: Vec::new(),
        }
    }

    fn forward(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.buf);
        let text = String::from_utf8_lossy(&pending);
        let redacted = self.redactor.redact(&text);
        self.inner.write_all(redacted.as_bytes())
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.forward()?;
        self.inner.flush()
    }
}

impl<W: Write> Drop for RedactingWriter<W> {
    fn drop(&mut self) {
        let _ = self.forward();
        let _ = self.inner.flush();
    }
}

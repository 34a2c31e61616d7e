//! GitHub endpoint derivation.
//!
//! The public host serves its REST API from an `api.` subdomain, while
//! GitHub Enterprise Server serves it under `/api/v3` on the same domain.

use url::Url;

use crate::error::Result;

/// The domain of the public GitHub service.
pub const PUBLIC_HOST: &str = "github.com";

/// The URLs used to authorize a device and identify its user.
///
/// # Examples
///
/// ```
/// use ghstack_github::Endpoints;
///
/// let public = Endpoints::for_host("github.com")?;
/// assert_eq!(public.user().as_str(), "https://api.github.com/user");
///
/// let enterprise = Endpoints::for_host("github.example.com")?;
/// assert_eq!(enterprise.user().as_str(), "https://github.example.com/api/v3/user");
/// # Ok::<(), ghstack_github::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    device_code: Url,
    access_token: Url,
    verification: Url,
    user: Url,
}

impl Endpoints {
    /// Derives the endpoints of a GitHub host from its domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if `host`
    /// cannot form a URL.
    pub fn for_host(host: &str) -> Result<Self> {
        let web = Url::parse(&format!("https://{host}/"))?;
        let api = if is_public_host(host) {
            Url::parse(&format!("https://api.{host}/"))?
        } else {
            web.join("api/v3/")?
        };
        Self::with_bases(&web, &api)
    }

    /// Builds endpoints from explicit web and API base URLs.
    ///
    /// Both bases should end with `/` so that relative paths are appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if a path
    /// cannot be joined onto a base.
    pub fn with_bases(web: &Url, api: &Url) -> Result<Self> {
        Ok(Self {
            device_code: web.join("login/device/code")?,
            access_token: web.join("login/oauth/access_token")?,
            verification: web.join("login/device")?,
            user: api.join("user")?,
        })
    }

    /// Where device and user codes are requested.
    #[must_use]
    pub fn device_code(&self) -> &Url {
        &self.device_code
    }

    /// Where a device code is exchanged for an access token.
    #[must_use]
    pub fn access_token(&self) -> &Url {
        &self.access_token
    }

    /// Where the operator enters the user code, if the server does not say.
    #[must_use]
    pub fn verification(&self) -> &Url {
        &self.verification
    }

    /// The authenticated user endpoint.
    #[must_use]
    pub fn user(&self) -> &Url {
        &self.user
    }
}

/// Returns `true` for the public GitHub domain.
#[must_use]
pub fn is_public_host(host: &str) -> bool {
    host.eq_ignore_ascii_case(PUBLIC_HOST)
}

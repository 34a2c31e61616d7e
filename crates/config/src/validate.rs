//! Syntactic checks for GitHub domains and usernames.
//!
//! The predicates never touch the file system or the network. The
//! `validate_*` wrappers turn a failed check into a [`ConfigError`] that
//! names the offending value and the rule it broke.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConfigError, Result};

/// The longest username GitHub accepts.
pub const MAX_USERNAME_LEN: usize = 39;

/// Hostname-like: word characters, dots and hyphens, ending in `.<word>`.
static DOMAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+\.\w+$").expect("domain pattern is valid"));

/// Alphanumeric runs separated by single hyphens.
static USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z\d]+(?:-[a-z\d]+)*$").expect("username pattern is valid")
});

/// Returns `true` if `s` looks like a bare domain name.
///
/// # Examples
///
/// ```
/// use ghstack_config::validate::is_valid_domain;
///
/// assert!(is_valid_domain("github.com"));
/// assert!(is_valid_domain("github.example.com"));
/// assert!(!is_valid_domain("https://github.example.com"));
/// assert!(!is_valid_domain("localhost"));
/// ```
#[must_use]
pub fn is_valid_domain(s: &str) -> bool {
    DOMAIN.is_match(s)
}

/// Returns `true` if `s` is a syntactically valid GitHub username.
///
/// Usernames are 1 to 39 ASCII letters, digits, or hyphens. A hyphen may
/// not lead, trail, or follow another hyphen.
///
/// # Examples
///
/// ```
/// use ghstack_config::validate::is_valid_username;
///
/// assert!(is_valid_username("A1-b2"));
/// assert!(!is_valid_username("-a"));
/// assert!(!is_valid_username("a--b"));
/// ```
#[must_use]
pub fn is_valid_username(s: &str) -> bool {
    s.len() <= MAX_USERNAME_LEN && USERNAME.is_match(s)
}

/// Checks a domain entered by the operator.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDomain`] if the domain is malformed.
pub fn validate_domain(s: &str) -> Result<()> {
    if is_valid_domain(s) {
        Ok(())
    } else {
        Err(ConfigError::InvalidDomain {
            value: s.to_string(),
            rule: "expected a bare domain name such as github.example.com; do not include the http:// or https:// scheme",
        })
    }
}

/// Checks a username entered by the operator.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidUsername`] if the username is malformed.
pub fn validate_username(s: &str) -> Result<()> {
    if is_valid_username(s) {
        Ok(())
    } else {
        Err(ConfigError::InvalidUsername {
            value: s.to_string(),
            rule: "expected 1-39 letters, digits or single hyphens, not starting or ending with a hyphen",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_domains() {
        for domain in ["github.com", "github.example.com", "git-hub.corp.io", "a.b"] {
            assert!(is_valid_domain(domain), "{domain} should be valid");
        }
    }

    #[test]
    fn rejects_domains() {
        for domain in [
            "",
            "localhost",
            "http://github.com",
            "https://github.example.com",
            "github.com/",
            "github.com:8443",
            "git hub.com",
            "github.",
        ] {
            assert!(!is_valid_domain(domain), "{domain} should be invalid");
        }
    }

    #[test]
    fn accepts_usernames() {
        let longest = "a".repeat(MAX_USERNAME_LEN);
        for name in ["a", "a-b", "A1-b2", "octocat", "0", longest.as_str()] {
            assert!(is_valid_username(name), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_usernames() {
        let too_long = "a".repeat(MAX_USERNAME_LEN + 1);
        for name in ["", "-a", "a-", "a--b", "a_b", "a.b", "a b", too_long.as_str()] {
            assert!(!is_valid_username(name), "{name} should be invalid");
        }
    }

    #[test]
    fn validation_errors_name_value_and_rule() {
        let err = validate_domain("https://github.com").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("https://github.com"));
        assert!(message.contains("scheme"));

        let err = validate_username("a--b").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a--b"));
        assert!(message.contains("hyphen"));
    }

    proptest! {
        #[test]
        fn domains_with_a_scheme_are_rejected(
            scheme in "(http|https|ftp|ssh)",
            host in "[a-z0-9-]{1,20}(\\.[a-z0-9-]{1,20}){1,3}",
        ) {
            let url = format!("{scheme}://{host}");
            prop_assert!(!is_valid_domain(&url));
        }

        #[test]
        fn dotted_hostnames_are_accepted(
            host in "[a-z0-9-]{1,20}(\\.[a-z0-9]{1,20}){1,3}",
        ) {
            prop_assert!(is_valid_domain(&host));
        }

        #[test]
        fn usernames_longer_than_limit_are_rejected(name in "[a-z0-9]{40,60}") {
            prop_assert!(!is_valid_username(&name));
        }

        #[test]
        fn usernames_never_contain_double_hyphens(
            left in "[a-zA-Z0-9]{1,15}",
            right in "[a-zA-Z0-9]{1,15}",
        ) {
            let name = format!("{left}--{right}");
            prop_assert!(!is_valid_username(&name));
            let single = format!("{left}-{right}");
            prop_assert!(is_valid_username(&single));
        }
    }
}

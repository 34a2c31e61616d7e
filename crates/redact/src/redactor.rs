//! The secret registry.
//!
//! Secrets are matched case-insensitively, and longer secrets take priority
//! over shorter ones when they overlap.

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use regex::{Regex, RegexBuilder};

/// A process-scoped, append-only registry of secrets to mask.
///
/// Cloning a `Redactor` yields another handle to the same registry.
///
/// # Examples
///
/// ```
/// use ghstack_redact::Redactor;
///
/// let redactor = Redactor::new();
/// let for_logging = redactor.clone();
///
/// redactor.register("ghp_secret", "<GITHUB_OAUTH>");
/// assert_eq!(
///     for_logging.redact("Authorization: Bearer ghp_secret"),
///     "Authorization: Bearer <GITHUB_OAUTH>",
/// );
/// ```
#[derive(Clone, Default)]
pub struct Redactor {
    inner: Arc<RwLock<Registry>>,
}

#[derive(Default)]
struct Registry {
    /// Registered secrets, longest first.
    entries: Vec<Entry>,
    /// One alternation over every entry, in `entries` order.
    pattern: Option<Regex>,
}

struct Entry {
    secret: String,
    label: String,
}

impl Redactor {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `secret` to be replaced by `label` in all future output.
    ///
    /// Empty secrets are ignored, and registering a secret that is already
    /// known keeps its original label.
    pub fn register(&self, secret: &str, label: &str) {
        if secret.is_empty() {
            return;
        }

        let mut registry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if registry.entries.iter().any(|e| e.secret == secret) {
            return;
        }

        let position = registry
            .entries
            .iter()
            .position(|e| e.secret.len() < secret.len())
            .unwrap_or(registry.entries.len());
        registry.entries.insert(
            position,
            Entry {
                secret: secret.to_string(),
                label: label.to_string(),
            },
        );
        registry.pattern = build_pattern(&registry.entries);
    }

    /// Returns the number of registered secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Returns `true` if no secret has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces every registered secret in `text` with its label.
    ///
    /// Returns the input unchanged (and unallocated) when nothing matches.
    #[must_use]
    pub fn redact<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let registry = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        if registry.entries.is_empty() {
            return Cow::Borrowed(text);
        }

        match &registry.pattern {
            Some(pattern) => pattern.replace_all(text, |caps: &regex::Captures<'_>| {
                // Group i + 1 belongs to entries[i].
                caps.iter()
                    .skip(1)
                    .position(|group| group.is_some())
                    .map_or_else(String::new, |i| registry.entries[i].label.clone())
            }),
            // The alternation could not be compiled.
            None => replace_ignoring_case(text, &registry.entries),
        }
    }
}

impl fmt::Debug for Redactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redactor")
            .field("secrets", &self.len())
            .finish()
    }
}

fn build_pattern(entries: &[Entry]) -> Option<Regex> {
    let alternation = entries
        .iter()
        .map(|e| format!("({})", regex::escape(&e.secret)))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Substitutes `entries` (longest first) in one left-to-right scan, folding
/// ASCII case on both sides.
fn replace_ignoring_case<'t>(text: &'t str, entries: &[Entry]) -> Cow<'t, str> {
    // ASCII folding keeps byte offsets identical between the two strings.
    let haystack = text.to_ascii_lowercase();
    let needles: Vec<String> = entries
        .iter()
        .map(|e| e.secret.to_ascii_lowercase())
        .collect();

    let mut out = String::new();
    let mut copied = 0;
    let mut pos = 0;
    while pos < text.len() {
        let rest = &haystack[pos..];
        match needles.iter().position(|n| rest.starts_with(n.as_str())) {
            Some(i) => {
                out.push_str(&text[copied..pos]);
                out.push_str(&entries[i].label);
                pos += needles[i].len();
                copied = pos;
            }
            None => pos += text[pos..].chars().next().map_or(1, char::len_utf8),
        }
    }

    if copied == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[copied..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn redacts_registered_secret() {
        let redactor = Redactor::new();
        let secret = "abc123";
        redactor.register(secret, "<TOKEN>");

        assert_eq!(redactor.redact(&format!("token={secret}")), "token=<TOKEN>");
    }

    #[test]
    fn redaction_ignores_case() {
        let redactor = Redactor::new();
        redactor.register("abc123", "<TOKEN>");

        assert_eq!(redactor.redact("ABC123 and AbC123"), "<TOKEN> and <TOKEN>");
    }

    #[test]
    fn literal_scan_ignores_case_and_prefers_longest() {
        let entries = [
            Entry {
                secret: "abc123xyz".to_string(),
                label: "<LONG>".to_string(),
            },
            Entry {
                secret: "abc123".to_string(),
                label: "<SHORT>".to_string(),
            },
        ];

        assert_eq!(
            replace_ignoring_case("é ABC123XYZ then aBc123!", &entries),
            "é <LONG> then <SHORT>!"
        );
        assert!(matches!(
            replace_ignoring_case("nothing here", &entries),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn unmatched_text_is_borrowed() {
        let redactor = Redactor::new();
        redactor.register("abc123", "<TOKEN>");

        assert!(matches!(redactor.redact("nothing here"), Cow::Borrowed(_)));
    }

    #[test]
    fn empty_secret_is_ignored() {
        let redactor = Redactor::new();
        redactor.register("", "<EMPTY>");

        assert!(redactor.is_empty());
        assert_eq!(redactor.redact("some text"), "some text");
    }

    #[test]
    fn registering_twice_keeps_first_label() {
        let redactor = Redactor::new();
        redactor.register("abc123", "<FIRST>");
        redactor.register("abc123", "<SECOND>");

        assert_eq!(redactor.len(), 1);
        assert_eq!(redactor.redact("abc123"), "<FIRST>");
    }

    #[test]
    fn longer_secret_wins_over_its_prefix() {
        let redactor = Redactor::new();
        redactor.register("abc", "<SHORT>");
        redactor.register("abc123", "<LONG>");

        assert_eq!(redactor.redact("abc123 abc"), "<LONG> <SHORT>");
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let redactor = Redactor::new();
        redactor.register("a.b*c", "<X>");

        assert_eq!(redactor.redact("a.b*c axbbc"), "<X> axbbc");
    }

    #[test]
    fn clones_share_the_registry() {
        let redactor = Redactor::new();
        let other = redactor.clone();
        other.register("abc123", "<TOKEN>");

        assert_eq!(redactor.redact("abc123"), "<TOKEN>");
    }

    #[test]
    fn debug_does_not_print_secrets() {
        let redactor = Redactor::new();
        redactor.register("abc123", "<TOKEN>");

        let debug = format!("{redactor:?}");
        assert!(!debug.contains("abc123"));
        assert!(debug.contains("secrets: 1"));
    }

    proptest! {
        #[test]
        fn registered_secret_never_survives(
            prefix in "[ -~]{0,20}",
            secret in "[a-zA-Z0-9_]{6,40}",
            suffix in "[ -~]{0,20}",
        ) {
            let redactor = Redactor::new();
            redactor.register(&secret, "<S>");

            let rendered = redactor.redact(&format!("{prefix}{secret}{suffix}")).into_owned();
            prop_assert!(!rendered.contains(&secret));
            prop_assert!(rendered.contains("<S>"));
        }
    }
}

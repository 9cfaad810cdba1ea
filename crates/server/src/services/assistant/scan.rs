//! Email and link extraction from free text.

use std::sync::LazyLock;

use regex::Regex;

use udyog_core::Email;

/// Matches the addresses visitors type into the widget.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._-]+@[a-zA-Z0-9._-]+\.[a-zA-Z0-9_-]+").expect("Invalid regex")
});

/// An absolute http(s) URL, stopping at whitespace, quotes and brackets.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'()\[\]{}]+"#).expect("Invalid regex"));

/// Every email address in `text`, in order of appearance.
pub fn emails(text: &str) -> impl Iterator<Item = Email> + '_ {
    EMAIL_RE
        .find_iter(text)
        .filter_map(|m| Email::parse(m.as_str()).ok())
}

/// The first email address in `text`.
#[must_use]
pub fn first_email(text: &str) -> Option<Email> {
    emails(text).next()
}

/// The first URL in `text`, without trailing sentence punctuation.
#[must_use]
pub fn first_url(text: &str) -> Option<&str> {
    URL_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']))
        .filter(|url| !url.ends_with("://"))
}

//! Input validation for user-supplied URLs
//!
//! Every URL-driven tool runs its raw input through [`normalize_url`] before
//! touching the network. Bare hostnames get `https://` prepended; anything that
//! still fails to parse as an absolute `http`/`https` URL is `InvalidInput`.

use crate::ToolError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;
use url::Url;

const DEFAULT_SCHEME: &str = "https://";

/// An absolute URL with an explicit scheme, produced by [`normalize_url`].
///
/// Keeps the normalized text as entered (`https://example.com`) alongside the
/// parsed form, which may differ cosmetically (`https://example.com/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUrl {
    text: String,
    parsed: Url,
}

impl Serialize for CanonicalUrl {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn url(&self) -> &Url {
        &self.parsed
    }

    pub fn is_https(&self) -> bool {
        self.parsed.scheme() == "https"
    }

    pub fn host(&self) -> &str {
        self.parsed.host_str().unwrap_or_default()
    }

    /// Resolves a path against this URL's origin, e.g. a theme stylesheet.
    pub fn join(&self, path: &str) -> Result<Url, ToolError> {
        Ok(self.parsed.join(path)?)
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme pattern is valid")
    })
}

/// Normalizes free text into a canonical URL.
///
/// ```rust
/// use wp_toolkit::normalize_url;
///
/// let url = normalize_url("example.com").unwrap();
/// assert_eq!(url.as_str(), "https://example.com");
/// ```
pub fn normalize_url(raw: &str) -> Result<CanonicalUrl, ToolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ToolError::InvalidInput(
            "Please enter a valid URL".to_string(),
        ));
    }

    let text = if scheme_pattern().is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{trimmed}")
    };

    let parsed = validate_url(&text)?;
    Ok(CanonicalUrl { text, parsed })
}

/// Strict validation: the input must already carry an `http` or `https` scheme.
pub fn validate_url(url: &str) -> Result<Url, ToolError> {
    let parsed = Url::parse(url)
        .map_err(|e| ToolError::InvalidInput(format!("'{url}' is not a valid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ToolError::InvalidInput(format!(
                "unsupported scheme '{other}' (expected http or https)"
            )))
        }
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(ToolError::InvalidInput(format!("'{url}' has no host"))),
    }
}

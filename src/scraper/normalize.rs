//! URL canonicalization used for source identity and article keys.
//!
//! Neither function fails: input that does not parse as an absolute URL
//! yields an empty string.

use url::Url;

/// Network location of `url` (host and explicit port) with one leading
/// `www.` removed. Credentials are not part of the result.
pub fn canonical_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };

    let mut netloc = parsed.host_str().unwrap_or_default().to_string();
    if let Some(port) = parsed.port() {
        netloc.push(':');
        netloc.push_str(&port.to_string());
    }

    match netloc.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => netloc,
    }
}

/// Path of `url` without query string or fragment.
pub fn canonical_path(url: &str) -> String {
    Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_default()
}

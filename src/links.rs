//! URL syntax check for `@tutorial` links. Purely syntactic, no network.

use url::Url;

/// Accept only well-formed `http://` / `https://` URLs with a host.
pub fn is_valid_http_url(candidate: &str) -> bool {
    let candidate = candidate.trim();
    if !(candidate.starts_with("http://") || candidate.starts_with("https://")) {
        return false;
    }
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(is_valid_http_url("https://docs.godotengine.org/en/stable/"));
        assert!(is_valid_http_url("http://example.com"));
        assert!(is_valid_http_url("https://example.com:8080/a?b=c#d"));
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(!is_valid_http_url("not-a-url"));
        assert!(!is_valid_http_url("ftp://example.com"));
        assert!(!is_valid_http_url("https://"));
        assert!(!is_valid_http_url("https://exa mple.com"));
        assert!(!is_valid_http_url(""));
    }
}

use crate::url::policy::DomainPolicy;
use crate::UrlError;
use url::Url;

/// Canonicalizes an absolute URL for the visited set
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only HTTP and HTTPS
/// 3. Require a host
/// 4. Remove the fragment (`#section` addresses the same document)
///
/// Host lowercasing, default-port removal and dot-segment resolution are
/// performed by the URL parser itself. Query strings are kept verbatim:
/// the mirror never rewrites the identity of a page beyond its fragment.
///
/// # Examples
///
/// ```
/// use site_mirror::url::canonicalize_url;
///
/// let url = canonicalize_url("https://EXAMPLE.com/a/../b#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/b");
/// ```
pub fn canonicalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    check_http(&url)?;
    url.set_fragment(None);
    Ok(url)
}

/// Resolves an `href`/`src` value against the page it appears on
///
/// Returns None if the reference should be ignored:
/// - empty or fragment-only references
/// - javascript:, mailto:, tel:, data: schemes
/// - references that do not resolve to an HTTP(S) URL
pub fn resolve_reference(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if check_http(&absolute).is_err() {
        return None;
    }
    absolute.set_fragment(None);
    Some(absolute)
}

/// Validates a user-supplied seed URL
///
/// A missing scheme defaults to `https://`. The seed must have a host and
/// must pass the domain policy.
///
/// # Examples
///
/// ```
/// use site_mirror::url::{validate_seed_url, DomainPolicy};
///
/// let policy = DomainPolicy::default();
/// let url = validate_seed_url("example.com/docs", &policy).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// assert!(validate_seed_url("https://www.facebook.com/", &policy).is_err());
/// ```
pub fn validate_seed_url(raw: &str, policy: &DomainPolicy) -> Result<Url, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = canonicalize_url(&with_scheme)?;

    if !policy.is_allowed(&url) {
        return Err(UrlError::DomainNotAllowed(
            url.host_str().unwrap_or_default().to_string(),
        ));
    }

    Ok(url)
}

fn check_http(url: &Url) -> Result<(), UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlError::MissingDomain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/docs/intro").unwrap()
    }

    #[test]
    fn test_remove_fragment() {
        let result = canonicalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keeps_scheme_and_query() {
        let result = canonicalize_url("http://example.com/page?b=2&a=1").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page?b=2&a=1");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = canonicalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = canonicalize_url("ftp://example.com/page");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(
            canonicalize_url("not a url"),
            Err(UrlError::Parse(_))
        ));
    }

    #[test]
    fn test_resolve_relative_reference() {
        let resolved = resolve_reference("../img/logo.png", &base_url()).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/img/logo.png");

        let resolved = resolve_reference("guide#install", &base_url()).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/docs/guide");
    }

    #[test]
    fn test_resolve_skips_special_schemes() {
        assert!(resolve_reference("javascript:void(0)", &base_url()).is_none());
        assert!(resolve_reference("mailto:someone@example.com", &base_url()).is_none());
        assert!(resolve_reference("tel:+123", &base_url()).is_none());
        assert!(resolve_reference("data:image/png;base64,AAAA", &base_url()).is_none());
        assert!(resolve_reference("#top", &base_url()).is_none());
        assert!(resolve_reference("   ", &base_url()).is_none());
        assert!(resolve_reference("ftp://example.com/file", &base_url()).is_none());
    }

    #[test]
    fn test_seed_scheme_defaults_to_https() {
        let policy = DomainPolicy::default();
        let url = validate_seed_url("example.com", &policy).unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_seed_rejections() {
        let policy = DomainPolicy::default();
        assert!(matches!(validate_seed_url("", &policy), Err(UrlError::Empty)));
        assert!(matches!(
            validate_seed_url("https://linkedin.com/in/someone", &policy),
            Err(UrlError::DomainNotAllowed(_))
        ));
    }
}

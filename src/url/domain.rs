use url::Url;

/// Extracts the network location (`host` or `host:port`) from a URL
///
/// The port is included only when it differs from the scheme's default,
/// so `https://example.com:443/` and `https://example.com/` share a netloc.
/// The host is lowercased by the URL parser.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_mirror::url::extract_netloc;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_netloc(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_netloc(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_netloc(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_netloc(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_netloc(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_explicit_port_is_kept() {
        let url = Url::parse("https://example.com:8443/").unwrap();
        assert_eq!(extract_netloc(&url), Some("example.com:8443".to_string()));
    }

    #[test]
    fn test_default_port_is_dropped() {
        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(extract_netloc(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_mixed_case() {
        let url = Url::parse("https://Example.COM/page#section").unwrap();
        assert_eq!(extract_netloc(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_no_host() {
        let url = Url::parse("data:text/plain,hello").unwrap();
        assert_eq!(extract_netloc(&url), None);
    }
}

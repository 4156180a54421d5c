use crate::config::PolicyConfig;
use crate::url::domain::extract_netloc;
use url::Url;

/// How a discovered link is treated by the crawl loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkClass {
    /// Same netloc as the session's base domain
    Internal,
    /// Different host, accepted because external links are followed
    External,
    /// Never visited
    Denied,
}

impl LinkClass {
    /// Returns true if the link may be visited
    pub fn should_follow(&self) -> bool {
        matches!(self, Self::Internal | Self::External)
    }
}

/// Blocked/allowed domain lists
///
/// Patterns are matched as case-insensitive substrings of the host, so
/// `facebook.com` also blocks `m.facebook.com`.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    blocked: Vec<String>,
    allowed: Vec<String>,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}

impl DomainPolicy {
    pub fn new<B, A>(blocked: B, allowed: A) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self {
            blocked: blocked
                .into_iter()
                .map(|d| d.as_ref().to_lowercase())
                .collect(),
            allowed: allowed
                .into_iter()
                .map(|d| d.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(&config.blocked_domains, &config.allowed_domains)
    }

    /// Checks whether a URL may be fetched at all
    ///
    /// # Rules
    ///
    /// 1. Any blocked pattern contained in the host → denied
    /// 2. Non-empty allow-list: allowed only if the host contains an entry
    /// 3. Otherwise allowed
    ///
    /// # Examples
    ///
    /// ```
    /// use site_mirror::url::DomainPolicy;
    /// use url::Url;
    ///
    /// let policy = DomainPolicy::new(["tracker.net"], Vec::<String>::new());
    /// assert!(policy.is_allowed(&Url::parse("https://example.com/").unwrap()));
    /// assert!(!policy.is_allowed(&Url::parse("https://cdn.TRACKER.net/x.js").unwrap()));
    /// ```
    pub fn is_allowed(&self, url: &Url) -> bool {
        let host = match url.host_str() {
            Some(h) => h.to_lowercase(),
            None => return false,
        };

        if self.blocked.iter().any(|blocked| host.contains(blocked.as_str())) {
            return false;
        }

        if !self.allowed.is_empty() {
            return self.allowed.iter().any(|allowed| host.contains(allowed.as_str()));
        }

        true
    }

    /// Classifies a discovered link relative to the session's base domain
    pub fn classify_link(&self, url: &Url, base_domain: &str, follow_external: bool) -> LinkClass {
        classify_link(url, base_domain, follow_external, self)
    }
}

/// Classifies a link as internal, external or denied
///
/// A link is internal when its netloc equals `base_domain` exactly. Other
/// links are denied unless `follow_external` is set, in which case they are
/// subject to [`DomainPolicy::is_allowed`]. Non-HTTP(S) links are denied.
pub fn classify_link(
    url: &Url,
    base_domain: &str,
    follow_external: bool,
    policy: &DomainPolicy,
) -> LinkClass {
    if url.scheme() != "http" && url.scheme() != "https" {
        return LinkClass::Denied;
    }

    let netloc = match extract_netloc(url) {
        Some(n) => n,
        None => return LinkClass::Denied,
    };

    if netloc == base_domain {
        return LinkClass::Internal;
    }

    if follow_external && policy.is_allowed(url) {
        LinkClass::External
    } else {
        LinkClass::Denied
    }
}

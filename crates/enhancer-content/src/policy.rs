//! Whether the content script may run on a page.

use url::Url;

/// Host name fragments that mark a page as too sensitive to touch.
///
/// A coarse heuristic; it guarantees nothing about sites it misses.
pub const SENSITIVE_HOST_PATTERNS: &[&str] = &["bank", "paypal", "secure", "login", "auth", "admin"];

/// The parts of a page location the policy looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationInfo {
    /// Scheme with trailing colon, e.g. `https:`.
    pub protocol: String,
    /// Lower-cased host name; empty for host-less URLs.
    pub hostname: String,
    pub pathname: String,
}

impl LocationInfo {
    pub fn new(protocol: impl Into<String>, hostname: impl Into<String>, pathname: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            hostname: hostname.into().to_lowercase(),
            pathname: pathname.into(),
        }
    }

    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(url)?;
        Ok(Self::new(
            format!("{}:", url.scheme()),
            url.host_str().unwrap_or_default(),
            url.path(),
        ))
    }

    /// `hostname + pathname`, the string path-bearing patterns match against.
    pub fn host_and_path(&self) -> String {
        format!("{}{}", self.hostname, self.pathname)
    }
}

/// User-configured blocked hosts and host+path prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList {
    patterns: Vec<String>,
}

impl BlockList {
    /// Parse a comma-separated list. Entries are trimmed, lower-cased and
    /// stripped of any `scheme://` prefix; empty entries are dropped.
    pub fn parse(domains: &str) -> Self {
        let patterns = domains
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| match d.split_once("://") {
                Some((_, rest)) => rest,
                None => d,
            })
            .map(str::to_lowercase)
            .collect();
        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// A bare host matches itself and any subdomain; a pattern with a `/`
    /// matches as a literal prefix of `host + path`.
    pub fn matches(&self, location: &LocationInfo) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let host = location.hostname.as_str();
        let host_and_path = location.host_and_path();

        self.patterns.iter().any(|pattern| {
            if pattern.contains('/') {
                host_and_path.starts_with(pattern.as_str())
            } else {
                host == pattern || host.ends_with(&format!(".{}", pattern))
            }
        })
    }
}

/// Location checks. Free of side effects.
pub struct DomainPolicy;

impl DomainPolicy {
    /// Extension-internal and blank pages never get a content script.
    pub fn is_supported_protocol(location: &LocationInfo) -> bool {
        let protocol = location.protocol.as_str();
        !(protocol.starts_with("chrome") || protocol.starts_with("moz-extension") || protocol == "about:")
    }

    pub fn is_sensitive_host(location: &LocationInfo) -> bool {
        SENSITIVE_HOST_PATTERNS
            .iter()
            .any(|pattern| location.hostname.contains(pattern))
    }

    pub fn should_run(location: &LocationInfo, block_list: &BlockList) -> bool {
        Self::is_supported_protocol(location) && !Self::is_sensitive_host(location) && !block_list.matches(location)
    }
}

//! Candidate discovery.

use std::collections::HashSet;

use enhancer_config::ContentConfig;
use enhancer_protocols::{NodeId, PageDom, Selector, SelectorError};

/// Selector tables, parsed once at injection.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub generic: Selector,
    /// `(host substring, selectors)` overrides for named platforms.
    pub platforms: Vec<(String, Selector)>,
}

impl ScannerConfig {
    pub fn from_config(config: &ContentConfig) -> Result<Self, SelectorError> {
        let generic = Selector::parse(&config.generic_selectors)?;
        let platforms = config
            .platform_selectors
            .iter()
            .map(|p| Ok((p.host_contains.to_lowercase(), Selector::parse(&p.selectors)?)))
            .collect::<Result<Vec<_>, SelectorError>>()?;
        Ok(Self { generic, platforms })
    }
}

#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Candidates for `hostname`: generic matches first, then any platform
    /// override whose host substring matches, without duplicates.
    pub fn candidates(&self, page: &dyn PageDom, hostname: &str) -> Vec<NodeId> {
        let hostname = hostname.to_lowercase();
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        let platform_selectors = self
            .config
            .platforms
            .iter()
            .filter(|(host, _)| hostname.contains(host.as_str()))
            .map(|(_, selector)| selector);

        for selector in std::iter::once(&self.config.generic).chain(platform_selectors) {
            for node in page.query_selector_all(selector) {
                if seen.insert(node) {
                    out.push(node);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MemoryPage;
    use enhancer_config::PlatformSelectors;

    fn scanner() -> Scanner {
        Scanner::new(ScannerConfig::from_config(&ContentConfig::default()).unwrap())
    }

    const CHAT: &str = r#"<html><body>
        <textarea id="plain"></textarea>
        <div id="ql" class="ql-editor" contenteditable="true"></div>
        <div id="slackqa" data-qa="message_input"></div>
        <div id="ck" class="ck-content"></div>
    </body></html>"#;

    #[test]
    fn test_generic_only_on_unknown_host() {
        let (page, _channels) = MemoryPage::parse("https://example.com/", CHAT);
        let found = scanner().candidates(page.as_ref(), "example.com");
        let ids: Vec<_> = found.iter().map(|n| page.attribute(*n, "id").unwrap()).collect();
        assert_eq!(ids, vec!["plain", "ql"]);
    }

    #[test]
    fn test_platform_overrides_added_without_duplicates() {
        let (page, _channels) = MemoryPage::parse("https://app.slack.com/client", CHAT);
        let found = scanner().candidates(page.as_ref(), "app.slack.com");
        let ids: Vec<_> = found.iter().map(|n| page.attribute(*n, "id").unwrap()).collect();
        assert_eq!(ids, vec!["plain", "ql", "slackqa"]);

        let found = scanner().candidates(page.as_ref(), "TEAMS.microsoft.com");
        let ids: Vec<_> = found.iter().map(|n| page.attribute(*n, "id").unwrap()).collect();
        assert_eq!(ids, vec!["plain", "ql", "ck"]);
    }

    #[test]
    fn test_platform_selector_with_quoted_comma() {
        let mut config = ContentConfig::default();
        config.platform_selectors = vec![PlatformSelectors::new(
            "mail.example.org",
            r#"div[aria-label="Reply, Message"], form .composer > [role="textbox"]"#,
        )];
        let scanner = Scanner::new(ScannerConfig::from_config(&config).unwrap());

        let html = r#"<html><body>
            <div id="reply" aria-label="Reply, Message"></div>
            <div id="other" aria-label="Reply"></div>
            <form><div class="composer"><div id="nested" role="textbox"></div></div></form>
            <div id="loose" role="textbox"></div>
        </body></html>"#;
        let (page, _channels) = MemoryPage::parse("https://mail.example.org/", html);
        let found = scanner.candidates(page.as_ref(), "mail.example.org");
        let ids: Vec<_> = found.iter().map(|n| page.attribute(*n, "id").unwrap()).collect();
        assert_eq!(ids, vec!["reply", "nested"]);
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut config = ContentConfig::default();
        config.generic_selectors = "div > ".to_string();
        assert!(ScannerConfig::from_config(&config).is_err());
    }
}

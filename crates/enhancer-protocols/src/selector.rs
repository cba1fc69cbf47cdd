//! CSS selector lists.
//!
//! Parsing is done by `scraper`; page hosts match a [`Selector`] through
//! [`Selector::compiled`].

use crate::error::SelectorError;

/// A parsed selector list together with its source text.
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    compiled: scraper::Selector,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        if source.trim().is_empty() {
            return Err(SelectorError::Empty(source.to_string()));
        }
        let compiled = scraper::Selector::parse(source).map_err(|e| SelectorError::Invalid {
            selector: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    /// The selector text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn compiled(&self) -> &scraper::Selector {
        &self.compiled
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn matched_ids(selector: &str, html: &str) -> Vec<String> {
        let sel = Selector::parse(selector).unwrap();
        let fragment = Html::parse_fragment(html);
        fragment
            .select(sel.compiled())
            .filter_map(|el| el.value().attr("id").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_generic_input_selectors() {
        let html = r#"
            <textarea id="t"></textarea>
            <input id="text" type="text">
            <input id="email" type="email">
            <input id="bare">
            <div id="ce" contenteditable="true"></div>
            <input id="pw" type="password">
            <input id="cb" type="checkbox">
            <div id="off" contenteditable="false"></div>
            <div id="plain"></div>
        "#;
        let ids = matched_ids(
            r#"textarea, input[type="text"], input[type="email"], input:not([type]), [contenteditable="true"]"#,
            html,
        );
        assert_eq!(ids, vec!["t", "text", "email", "bare", "ce"]);
    }

    #[test]
    fn test_comma_inside_quoted_value() {
        let sel = Selector::parse(r#"[aria-label="Reply, Message"]"#).unwrap();
        assert_eq!(sel.source(), r#"[aria-label="Reply, Message"]"#);

        let ids = matched_ids(
            r#"[aria-label="Reply, Message"]"#,
            r#"<div id="yes" aria-label="Reply, Message"></div><div id="no" aria-label="Reply"></div>"#,
        );
        assert_eq!(ids, vec!["yes"]);
    }

    #[test]
    fn test_platform_selectors() {
        let html = r#"
            <div id="gmail" class="Am Al editable LW-avf"></div>
            <div id="half" class="Am editable"></div>
            <div id="slack" data-qa="message_input"></div>
            <div id="teams" role="textbox" contenteditable="true"></div>
            <div id="role-only" role="textbox"></div>
        "#;
        assert_eq!(matched_ids(".Am.Al.editable", html), vec!["gmail"]);
        assert_eq!(matched_ids(r#"[data-qa^=message]"#, html), vec!["slack"]);
        assert_eq!(
            matched_ids(r#"[role="textbox"][contenteditable="true"]"#, html),
            vec!["teams"]
        );
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            Selector::parse("input[type="),
            Err(SelectorError::Invalid { .. })
        ));
        assert!(Selector::parse("textarea,,input").is_err());
        assert!(matches!(Selector::parse("  "), Err(SelectorError::Empty(_))));
    }

    #[test]
    fn test_equality_and_display_use_source() {
        let a = Selector::parse(".ql-editor, [data-qa=\"message_input\"]").unwrap();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), ".ql-editor, [data-qa=\"message_input\"]");
        assert_ne!(a, Selector::parse(".ql-editor").unwrap());
    }
}

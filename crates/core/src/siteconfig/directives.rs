use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer};

use crate::error::{ClearlyError, Result};
use crate::siteconfig::matcher::pattern_matches;

/// How to find the author name on a page
#[derive(Debug, Clone)]
pub enum AuthorRule {
    /// CSS selector; the first match's text is the author
    Selector(String),
    /// Regex run against the serialized document; group 1 (or the whole match) is the author
    Pattern(Regex),
}

impl AuthorRule {
    /// Parse a rule. Strings written as `/body/flags` become patterns, anything
    /// else (including a pattern that fails to compile) is kept as a selector.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if let Some(rest) = trimmed.strip_prefix('/')
            && let Some(end) = rest.rfind('/')
        {
            let (body, flags) = (&rest[..end], &rest[end + 1..]);
            let compiled = RegexBuilder::new(body)
                .case_insensitive(flags.contains('i'))
                .multi_line(flags.contains('m'))
                .dot_matches_new_line(flags.contains('s'))
                .build();
            match compiled {
                Ok(re) => return AuthorRule::Pattern(re),
                Err(e) => tracing::warn!("author pattern {trimmed} kept as a selector: {e}"),
            }
        }
        AuthorRule::Selector(trimmed.to_string())
    }
}

impl PartialEq for AuthorRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AuthorRule::Selector(a), AuthorRule::Selector(b)) => a == b,
            (AuthorRule::Pattern(a), AuthorRule::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(one) => vec![one],
            OneOrMany::Many(many) => many,
        }
    }
}

fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(OneOrMany::deserialize(deserializer)?.into())
}

fn author_rules<'de, D>(deserializer: D) -> std::result::Result<Vec<AuthorRule>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<String> = OneOrMany::deserialize(deserializer)?.into();
    Ok(values.iter().map(|v| AuthorRule::parse(v)).collect())
}

/// Overrides for the pages matched by one site-config key
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteRule {
    /// Selectors for the element holding the whole article
    #[serde(deserialize_with = "string_or_list")]
    pub content_elem: Vec<String>,
    /// Selectors whose matches are joined to form the article
    #[serde(deserialize_with = "string_or_list")]
    pub extract_elems: Vec<String>,
    /// HTML inserted between extracted elements
    pub extract_elems_joiner: Option<String>,
    pub content_type: Option<String>,
    #[serde(deserialize_with = "author_rules")]
    pub author_name: Vec<AuthorRule>,
    /// Removed before anything else runs
    #[serde(deserialize_with = "string_or_list")]
    pub ignore_elements: Vec<String>,
    /// Removed from the extracted content
    #[serde(deserialize_with = "string_or_list")]
    pub exclude_elems: Vec<String>,
    pub readable: Option<bool>,
}

impl SiteRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// `false` only when the rule opts the site out of extraction
    pub fn is_readable(&self) -> bool {
        self.readable != Some(false)
    }
}

/// Ordered map from URL pattern to [`SiteRule`].
///
/// Keys are matched in insertion order and the first match wins, so keys are
/// not sorted by specificity.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SiteConfigMap {
    rules: IndexMap<String, SiteRule>,
}

impl SiteConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `pattern -> rule`.
    ///
    /// # Errors
    ///
    /// Returns [`ClearlyError::SiteConfigError`] when the document is not such an object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ClearlyError::SiteConfigError(e.to_string()))
    }

    pub fn insert(&mut self, pattern: impl Into<String>, rule: SiteRule) {
        self.rules.insert(pattern.into(), rule);
    }

    /// Merge another map in; keys already present keep their rule and position.
    pub fn merge(&mut self, other: &SiteConfigMap) {
        for (pattern, rule) in &other.rules {
            if !self.rules.contains_key(pattern) {
                self.rules.insert(pattern.clone(), rule.clone());
            }
        }
    }

    /// First rule whose pattern matches `url`, with its key
    pub fn resolve(&self, url: &str) -> Option<(&str, &SiteRule)> {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern_matches(pattern, url))
            .map(|(pattern, rule)| (pattern.as_str(), rule))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SiteRule)> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "github.com/*/*/issues/": {
            "contentElem": ".js-discussion",
            "contentType": "discussion",
            "excludeElems": [".timeline-comment-actions", ".reaction-summary"]
        },
        "example.com": {
            "authorName": ["/by ([A-Z][a-z]+ [A-Z][a-z]+)/i", ".author-name"],
            "ignoreElements": ".promo"
        },
        "paywalled.example": { "readable": false }
    }"#;

    #[test]
    fn test_parse_rules() {
        let map = SiteConfigMap::from_json(CONFIG).unwrap();
        assert_eq!(map.len(), 3);

        let (_, rule) = map.resolve("https://example.com/post").unwrap();
        assert_eq!(rule.ignore_elements, vec![".promo"]);
        assert!(matches!(rule.author_name[0], AuthorRule::Pattern(_)));
        assert_eq!(rule.author_name[1], AuthorRule::Selector(".author-name".to_string()));
    }

    #[test]
    fn test_resolve_wildcard() {
        let map = SiteConfigMap::from_json(CONFIG).unwrap();
        let (key, rule) = map.resolve("https://github.com/a/b/issues/12").unwrap();
        assert_eq!(key, "github.com/*/*/issues/");
        assert_eq!(rule.content_type.as_deref(), Some("discussion"));
        assert_eq!(rule.content_elem, vec![".js-discussion"]);
        assert!(map.resolve("https://github.com/a/b/pulls").is_none());
    }

    #[test]
    fn test_readable_opt_out() {
        let map = SiteConfigMap::from_json(CONFIG).unwrap();
        let (_, rule) = map.resolve("https://paywalled.example/story").unwrap();
        assert!(!rule.is_readable());
        assert!(SiteRule::new().is_readable());
    }

    #[test]
    fn test_author_rule_fallback() {
        assert!(matches!(AuthorRule::parse("/(unclosed/"), AuthorRule::Selector(_)));
        assert!(matches!(AuthorRule::parse(".byline a"), AuthorRule::Selector(_)));
        match AuthorRule::parse("/Written by (\\w+)/i") {
            AuthorRule::Pattern(re) => assert!(re.is_match("WRITTEN BY someone")),
            other => panic!("expected a pattern, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_keeps_first() {
        let mut first = SiteConfigMap::from_json(r#"{"a.com": {"contentType": "one"}}"#).unwrap();
        let second = SiteConfigMap::from_json(r#"{"a.com": {"contentType": "two"}, "b.com": {}}"#).unwrap();
        first.merge(&second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.resolve("https://a.com/").unwrap().1.content_type.as_deref(), Some("one"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            SiteConfigMap::from_json("[1, 2]"),
            Err(ClearlyError::SiteConfigError(_))
        ));
    }
}

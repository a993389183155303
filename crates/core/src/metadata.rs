use std::collections::HashMap;

use serde_json::Value;

use crate::Document;
use crate::patterns::{
    JSON_LD_ARTICLE_TYPES, META_NAME, META_PROPERTY, SCHEMA_ORG, TITLE_HEAD, TITLE_SEPARATOR, TITLE_TAIL,
    WHITESPACE_RUN,
};
use crate::tags::Tag;

/// Represents the page-level metadata found outside the article body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub published_time: Option<String>,
    /// `og:image` / `twitter:image`, used when the content has no cover photo
    pub image: Option<String>,
}

/// Fields read from a schema.org JSON-LD block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonLdMetadata {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub date_published: Option<String>,
}

/// Word count the way a whitespace split counts it: a leading or trailing
/// space adds an empty field.
pub fn word_count(text: &str) -> usize {
    WHITESPACE_RUN.split(text).count()
}

/// Share of `b`'s tokens that also appear in `a`, weighted by length (0.0 to 1.0)
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let tokenize = |s: &str| -> Vec<String> {
        s.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    };
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let unique_b: Vec<&str> = tokens_b
        .iter()
        .filter(|t| !tokens_a.contains(t))
        .map(String::as_str)
        .collect();
    let distance = unique_b.join(" ").chars().count() as f64 / tokens_b.join(" ").chars().count() as f64;
    1.0 - distance
}

impl Document {
    /// Extract all metadata at once.
    ///
    /// JSON-LD wins over `<meta>` tags, which win over the `<title>` heuristic.
    pub fn extract_metadata(&self) -> Metadata {
        let json_ld = self.extract_json_ld().unwrap_or_default();
        let values = self.meta_values();
        let pick = |keys: &[&str]| keys.iter().find_map(|k| values.get(*k).cloned());

        let title = json_ld
            .title
            .or_else(|| {
                pick(&[
                    "dc:title",
                    "dcterm:title",
                    "og:title",
                    "weibo:article:title",
                    "weibo:webpage:title",
                    "title",
                    "twitter:title",
                ])
            })
            .unwrap_or_else(|| self.article_title());

        Metadata {
            title,
            byline: json_ld.byline.or_else(|| pick(&["dc:creator", "dcterm:creator", "author"])),
            excerpt: json_ld.excerpt.or_else(|| {
                pick(&[
                    "dc:description",
                    "dcterm:description",
                    "og:description",
                    "weibo:article:description",
                    "weibo:webpage:description",
                    "description",
                    "twitter:description",
                ])
            }),
            site_name: json_ld.site_name.or_else(|| pick(&["og:site_name"])),
            published_time: json_ld.date_published.or_else(|| pick(&["article:published_time"])),
            image: pick(&["og:image", "twitter:image"]),
        }
    }

    /// `<meta>` contents keyed by normalized name (`og:title`, `dc:creator`, ...).
    /// Later tags overwrite earlier ones.
    fn meta_values(&self) -> HashMap<String, String> {
        let mut values = HashMap::new();

        for meta in self.get_elements_by_tag(self.root(), &[Tag::Meta]) {
            let Some(content) = self.attr(meta, "content").map(str::trim).filter(|c| !c.is_empty()) else {
                continue;
            };

            let mut matched = false;
            if let Some(property) = self.attr(meta, "property") {
                for m in META_PROPERTY.find_iter(property) {
                    let name: String = m.as_str().to_lowercase().split_whitespace().collect();
                    values.insert(name, content.to_string());
                    matched = true;
                }
            }

            if !matched
                && let Some(name) = self.attr(meta, "name")
                && META_NAME.is_match(name)
            {
                let name: String = name.to_lowercase().split_whitespace().collect::<String>().replace('.', ":");
                values.insert(name, content.to_string());
            }
        }

        values
    }

    /// Read the first schema.org article object from `application/ld+json` scripts
    pub fn extract_json_ld(&self) -> Option<JsonLdMetadata> {
        let scripts = self
            .get_elements_by_tag(self.root(), &[Tag::Script])
            .into_iter()
            .filter(|s| self.attr(*s, "type") == Some("application/ld+json"));

        for script in scripts {
            let text = self.text_content(script);
            let text = text.trim().trim_start_matches("<![CDATA[").trim_end_matches("]]>");
            let Ok(parsed) = serde_json::from_str::<Value>(text) else {
                continue;
            };
            if let Some(article) = Self::find_json_ld_article(&parsed) {
                return Some(self.json_ld_fields(article));
            }
        }

        None
    }

    fn find_json_ld_article(parsed: &Value) -> Option<&Value> {
        let is_article = |v: &Value| v.get("@type").and_then(Value::as_str).is_some_and(|t| JSON_LD_ARTICLE_TYPES.is_match(t));

        if let Some(items) = parsed.as_array() {
            return items.iter().find(|item| is_article(*item));
        }

        let context_ok = parsed.get("@context").and_then(Value::as_str).is_some_and(|c| SCHEMA_ORG.is_match(c));
        if !context_ok {
            return None;
        }

        if parsed.get("@type").is_none()
            && let Some(graph) = parsed.get("@graph").and_then(Value::as_array)
        {
            return graph.iter().find(|item| is_article(*item));
        }

        is_article(parsed).then_some(parsed)
    }

    fn json_ld_fields(&self, article: &Value) -> JsonLdMetadata {
        let text = |key: &str| article.get(key).and_then(Value::as_str).map(|s| s.trim().to_string());

        let title = match (text("name"), text("headline")) {
            (Some(name), Some(headline)) if name != headline => {
                let doc_title = self.title().unwrap_or_default();
                let name_matches = text_similarity(&name, &doc_title) > 0.75;
                let headline_matches = text_similarity(&headline, &doc_title) > 0.75;
                if name_matches && !headline_matches { Some(name) } else { Some(headline) }
            }
            (name, headline) => headline.or(name),
        };

        let byline = match article.get("author") {
            Some(Value::String(name)) => Some(name.trim().to_string()),
            Some(Value::Object(author)) => author.get("name").and_then(Value::as_str).map(|s| s.trim().to_string()),
            Some(Value::Array(authors)) => {
                let names: Vec<&str> = authors
                    .iter()
                    .filter_map(|a| a.get("name").and_then(Value::as_str).or_else(|| a.as_str()))
                    .map(str::trim)
                    .collect();
                (!names.is_empty()).then(|| names.join(", "))
            }
            _ => None,
        };

        JsonLdMetadata {
            title,
            byline,
            excerpt: text("description"),
            site_name: article
                .get("publisher")
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string()),
            date_published: text("datePublished"),
        }
    }

    /// Derive the article title from `<title>`.
    ///
    /// Site names are cut at hierarchical separators (`| - \ / > »`) or at
    /// `": "`. Very short or very long titles fall back to a lone `<h1>`. The
    /// original title comes back when the result has four words or fewer, unless
    /// exactly one separator-delimited term was cut.
    pub fn article_title(&self) -> String {
        let original = self.title().unwrap_or_default();
        let mut current = original.clone();

        if TITLE_SEPARATOR.is_match(&current) {
            current = TITLE_HEAD.replace(&original, "$1").into_owned();
            if word_count(&current) < 3 {
                current = TITLE_TAIL.replace(&original, "$1").into_owned();
            }
        } else if current.contains(": ") {
            let headings = self.get_elements_by_tag(self.root(), &[Tag::H1, Tag::H2]);
            let trimmed = current.trim();
            let heading_matches = headings.iter().any(|h| self.text_content(*h).trim() == trimmed);
            if !heading_matches {
                let last = original.rfind(':').map_or(0, |i| i + 1);
                let first = original.find(':').unwrap_or(0);
                current = original[last..].to_string();
                if word_count(&current) < 3 {
                    current = original[first + 1..].to_string();
                } else if word_count(&original[..first]) > 5 {
                    current = original.clone();
                }
            }
        } else {
            let length = current.chars().count();
            if !(15..=150).contains(&length) {
                let h1s = self.get_elements_by_tag(self.root(), &[Tag::H1]);
                if h1s.len() == 1 {
                    current = self.inner_text(h1s[0]);
                }
            }
        }

        let current = current.split_whitespace().collect::<Vec<_>>().join(" ");
        let removed_one_term =
            TITLE_SEPARATOR.split(&original).count().saturating_sub(TITLE_SEPARATOR.split(&current).count()) == 1;
        if word_count(&current) <= 4 && !removed_one_term {
            return original;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const HTML_WITH_META: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page Title | Example</title>
            <meta name="author" content="John Doe">
            <meta name="description" content="A plain description">
            <meta property="og:description" content="The OG description">
            <meta property="og:site_name" content="Example Site">
            <meta property="og:image" content="https://example.com/cover.jpg">
            <meta property="article:published_time" content="2024-01-15T10:00:00Z">
            <meta name="DC.title" content="Dublin Core Title">
        </head>
        <body><p>Body</p></body>
        </html>
    "#;

    const HTML_WITH_JSON_LD: &str = r#"
        <html><head>
            <title>Headline Here - News</title>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "NewsArticle",
                "headline": "Headline Here",
                "author": [{"name": "Ann Lee"}, {"name": "Bo Chen"}],
                "description": "Summary from JSON-LD",
                "publisher": {"name": "The Paper"},
                "datePublished": "2024-02-01"
            }
            </script>
            <meta property="og:title" content="OG title">
        </head><body></body></html>
    "#;

    fn doc_with_title(title: &str, body: &str) -> Document {
        Document::parse(&format!("<html><head><title>{title}</title></head><body>{body}</body></html>")).unwrap()
    }

    #[test]
    fn test_meta_tags() {
        let doc = Document::parse(HTML_WITH_META).unwrap();
        let meta = doc.extract_metadata();

        assert_eq!(meta.title, "Dublin Core Title");
        assert_eq!(meta.byline.as_deref(), Some("John Doe"));
        assert_eq!(meta.excerpt.as_deref(), Some("The OG description"));
        assert_eq!(meta.site_name.as_deref(), Some("Example Site"));
        assert_eq!(meta.published_time.as_deref(), Some("2024-01-15T10:00:00Z"));
        assert_eq!(meta.image.as_deref(), Some("https://example.com/cover.jpg"));
    }

    #[test]
    fn test_json_ld_wins() {
        let doc = Document::parse(HTML_WITH_JSON_LD).unwrap();
        let meta = doc.extract_metadata();

        assert_eq!(meta.title, "Headline Here");
        assert_eq!(meta.byline.as_deref(), Some("Ann Lee, Bo Chen"));
        assert_eq!(meta.excerpt.as_deref(), Some("Summary from JSON-LD"));
        assert_eq!(meta.site_name.as_deref(), Some("The Paper"));
        assert_eq!(meta.published_time.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn test_json_ld_wrong_context_ignored() {
        let doc = Document::parse(
            r#"<script type="application/ld+json">{"@context": "https://example.org", "@type": "Article", "headline": "X"}</script>"#,
        )
        .unwrap();
        assert!(doc.extract_json_ld().is_none());
    }

    #[test]
    fn test_json_ld_graph() {
        let doc = Document::parse(
            r#"<script type="application/ld+json">{"@context": "http://schema.org/", "@graph": [{"@type": "WebSite", "name": "Site"}, {"@type": "BlogPosting", "headline": "Post"}]}</script>"#,
        )
        .unwrap();
        assert_eq!(doc.extract_json_ld().unwrap().title.as_deref(), Some("Post"));
    }

    #[rstest]
    #[case("Breaking News - The Daily Times", "", "Breaking News")]
    #[case("An Unusually Long Story Headline About Rust | Site", "", "An Unusually Long Story Headline About Rust")]
    #[case("Home | Site", "", "Site")]
    #[case("Site Name: A Story With Enough Words", "", "A Story With Enough Words")]
    #[case("Site Name: A Story With Enough Words", "<h1>Site Name: A Story With Enough Words</h1>", "Site Name: A Story With Enough Words")]
    #[case("Short", "<h1>The Real Article Heading Goes Here</h1>", "The Real Article Heading Goes Here")]
    #[case("Just A Normal Title Here", "", "Just A Normal Title Here")]
    fn test_article_title(#[case] title: &str, #[case] body: &str, #[case] expected: &str) {
        assert_eq!(doc_with_title(title, body).article_title(), expected);
    }

    #[rstest]
    #[case("Breaking News ", 3)]
    #[case("Breaking News", 2)]
    #[case("", 1)]
    fn test_word_count(#[case] text: &str, #[case] expected: usize) {
        assert_eq!(word_count(text), expected);
    }

    #[test]
    fn test_text_similarity() {
        assert_eq!(text_similarity("Hello World", "hello world"), 1.0);
        assert_eq!(text_similarity("Hello", ""), 0.0);
        assert!(text_similarity("The Rust Book", "Rust Book Chapter") < 0.75);
    }
}

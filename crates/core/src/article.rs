//! Article output type with content, metadata, and format conversion.
//!
//! This module defines the [`Article`] struct which represents the complete
//! result of content extraction: the cleaned HTML, its plain text, the heading
//! outline and links, and the metadata and metrics computed along the way.

use serde::Serialize;

use crate::Result;
use crate::dom_tree::{Document, NodeData, NodeId};
use crate::outline::{Link, OutlineEntry};
use crate::tags::Tag;

/// The complete result of reading an HTML document.
///
/// Serializes with camelCase keys (`authorName`, `coverUrl`, `wordsCount`,
/// `readSeconds`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,

    /// Extracted readable content as clean HTML.
    pub html: String,

    /// Plain text of the content, one blank line between blocks.
    pub text: String,

    pub byline: Option<String>,

    /// Author found through the site configuration.
    pub author_name: Option<String>,

    pub cover_url: Option<String>,

    /// `ltr` or `rtl`.
    pub dir: String,

    pub outline: Vec<OutlineEntry>,

    pub links: Vec<Link>,

    /// Length of the text in characters.
    pub length: usize,

    pub words_count: usize,

    /// Detected language code.
    pub lang: String,

    /// Estimated reading time, 3.5 words per second.
    pub read_seconds: u64,

    /// `read_seconds` formatted as `m:ss`.
    pub read_time: String,

    /// Host of the base URL, without a leading `www.`.
    pub domain: Option<String>,

    pub excerpt: Option<String>,

    /// `contentType` of the matched site rule, `article` by default.
    pub content_type: String,

    pub site_name: Option<String>,

    pub published_time: Option<String>,
}

impl Article {
    /// Gets the article as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Gets the article as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Gets the article as plain text, headed by its title and byline.
    pub fn to_text(&self) -> String {
        let mut out = self.title.clone();
        if let Some(byline) = &self.byline {
            out.push('\n');
            out.push_str(byline);
        }
        out.push_str("\n\n");
        out.push_str(&self.text);
        out
    }
}

/// Text of a subtree with block boundaries kept as blank lines and `<br>` as
/// line breaks. Whitespace inside a line is collapsed.
pub(crate) fn block_text(doc: &Document, id: NodeId) -> String {
    let mut raw = String::new();
    write_block_text(doc, id, &mut raw);

    let mut lines: Vec<String> = Vec::new();
    let mut blank = false;
    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank = !lines.is_empty();
            continue;
        }
        if blank {
            lines.push(String::new());
            blank = false;
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn write_block_text(doc: &Document, id: NodeId, out: &mut String) {
    for &child in doc.children(id) {
        match doc.data(child) {
            NodeData::Text(text) => out.push_str(&text.replace('\n', " ")),
            NodeData::Element(el) if el.tag == Tag::Br => out.push('\n'),
            NodeData::Element(_) if doc.is_phrasing_content(child) => write_block_text(doc, child, out),
            NodeData::Element(_) => {
                out.push_str("\n\n");
                write_block_text(doc, child, out);
                out.push_str("\n\n");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article {
            title: "Test Article".to_string(),
            html: "<p>This is a test article with some content.</p>".to_string(),
            text: "This is a test article with some content.".to_string(),
            byline: Some("Jane Doe".to_string()),
            author_name: None,
            cover_url: None,
            dir: "ltr".to_string(),
            outline: Vec::new(),
            links: Vec::new(),
            length: 41,
            words_count: 8,
            lang: "en".to_string(),
            read_seconds: 2,
            read_time: "0:02".to_string(),
            domain: Some("example.com".to_string()),
            excerpt: None,
            content_type: "article".to_string(),
            site_name: None,
            published_time: None,
        }
    }

    #[test]
    fn test_json_keys() {
        let json = article().to_json().unwrap();
        assert!(json.contains("\"wordsCount\":8"));
        assert!(json.contains("\"readTime\":\"0:02\""));
        assert!(json.contains("\"contentType\":\"article\""));
        assert!(json.contains("\"authorName\":null"));

        let pretty = article().to_json_pretty().unwrap();
        assert!(pretty.contains("\n  \"title\": \"Test Article\""));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(article().to_text(), "Test Article\nJane Doe\n\nThis is a test article with some content.");
    }

    #[test]
    fn test_block_text() {
        let doc = Document::parse("<div><p>One <b>two</b>\n three</p><p>Four<br>five</p><ul><li>six</li></ul></div>")
            .unwrap();
        let body = doc.body().unwrap();
        assert_eq!(block_text(&doc, body), "One two three\n\nFour\nfive\n\nsix");
    }
}

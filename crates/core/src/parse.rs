//! HTML parsing, CSS queries and serialization for [`Document`].
//!
//! Parsing goes through `scraper` (html5ever), and the resulting tree is copied
//! into the arena. CSS queries use scraper's selector grammar and run on the
//! arena itself.
//!
//! # Example
//!
//! ```rust
//! use clearly_core::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><title>Title</title></head>
//!         <body>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! assert_eq!(doc.title(), Some("Title".to_string()));
//! let paragraphs = doc.select(doc.root(), "p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use scraper::{Html, Node};
use selectors::matching::SelectorCaches;
use url::Url;

use crate::dom_tree::{Document, NodeData, NodeId};
use crate::select::{ArenaElement, CompiledSelector};
use crate::tags::Tag;
use crate::{ClearlyError, Result};

impl Document {
    /// Parses an HTML string into a document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use clearly_core::Document;
    ///
    /// let doc = Document::parse("<html><body><h1>Title</h1></body></html>").unwrap();
    /// assert!(doc.body().is_some());
    /// ```
    pub fn parse(html: &str) -> Result<Self> {
        let parsed = Html::parse_document(html);
        Ok(Self::from_html(&parsed))
    }

    /// Parses an HTML string and records the URL it was fetched from.
    ///
    /// The URL is used to resolve relative links and to match site
    /// configuration rules.
    ///
    /// # Errors
    ///
    /// Returns [`ClearlyError::InvalidUrl`] if `url` is not an absolute URL.
    pub fn parse_with_url(html: &str, url: &str) -> Result<Self> {
        let base = Url::parse(url).map_err(|e| ClearlyError::InvalidUrl(format!("{url}: {e}")))?;
        let mut doc = Self::parse(html)?;
        doc.set_base_url(Some(base));
        Ok(doc)
    }

    fn from_html(html: &Html) -> Self {
        let mut doc = Document::new();
        let root = doc.root();
        let mut stack: Vec<_> = html.tree.root().children().rev().map(|child| (child, root)).collect();

        while let Some((node, parent)) = stack.pop() {
            let id = match node.value() {
                Node::Element(el) => {
                    let id = doc.create_element(el.name());
                    for (name, value) in el.attrs() {
                        doc.set_attr(id, name, value);
                    }
                    id
                }
                Node::Text(text) => doc.create_text(text),
                Node::Comment(comment) => doc.create_comment(comment),
                _ => continue,
            };
            doc.append_child(parent, id);
            stack.extend(node.children().rev().map(|child| (child, id)));
        }

        doc
    }

    /// Selects descendants of `scope` matching a CSS selector, in document order.
    ///
    /// The scope itself is never part of the result, but the selector is
    /// matched against the whole tree the scope belongs to, so combinators may
    /// reach above it (as with `querySelectorAll`).
    ///
    /// # Errors
    ///
    /// Returns [`ClearlyError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use clearly_core::Document;
    ///
    /// let doc = Document::parse(r#"<div id="a"><p>One</p></div><p>Two</p>"#).unwrap();
    /// let div = doc.select(doc.root(), "#a").unwrap()[0];
    /// assert_eq!(doc.select(div, "p").unwrap().len(), 1);
    /// ```
    pub fn select(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let selector = CompiledSelector::parse(selector)?;
        let scope_element = ArenaElement::wrap(self, scope);
        let mut caches = SelectorCaches::default();

        Ok(self
            .descendants(scope)
            .into_iter()
            .filter_map(|id| ArenaElement::wrap(self, id).map(|el| (id, el)))
            .filter(|(_, el)| selector.matches(el, scope_element.as_ref(), &mut caches))
            .map(|(id, _)| id)
            .collect())
    }

    /// First match of [`select`](Self::select)
    pub fn select_first(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.select(scope, selector)?.into_iter().next())
    }

    /// Text of the `<title>` element, trimmed and whitespace-normalized
    pub fn title(&self) -> Option<String> {
        let title = self.find_first(Tag::Title)?;
        Some(self.inner_text(title))
    }

    /// Serialized HTML of the node including its own tags
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialized HTML of the node's children
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_children(id, &mut out);
        out
    }

    fn write_children(&self, id: NodeId, out: &mut String) {
        for child in self.children(id) {
            self.write_node(*child, out);
        }
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Document => self.write_children(id, out),
            NodeData::Text(text) => {
                let raw = self.parent(id).and_then(|p| self.tag(p)).is_some_and(Tag::is_raw_text);
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&html_escape::encode_text(text));
                }
            }
            NodeData::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if el.tag.is_void() {
                    return;
                }
                self.write_children(id, out);
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test   Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <div id="main">
                <p class="content">Paragraph 1</p>
                <p class="content">Paragraph 2</p>
            </div>
            <p class="content">Outside</p>
            <a href="https://example.com?a=1&amp;b=2">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
        assert!(doc.body().is_some());
        assert!(doc.is(doc.document_element().unwrap(), Tag::Html));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select(doc.root(), "p.content").unwrap();

        assert_eq!(elements.len(), 3);
        assert_eq!(doc.inner_text(elements[0]), "Paragraph 1");
        assert_eq!(doc.inner_text(elements[2]), "Outside");
    }

    #[test]
    fn test_select_within_scope() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let main = doc.select_first(doc.root(), "#main").unwrap().unwrap();
        let inside = doc.select(main, "p").unwrap();
        assert_eq!(inside.len(), 2);
        assert!(doc.select(main, "div").unwrap().is_empty());
        assert_eq!(doc.select(main, "body p").unwrap().len(), 2);
    }

    #[test]
    fn test_select_detached_subtree() {
        let mut doc = Document::parse(SAMPLE_HTML).unwrap();
        let main = doc.select_first(doc.root(), "#main").unwrap().unwrap();
        doc.remove(main);
        assert_eq!(doc.select(main, "p.content").unwrap().len(), 2);
        assert_eq!(doc.select(doc.root(), "p.content").unwrap().len(), 1);
    }

    #[test]
    fn test_attributes_keep_source_order() {
        let doc = Document::parse(r#"<p id="b" class="a" data-z="1">x</p>"#).unwrap();
        let body = doc.body().unwrap();
        assert_eq!(doc.inner_html(body), r#"<p id="b" class="a" data-z="1">x</p>"#);
    }

    #[test]
    fn test_select_detached_table_row() {
        let mut doc = Document::parse("<table><tbody><tr><td class=\"c\">1</td><td>2</td></tr></tbody></table>").unwrap();
        let row = doc.select_first(doc.root(), "tr").unwrap().unwrap();
        doc.remove(row);

        let cells = doc.select(row, "td").unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(doc.select(row, "td.c").unwrap(), [cells[0]]);
        assert!(doc.select(doc.root(), "td").unwrap().is_empty());
    }

    #[test]
    fn test_select_sees_mutated_tree() {
        let mut doc = Document::parse("<p id=\"host\">text</p>").unwrap();
        let p = doc.select_first(doc.root(), "#host").unwrap().unwrap();
        let div = doc.create_element("div");
        doc.set_attr(div, "class", "inner");
        doc.append_child(p, div);

        assert_eq!(doc.select(doc.root(), "p > div.inner").unwrap(), [div]);
        assert_eq!(doc.select(p, ":scope > div").unwrap(), [div]);
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select(doc.root(), "[[invalid");

        assert!(matches!(result, Err(ClearlyError::HtmlParseError(_))));
    }

    #[test]
    fn test_attribute_entities_decoded() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let link = doc.select_first(doc.root(), "a").unwrap().unwrap();
        assert_eq!(doc.attr(link, "href"), Some("https://example.com?a=1&b=2"));
        assert!(doc.outer_html(link).contains("a=1&amp;b=2"));
    }

    #[test]
    fn test_serialization() {
        let doc = Document::parse("<div><p>a &lt; b</p><img src=\"x.png\"><br></div>").unwrap();
        let div = doc.select_first(doc.root(), "div").unwrap().unwrap();
        assert_eq!(doc.outer_html(div), "<div><p>a &lt; b</p><img src=\"x.png\"><br></div>");
        assert_eq!(doc.inner_html(div), "<p>a &lt; b</p><img src=\"x.png\"><br>");
    }

    #[test]
    fn test_parse_with_url() {
        let doc = Document::parse_with_url("<p>x</p>", "https://example.com/a/b").unwrap();
        assert_eq!(doc.base_url().map(|u| u.as_str()), Some("https://example.com/a/b"));
        assert!(matches!(
            Document::parse_with_url("<p>x</p>", "not a url"),
            Err(ClearlyError::InvalidUrl(_))
        ));
    }
}

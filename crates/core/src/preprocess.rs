use crate::dom_tree::{Document, NodeData, NodeId};
use crate::siteconfig::{AuthorRule, SiteRule};
use crate::tags::Tag;

/// Prepare the working copy for extraction.
///
/// Runs, in order: site-config `ignoreElements` removal, author lookup,
/// removal of scripts, styles and comments, `<br>` run normalization, and
/// `<font>` to `<span>`. Returns the author name found by the site rule, if any.
pub fn prepare_document(doc: &mut Document, rule: &SiteRule) -> Option<String> {
    remove_ignored(doc, &rule.ignore_elements);
    let author = find_author(doc, &rule.author_name);
    remove_unwanted_nodes(doc);
    replace_brs(doc);
    for font in doc.get_elements_by_tag(doc.root(), &[Tag::Font]) {
        doc.set_tag(font, "span");
    }
    author
}

/// Remove every element matching one of the selectors; invalid selectors are skipped
pub fn remove_ignored(doc: &mut Document, selectors: &[String]) {
    for selector in selectors {
        match doc.select(doc.root(), selector) {
            Ok(nodes) => nodes.into_iter().for_each(|node| doc.remove(node)),
            Err(e) => tracing::warn!("ignoreElements selector skipped: {e}"),
        }
    }
}

/// First author found by the rules, in order. A rule that finds nothing does not
/// undo an earlier hit.
pub fn find_author(doc: &Document, rules: &[AuthorRule]) -> Option<String> {
    let mut markup: Option<String> = None;

    for rule in rules {
        let found = match rule {
            AuthorRule::Selector(selector) => match doc.select_first(doc.root(), selector) {
                Ok(node) => node.map(|n| doc.inner_text(n)),
                Err(e) => {
                    tracing::warn!("authorName selector skipped: {e}");
                    None
                }
            },
            AuthorRule::Pattern(re) => {
                let html = markup.get_or_insert_with(|| doc.outer_html(doc.root()));
                re.captures(html).and_then(|caps| caps.get(1).or_else(|| caps.get(0))).map(|m| m.as_str().trim().to_string())
            }
        };

        if let Some(author) = found.filter(|a| !a.is_empty()) {
            tracing::debug!("site-config author: {author}");
            return Some(author);
        }
    }

    None
}

fn remove_unwanted_nodes(doc: &mut Document) {
    let unwanted: Vec<NodeId> = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|n| match doc.data(*n) {
            NodeData::Comment(_) => true,
            NodeData::Element(el) => el.tag.is_raw_text(),
            _ => false,
        })
        .collect();
    for node in unwanted {
        doc.remove(node);
    }
}

/// Next sibling starting at `node`, skipping whitespace-only text
fn next_significant(doc: &Document, mut node: Option<NodeId>) -> Option<NodeId> {
    while let Some(n) = node {
        if doc.is_element(n) || !doc.text_content(n).trim().is_empty() {
            break;
        }
        node = doc.next_sibling(n);
    }
    node
}

/// Collapse runs of two or more `<br>` into a paragraph holding the phrasing
/// content that follows. A lone `<br>` inside `<pre>`/`<code>` becomes a newline.
fn replace_brs(doc: &mut Document) {
    for br in doc.get_elements_by_tag(doc.root(), &[Tag::Br]) {
        if doc.parent(br).is_none() {
            continue;
        }

        let mut replaced = false;
        let mut next = next_significant(doc, doc.next_sibling(br));
        while let Some(n) = next.filter(|n| doc.is(*n, Tag::Br)) {
            replaced = true;
            let after = doc.next_sibling(n);
            doc.remove(n);
            next = next_significant(doc, after);
        }

        if !replaced {
            let in_code = doc.has_ancestor_tag(br, Tag::Pre, 2, |_| true)
                || doc.has_ancestor_tag(br, Tag::Code, 2, |_| true);
            if in_code {
                let newline = doc.create_text("\n");
                doc.replace(br, newline);
            }
            continue;
        }

        let p = doc.create_element("p");
        doc.replace(br, p);

        let mut next = doc.next_sibling(p);
        while let Some(n) = next {
            if doc.is(n, Tag::Br) {
                let following = next_significant(doc, doc.next_sibling(n));
                if following.is_some_and(|f| doc.is(f, Tag::Br)) {
                    break;
                }
            }
            if !doc.is_phrasing_content(n) {
                break;
            }
            next = doc.next_sibling(n);
            doc.append_child(p, n);
        }

        while let Some(last) = doc.last_child(p).filter(|l| doc.is_whitespace(*l)) {
            doc.remove(last);
        }

        if let Some(parent) = doc.parent(p).filter(|parent| doc.is(*parent, Tag::P)) {
            doc.set_tag(parent, "div");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_html(doc: &Document) -> String {
        doc.inner_html(doc.body().unwrap())
    }

    #[test]
    fn test_remove_unwanted_tags() {
        let mut doc = Document::parse(
            "<html><head><style>p{}</style></head><body><script>var a;</script><!-- note --><p>Text</p><noscript>x</noscript></body></html>",
        )
        .unwrap();
        prepare_document(&mut doc, &SiteRule::new());
        assert_eq!(body_html(&doc), "<p>Text</p>");
        assert!(doc.find_first(Tag::Style).is_none());
    }

    #[test]
    fn test_br_runs_become_paragraphs() {
        let mut doc = Document::parse("<div>foo<br>bar<br> <br>abc<br>def<br><br>ghi</div>").unwrap();
        replace_brs(&mut doc);
        assert_eq!(body_html(&doc), "<div>foo<br>bar<p> abc<br>def</p><p>ghi</p></div>");
    }

    #[test]
    fn test_br_in_pre_becomes_newline() {
        let mut doc = Document::parse("<pre><code>let a;<br>let b;</code></pre>").unwrap();
        replace_brs(&mut doc);
        let pre = doc.find_first(Tag::Pre).unwrap();
        assert_eq!(doc.text_content(pre), "let a;\nlet b;");
    }

    #[test]
    fn test_paragraph_parent_becomes_div() {
        let mut doc = Document::parse("<p>one<br><br>two</p>").unwrap();
        replace_brs(&mut doc);
        assert_eq!(body_html(&doc), "<div>one<p>two</p></div>");
    }

    #[test]
    fn test_font_becomes_span() {
        let mut doc = Document::parse("<p><font color=\"red\">x</font></p>").unwrap();
        prepare_document(&mut doc, &SiteRule::new());
        assert_eq!(body_html(&doc), "<p><span color=\"red\">x</span></p>");
    }

    #[test]
    fn test_ignore_elements_and_author() {
        let rule = SiteRule {
            ignore_elements: vec![".promo".to_string(), "[[bad".to_string()],
            author_name: vec![
                AuthorRule::Selector(".missing".to_string()),
                AuthorRule::parse("/Written by ([A-Z][a-z]+ [A-Z][a-z]+)/"),
                AuthorRule::Selector(".author".to_string()),
            ],
            ..SiteRule::new()
        };
        let mut doc = Document::parse(
            r#"<div class="promo">Buy</div><p>Written by Jane Smith</p><span class="author">Someone Else</span>"#,
        )
        .unwrap();

        let author = prepare_document(&mut doc, &rule);
        assert_eq!(author.as_deref(), Some("Jane Smith"));
        assert!(doc.select(doc.root(), ".promo").unwrap().is_empty());
    }
}

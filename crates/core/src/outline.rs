//! Heading outline and outbound links of the cleaned content.

use std::collections::HashSet;

use serde::Serialize;

use crate::dom_tree::{Document, NodeId};
use crate::patterns::RAW_URL;
use crate::tags::Tag;

/// Links with this much text or less are skipped
const MIN_LINK_TEXT: usize = 12;

const TITLE_ENTRY_ID: &str = "ros-title";

/// One heading of the article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub id: String,
    /// Heading depth, 1 to 6
    pub level: u8,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
}

/// An outbound link found in the article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Link text, HTML-escaped
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    /// The anchor's `title` attribute
    pub alt: Option<String>,
}

/// Give every heading under `content` an id and list them in document order.
///
/// Headings without an id, or repeating one already in the outline, get
/// `ros-N`, N being their position in the outline. When the first heading had
/// no id of its own, a level-1 entry for the article title is put in front.
/// Ids are unique within the outline and never collide with other ids in the
/// content.
pub fn build_outline(doc: &mut Document, content: NodeId, title: &str) -> Vec<OutlineEntry> {
    let mut taken: HashSet<String> = doc
        .descendants(content)
        .into_iter()
        .filter(|&n| doc.is_element(n) && !doc.id_attr(n).is_empty())
        .map(|n| doc.id_attr(n).to_string())
        .collect();

    let headings: Vec<NodeId> = doc
        .descendants(content)
        .into_iter()
        .filter(|&n| doc.tag(n).is_some_and(|t| t.is_heading()))
        .collect();

    let mut entries = Vec::with_capacity(headings.len() + 1);
    let mut emitted = HashSet::new();
    let mut first_had_id = true;

    for (index, heading) in headings.into_iter().enumerate() {
        let Some(level) = doc.tag(heading).and_then(|t| t.heading_level()) else {
            continue;
        };

        let mut id = doc.id_attr(heading).to_string();
        if id.is_empty() || emitted.contains(&id) {
            if index == 0 {
                first_had_id = false;
            }
            id = free_id(&taken, "ros-", index);
            doc.set_attr(heading, "id", &id);
            taken.insert(id.clone());
        }
        emitted.insert(id.clone());

        entries.push(OutlineEntry { id, level, kind: "heading".to_string(), title: doc.inner_text(heading) });
    }

    if !entries.is_empty() && !first_had_id {
        let id = if taken.contains(TITLE_ENTRY_ID) {
            free_id(&taken, &format!("{TITLE_ENTRY_ID}-"), 1)
        } else {
            TITLE_ENTRY_ID.to_string()
        };
        entries.insert(0, OutlineEntry { id, level: 1, kind: "heading".to_string(), title: title.to_string() });
    }

    entries
}

/// `{prefix}{n}` with the smallest `n >= start` not in `taken`
fn free_id(taken: &HashSet<String>, prefix: &str, start: usize) -> String {
    (start..)
        .map(|n| format!("{prefix}{n}"))
        .find(|id| !taken.contains(id))
        .unwrap_or_else(|| format!("{prefix}{start}"))
}

/// Outbound `http(s)` links with enough text, first occurrence of each URL
pub fn collect_links(doc: &Document, content: NodeId) -> Vec<Link> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in doc.get_elements_by_tag(content, &[Tag::A]) {
        let Some(url) = doc.attr(anchor, "href").map(str::trim) else {
            continue;
        };
        if !url.starts_with("http") {
            continue;
        }

        let text = doc.inner_text(anchor);
        if text.chars().count() <= MIN_LINK_TEXT || RAW_URL.is_match(&text) {
            continue;
        }
        if !seen.insert(url.to_lowercase()) {
            continue;
        }

        links.push(Link {
            title: html_escape::encode_text(&text).into_owned(),
            kind: "link".to_string(),
            url: url.to_string(),
            alt: doc.attr(anchor, "title").map(str::to_string),
        });
    }

    links
}

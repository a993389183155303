use std::collections::HashMap;

use crate::dom_tree::{Document, NodeId};
use crate::extract::Flags;
use crate::patterns::{HASH_URL, IMAGE_NEGATIVE, IMAGE_POSITIVE, NEGATIVE, POSITIVE};
use crate::tags::Tag;

/// Weight of one positive or negative class/id signal
const CLASS_WEIGHT: f64 = 25.0;

/// Anchors pointing inside the page count this much towards link density
const HASH_LINK_COEFFICIENT: f64 = 0.3;

/// Calculate the base score for an element based on its tag
///
/// - DIV: +5 (generic container)
/// - PRE, TD, BLOCKQUOTE: +3 (content elements)
/// - ADDRESS, OL, UL, DL, DD, DT, LI, FORM: -3 (list/metadata elements)
/// - H1-H6, TH: -5 (headings)
pub fn base_tag_score(tag: Tag) -> f64 {
    match tag {
        Tag::Div => 5.0,
        Tag::Pre | Tag::Td | Tag::Blockquote => 3.0,
        Tag::Address | Tag::Ol | Tag::Ul | Tag::Dl | Tag::Dd | Tag::Dt | Tag::Li | Tag::Form => -3.0,
        Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6 | Tag::Th => -5.0,
        _ => 0.0,
    }
}

/// Calculate weight from class and id patterns
///
/// Each of `class` and `id` adds +25 on a positive match and -25 on a negative
/// match. Images get one more ±25 from the image-specific patterns. Returns 0
/// when `WEIGHT_CLASSES` is not active.
pub fn class_weight(doc: &Document, id: NodeId, flags: Flags) -> f64 {
    if !flags.contains(Flags::WEIGHT_CLASSES) {
        return 0.0;
    }

    let mut weight = 0.0;
    for value in [doc.class_name(id), doc.id_attr(id)] {
        if value.is_empty() {
            continue;
        }
        if NEGATIVE.is_match(value) {
            weight -= CLASS_WEIGHT;
        }
        if POSITIVE.is_match(value) {
            weight += CLASS_WEIGHT;
        }
    }

    if doc.is(id, Tag::Img) {
        let match_string = format!("{} {}", doc.class_name(id), doc.id_attr(id));
        if IMAGE_NEGATIVE.is_match(&match_string) {
            weight -= CLASS_WEIGHT;
        } else if IMAGE_POSITIVE.is_match(&match_string) {
            weight += CLASS_WEIGHT;
        }
    }

    weight
}

/// Length of a string in characters
pub fn text_length(text: &str) -> usize {
    text.chars().count()
}

/// Number of commas, counting the full-width and Arabic forms too
pub fn comma_count(text: &str) -> usize {
    text.chars()
        .filter(|c| matches!(c, ',' | '\u{060C}' | '\u{FE50}' | '\u{FE10}' | '\u{FE11}' | '\u{2E41}' | '\u{2E34}' | '\u{2E32}' | '\u{FF0C}'))
        .count()
}

/// Calculate link density (ratio of link text to total text)
///
/// Returns a value between 0.0 and 1.0, where higher values indicate more links.
/// Links to `#fragments` count at 30% of their length.
pub fn link_density(doc: &Document, id: NodeId) -> f64 {
    let total = text_length(&doc.inner_text(id));
    if total == 0 {
        return 0.0;
    }

    let link_length: f64 = doc
        .get_elements_by_tag(id, &[Tag::A])
        .into_iter()
        .map(|a| {
            let coefficient = match doc.attr(a, "href") {
                Some(href) if HASH_URL.is_match(href) => HASH_LINK_COEFFICIENT,
                _ => 1.0,
            };
            text_length(&doc.inner_text(a)) as f64 * coefficient
        })
        .sum();

    link_length / total as f64
}

/// Text contribution of a scored element: one point, one per comma, and one
/// per hundred characters up to three.
pub fn content_score(text: &str) -> f64 {
    let hundreds = (text_length(text) / 100).min(3);
    1.0 + comma_count(text) as f64 + hundreds as f64
}

/// Content scores kept beside the tree, keyed by node
#[derive(Debug, Clone, Default)]
pub struct ContentScores {
    scores: HashMap<NodeId, f64>,
}

impl ContentScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scored(&self, id: NodeId) -> bool {
        self.scores.contains_key(&id)
    }

    /// Score of a node, 0 when it was never initialized
    pub fn get(&self, id: NodeId) -> f64 {
        self.scores.get(&id).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, id: NodeId, score: f64) {
        self.scores.insert(id, score);
    }

    pub fn add(&mut self, id: NodeId, delta: f64) {
        *self.scores.entry(id).or_insert(0.0) += delta;
    }

    /// Start a node at its tag score plus class weight
    pub fn initialize(&mut self, doc: &Document, id: NodeId, flags: Flags) {
        let score = doc.tag(id).map(base_tag_score).unwrap_or(0.0) + class_weight(doc, id, flags);
        self.scores.insert(id, score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn first(doc: &Document, selector: &str) -> NodeId {
        doc.select_first(doc.root(), selector).unwrap().unwrap()
    }

    #[rstest]
    #[case(Tag::Div, 5.0)]
    #[case(Tag::Blockquote, 3.0)]
    #[case(Tag::Form, -3.0)]
    #[case(Tag::Th, -5.0)]
    #[case(Tag::Article, 0.0)]
    fn test_base_tag_score(#[case] tag: Tag, #[case] expected: f64) {
        assert_eq!(base_tag_score(tag), expected);
    }

    #[test]
    fn test_class_weight() {
        let doc = Document::parse(
            r#"<div class="article-content" id="main">x</div>
               <div class="sidebar" id="comments">x</div>
               <div class="content sidebar">x</div>"#,
        )
        .unwrap();
        let divs = doc.select(doc.root(), "div").unwrap();

        assert_eq!(class_weight(&doc, divs[0], Flags::all()), 50.0);
        assert_eq!(class_weight(&doc, divs[1], Flags::all()), -50.0);
        assert_eq!(class_weight(&doc, divs[2], Flags::all()), 0.0);
        assert_eq!(class_weight(&doc, divs[0], Flags::STRIP_UNLIKELYS), 0.0);
    }

    #[test]
    fn test_image_weight() {
        let doc = Document::parse(r#"<img class="author-avatar" src="a.png"><img class="hero" src="b.png">"#).unwrap();
        let imgs = doc.select(doc.root(), "img").unwrap();
        assert_eq!(class_weight(&doc, imgs[0], Flags::all()), -25.0);
        assert_eq!(class_weight(&doc, imgs[1], Flags::all()), 25.0);
    }

    #[test]
    fn test_link_density() {
        let doc = Document::parse(
            r##"<div id="a"><a href="/x">0123456789</a>0123456789</div>
                <div id="b"><a href="#top">0123456789</a>0123456789</div>
                <div id="c"></div>"##,
        )
        .unwrap();

        assert!((link_density(&doc, first(&doc, "#a")) - 10.0 / 20.0).abs() < 1e-9);
        assert!((link_density(&doc, first(&doc, "#b")) - 3.0 / 20.0).abs() < 1e-9);
        assert_eq!(link_density(&doc, first(&doc, "#c")), 0.0);
    }

    #[rstest]
    #[case("short", 1.0)]
    #[case("one, two, three", 3.0)]
    #[case("一，二", 2.0)]
    fn test_content_score(#[case] text: &str, #[case] expected: f64) {
        assert_eq!(content_score(text), expected);
    }

    #[test]
    fn test_content_score_length_cap() {
        let long = "a".repeat(1000);
        assert_eq!(content_score(&long), 4.0);
        assert_eq!(content_score(&"a".repeat(250)), 3.0);
    }

    #[test]
    fn test_scores_side_table() {
        let doc = Document::parse(r#"<div class="post">x</div>"#).unwrap();
        let div = first(&doc, "div");
        let mut scores = ContentScores::new();

        assert!(!scores.is_scored(div));
        scores.initialize(&doc, div, Flags::all());
        assert_eq!(scores.get(div), 30.0);
        scores.add(div, 2.5);
        assert_eq!(scores.get(div), 32.5);
        assert_eq!(scores.len(), 1);
    }
}

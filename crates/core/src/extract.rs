//! Top-candidate selection and the retry loop around it.
//!
//! An attempt prunes a private copy of the prepared document, scores the
//! paragraphs into their ancestors, picks the best-scoring subtree, pulls in
//! related siblings and cleans the result. An attempt that yields less text
//! than the character threshold is retried with one heuristic switched off,
//! until all are off; the longest attempt then wins.

use std::collections::HashSet;

use bitflags::bitflags;

use crate::clearly::ClearlyConfig;
use crate::dom_tree::{Document, NodeId};
use crate::metadata::text_similarity;
use crate::patterns::{BYLINE, HIDDEN_STYLE, MAYBE_CANDIDATE, SENTENCE_END, UNLIKELY_CANDIDATES};
use crate::postprocess::{
    CleanOptions, has_lazy_image, holds_anchor_target, internal_anchor_targets, is_code_block, prep_article,
    single_tag_inside,
};
use crate::scoring::{ContentScores, content_score, link_density, text_length};
use crate::siteconfig::SiteRule;
use crate::tags::Tag;

bitflags! {
    /// Heuristics active during one extraction attempt.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// Remove blocks whose class/id looks like boilerplate
        const STRIP_UNLIKELYS = 0b001;
        /// Score class/id signals
        const WEIGHT_CLASSES = 0b010;
        /// Remove suspicious tables, lists and divs while cleaning
        const CLEAN_CONDITIONALLY = 0b100;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::all()
    }
}

/// Flags of the next attempt, with the first still-active flag (in drop order)
/// cleared. `None` once every flag is off.
pub fn next_flags(flags: Flags) -> Option<Flags> {
    [Flags::STRIP_UNLIKELYS, Flags::WEIGHT_CLASSES, Flags::CLEAN_CONDITIONALLY]
        .into_iter()
        .find(|flag| flags.contains(*flag))
        .map(|flag| flags - flag)
}

/// Selectors tried, in order, for a content element when the site rule has none
const DEFAULT_CONTENT_ELEMS: &[&str] = &[".notion", "article", "main"];

/// Subtrees with these classes are never pruned
const PROTECTED_CLASSES: &[&str] = &["math", "hljs"];

const UNLIKELY_ROLES: &[&str] = &["menu", "menubar", "complementary", "navigation", "alert", "alertdialog", "dialog"];

/// Paragraphs shorter than this are not scored
const MIN_PARAGRAPH_LENGTH: usize = 25;

/// Levels of ancestors a paragraph's score reaches
const SCORE_ANCESTOR_DEPTH: usize = 3;

/// Alternative candidates needed to promote their common ancestor
const MINIMUM_TOP_CANDIDATES: usize = 3;

const MAX_BYLINE_LENGTH: usize = 100;

/// Content pulled out of a document, with the copy it lives in
#[derive(Debug, Clone)]
pub struct Extracted {
    /// Working copy that owns the content nodes
    pub doc: Document,
    /// Detached `<div>` holding the cleaned content
    pub content: NodeId,
    /// Characters of visible text in the content
    pub text_length: usize,
    /// Flags active in the attempt that produced the content
    pub flags: Flags,
    /// Byline text found while pruning
    pub byline: Option<String>,
    /// Closest `dir` attribute at or above the top candidate
    pub dir: Option<String>,
    /// Cover image URL chosen while cleaning
    pub cover: Option<String>,
}

impl Extracted {
    pub fn html(&self) -> String {
        self.doc.inner_html(self.content)
    }
}

/// Runs content extraction over a prepared document
#[derive(Debug, Clone)]
pub struct Extractor<'a> {
    config: &'a ClearlyConfig,
    rule: &'a SiteRule,
    title: &'a str,
    meta_image: Option<&'a str>,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a ClearlyConfig, rule: &'a SiteRule, title: &'a str) -> Self {
        Self { config, rule, title, meta_image: None }
    }

    /// Image used as cover when the content has no qualifying picture
    pub fn with_meta_image(mut self, image: Option<&'a str>) -> Self {
        self.meta_image = image;
        self
    }

    /// Extract the main content of `prepared`, which is never modified.
    ///
    /// A content element (from the site rule, or the `.notion`/`article`/`main`
    /// defaults) that matches exactly once is taken as is. Otherwise the
    /// scoring attempts run until one reaches the character threshold.
    pub fn extract(&self, prepared: &Document) -> Option<Extracted> {
        if let Some(extracted) = self.extract_content_elem(prepared) {
            return Some(extracted);
        }

        let mut flags = Flags::all();
        let mut byline: Option<String> = None;
        let mut attempts: Vec<Extracted> = Vec::new();

        loop {
            tracing::debug!("extraction attempt {} with flags {flags:?}", attempts.len() + 1);

            if let Some(mut attempt) = self.attempt(prepared.clone(), flags, &mut byline) {
                if attempt.text_length >= self.config.char_threshold {
                    tracing::debug!("accepted {} characters with flags {flags:?}", attempt.text_length);
                    attempt.byline = byline;
                    return Some(attempt);
                }
                attempts.push(attempt);
            }

            match next_flags(flags) {
                Some(next) => flags = next,
                None => break,
            }
        }

        let mut best: Option<Extracted> = None;
        for attempt in attempts {
            if best.as_ref().is_none_or(|b| attempt.text_length > b.text_length) {
                best = Some(attempt);
            }
        }

        let mut best = best.filter(|b| b.text_length > 0)?;
        tracing::debug!("falling back to the attempt with flags {:?} ({} characters)", best.flags, best.text_length);
        best.byline = byline;
        Some(best)
    }

    fn pruned(&self, doc: &Document, node: NodeId, reason: &str) {
        let name = doc.tag_name(node).unwrap_or("#node");
        let class = doc.class_name(node);
        node_event!(self.config.debug, "pruned <{name} class=\"{class}\">: {reason}");
    }

    fn clean_options(&self, flags: Flags) -> CleanOptions<'_> {
        CleanOptions {
            title: self.title,
            flags,
            char_threshold: self.config.char_threshold,
            classes_to_preserve: &self.config.classes_to_preserve,
            keep_classes: self.config.keep_classes,
            exclude_elems: &self.rule.exclude_elems,
            meta_image: self.meta_image,
            debug: self.config.debug,
        }
    }

    /// Use a single matching content element instead of scoring
    fn extract_content_elem(&self, prepared: &Document) -> Option<Extracted> {
        let selectors: Vec<&str> = if self.rule.content_elem.is_empty() {
            DEFAULT_CONTENT_ELEMS.to_vec()
        } else {
            self.rule.content_elem.iter().map(String::as_str).collect()
        };

        let mut doc = prepared.clone();
        let element = selectors.into_iter().find_map(|selector| match doc.select(doc.root(), selector) {
            Ok(found) if found.len() == 1 => Some(found[0]),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("contentElem selector skipped: {e}");
                None
            }
        })?;
        tracing::debug!("content element <{}> matched", doc.tag_name(element).unwrap_or_default());

        let mut byline = None;
        self.prune_hidden(&mut doc, element, &mut byline);
        let dir = nearest_dir(&doc, element);

        let content = doc.create_element("div");
        if self.rule.extract_elems.is_empty() {
            doc.append_child(content, element);
        } else {
            self.gather_extract_elems(&mut doc, element, content);
        }

        let flags = Flags::all() - Flags::CLEAN_CONDITIONALLY;
        let cover = prep_article(&mut doc, content, &self.clean_options(flags));
        let text_length = text_length(&doc.inner_text(content));
        if text_length == 0 {
            tracing::debug!("content element is empty, scoring instead");
            return None;
        }

        Some(Extracted { doc, content, text_length, flags, byline, dir, cover })
    }

    /// Move every `extractElems` match into `content`, separated by the joiner markup
    fn gather_extract_elems(&self, doc: &mut Document, element: NodeId, content: NodeId) {
        let joiner = self
            .rule
            .extract_elems_joiner
            .as_deref()
            .filter(|j| !j.is_empty())
            .and_then(|j| Document::parse(j).ok());

        for selector in &self.rule.extract_elems {
            let found = match doc.select(element, selector) {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!("extractElems selector skipped: {e}");
                    continue;
                }
            };

            for part in found {
                if doc.contains(content, part) {
                    continue;
                }
                if !doc.children(content).is_empty()
                    && let Some(joiner) = &joiner
                    && let Some(body) = joiner.body()
                {
                    for child in joiner.children(body) {
                        let copy = doc.import(joiner, *child);
                        doc.append_child(content, copy);
                    }
                }
                doc.append_child(content, part);
            }
        }
    }

    /// Remove invisible nodes and the byline below `scope`
    fn prune_hidden(&self, doc: &mut Document, scope: NodeId, byline: &mut Option<String>) {
        for node in doc.descendants(scope) {
            if !doc.is_element(node) || !doc.contains(scope, node) {
                continue;
            }
            if !is_probably_visible(doc, node) || is_modal_dialog(doc, node) {
                self.pruned(doc, node, "hidden");
                doc.remove(node);
            } else if byline.is_none()
                && let Some(found) = check_byline(doc, node)
            {
                self.pruned(doc, node, "byline");
                *byline = Some(found);
                doc.remove(node);
            }
        }
    }

    fn attempt(&self, mut doc: Document, flags: Flags, byline: &mut Option<String>) -> Option<Extracted> {
        let body = doc.body()?;
        let to_score = self.prune(&mut doc, flags, byline);
        let (mut scores, candidates) = score_paragraphs(&doc, &to_score, flags);
        let top = rank_candidates(&doc, &mut scores, &candidates, self.config.nb_top_candidates);

        let top_candidate = match top.first() {
            Some(&candidate) if !doc.is(candidate, Tag::Body) => promote(&doc, &mut scores, candidate, &top, flags),
            _ => {
                let div = doc.create_element("div");
                doc.move_children(body, div);
                doc.append_child(body, div);
                scores.initialize(&doc, div, flags);
                tracing::debug!("no usable candidate, wrapping the body");
                div
            }
        };
        tracing::debug!(
            "top candidate <{} class=\"{}\"> scored {:.2}",
            doc.tag_name(top_candidate).unwrap_or_default(),
            doc.class_name(top_candidate),
            scores.get(top_candidate)
        );

        let dir = nearest_dir(&doc, top_candidate);
        let content = absorb_siblings(&mut doc, &scores, top_candidate);
        let cover = prep_article(&mut doc, content, &self.clean_options(flags));
        let text_length = text_length(&doc.inner_text(content));

        Some(Extracted { doc, content, text_length, flags, byline: None, dir, cover })
    }

    /// Walk the whole tree, removing what cannot be content, and collect the
    /// elements whose text gets scored
    fn prune(&self, doc: &mut Document, flags: Flags, byline: &mut Option<String>) -> Vec<NodeId> {
        let anchors = internal_anchor_targets(doc, doc.root());
        let mut to_score = Vec::new();
        let mut title_header_pending = !self.title.is_empty();
        let mut node = doc.document_element();

        while let Some(current) = node {
            if is_protected(doc, current) {
                node = doc.next_node(current, true);
                continue;
            }

            if !is_probably_visible(doc, current) || is_modal_dialog(doc, current) {
                self.pruned(doc, current, "hidden");
                node = doc.remove_and_get_next(current);
                continue;
            }

            if byline.is_none()
                && let Some(found) = check_byline(doc, current)
            {
                self.pruned(doc, current, "byline");
                *byline = Some(found);
                node = doc.remove_and_get_next(current);
                continue;
            }

            if title_header_pending && self.header_duplicates_title(doc, current) {
                self.pruned(doc, current, "repeats the title");
                title_header_pending = false;
                node = doc.remove_and_get_next(current);
                continue;
            }

            if flags.contains(Flags::STRIP_UNLIKELYS) {
                if is_unlikely_candidate(doc, current, &anchors) {
                    self.pruned(doc, current, "unlikely candidate");
                    node = doc.remove_and_get_next(current);
                    continue;
                }
                if doc.attr(current, "role").is_some_and(|role| UNLIKELY_ROLES.contains(&role)) {
                    self.pruned(doc, current, "unlikely role");
                    node = doc.remove_and_get_next(current);
                    continue;
                }
            }

            let tag = doc.tag(current);
            if tag.is_some_and(Tag::is_prunable_when_empty) && is_without_content(doc, current) && !has_lazy_image(doc, current)
            {
                self.pruned(doc, current, "empty");
                node = doc.remove_and_get_next(current);
                continue;
            }

            if tag.is_some_and(Tag::is_scored_by_default) {
                to_score.push(current);
            }

            let mut current = current;
            if tag == Some(Tag::Div) {
                wrap_phrasing_runs(doc, current);

                if let Some(p) = single_tag_inside(doc, current, Tag::P)
                    && link_density(doc, current) < 0.25
                {
                    doc.replace(current, p);
                    current = p;
                    to_score.push(p);
                } else if !has_child_block_element(doc, current) {
                    doc.set_tag(current, "p");
                    to_score.push(current);
                }
            }

            node = doc.next_node(current, false);
        }

        to_score
    }

    fn header_duplicates_title(&self, doc: &Document, id: NodeId) -> bool {
        matches!(doc.tag(id), Some(Tag::H1 | Tag::H2)) && text_similarity(self.title, &doc.inner_text(id)) > 0.75
    }
}

fn is_protected(doc: &Document, id: NodeId) -> bool {
    doc.class_name(id)
        .split_whitespace()
        .any(|class| PROTECTED_CLASSES.contains(&class))
}

fn is_probably_visible(doc: &Document, id: NodeId) -> bool {
    let hidden_style = doc.attr(id, "style").is_some_and(|style| HIDDEN_STYLE.is_match(style));
    let aria_hidden = doc.attr(id, "aria-hidden") == Some("true") && !doc.class_name(id).contains("fallback-image");
    !hidden_style && !doc.has_attr(id, "hidden") && !aria_hidden
}

fn is_modal_dialog(doc: &Document, id: NodeId) -> bool {
    doc.attr(id, "aria-modal") == Some("true") && doc.attr(id, "role") == Some("dialog")
}

/// Trimmed byline text when the node looks like one
fn check_byline(doc: &Document, id: NodeId) -> Option<String> {
    let signal = format!("{} {}", doc.class_name(id), doc.id_attr(id));
    let is_byline = doc.attr(id, "rel") == Some("author")
        || doc.attr(id, "itemprop").is_some_and(|itemprop| itemprop.contains("author"))
        || BYLINE.is_match(&signal);
    if !is_byline {
        return None;
    }

    let text = doc.text_content(id).trim().to_string();
    let length = text_length(&text);
    (length > 0 && length < MAX_BYLINE_LENGTH).then_some(text)
}

fn is_unlikely_candidate(doc: &Document, id: NodeId, anchors: &HashSet<String>) -> bool {
    let signal = format!("{} {}", doc.class_name(id), doc.id_attr(id));
    UNLIKELY_CANDIDATES.is_match(&signal)
        && !MAYBE_CANDIDATE.is_match(&signal)
        && !matches!(doc.tag(id), Some(Tag::Body | Tag::A))
        && !doc.has_ancestor_tag(id, Tag::Table, 0, |_| true)
        && !doc.has_ancestor_tag(id, Tag::Code, 0, |_| true)
        && !holds_anchor_target(doc, id, anchors)
        && !is_code_block(doc, id)
}

/// No text, and no children other than `<br>` and `<hr>`
fn is_without_content(doc: &Document, id: NodeId) -> bool {
    doc.text_content(id).trim().is_empty()
        && doc
            .element_children(id)
            .into_iter()
            .all(|child| matches!(doc.tag(child), Some(Tag::Br | Tag::Hr)))
}

fn has_child_block_element(doc: &Document, id: NodeId) -> bool {
    doc.children(id)
        .iter()
        .any(|child| doc.tag(*child).is_some_and(Tag::is_div_to_p_block) || has_child_block_element(doc, *child))
}

/// Wrap each run of phrasing content directly inside `div` into a `<p>`
fn wrap_phrasing_runs(doc: &mut Document, div: NodeId) {
    let mut paragraph: Option<NodeId> = None;

    for child in doc.children(div).to_vec() {
        if doc.is_phrasing_content(child) {
            if let Some(p) = paragraph {
                doc.append_child(p, child);
            } else if !doc.is_whitespace(child) {
                let p = doc.create_element("p");
                doc.replace(child, p);
                doc.append_child(p, child);
                paragraph = Some(p);
            }
        } else if let Some(p) = paragraph.take() {
            while let Some(last) = doc.last_child(p).filter(|l| doc.is_whitespace(*l)) {
                doc.remove(last);
            }
        }
    }
}

/// Score every collected element into up to three of its ancestors.
/// Returns the scores and the scored ancestors in the order they were first seen.
fn score_paragraphs(doc: &Document, to_score: &[NodeId], flags: Flags) -> (ContentScores, Vec<NodeId>) {
    let mut scores = ContentScores::new();
    let mut candidates = Vec::new();

    for &element in to_score {
        if doc.parent_element(element).is_none() || !doc.is_attached(element) {
            continue;
        }
        let text = doc.inner_text(element);
        if text_length(&text) < MIN_PARAGRAPH_LENGTH {
            continue;
        }

        let score = content_score(&text);
        for (level, ancestor) in doc.ancestors(element, SCORE_ANCESTOR_DEPTH).into_iter().enumerate() {
            if doc.parent_element(ancestor).is_none() {
                continue;
            }
            if !scores.is_scored(ancestor) {
                scores.initialize(doc, ancestor, flags);
                candidates.push(ancestor);
            }
            let divider = match level {
                0 => 1.0,
                1 => 2.0,
                level => level as f64 * 3.0,
            };
            scores.add(ancestor, score / divider);
        }
    }

    (scores, candidates)
}

/// Scale each score by `1 - link density` and keep the best `limit`, best first.
/// Ties keep the candidate scored first.
fn rank_candidates(doc: &Document, scores: &mut ContentScores, candidates: &[NodeId], limit: usize) -> Vec<NodeId> {
    let mut top: Vec<NodeId> = Vec::new();

    for &candidate in candidates {
        let score = scores.get(candidate) * (1.0 - link_density(doc, candidate));
        scores.set(candidate, score);

        let position = top.iter().position(|t| score > scores.get(*t)).unwrap_or(top.len());
        if position < limit {
            top.insert(position, candidate);
            top.truncate(limit);
        }
    }

    top
}

/// Move from the best candidate to a better container: the ancestor shared by
/// enough close alternatives, a higher-scoring parent, then up through parents
/// that hold nothing else.
fn promote(doc: &Document, scores: &mut ContentScores, best: NodeId, top: &[NodeId], flags: Flags) -> NodeId {
    let mut top_candidate = best;
    let best_score = scores.get(best);

    if best_score > 0.0 {
        let alternatives: Vec<Vec<NodeId>> = top[1..]
            .iter()
            .filter(|c| scores.get(**c) / best_score >= 0.75)
            .map(|c| doc.ancestors(*c, 0))
            .collect();

        if alternatives.len() >= MINIMUM_TOP_CANDIDATES {
            let mut parent = doc.parent_element(top_candidate);
            while let Some(p) = parent.filter(|p| !doc.is(*p, Tag::Body)) {
                let lists = alternatives.iter().filter(|ancestors| ancestors.contains(&p)).count();
                if lists >= MINIMUM_TOP_CANDIDATES {
                    top_candidate = p;
                    break;
                }
                parent = doc.parent_element(p);
            }
        }
    }
    if !scores.is_scored(top_candidate) {
        scores.initialize(doc, top_candidate, flags);
    }

    let mut last_score = scores.get(top_candidate);
    let threshold = last_score / 3.0;
    let mut parent = doc.parent_element(top_candidate);
    while let Some(p) = parent.filter(|p| !doc.is(*p, Tag::Body)) {
        if !scores.is_scored(p) {
            parent = doc.parent_element(p);
            continue;
        }
        let parent_score = scores.get(p);
        if parent_score < threshold {
            break;
        }
        if parent_score > last_score {
            top_candidate = p;
            break;
        }
        last_score = parent_score;
        parent = doc.parent_element(p);
    }

    let mut parent = doc.parent_element(top_candidate);
    while let Some(p) = parent.filter(|p| !doc.is(*p, Tag::Body) && doc.element_children(*p).len() == 1) {
        top_candidate = p;
        parent = doc.parent_element(p);
    }
    if !scores.is_scored(top_candidate) {
        scores.initialize(doc, top_candidate, flags);
    }

    top_candidate
}

fn nearest_dir(doc: &Document, id: NodeId) -> Option<String> {
    std::iter::once(id)
        .chain(doc.ancestors(id, 0))
        .find_map(|node| doc.attr(node, "dir").filter(|d| !d.trim().is_empty()))
        .map(str::to_string)
}

fn is_absorbable_paragraph(doc: &Document, id: NodeId) -> bool {
    if !doc.is(id, Tag::P) {
        return false;
    }
    let density = link_density(doc, id);
    let text = doc.inner_text(id);
    let length = text_length(&text);

    (length > 80 && density < 0.25) || (length > 0 && length < 80 && density == 0.0 && SENTENCE_END.is_match(&text))
}

/// Collect the top candidate and its related siblings into a new `<div>`
fn absorb_siblings(doc: &mut Document, scores: &ContentScores, top_candidate: NodeId) -> NodeId {
    let content = doc.create_element("div");
    let top_score = scores.get(top_candidate);
    let threshold = (top_score * 0.2).max(10.0);
    let top_class = doc.class_name(top_candidate).to_string();

    let siblings = match doc.parent(top_candidate) {
        Some(parent) => doc.element_children(parent),
        None => vec![top_candidate],
    };

    for sibling in siblings {
        let append = sibling == top_candidate || {
            let bonus = if !top_class.is_empty() && doc.class_name(sibling) == top_class { top_score * 0.2 } else { 0.0 };
            (scores.is_scored(sibling) && scores.get(sibling) + bonus >= threshold)
                || is_absorbable_paragraph(doc, sibling)
                || (matches!(doc.tag(sibling), Some(Tag::Figure | Tag::Picture)) && has_lazy_image(doc, sibling))
        };
        if !append {
            continue;
        }

        if !doc.tag(sibling).is_some_and(Tag::keeps_tag_when_absorbed) {
            doc.set_tag(sibling, "div");
        }
        doc.append_child(content, sibling);
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn long_paragraph(seed: &str) -> String {
        format!(
            "<p>{seed} is the subject of this paragraph, which goes on for a while, with commas, \
             so that it scores well and carries plenty of text for the extractor to keep.</p>"
        )
    }

    fn extract_with(html: &str, config: &ClearlyConfig, rule: &SiteRule) -> Option<Extracted> {
        let doc = Document::parse(html).unwrap();
        Extractor::new(config, rule, "").extract(&doc)
    }

    fn extract(html: &str) -> Option<Extracted> {
        extract_with(html, &ClearlyConfig::default(), &SiteRule::new())
    }

    #[test]
    fn test_flags_drop_in_order() {
        let mut flags = Flags::all();
        let mut seen = vec![flags];
        while let Some(next) = next_flags(flags) {
            assert!(flags.contains(next) && flags != next);
            flags = next;
            seen.push(flags);
        }

        assert_eq!(
            seen,
            vec![
                Flags::all(),
                Flags::WEIGHT_CLASSES | Flags::CLEAN_CONDITIONALLY,
                Flags::CLEAN_CONDITIONALLY,
                Flags::empty(),
            ]
        );
    }

    #[test]
    fn test_scoring_picks_content_over_navigation() {
        let paragraphs: String = ["First", "Second", "Third", "Fourth", "Fifth", "Sixth"]
            .iter()
            .map(|s| long_paragraph(s))
            .collect();
        let html = format!(
            r#"<html><body>
                <div class="menu"><a href="/a">Home</a> <a href="/b">About</a></div>
                <div class="story">{paragraphs}</div>
                <div class="footer">Copyright</div>
            </body></html>"#
        );

        let extracted = extract(&html).unwrap();
        let text = extracted.doc.inner_text(extracted.content);
        assert!(text.contains("Sixth is the subject"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("About"));
        assert!(extracted.text_length >= 500);
        assert_eq!(extracted.flags, Flags::all());
    }

    #[test]
    fn test_single_article_element_is_used() {
        let html = format!(
            "<html><body><nav>Menu</nav><article dir=\"rtl\">{}</article><aside>Ads</aside></body></html>",
            long_paragraph("Only")
        );

        let extracted = extract(&html).unwrap();
        assert_eq!(extracted.flags, Flags::all() - Flags::CLEAN_CONDITIONALLY);
        assert_eq!(extracted.dir.as_deref(), Some("rtl"));
        assert!(extracted.html().starts_with("<article"));
        assert!(!extracted.html().contains("Menu"));
    }

    #[test]
    fn test_extract_elems_joined() {
        let rule = SiteRule {
            content_elem: vec!["#thread".to_string()],
            extract_elems: vec![".comment".to_string()],
            extract_elems_joiner: Some("<hr>".to_string()),
            ..SiteRule::new()
        };
        let html = r#"<div id="thread"><div class="comment">First comment text.</div><div class="meta">x</div><div class="comment">Second comment text.</div></div>"#;

        let extracted = extract_with(html, &ClearlyConfig::default(), &rule).unwrap();
        assert_eq!(
            extracted.html(),
            "<div>First comment text.</div><hr><div>Second comment text.</div>"
        );
    }

    #[test]
    fn test_byline_and_hidden_nodes() {
        let paragraphs: String = ["One", "Two", "Three", "Four", "Five"].iter().map(|s| long_paragraph(s)).collect();
        let html = format!(
            r#"<html><body><div class="post">
                <p class="byline">By Jane Doe</p>
                <div style="display: none">Hidden text</div>
                <p hidden>Also hidden</p>
                {paragraphs}
            </div></body></html>"#
        );

        let extracted = extract(&html).unwrap();
        let text = extracted.doc.inner_text(extracted.content);
        assert_eq!(extracted.byline.as_deref(), Some("By Jane Doe"));
        assert!(!text.contains("Jane Doe"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn test_short_document_falls_back_to_best_attempt() {
        let html = "<html><body><div><p>Just one paragraph with some text in it.</p></div></body></html>";
        let extracted = extract(html).unwrap();
        assert!(extracted.text_length > 0 && extracted.text_length < 500);
        assert_eq!(extracted.flags, Flags::all());
    }

    #[test]
    fn test_empty_document() {
        assert!(extract("<html><body></body></html>").is_none());
    }

    #[test]
    fn test_div_with_phrasing_becomes_paragraph() {
        let mut doc = Document::parse("<div>Some <b>bold</b> text<div>block</div>tail</div>").unwrap();
        let div = doc.select_first(doc.root(), "div").unwrap().unwrap();
        wrap_phrasing_runs(&mut doc, div);
        assert_eq!(doc.inner_html(div), "<p>Some <b>bold</b> text</p><div>block</div><p>tail</p>");
    }

    #[test]
    fn test_rank_keeps_first_on_ties() {
        let doc = Document::parse("<div id=\"a\">x</div><div id=\"b\">x</div><div id=\"c\">x</div>").unwrap();
        let divs = doc.select(doc.root(), "div").unwrap();
        let mut scores = ContentScores::new();
        scores.set(divs[0], 10.0);
        scores.set(divs[1], 10.0);
        scores.set(divs[2], 20.0);

        let top = rank_candidates(&doc, &mut scores, &divs, 2);
        assert_eq!(top, vec![divs[2], divs[0]]);
    }

    fn by_id(doc: &Document, id: &str) -> NodeId {
        doc.select_first(doc.root(), &format!("#{id}")).unwrap().unwrap()
    }

    #[test]
    fn test_promote_to_shared_ancestor_of_close_candidates() {
        let html = r#"<div id="wrap"><div id="a">x</div><div id="b">x</div><div id="c">x</div><div id="d">x</div></div>"#;
        let doc = Document::parse(html).unwrap();
        let [a, b, c, d] = ["a", "b", "c", "d"].map(|id| by_id(&doc, id));

        let mut scores = ContentScores::new();
        for (node, score) in [(a, 100.0), (b, 80.0), (c, 80.0), (d, 80.0)] {
            scores.set(node, score);
        }
        let promoted = promote(&doc, &mut scores, a, &[a, b, c, d], Flags::empty());
        assert_eq!(promoted, by_id(&doc, "wrap"));
        assert!(scores.is_scored(promoted));

        let mut scores = ContentScores::new();
        for (node, score) in [(a, 100.0), (b, 80.0), (c, 80.0), (d, 50.0)] {
            scores.set(node, score);
        }
        assert_eq!(promote(&doc, &mut scores, a, &[a, b, c, d], Flags::empty()), a);
    }

    #[rstest]
    #[case::better_parent(40.0, None, "mid")]
    #[case::parent_below_floor(5.0, Some(100.0), "inner")]
    #[case::climb_past_weaker_parent(20.0, Some(25.0), "outer")]
    fn test_promote_parent_climb(#[case] mid: f64, #[case] outer: Option<f64>, #[case] expected: &str) {
        let html = r#"<div id="outer"><div id="mid"><div id="inner">x</div><p>y</p></div><p>z</p></div>"#;
        let doc = Document::parse(html).unwrap();
        let inner = by_id(&doc, "inner");

        let mut scores = ContentScores::new();
        scores.set(inner, 30.0);
        scores.set(by_id(&doc, "mid"), mid);
        if let Some(score) = outer {
            scores.set(by_id(&doc, "outer"), score);
        }

        assert_eq!(promote(&doc, &mut scores, inner, &[inner], Flags::empty()), by_id(&doc, expected));
    }

    #[test]
    fn test_promote_collapses_single_child_parents() {
        let html = r#"<div id="outer"><section id="only"><div id="best">x</div></section><p>other</p></div>"#;
        let doc = Document::parse(html).unwrap();
        let best = by_id(&doc, "best");

        let mut scores = ContentScores::new();
        scores.set(best, 30.0);
        let promoted = promote(&doc, &mut scores, best, &[best], Flags::empty());

        assert_eq!(promoted, by_id(&doc, "only"));
        assert!(scores.is_scored(promoted));
    }

    #[test]
    fn test_absorb_related_siblings() {
        let html = r#"<div id="parent">
            <div id="top" class="story">x</div>
            <div id="same" class="story">x</div>
            <div id="other" class="misc">x</div>
            <aside id="strong">x</aside>
            <p id="long">This paragraph is long enough to be absorbed even though it shares no class with the top one.</p>
            <p id="short">Short sentence.</p>
            <p id="fragment">Short fragment</p>
            <p id="linky"><a href="/x">A long run of link text that makes up nearly all of this paragraph, well past eighty characters</a> end</p>
            <figure id="lazy"><img data-src="a.jpg"></figure>
            <figure id="plain"><img src="b.jpg"></figure>
        </div>"#;
        let mut doc = Document::parse(html).unwrap();

        let mut scores = ContentScores::new();
        scores.set(by_id(&doc, "top"), 100.0);
        scores.set(by_id(&doc, "same"), 4.0);
        scores.set(by_id(&doc, "other"), 4.0);
        scores.set(by_id(&doc, "strong"), 25.0);

        let top = by_id(&doc, "top");
        let content = absorb_siblings(&mut doc, &scores, top);

        let absorbed: Vec<&str> = doc.element_children(content).into_iter().map(|n| doc.id_attr(n)).collect();
        assert_eq!(absorbed, ["top", "same", "strong", "long", "short", "lazy"]);

        let tags: Vec<&str> = doc.element_children(content).into_iter().filter_map(|n| doc.tag_name(n)).collect();
        assert_eq!(tags, ["div", "div", "div", "p", "p", "div"]);
        assert!(doc.is(by_id(&doc, "plain"), Tag::Figure));
    }

    #[test]
    fn test_absorb_threshold_floor() {
        let html = r#"<div><div id="top">x</div><div id="near">x</div><div id="far">x</div></div>"#;
        let mut doc = Document::parse(html).unwrap();

        let mut scores = ContentScores::new();
        scores.set(by_id(&doc, "top"), 20.0);
        scores.set(by_id(&doc, "near"), 10.0);
        scores.set(by_id(&doc, "far"), 9.0);

        let top = by_id(&doc, "top");
        let content = absorb_siblings(&mut doc, &scores, top);
        let absorbed: Vec<&str> = doc.element_children(content).into_iter().map(|n| doc.id_attr(n)).collect();
        assert_eq!(absorbed, ["top", "near"]);
    }

    #[test]
    fn test_unlikely_kept_when_anchor_target() {
        let doc = Document::parse(
            r##"<div class="sidebar" id="s1">x</div><div class="sidebar"><h2 id="notes">Notes</h2></div><a href="#notes">n</a>"##,
        )
        .unwrap();
        let anchors = internal_anchor_targets(&doc, doc.root());
        let divs = doc.select(doc.root(), "div.sidebar").unwrap();

        assert!(is_unlikely_candidate(&doc, divs[0], &anchors));
        assert!(!is_unlikely_candidate(&doc, divs[1], &anchors));
    }
}

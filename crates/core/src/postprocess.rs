use std::collections::HashSet;

use url::Url;

use crate::dom_tree::{Document, NodeId};
use crate::extract::Flags;
use crate::patterns::{
    BASE64_DATA_URL, CODE_BLOCK, LAZY_IMAGE_SRC, LAZY_IMAGE_SRCSET, SHARE_ELEMENTS, SRCSET_CANDIDATE, VIDEOS,
};
use crate::scoring::{class_weight, comma_count, link_density, text_length};
use crate::tags::Tag;

/// Attributes that carry the real image URL of a delay-loaded picture
pub(crate) const DELAY_LOAD_ATTRS: &[&str] =
    &["data-src", "data-srcset", "data-lazy-src", "data-lazy-srcset", "data-original", "data-lazy", "data-url"];

/// Layout attributes dropped from every element outside SVG
const PRESENTATIONAL_ATTRIBUTES: &[&str] = &[
    "align",
    "background",
    "bgcolor",
    "border",
    "cellpadding",
    "cellspacing",
    "frame",
    "hspace",
    "rules",
    "style",
    "valign",
    "vspace",
];

/// Base64 images shorter than this are placeholders
const MIN_BASE64_LENGTH: usize = 133;

const COVER_MIN_WIDTH: f64 = 500.0;
const COVER_MIN_HEIGHT: f64 = 300.0;

const SMALL_IMAGE_SIDE: f64 = 250.0;
const MIN_ASPECT_RATIO: f64 = 1.0 / 6.0;
const MAX_ASPECT_RATIO: f64 = 4.5;

/// Settings for one cleaning pass over the extracted content
#[derive(Debug, Clone, Copy)]
pub struct CleanOptions<'a> {
    /// Article title, used to drop a heading that repeats it
    pub title: &'a str,
    /// Heuristics active in the current attempt
    pub flags: Flags,
    /// Share widgets shorter than this are removed
    pub char_threshold: usize,
    /// Classes that survive attribute stripping
    pub classes_to_preserve: &'a [String],
    /// Keep every class
    pub keep_classes: bool,
    /// Site-config selectors removed before anything else
    pub exclude_elems: &'a [String],
    /// Image from the page metadata, used when no picture qualifies as cover
    pub meta_image: Option<&'a str>,
    /// Report every removed node at debug level
    pub debug: bool,
}

impl Default for CleanOptions<'_> {
    fn default() -> Self {
        Self {
            title: "",
            flags: Flags::all(),
            char_threshold: 500,
            classes_to_preserve: &[],
            keep_classes: false,
            exclude_elems: &[],
            meta_image: None,
            debug: false,
        }
    }
}

struct Cleaner<'a> {
    opts: &'a CleanOptions<'a>,
    data_tables: HashSet<NodeId>,
}

/// Clean the extracted content in place and return the cover image URL.
///
/// The steps run in a fixed order: exclusion selectors, presentational
/// attributes, data-table marking, delay-loaded images, forms, unwanted
/// elements, share widgets, a heading repeating the title, form controls,
/// negative headings, the cover photo, conditional cleaning of tables, lists
/// and divs, small images, single-cell tables, the attribute whitelist, empty
/// nodes, duplicate images and finally URL rewriting.
pub fn prep_article(doc: &mut Document, article: NodeId, opts: &CleanOptions<'_>) -> Option<String> {
    let mut cleaner = Cleaner { opts, data_tables: HashSet::new() };

    remove_excluded(doc, article, opts.exclude_elems);
    clean_styles(doc, article);
    cleaner.data_tables = mark_data_tables(doc, article);
    fix_lazy_images(doc, article);

    cleaner.clean_conditionally(doc, article, Tag::Form);
    cleaner.clean_conditionally(doc, article, Tag::Fieldset);
    cleaner.remove_tags(
        doc,
        article,
        &[Tag::Object, Tag::Embed, Tag::H1, Tag::Footer, Tag::Link, Tag::Aside, Tag::Canvas],
    );
    cleaner.remove_share_elements(doc, article);
    cleaner.remove_title_heading(doc, article);
    cleaner.remove_tags(doc, article, &[Tag::Iframe, Tag::Input, Tag::Textarea, Tag::Select, Tag::Button]);
    cleaner.clean_headers(doc, article);

    let cover = cover_photo(doc, article).or_else(|| opts.meta_image.map(str::to_string));

    cleaner.clean_conditionally(doc, article, Tag::Table);
    cleaner.clean_conditionally(doc, article, Tag::Ul);
    cleaner.clean_conditionally(doc, article, Tag::Div);

    cleaner.remove_small_images(doc, article);
    collapse_single_cell_tables(doc, article);

    let anchors = internal_anchor_targets(doc, article);
    clean_attributes(doc, article, &anchors, opts);
    remove_empty_nodes(doc, article);
    remove_duplicate_images(doc, article);
    fix_relative_uris(doc, article);

    cover.and_then(|url| absolutize(doc.base_url(), &url))
}

/// Ids targeted by `#fragment` links inside `scope`
pub(crate) fn internal_anchor_targets(doc: &Document, scope: NodeId) -> HashSet<String> {
    doc.get_elements_by_tag(scope, &[Tag::A])
        .into_iter()
        .filter_map(|a| doc.attr(a, "href"))
        .filter_map(|href| href.strip_prefix('#'))
        .filter(|target| !target.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether the node or one of its descendants is the target of an internal link
pub(crate) fn holds_anchor_target(doc: &Document, id: NodeId, anchors: &HashSet<String>) -> bool {
    if anchors.is_empty() {
        return false;
    }
    std::iter::once(id)
        .chain(doc.descendants(id))
        .any(|n| doc.attr(n, "id").is_some_and(|value| anchors.contains(value)))
}

/// Whether the node, or an `<img>`/`<source>` inside it, waits for a delay-load attribute
pub(crate) fn has_lazy_image(doc: &Document, id: NodeId) -> bool {
    std::iter::once(id)
        .chain(doc.descendants(id))
        .filter(|n| matches!(doc.tag(*n), Some(Tag::Img | Tag::Source)))
        .any(|n| DELAY_LOAD_ATTRS.iter().any(|attr| doc.has_attr(n, attr)))
}

/// Highlighted code: a class from a highlighter, or `<pre><code>`
pub(crate) fn is_code_block(doc: &Document, id: NodeId) -> bool {
    if !doc.is_element(id) {
        return false;
    }
    CODE_BLOCK.is_match(doc.class_name(id))
        || (doc.is(id, Tag::Pre) && doc.first_element_child(id).is_some_and(|c| doc.is(c, Tag::Code)))
}

/// An embed pointing at a known video host
pub(crate) fn is_video_embed(doc: &Document, id: NodeId) -> bool {
    doc.attrs(id).iter().any(|(_, value)| VIDEOS.is_match(value))
        || (doc.is(id, Tag::Object) && VIDEOS.is_match(&doc.inner_html(id)))
}

fn remove_excluded(doc: &mut Document, article: NodeId, selectors: &[String]) {
    for selector in selectors {
        match doc.select(article, selector) {
            Ok(nodes) => nodes.into_iter().for_each(|node| doc.remove(node)),
            Err(e) => tracing::warn!("excludeElems selector skipped: {e}"),
        }
    }
}

fn clean_styles(doc: &mut Document, article: NodeId) {
    let mut stack = vec![article];
    while let Some(node) = stack.pop() {
        let Some(tag) = doc.tag(node) else { continue };
        if tag == Tag::Svg {
            continue;
        }

        let sized = matches!(tag, Tag::Table | Tag::Th | Tag::Td | Tag::Hr | Tag::Pre);
        doc.retain_attrs(node, |name, _| {
            let name = name.to_ascii_lowercase();
            !PRESENTATIONAL_ATTRIBUTES.contains(&name.as_str()) && !(sized && (name == "width" || name == "height"))
        });
        stack.extend(doc.element_children(node));
    }
}

/// Classify every table in `scope` as holding data or only layout
fn mark_data_tables(doc: &Document, scope: NodeId) -> HashSet<NodeId> {
    doc.get_elements_by_tag(scope, &[Tag::Table])
        .into_iter()
        .filter(|table| is_data_table(doc, *table))
        .collect()
}

fn is_data_table(doc: &Document, table: NodeId) -> bool {
    if doc.attr(table, "role") == Some("presentation") || doc.attr(table, "datatable") == Some("0") {
        return false;
    }
    if doc.has_attr(table, "summary") {
        return true;
    }

    let descendants = doc.descendants(table);
    let caption = descendants.iter().copied().find(|n| doc.is(*n, Tag::Caption));
    if caption.is_some_and(|c| !doc.children(c).is_empty()) {
        return true;
    }
    if descendants
        .iter()
        .any(|n| matches!(doc.tag(*n), Some(Tag::Col | Tag::Colgroup | Tag::Tfoot | Tag::Thead | Tag::Th)))
    {
        return true;
    }
    if descendants.iter().any(|n| doc.is(*n, Tag::Table)) {
        return false;
    }

    let (rows, columns) = row_and_column_count(doc, table);
    if rows >= 10 || columns > 4 {
        return true;
    }
    rows * columns > 10
}

fn span_attr(doc: &Document, id: NodeId, name: &str) -> usize {
    doc.attr(id, name)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|span| *span > 0)
        .unwrap_or(1)
}

fn row_and_column_count(doc: &Document, table: NodeId) -> (usize, usize) {
    let mut rows = 0;
    let mut columns = 0;
    for tr in doc.get_elements_by_tag(table, &[Tag::Tr]) {
        rows += span_attr(doc, tr, "rowspan");
        let cells: usize = doc
            .element_children(tr)
            .into_iter()
            .filter(|c| doc.tag(*c).is_some_and(Tag::is_table_cell))
            .map(|c| span_attr(doc, c, "colspan"))
            .sum();
        columns = columns.max(cells);
    }
    (rows, columns)
}

/// Promote delay-load attributes of images to `src`/`srcset`
fn fix_lazy_images(doc: &mut Document, article: NodeId) {
    for node in doc.get_elements_by_tag(article, &[Tag::Img, Tag::Picture, Tag::Figure]) {
        if let Some(src) = doc.attr(node, "src").map(str::to_string)
            && let Some(caps) = BASE64_DATA_URL.captures(&src)
        {
            let svg = caps.get(1).is_some_and(|m| m.as_str().eq_ignore_ascii_case("image/svg+xml"));
            let other_image = doc
                .attrs(node)
                .iter()
                .any(|(name, value)| !name.eq_ignore_ascii_case("src") && LAZY_IMAGE_SRC.is_match(value));
            let payload = src.len() - caps.get(0).map_or(0, |m| m.end());
            if !svg && other_image && payload < MIN_BASE64_LENGTH {
                doc.remove_attr(node, "src");
            }
        }

        let has_source = doc.attr(node, "src").is_some_and(|v| !v.is_empty())
            || doc.attr(node, "srcset").is_some_and(|v| !v.is_empty() && v != "null");
        if has_source && !doc.class_name(node).to_ascii_lowercase().contains("lazy") {
            continue;
        }

        let candidates: Vec<(String, String)> = doc
            .attrs(node)
            .iter()
            .filter(|(name, _)| !matches!(name.to_ascii_lowercase().as_str(), "src" | "srcset" | "alt"))
            .filter_map(|(_, value)| {
                if LAZY_IMAGE_SRCSET.is_match(value) {
                    Some(("srcset".to_string(), value.clone()))
                } else if LAZY_IMAGE_SRC.is_match(value) {
                    Some(("src".to_string(), value.trim().to_string()))
                } else {
                    None
                }
            })
            .collect();

        for (target, value) in candidates {
            if matches!(doc.tag(node), Some(Tag::Img | Tag::Picture)) {
                doc.set_attr(node, &target, &value);
            } else if doc.get_elements_by_tag(node, &[Tag::Img, Tag::Picture]).is_empty() {
                let img = doc.create_element("img");
                doc.set_attr(img, &target, &value);
                doc.append_child(node, img);
            }
        }
    }
}

impl Cleaner<'_> {
    fn removed(&self, doc: &Document, node: NodeId, reason: &str) {
        let name = doc.tag_name(node).unwrap_or("#node");
        let class = doc.class_name(node);
        node_event!(self.opts.debug, "cleaning removed <{name} class=\"{class}\">: {reason}");
    }

    /// Remove every element of the given kinds; video embeds survive
    fn remove_tags(&self, doc: &mut Document, article: NodeId, tags: &[Tag]) {
        for node in doc.get_elements_by_tag(article, tags) {
            if matches!(doc.tag(node), Some(Tag::Object | Tag::Embed | Tag::Iframe)) && is_video_embed(doc, node) {
                continue;
            }
            self.removed(doc, node, "unwanted element");
            doc.remove(node);
        }
    }

    fn remove_share_elements(&self, doc: &mut Document, article: NodeId) {
        for child in doc.element_children(article) {
            for node in doc.descendants(child) {
                if !doc.is_element(node) || !doc.contains(child, node) {
                    continue;
                }
                let signal = format!("{} {}", doc.class_name(node), doc.id_attr(node));
                if SHARE_ELEMENTS.is_match(&signal) && text_length(&doc.text_content(node)) < self.opts.char_threshold {
                    self.removed(doc, node, "share widget");
                    doc.remove(node);
                }
            }
        }
    }

    /// Drop the only `<h2>` when it repeats the title
    fn remove_title_heading(&self, doc: &mut Document, article: NodeId) {
        let title_length = text_length(self.opts.title);
        if title_length == 0 {
            return;
        }

        let headings = doc.get_elements_by_tag(article, &[Tag::H2]);
        let [h2] = headings.as_slice() else { return };
        let text = doc.text_content(*h2);
        let rate = (text_length(&text) as f64 - title_length as f64) / title_length as f64;
        if rate.abs() >= 0.5 {
            return;
        }

        let matches = if rate > 0.0 { text.contains(self.opts.title) } else { self.opts.title.contains(text.as_str()) };
        if matches {
            self.removed(doc, *h2, "repeats the title");
            doc.remove(*h2);
        }
    }

    /// Remove headings with a negative class weight that no internal link targets
    fn clean_headers(&self, doc: &mut Document, article: NodeId) {
        let anchors = internal_anchor_targets(doc, article);
        let headings = doc.get_elements_by_tag(article, &[Tag::H1, Tag::H2, Tag::H3, Tag::H4, Tag::H5, Tag::H6]);
        for heading in headings {
            if class_weight(doc, heading, self.opts.flags) < 0.0 && !holds_anchor_target(doc, heading, &anchors) {
                self.removed(doc, heading, "negative heading");
                doc.remove(heading);
            }
        }
    }

    fn is_exempt(&self, doc: &Document, node: NodeId) -> bool {
        if self.data_tables.contains(&node) || is_code_block(doc, node) {
            return true;
        }
        let ancestors = doc.ancestors(node, 0);
        if ancestors.iter().any(|a| {
            self.data_tables.contains(a) || matches!(doc.tag(*a), Some(Tag::Code | Tag::Pre)) || is_code_block(doc, *a)
        }) {
            return true;
        }
        doc.descendants(node)
            .into_iter()
            .any(|d| self.data_tables.contains(&d) || is_code_block(doc, d))
    }

    /// Remove elements of `tag` that look like boilerplate rather than content.
    ///
    /// Runs only while `CLEAN_CONDITIONALLY` is active. Data tables and code
    /// blocks, and anything inside or around them, are kept.
    fn clean_conditionally(&self, doc: &mut Document, article: NodeId, tag: Tag) {
        if !self.opts.flags.contains(Flags::CLEAN_CONDITIONALLY) {
            return;
        }

        for node in doc.get_elements_by_tag(article, &[tag]).into_iter().rev() {
            if !doc.contains(article, node) || self.is_exempt(doc, node) {
                continue;
            }
            if let Some(reason) = self.removal_reason(doc, node, tag) {
                self.removed(doc, node, reason);
                doc.remove(node);
            }
        }
    }

    fn removal_reason(&self, doc: &Document, node: NodeId, tag: Tag) -> Option<&'static str> {
        let weight = class_weight(doc, node, self.opts.flags);
        if weight < 0.0 {
            return Some("negative weight");
        }

        let text = doc.inner_text(node);
        if comma_count(&text) >= 10 {
            return None;
        }

        let content_length = text_length(&text);
        let is_list = matches!(tag, Tag::Ul | Tag::Ol) || {
            let list_length: usize = doc
                .get_elements_by_tag(node, &[Tag::Ul, Tag::Ol])
                .into_iter()
                .map(|list| text_length(&doc.inner_text(list)))
                .sum();
            content_length > 0 && list_length as f64 / content_length as f64 > 0.9
        };

        let count = |tags: &[Tag]| doc.get_elements_by_tag(node, tags).len();
        let p = count(&[Tag::P]);
        let img = count(&[Tag::Img]);
        let li_count = count(&[Tag::Li]);
        let li = li_count as isize - 100;
        let input = count(&[Tag::Input]);

        let mut embeds = 0;
        for embed in doc.get_elements_by_tag(node, &[Tag::Object, Tag::Embed, Tag::Iframe]) {
            if is_video_embed(doc, embed) {
                return None;
            }
            embeds += 1;
        }

        let density = link_density(doc, node);
        let in_figure = doc.has_ancestor_tag(node, Tag::Figure, 0, |_| true);

        let reason = if !in_figure && img > 1 && (p as f64 / img as f64) < 0.5 {
            Some("more images than paragraphs")
        } else if is_list && li_count == 0 {
            Some("empty list")
        } else if !is_list && li > p as isize {
            Some("more list items than paragraphs")
        } else if input > p / 3 {
            Some("too many inputs")
        } else if !is_list && !in_figure && content_length < 25 && (img == 0 || img > 2) {
            Some("too short")
        } else if !is_list && img == 0 && weight < 25.0 && density > 0.2 {
            Some("low weight and linky")
        } else if weight >= 25.0 && density > 0.5 {
            Some("too linky")
        } else if (embeds == 1 && content_length < 75) || embeds > 1 {
            Some("embeds without text")
        } else {
            None
        };

        // Simple lists of images stay
        if is_list && reason.is_some() {
            let nested = doc.element_children(node).into_iter().any(|c| doc.element_children(c).len() > 1);
            if !nested && img == li_count {
                return None;
            }
        }

        reason
    }

    /// Remove icons and thin decorations
    fn remove_small_images(&self, doc: &mut Document, article: NodeId) {
        for node in doc.get_elements_by_tag(article, &[Tag::Img, Tag::Svg]) {
            let (Some(width), Some(height)) = (dimension(doc, node, "width"), dimension(doc, node, "height")) else {
                continue;
            };
            if width <= 0.0 || height <= 0.0 {
                continue;
            }

            let ratio = width / height;
            let small = width <= SMALL_IMAGE_SIDE && height <= SMALL_IMAGE_SIDE;
            let thin = width.min(height) < SMALL_IMAGE_SIDE && !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio);
            if small || thin {
                self.removed(doc, node, "small image");
                doc.remove(node);
            }
        }
    }
}

/// Numeric `width`/`height` attribute, ignoring a `px` suffix
fn dimension(doc: &Document, id: NodeId, name: &str) -> Option<f64> {
    doc.attr(id, name)
        .map(|value| value.trim().trim_end_matches("px").trim())
        .and_then(|value| value.parse::<f64>().ok())
}

/// URL of the largest image that qualifies as cover.
///
/// An `<svg>` counts with its `width`/`height` (or `viewBox`) and the picture
/// it draws through `<image>` or `<use>`.
fn cover_photo(doc: &Document, article: NodeId) -> Option<String> {
    let mut best: Option<(String, f64)> = None;
    for node in doc.get_elements_by_tag(article, &[Tag::Img, Tag::Svg]) {
        let (width, height) = if doc.is(node, Tag::Svg) {
            svg_dimensions(doc, node)
        } else {
            (dimension(doc, node, "width").unwrap_or(0.0), dimension(doc, node, "height").unwrap_or(0.0))
        };
        if width <= COVER_MIN_WIDTH && height <= COVER_MIN_HEIGHT {
            continue;
        }
        let url = if doc.is(node, Tag::Svg) { svg_image_url(doc, node) } else { image_url(doc, node) };
        let Some(url) = url else { continue };

        let area = width.max(1.0) * height.max(1.0);
        if best.as_ref().is_none_or(|(_, size)| area > *size) {
            best = Some((url, area));
        }
    }

    best.map(|(url, _)| url)
}

/// `width`/`height` of an `<svg>`, falling back to its `viewBox` size
fn svg_dimensions(doc: &Document, svg: NodeId) -> (f64, f64) {
    let view_box: Vec<f64> = doc
        .attr(svg, "viewBox")
        .or_else(|| doc.attr(svg, "viewbox"))
        .map(|v| v.split([' ', ',']).filter_map(|n| n.trim().parse().ok()).collect())
        .unwrap_or_default();
    let (box_width, box_height) = match view_box.as_slice() {
        [_, _, w, h] => (*w, *h),
        _ => (0.0, 0.0),
    };

    (
        dimension(doc, svg, "width").unwrap_or(box_width),
        dimension(doc, svg, "height").unwrap_or(box_height),
    )
}

/// Picture referenced by an `<image>` or `<use>` inside an `<svg>`
fn svg_image_url(doc: &Document, svg: NodeId) -> Option<String> {
    doc.descendants(svg)
        .into_iter()
        .filter(|n| matches!(doc.tag_name(*n), Some("image" | "use")))
        .find_map(|n| doc.attr(n, "href").or_else(|| doc.attr(n, "xlink:href")))
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty() && !url.starts_with('#') && !url.starts_with("data:"))
}

/// Highest-resolution `srcset` candidate, else `src`. Data URLs are ignored.
fn image_url(doc: &Document, img: NodeId) -> Option<String> {
    let from_srcset = doc.attr(img, "srcset").and_then(|srcset| {
        let mut best: Option<(&str, f64)> = None;
        for caps in SRCSET_CANDIDATE.captures_iter(srcset) {
            let Some(url) = caps.get(1).map(|m| m.as_str()) else { continue };
            let size = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok()).unwrap_or(1.0);
            if best.is_none_or(|(_, current)| size > current) {
                best = Some((url, size));
            }
        }
        best.map(|(url, _)| url.to_string())
    });

    from_srcset
        .or_else(|| doc.attr(img, "src").map(str::to_string))
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty() && !url.starts_with("data:"))
}

/// Only element child of `id` when it has the given tag and no text sits beside it
pub(crate) fn single_tag_inside(doc: &Document, id: NodeId, tag: Tag) -> Option<NodeId> {
    let children = doc.element_children(id);
    let [only] = children.as_slice() else { return None };
    let loose_text = doc
        .children(id)
        .iter()
        .any(|c| doc.text(*c).is_some_and(|text| !text.trim().is_empty()));
    (doc.is(*only, tag) && !loose_text).then_some(*only)
}

fn collapse_single_cell_tables(doc: &mut Document, article: NodeId) {
    for table in doc.get_elements_by_tag(article, &[Tag::Table]) {
        let body = single_tag_inside(doc, table, Tag::Tbody).unwrap_or(table);
        let Some(row) = single_tag_inside(doc, body, Tag::Tr) else { continue };
        let Some(cell) = single_tag_inside(doc, row, Tag::Td) else { continue };

        let phrasing = doc.children(cell).iter().all(|c| doc.is_phrasing_content(*c));
        doc.set_tag(cell, if phrasing { "p" } else { "div" });
        doc.replace(table, cell);
    }
}

fn allowed_attributes(tag: Tag) -> &'static [&'static str] {
    match tag {
        Tag::Img => &["src", "alt", "srcset"],
        Tag::A => &["href", "title", "target", "rel"],
        Tag::Td | Tag::Th => &["colspan", "rowspan"],
        Tag::Video | Tag::Audio => &["src", "poster", "controls", "preload", "width", "height"],
        Tag::Source | Tag::Track => &["src", "srcset", "type", "media", "sizes", "kind", "label", "srclang"],
        Tag::Iframe | Tag::Embed => &["src", "type", "width", "height", "allowfullscreen"],
        Tag::Object => &["data", "type", "width", "height"],
        Tag::Param => &["name", "value"],
        Tag::Ol => &["start", "reversed", "type"],
        Tag::Time => &["datetime"],
        _ => &[],
    }
}

/// Strip every attribute outside the per-tag whitelist. SVG and MathML keep theirs.
fn clean_attributes(doc: &mut Document, article: NodeId, anchors: &HashSet<String>, opts: &CleanOptions<'_>) {
    let mut stack = vec![article];
    while let Some(node) = stack.pop() {
        let Some(tag) = doc.tag(node) else { continue };
        if matches!(tag, Tag::Svg | Tag::Math) {
            continue;
        }

        let keep_id = tag.is_heading() || anchors.contains(doc.id_attr(node));
        let class = if opts.keep_classes {
            doc.class_name(node).to_string()
        } else {
            doc.class_name(node)
                .split_whitespace()
                .filter(|c| opts.classes_to_preserve.iter().any(|p| p == c))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let allowed = allowed_attributes(tag);
        doc.retain_attrs(node, |name, _| {
            let name = name.to_ascii_lowercase();
            name == "dir"
                || (name == "id" && keep_id)
                || (name == "class" && !class.is_empty())
                || allowed.contains(&name.as_str())
        });
        if !class.is_empty() {
            doc.set_attr(node, "class", &class);
        }

        stack.extend(doc.element_children(node));
    }
}

/// Remove elements left without text or media, children first
fn remove_empty_nodes(doc: &mut Document, article: NodeId) {
    for node in doc.descendants(article).into_iter().rev() {
        let Some(tag) = doc.tag(node) else { continue };
        if tag.is_void() || tag.is_media() || matches!(tag, Tag::Td | Tag::Th | Tag::Hr | Tag::Iframe) {
            continue;
        }
        if doc.has_attr(node, "id") || doc.has_ancestor_tag(node, Tag::Svg, 0, |_| true) {
            continue;
        }

        let has_text = !doc.text_content(node).trim().is_empty();
        let has_content = doc
            .element_children(node)
            .into_iter()
            .any(|c| !matches!(doc.tag(c), Some(Tag::Br | Tag::Wbr)));
        if !has_text && !has_content {
            doc.remove(node);
        }
    }
}

/// Keep the first of several images with the same `src`. A repeat inside a
/// `<figure>` takes the whole figure with it.
fn remove_duplicate_images(doc: &mut Document, article: NodeId) {
    let mut seen: Vec<(String, NodeId)> = Vec::new();
    for img in doc.get_elements_by_tag(article, &[Tag::Img]) {
        let Some(src) = doc.attr(img, "src").map(str::to_string).filter(|s| !s.is_empty()) else {
            continue;
        };
        if !doc.contains(article, img) {
            continue;
        }

        match seen.iter().find(|(known, _)| *known == src) {
            Some((_, first)) => {
                let figure = doc
                    .ancestors(img, 0)
                    .into_iter()
                    .find(|a| doc.is(*a, Tag::Figure) && !doc.contains(*a, *first));
                doc.remove(figure.unwrap_or(img));
            }
            None => seen.push((src, img)),
        }
    }
}

fn absolutize(base: Option<&Url>, value: &str) -> Option<String> {
    match base {
        Some(base) => base.join(value.trim()).ok().map(String::from),
        None => Some(value.to_string()),
    }
}

fn absolutize_srcset(base: &Url, srcset: &str) -> String {
    SRCSET_CANDIDATE
        .captures_iter(srcset)
        .filter_map(|caps| {
            let url = caps.get(1)?.as_str();
            let absolute = base.join(url).map(String::from).unwrap_or_else(|_| url.to_string());
            Some(match (caps.get(2), caps.get(3)) {
                (Some(size), Some(unit)) => format!("{absolute} {}{}", size.as_str(), unit.as_str()),
                _ => absolute,
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrite relative links and media sources against the base URL and turn
/// `javascript:` links into plain text.
fn fix_relative_uris(doc: &mut Document, article: NodeId) {
    let base = doc.base_url().cloned();

    for link in doc.get_elements_by_tag(article, &[Tag::A]) {
        let Some(href) = doc.attr(link, "href").map(str::to_string) else { continue };

        if href.trim_start().to_ascii_lowercase().starts_with("javascript:") {
            let children = doc.children(link).to_vec();
            if let [only] = children.as_slice()
                && doc.is_text(*only)
            {
                doc.replace(link, *only);
            } else {
                let span = doc.create_element("span");
                doc.move_children(link, span);
                doc.replace(link, span);
            }
            continue;
        }

        if let Some(base) = &base
            && !href.starts_with('#')
            && let Ok(absolute) = base.join(href.trim())
        {
            doc.set_attr(link, "href", absolute.as_str());
        }
    }

    let Some(base) = base else { return };
    let media = [Tag::Img, Tag::Picture, Tag::Figure, Tag::Video, Tag::Audio, Tag::Source, Tag::Track, Tag::Iframe, Tag::Embed];
    for node in doc.get_elements_by_tag(article, &media) {
        for name in ["src", "poster"] {
            if let Some(value) = doc.attr(node, name).map(str::to_string)
                && let Ok(absolute) = base.join(value.trim())
            {
                doc.set_attr(node, name, absolute.as_str());
            }
        }
        if let Some(srcset) = doc.attr(node, "srcset").map(str::to_string) {
            doc.set_attr(node, "srcset", &absolutize_srcset(&base, &srcset));
        }
    }
}

//! Arena-backed, mutable document tree.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]. The parent link
//! is a plain index, so the usual DOM back-reference costs nothing in terms of
//! ownership. Removing a node only unlinks it: the slot stays in the arena and
//! the id stays valid, which lets side tables (such as content scores) keep
//! using ids across mutations.
//!
//! Cloning a [`Document`] produces a fully independent copy, which is how the
//! extractor gets its disposable working tree.

use url::Url;

use crate::tags::Tag;

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element name, tag kind and ordered attributes.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub(crate) name: String,
    pub(crate) tag: Tag,
    pub(crate) attrs: Vec<(String, String)>,
}

impl ElementData {
    fn new(name: &str) -> Self {
        let tag = Tag::from_name(name);
        let name = tag.as_str().map(str::to_string).unwrap_or_else(|| name.to_string());
        Self { name, tag, attrs: Vec::new() }
    }
}

/// Payload of a tree node.
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// A node in the tree together with its links
#[derive(Debug, Clone)]
pub struct DomNode {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// A parsed, mutable HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<DomNode>,
    root: NodeId,
    base_url: Option<Url>,
}

impl Document {
    /// Create an empty document holding only the root node
    pub fn new() -> Self {
        let root = DomNode { data: NodeData::Document, parent: None, children: Vec::new() };
        Self { nodes: vec![root], root: NodeId(0), base_url: None }
    }

    fn add_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode { data, parent: None, children: Vec::new() });
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn set_base_url(&mut self, url: Option<Url>) {
        self.base_url = url;
    }

    /// Payload of a node
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    /// Tag kind of an element, `None` for text, comment and document nodes.
    pub fn tag(&self, id: NodeId) -> Option<Tag> {
        self.element(id).map(|el| el.tag)
    }

    /// Whether the node is an element of the given kind.
    pub fn is(&self, id: NodeId, tag: Tag) -> bool {
        self.tag(id) == Some(tag)
    }

    /// Lowercase element name
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    /// Rename an element in place. Children, attributes and the id are kept.
    pub fn set_tag(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            let renamed = ElementData::new(name);
            el.name = renamed.name;
            el.tag = renamed.tag;
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Attributes in source order
    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        self.element(id).map(|el| el.attrs.as_slice()).unwrap_or(&[])
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            match el.attrs.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
                Some((_, existing)) => *existing = value.to_string(),
                None => el.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        }
    }

    /// Keep only the attributes for which `keep` returns true.
    pub fn retain_attrs<F>(&mut self, id: NodeId, mut keep: F)
    where
        F: FnMut(&str, &str) -> bool,
    {
        if let Some(el) = self.element_mut(id) {
            el.attrs.retain(|(key, value)| keep(key, value));
        }
    }

    /// `class` attribute, or an empty string
    pub fn class_name(&self, id: NodeId) -> &str {
        self.attr(id, "class").unwrap_or("")
    }

    /// `id` attribute, or an empty string
    pub fn id_attr(&self, id: NodeId) -> &str {
        self.attr(id, "id").unwrap_or("")
    }

    /// Raw text of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) {
        if let NodeData::Text(text) = &mut self.nodes[id.0].data {
            *text = value.to_string();
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Parent when it is an element (not the document node)
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    /// All child nodes, including text and comments
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).iter().copied().filter(|c| self.is_element(*c)).collect()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).iter().copied().find(|c| self.is_element(*c))
    }

    fn position(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|c| *c == id)?;
        Some((parent, index))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.position(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.position(id)?;
        index.checked_sub(1).and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.position(id)?;
        self.children(parent)[index + 1..].iter().copied().find(|c| self.is_element(*c))
    }

    /// Descendants in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Descendant elements of any of the given kinds, in document order
    pub fn get_elements_by_tag(&self, scope: NodeId, tags: &[Tag]) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.tag(*n).is_some_and(|t| tags.contains(&t)))
            .collect()
    }

    /// Element ancestors, closest first. `max_depth == 0` means unlimited.
    pub fn ancestors(&self, id: NodeId, max_depth: usize) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent_element(id);
        while let Some(node) = current {
            out.push(node);
            if max_depth > 0 && out.len() == max_depth {
                break;
            }
            current = self.parent_element(node);
        }
        out
    }

    /// Whether an ancestor within `max_depth` levels has the given tag
    /// and satisfies `filter`. `max_depth == 0` means unlimited.
    pub fn has_ancestor_tag<F>(&self, id: NodeId, tag: Tag, max_depth: usize, filter: F) -> bool
    where
        F: Fn(NodeId) -> bool,
    {
        self.ancestors(id, max_depth)
            .into_iter()
            .any(|a| self.is(a, tag) && filter(a))
    }

    /// Whether `ancestor` contains `id` (strictly)
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub(crate) fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id.0]
    }

    /// Whether the node is still reachable from the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.contains(self.root, id)
    }

    /// Number of element nodes reachable from the root
    pub fn element_count(&self) -> usize {
        self.descendants(self.root).into_iter().filter(|n| self.is_element(*n)).count()
    }

    /// First element with the given tag in the whole document
    pub fn find_first(&self, tag: Tag) -> Option<NodeId> {
        self.descendants(self.root).into_iter().find(|n| self.is(*n, tag))
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.first_element_child(self.root)
    }

    pub fn head(&self) -> Option<NodeId> {
        self.find_first(Tag::Head)
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_first(Tag::Body)
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.add_node(NodeData::Element(ElementData::new(name)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.add_node(NodeData::Text(text.to_string()))
    }

    pub(crate) fn create_comment(&mut self, text: &str) -> NodeId {
        self.add_node(NodeData::Comment(text.to_string()))
    }

    /// Unlink a node from its parent. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some((parent, index)) = self.position(id) {
            self.nodes[parent.0].children.remove(index);
        }
        self.nodes[id.0].parent = None;
    }

    /// Remove a node (and its subtree) from the tree
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` right before `reference` under the reference's parent
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) {
        self.detach(child);
        if let Some((parent, index)) = self.position(reference) {
            self.nodes[child.0].parent = Some(parent);
            self.nodes[parent.0].children.insert(index, child);
        }
    }

    /// Put `replacement` where `old` is and detach `old`
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) {
        if old == replacement {
            return;
        }
        self.detach(replacement);
        if let Some((parent, index)) = self.position(old) {
            self.nodes[replacement.0].parent = Some(parent);
            self.nodes[parent.0].children[index] = replacement;
            self.nodes[old.0].parent = None;
        }
    }

    /// Deep-copy a subtree of `other` into this arena. The copy is detached.
    pub fn import(&mut self, other: &Document, id: NodeId) -> NodeId {
        let copy = self.add_node(other.data(id).clone());
        for child in other.children(id) {
            let child_copy = self.import(other, *child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Move every child of `from` to the end of `to`
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in children {
            self.nodes[child.0].parent = Some(to);
            self.nodes[to.0].children.push(child);
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Trimmed text content with whitespace runs collapsed to one space
    pub fn inner_text(&self, id: NodeId) -> String {
        self.text_content(id).split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Whether a node is whitespace-only text or a `<br>`
    pub fn is_whitespace(&self, id: NodeId) -> bool {
        match self.data(id) {
            NodeData::Text(text) => text.trim().is_empty(),
            NodeData::Element(el) => el.tag == Tag::Br,
            _ => false,
        }
    }

    /// Inline content: text, phrasing elements, and `A`/`DEL`/`INS`
    /// whose children are all phrasing content.
    pub fn is_phrasing_content(&self, id: NodeId) -> bool {
        match self.data(id) {
            NodeData::Text(_) => true,
            NodeData::Element(el) if el.tag.is_phrasing() => true,
            NodeData::Element(el) if matches!(el.tag, Tag::A | Tag::Del | Tag::Ins) => {
                self.children(id).iter().all(|c| self.is_phrasing_content(*c))
            }
            _ => false,
        }
    }

    /// Next element in a depth-first walk, optionally skipping the subtree of `id`
    pub fn next_node(&self, id: NodeId, skip_children: bool) -> Option<NodeId> {
        if !skip_children && let Some(child) = self.first_element_child(id) {
            return Some(child);
        }
        if let Some(sibling) = self.next_element_sibling(id) {
            return Some(sibling);
        }
        let mut current = self.parent(id);
        while let Some(node) = current {
            if let Some(sibling) = self.next_element_sibling(node) {
                return Some(sibling);
            }
            current = self.parent(node);
        }
        None
    }

    /// Remove `id` and return the node the walk continues from
    pub fn remove_and_get_next(&mut self, id: NodeId) -> Option<NodeId> {
        let next = self.next_node(id, true);
        self.remove(id);
        next
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let root = doc.root();
        doc.append_child(root, body);
        let div = doc.create_element("DIV");
        doc.append_child(body, div);
        let p = doc.create_element("p");
        doc.append_child(div, p);
        let text = doc.create_text("  Hello   world ");
        doc.append_child(p, text);
        (doc, body, div, p)
    }

    #[test]
    fn test_build_tree() {
        let (doc, body, div, p) = sample();
        assert_eq!(doc.parent(div), Some(body));
        assert_eq!(doc.element_children(div), vec![p]);
        assert!(doc.is(div, Tag::Div));
        assert_eq!(doc.tag_name(div), Some("div"));
        assert_eq!(doc.element_count(), 3);
    }

    #[test]
    fn test_text_helpers() {
        let (doc, _, div, _) = sample();
        assert_eq!(doc.text_content(div), "  Hello   world ");
        assert_eq!(doc.inner_text(div), "Hello world");
    }

    #[test]
    fn test_attributes() {
        let (mut doc, _, div, _) = sample();
        doc.set_attr(div, "class", "post");
        doc.set_attr(div, "CLASS", "entry");
        assert_eq!(doc.attr(div, "class"), Some("entry"));
        assert_eq!(doc.attrs(div).len(), 1);
        doc.remove_attr(div, "class");
        assert_eq!(doc.class_name(div), "");
    }

    #[test]
    fn test_remove_keeps_id_valid() {
        let (mut doc, body, div, p) = sample();
        doc.remove(div);
        assert!(doc.children(body).is_empty());
        assert!(!doc.is_attached(p));
        assert_eq!(doc.parent(p), Some(div));
        assert_eq!(doc.inner_text(p), "Hello world");
    }

    #[test]
    fn test_replace_and_insert() {
        let (mut doc, body, div, p) = sample();
        doc.replace(div, p);
        assert_eq!(doc.children(body), &[p]);
        let span = doc.create_element("span");
        doc.insert_before(p, span);
        assert_eq!(doc.children(body), &[span, p]);
        assert_eq!(doc.next_element_sibling(span), Some(p));
        assert_eq!(doc.previous_sibling(p), Some(span));
    }

    #[test]
    fn test_set_tag_keeps_children() {
        let (mut doc, _, div, p) = sample();
        doc.set_tag(div, "P");
        assert!(doc.is(div, Tag::P));
        assert_eq!(doc.children(div), &[p]);
    }

    #[test]
    fn test_next_node_walk() {
        let (mut doc, body, div, p) = sample();
        let aside = doc.create_element("aside");
        doc.append_child(body, aside);
        assert_eq!(doc.next_node(body, false), Some(div));
        assert_eq!(doc.next_node(div, false), Some(p));
        assert_eq!(doc.next_node(p, false), Some(aside));
        assert_eq!(doc.next_node(div, true), Some(aside));
        assert_eq!(doc.remove_and_get_next(div), Some(aside));
    }

    #[test]
    fn test_import_copies_subtree() {
        let (source, _, div, _) = sample();
        let mut target = Document::new();
        let copy = target.import(&source, div);

        assert!(target.parent(copy).is_none());
        assert!(target.is(copy, Tag::Div));
        assert_eq!(target.inner_text(copy), "Hello world");
        assert_eq!(source.element_count(), 3);
    }

    #[test]
    fn test_ancestors_depth() {
        let (doc, body, div, p) = sample();
        assert_eq!(doc.ancestors(p, 0), vec![div, body]);
        assert_eq!(doc.ancestors(p, 1), vec![div]);
        assert!(doc.has_ancestor_tag(p, Tag::Body, 0, |_| true));
        assert!(!doc.has_ancestor_tag(p, Tag::Body, 1, |_| true));
    }
}

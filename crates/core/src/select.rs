//! CSS selector matching directly on the arena.
//!
//! Selectors are parsed with scraper's selector grammar and matched by the
//! `selectors` engine through [`ArenaElement`], so queries see the tree exactly
//! as it is, detached or mutated subtrees included.

use std::fmt;

use cssparser::{Parser as CssParser, ParserInput};
use scraper::error::SelectorErrorKind;
use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, Parser as SelectorParser, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{
    self, ElementSelectorFlags, MatchingContext, MatchingForInvalidation, MatchingMode, NeedsSelectorFlags,
    QuirksMode, SelectorCaches,
};
use selectors::parser::ParseRelative;
use selectors::{Element, OpaqueElement, SelectorImpl, SelectorList};

use crate::dom_tree::{Document, NodeData, NodeId};
use crate::{ClearlyError, Result};

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A parsed selector group
pub(crate) struct CompiledSelector(SelectorList<Simple>);

impl CompiledSelector {
    pub(crate) fn parse(selector: &str) -> Result<Self> {
        let mut input = ParserInput::new(selector);
        let mut parser = CssParser::new(&mut input);
        SelectorList::parse(&SelectorParser, &mut parser, ParseRelative::No)
            .map(Self)
            .map_err(|e| ClearlyError::HtmlParseError(format!("Invalid selector: {}", SelectorErrorKind::from(e))))
    }

    /// Whether `element` matches, with `:scope` bound to `scope`
    pub(crate) fn matches(&self, element: &ArenaElement<'_>, scope: Option<&ArenaElement<'_>>, caches: &mut SelectorCaches) -> bool {
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            caches,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            MatchingForInvalidation::No,
        );
        context.scope_element = scope.map(Element::opaque);
        self.0.slice().iter().any(|s| matching::matches_selector(s, 0, None, element, &mut context))
    }
}

/// An element node seen through the `selectors` tree interface
#[derive(Clone, Copy)]
pub(crate) struct ArenaElement<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> ArenaElement<'a> {
    /// `None` unless `id` is an element
    pub(crate) fn wrap(doc: &'a Document, id: NodeId) -> Option<Self> {
        doc.is_element(id).then_some(Self { doc, id })
    }

    fn name(&self) -> &'a str {
        self.doc.tag_name(self.id).unwrap_or_default()
    }

    fn sibling_element(&self, step: fn(&Document, NodeId) -> Option<NodeId>) -> Option<Self> {
        let mut current = step(self.doc, self.id);
        while let Some(id) = current {
            if let Some(el) = Self::wrap(self.doc, id) {
                return Some(el);
            }
            current = step(self.doc, id);
        }
        None
    }
}

impl fmt::Debug for ArenaElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> #{}", self.name(), self.id.index())
    }
}

/// Never matches non-tree-structural pseudo-classes.
impl Element for ArenaElement<'_> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.doc.node(self.id))
    }

    fn parent_element(&self) -> Option<Self> {
        self.doc.parent(self.id).and_then(|p| Self::wrap(self.doc, p))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling_element(Document::previous_sibling)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling_element(Document::next_sibling)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc.first_element_child(self.id).and_then(|c| Self::wrap(self.doc, c))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &CssLocalName) -> bool {
        *local_name.0 == *self.name()
    }

    fn has_namespace(&self, ns: &<Simple as SelectorImpl>::BorrowedNamespaceUrl) -> bool {
        ns.is_empty() || **ns == *XHTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.name() == other.name()
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&<Simple as SelectorImpl>::NamespaceUrl>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        if matches!(ns, NamespaceConstraint::Specific(url) if !url.is_empty()) {
            return false;
        }
        self.doc
            .attrs(self.id)
            .iter()
            .any(|(name, value)| *local_name.0 == **name && operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(&self, _pe: &PseudoElement, _context: &mut MatchingContext<'_, Self::Impl>) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        self.name() == "link"
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.doc
            .attr(self.id, "id")
            .is_some_and(|value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.doc
            .class_name(self.id)
            .split_ascii_whitespace()
            .any(|class| case_sensitivity.eq(name.0.as_bytes(), class.as_bytes()))
    }

    fn has_custom_state(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
        None
    }

    fn is_part(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        !self.doc.children(self.id).iter().any(|&child| match self.doc.data(child) {
            NodeData::Element(_) => true,
            NodeData::Text(text) => !text.is_empty(),
            _ => false,
        })
    }

    fn is_root(&self) -> bool {
        self.doc.parent(self.id).is_some_and(|p| matches!(self.doc.data(p), NodeData::Document))
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}

//! Closed set of HTML tag kinds the engine reasons about.
//!
//! Every element carries a [`Tag`]. Names the heuristics never look at map to
//! [`Tag::Other`], and the element keeps its original name for serialization.
//! Membership tests such as "is this phrasing content" are `matches!` tables
//! over the enum rather than string comparisons.

macro_rules! tags {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Tag kind of an element.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Tag {
            $($variant,)+
            /// Any element name outside the known set.
            Other,
        }

        impl Tag {
            /// Maps a (case-insensitive) element name to its tag kind.
            pub fn from_name(name: &str) -> Tag {
                let lower = name.to_ascii_lowercase();
                match lower.as_str() {
                    $($name => Tag::$variant,)+
                    _ => Tag::Other,
                }
            }

            /// Lowercase element name, `None` for [`Tag::Other`].
            pub fn as_str(self) -> Option<&'static str> {
                match self {
                    $(Tag::$variant => Some($name),)+
                    Tag::Other => None,
                }
            }
        }
    };
}

tags! {
    A => "a",
    Abbr => "abbr",
    Address => "address",
    Article => "article",
    Aside => "aside",
    Audio => "audio",
    B => "b",
    Bdo => "bdo",
    Blockquote => "blockquote",
    Body => "body",
    Br => "br",
    Button => "button",
    Canvas => "canvas",
    Caption => "caption",
    Cite => "cite",
    Code => "code",
    Col => "col",
    Colgroup => "colgroup",
    Data => "data",
    Datalist => "datalist",
    Dd => "dd",
    Del => "del",
    Dfn => "dfn",
    Div => "div",
    Dl => "dl",
    Dt => "dt",
    Em => "em",
    Embed => "embed",
    Fieldset => "fieldset",
    Figcaption => "figcaption",
    Figure => "figure",
    Font => "font",
    Footer => "footer",
    Form => "form",
    H1 => "h1",
    H2 => "h2",
    H3 => "h3",
    H4 => "h4",
    H5 => "h5",
    H6 => "h6",
    Head => "head",
    Header => "header",
    Hr => "hr",
    Html => "html",
    I => "i",
    Iframe => "iframe",
    Image => "image",
    Img => "img",
    Input => "input",
    Ins => "ins",
    Kbd => "kbd",
    Label => "label",
    Li => "li",
    Link => "link",
    Main => "main",
    Mark => "mark",
    Math => "math",
    Meta => "meta",
    Meter => "meter",
    Nav => "nav",
    Noscript => "noscript",
    Object => "object",
    Ol => "ol",
    Output => "output",
    P => "p",
    Param => "param",
    Picture => "picture",
    Pre => "pre",
    Progress => "progress",
    Q => "q",
    Ruby => "ruby",
    Samp => "samp",
    Script => "script",
    Section => "section",
    Select => "select",
    Small => "small",
    Source => "source",
    Span => "span",
    Strong => "strong",
    Style => "style",
    Sub => "sub",
    Sup => "sup",
    Svg => "svg",
    Table => "table",
    Tbody => "tbody",
    Td => "td",
    Template => "template",
    Textarea => "textarea",
    Tfoot => "tfoot",
    Th => "th",
    Thead => "thead",
    Time => "time",
    Title => "title",
    Tr => "tr",
    Track => "track",
    Ul => "ul",
    Var => "var",
    Video => "video",
    Wbr => "wbr",
}

impl Tag {
    /// Inline content that may be wrapped into a paragraph.
    ///
    /// `A`, `DEL` and `INS` are phrasing only when all of their children are,
    /// see [`Document::is_phrasing_content`](crate::Document::is_phrasing_content).
    pub fn is_phrasing(self) -> bool {
        matches!(
            self,
            Tag::Abbr
                | Tag::Audio
                | Tag::B
                | Tag::Bdo
                | Tag::Br
                | Tag::Button
                | Tag::Cite
                | Tag::Code
                | Tag::Data
                | Tag::Datalist
                | Tag::Dfn
                | Tag::Em
                | Tag::Embed
                | Tag::I
                | Tag::Img
                | Tag::Input
                | Tag::Kbd
                | Tag::Label
                | Tag::Mark
                | Tag::Math
                | Tag::Meter
                | Tag::Noscript
                | Tag::Object
                | Tag::Output
                | Tag::Progress
                | Tag::Q
                | Tag::Ruby
                | Tag::Samp
                | Tag::Script
                | Tag::Select
                | Tag::Small
                | Tag::Span
                | Tag::Strong
                | Tag::Sub
                | Tag::Sup
                | Tag::Textarea
                | Tag::Time
                | Tag::Var
                | Tag::Wbr
        )
    }

    /// Block-level children that keep a `DIV` from being turned into a `P`.
    pub fn is_div_to_p_block(self) -> bool {
        matches!(
            self,
            Tag::Blockquote | Tag::Dl | Tag::Div | Tag::Img | Tag::Ol | Tag::P | Tag::Pre | Tag::Table | Tag::Ul
        )
    }

    /// Tags kept as-is when absorbed as siblings of the top candidate.
    pub fn keeps_tag_when_absorbed(self) -> bool {
        matches!(self, Tag::Div | Tag::Article | Tag::Section | Tag::P | Tag::Ol | Tag::Ul)
    }

    /// Default set of elements whose text is scored.
    pub fn is_scored_by_default(self) -> bool {
        matches!(
            self,
            Tag::Section | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6 | Tag::P | Tag::Td | Tag::Pre
        )
    }

    /// Elements pruned when they hold no content.
    pub fn is_prunable_when_empty(self) -> bool {
        matches!(
            self,
            Tag::Div | Tag::Section | Tag::Header | Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6
        )
    }

    pub fn is_heading(self) -> bool {
        self.heading_level().is_some()
    }

    /// Depth of a heading element, 1 through 6.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            Tag::H1 => Some(1),
            Tag::H2 => Some(2),
            Tag::H3 => Some(3),
            Tag::H4 => Some(4),
            Tag::H5 => Some(5),
            Tag::H6 => Some(6),
            _ => None,
        }
    }

    /// Void elements never have children or a closing tag.
    pub fn is_void(self) -> bool {
        matches!(
            self,
            Tag::Br
                | Tag::Col
                | Tag::Embed
                | Tag::Hr
                | Tag::Img
                | Tag::Input
                | Tag::Link
                | Tag::Meta
                | Tag::Param
                | Tag::Source
                | Tag::Track
                | Tag::Wbr
        )
    }

    /// Elements whose text content is serialized without escaping.
    pub fn is_raw_text(self) -> bool {
        matches!(self, Tag::Script | Tag::Style | Tag::Noscript)
    }

    /// Elements that count as content even without any text.
    pub fn is_media(self) -> bool {
        matches!(
            self,
            Tag::Img
                | Tag::Picture
                | Tag::Svg
                | Tag::Video
                | Tag::Audio
                | Tag::Iframe
                | Tag::Embed
                | Tag::Object
                | Tag::Canvas
                | Tag::Math
        )
    }

    /// Table-structure elements, used when measuring rows and columns.
    pub fn is_table_cell(self) -> bool {
        matches!(self, Tag::Td | Tag::Th)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("div", Tag::Div)]
    #[case("DIV", Tag::Div)]
    #[case("H3", Tag::H3)]
    #[case("custom-element", Tag::Other)]
    fn test_from_name(#[case] name: &str, #[case] expected: Tag) {
        assert_eq!(Tag::from_name(name), expected);
    }

    #[test]
    fn test_as_str_round_trip() {
        assert_eq!(Tag::Blockquote.as_str(), Some("blockquote"));
        assert_eq!(Tag::Other.as_str(), None);
    }

    #[test]
    fn test_sets() {
        assert!(Tag::Span.is_phrasing());
        assert!(!Tag::A.is_phrasing());
        assert!(Tag::Table.is_div_to_p_block());
        assert!(Tag::Td.is_scored_by_default());
        assert!(!Tag::Div.is_scored_by_default());
        assert_eq!(Tag::H4.heading_level(), Some(4));
        assert!(Tag::Br.is_void());
    }
}

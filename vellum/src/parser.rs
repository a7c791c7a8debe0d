//! Surface snapshot parser
//!
//! Converts surface snapshot nodes into document model sections. One
//! top-level surface node becomes one section; inline children become
//! markers via a formatting stack that toggles as the walk enters and
//! leaves format elements.
//!
//! Parsing is total over surface shapes: anything the parser does not
//! recognize degrades to a plain paragraph holding the flattened text of
//! the subtree. Losing formatting is acceptable; losing content is not.
//! The one exception is an atomic section with an unknown schema, which is
//! routed through the card registry's fallback and is an error if the
//! fallback declines.

use crate::cards::{CardError, CardRegistry};
use crate::post::{Format, ListStyle, Marker, MarkupTag, Post, Section};
use crate::surface::{SurfaceKind, SurfaceNode};

/// Attribute naming the card schema of an atomic surface element
pub const CARD_ATTR: &str = "data-card";

/// Attribute carrying a card element's JSON payload
pub const CARD_PAYLOAD_ATTR: &str = "data-card-payload";

/// Parser from surface snapshots to model sections
pub struct SurfaceParser<'a> {
    cards: &'a CardRegistry,
}

impl<'a> SurfaceParser<'a> {
    /// Create a parser resolving atomic sections against `cards`
    pub fn new(cards: &'a CardRegistry) -> Self {
        Self { cards }
    }

    /// Parse an entire surface snapshot into a fresh post
    ///
    /// Applies [`parse_section`](Self::parse_section) to each top-level
    /// child in order, threading the previously produced section into the
    /// continuation heuristic. Top-level `ul`/`ol` containers are flattened
    /// into consecutive list-item sections.
    pub fn parse(&self, root: &SurfaceNode) -> Result<Post, CardError> {
        let mut sections: Vec<Section> = Vec::new();

        for child in root.children() {
            // Whitespace-only text between blocks is layout noise
            if let SurfaceKind::Text(text) = &child.kind {
                if text.trim().is_empty() {
                    continue;
                }
            }

            match child.tag() {
                Some("ul") => self.parse_list_container(ListStyle::Unordered, child, &mut sections),
                Some("ol") => self.parse_list_container(ListStyle::Ordered, child, &mut sections),
                _ => {
                    let section = self.parse_section(sections.last(), child)?;
                    sections.push(section);
                }
            }
        }

        Ok(Post::from_sections(sections))
    }

    /// Interpret a single surface node as one section
    ///
    /// # Parameters
    /// * `previous` - The section preceding this one in the walk, consulted
    ///   only by the continuation heuristic (e.g. whether a line break
    ///   merges into the prior block)
    /// * `node` - The surface node to interpret
    ///
    /// # Returns
    /// * `Ok(Section)` - Always, except for an unknown card schema whose
    ///   fallback declined
    pub fn parse_section(
        &self,
        previous: Option<&Section>,
        node: &SurfaceNode,
    ) -> Result<Section, CardError> {
        let tag = match node.tag() {
            Some(tag) => tag,
            // A bare text node at the top level is a paragraph
            None => return Ok(Section::paragraph_with_text(node.flattened_text())),
        };

        if let Some(card_name) = node.attr(CARD_ATTR) {
            return self.parse_card(card_name, node);
        }

        match tag {
            "img" => Ok(Section::Image {
                src: node.attr("src").unwrap_or_default().to_string(),
                alt: node.attr("alt").map(str::to_string),
            }),

            // Editable surfaces produce `div` (and sometimes `section`) for
            // freshly broken lines; those continue the previous block's tag
            // rather than resetting to a paragraph.
            "div" | "section" | "br" => {
                let tag = previous
                    .and_then(Section::markup_tag)
                    .unwrap_or(MarkupTag::Paragraph);
                Ok(Section::Markup {
                    tag,
                    markers: self.parse_inline(node.children()),
                })
            }

            "li" => {
                // A stray list item outside its container keeps the style
                // of a preceding list-item section, if any
                let style = match previous.and_then(Section::markup_tag) {
                    Some(MarkupTag::ListItem(style)) => style,
                    _ => ListStyle::Unordered,
                };
                Ok(Section::Markup {
                    tag: MarkupTag::ListItem(style),
                    markers: self.parse_inline(node.children()),
                })
            }

            _ => match MarkupTag::from_surface_tag(tag) {
                Some(markup_tag) => Ok(Section::Markup {
                    tag: markup_tag,
                    markers: self.parse_inline(node.children()),
                }),
                None => {
                    log::warn!("unsupported surface element <{tag}>, degrading to paragraph");
                    Ok(Section::paragraph_with_text(node.flattened_text()))
                }
            },
        }
    }

    /// Parse a list item of known style into a list-item section
    ///
    /// Used when the caller can see the surrounding `ul`/`ol` container,
    /// which [`parse_section`](Self::parse_section) cannot.
    pub fn parse_list_item(&self, style: ListStyle, node: &SurfaceNode) -> Section {
        Section::Markup {
            tag: MarkupTag::ListItem(style),
            markers: self.parse_inline(node.children()),
        }
    }

    /// Flatten a `ul`/`ol` container into consecutive list-item sections
    fn parse_list_container(
        &self,
        style: ListStyle,
        container: &SurfaceNode,
        sections: &mut Vec<Section>,
    ) {
        for item in container.children() {
            if item.tag() == Some("li") {
                sections.push(self.parse_list_item(style, item));
            } else if !item.flattened_text().trim().is_empty() {
                log::warn!("non-item child inside a list container, skipping");
            }
        }
    }

    /// Parse a card element against the registry
    fn parse_card(&self, name: &str, node: &SurfaceNode) -> Result<Section, CardError> {
        let payload = match node.attr(CARD_PAYLOAD_ATTR) {
            Some(raw) => match serde_json::from_str(raw) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("card '{name}' carries unparseable payload ({e}), degrading");
                    return Ok(Section::paragraph_with_text(node.flattened_text()));
                }
            },
            None => serde_json::Value::Null,
        };
        self.cards.resolve(name, &payload)
    }

    /// Walk inline children, emitting markers under the active format stack
    fn parse_inline(&self, nodes: &[SurfaceNode]) -> Vec<Marker> {
        let mut stack: Vec<Format> = Vec::new();
        let mut markers = Vec::new();
        self.collect_markers(nodes, &mut stack, &mut markers);
        markers
    }

    fn collect_markers(
        &self,
        nodes: &[SurfaceNode],
        stack: &mut Vec<Format>,
        markers: &mut Vec<Marker>,
    ) {
        for node in nodes {
            match &node.kind {
                SurfaceKind::Text(text) => {
                    if !text.is_empty() {
                        markers.push(Marker::with_formats(text.clone(), active_formats(stack)));
                    }
                }
                SurfaceKind::Element { tag, children, .. } => {
                    if tag == "br" {
                        markers.push(Marker::with_formats("\n", active_formats(stack)));
                        continue;
                    }
                    match inline_format(node) {
                        Some(format) => {
                            stack.push(format);
                            self.collect_markers(children, stack, markers);
                            stack.pop();
                        }
                        // Unknown inline wrappers are transparent; their
                        // text survives, their markup does not
                        None => self.collect_markers(children, stack, markers),
                    }
                }
            }
        }
    }
}

/// The format an inline element applies, if it is a recognized format tag
fn inline_format(node: &SurfaceNode) -> Option<Format> {
    match node.tag()? {
        "b" | "strong" => Some(Format::Bold),
        "i" | "em" => Some(Format::Italic),
        "u" => Some(Format::Underline),
        "s" | "del" | "strike" => Some(Format::Strikethrough),
        "code" => Some(Format::Code),
        "sub" => Some(Format::Subscript),
        "sup" => Some(Format::Superscript),
        "a" => Some(Format::Link {
            href: node.attr("href").unwrap_or_default().to_string(),
        }),
        _ => None,
    }
}

/// The current stack as a duplicate-free format set, outermost first
fn active_formats(stack: &[Format]) -> Vec<Format> {
    let mut formats: Vec<Format> = Vec::with_capacity(stack.len());
    for format in stack {
        if !formats.contains(format) {
            formats.push(format.clone());
        }
    }
    formats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceId;
    use serde_json::json;

    fn parser_fixture(cards: &CardRegistry) -> SurfaceParser<'_> {
        SurfaceParser::new(cards)
    }

    fn sid(n: u64) -> SurfaceId {
        SurfaceId(n)
    }

    #[test]
    fn test_parse_simple_paragraph() {
        // Arrange: <div contenteditable><p>Hello</p></div>
        let cards = CardRegistry::new();
        let root = SurfaceNode::element(sid(0), "div").with_child(
            SurfaceNode::element(sid(1), "p").with_child(SurfaceNode::text(sid(2), "Hello")),
        );

        // Act
        let post = parser_fixture(&cards).parse(&root).unwrap();

        // Assert: one paragraph with one plain marker
        assert_eq!(post.len(), 1);
        let (_, section) = post.section_at(0).unwrap();
        assert_eq!(
            section,
            &Section::Markup {
                tag: MarkupTag::Paragraph,
                markers: vec![Marker::new("Hello")],
            }
        );
    }

    #[test]
    fn test_parse_nested_inline_formats() {
        // Arrange: <p>Hello <b>bold <i>both</i></b></p>
        let cards = CardRegistry::new();
        let root = SurfaceNode::element(sid(0), "div").with_child(
            SurfaceNode::element(sid(1), "p")
                .with_child(SurfaceNode::text(sid(2), "Hello "))
                .with_child(
                    SurfaceNode::element(sid(3), "b")
                        .with_child(SurfaceNode::text(sid(4), "bold "))
                        .with_child(
                            SurfaceNode::element(sid(5), "i")
                                .with_child(SurfaceNode::text(sid(6), "both")),
                        ),
                ),
        );

        // Act
        let post = parser_fixture(&cards).parse(&root).unwrap();

        // Assert: three markers with accumulating formats
        let markers = post.section_at(0).unwrap().1.markers().unwrap();
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0], Marker::new("Hello "));
        assert_eq!(markers[1], Marker::with_formats("bold ", vec![Format::Bold]));
        assert_eq!(
            markers[2],
            Marker::with_formats("both", vec![Format::Bold, Format::Italic])
        );
    }

    #[test]
    fn test_parse_link_keeps_href() {
        // Arrange: <p><a href="https://rust-lang.org">Rust</a></p>
        let cards = CardRegistry::new();
        let root = SurfaceNode::element(sid(0), "div").with_child(
            SurfaceNode::element(sid(1), "p").with_child(
                SurfaceNode::element(sid(2), "a")
                    .with_attr("href", "https://rust-lang.org")
                    .with_child(SurfaceNode::text(sid(3), "Rust")),
            ),
        );

        // Act
        let post = parser_fixture(&cards).parse(&root).unwrap();

        // Assert
        let markers = post.section_at(0).unwrap().1.markers().unwrap();
        assert_eq!(
            markers[0].formats,
            vec![Format::Link {
                href: "https://rust-lang.org".to_string()
            }]
        );
    }

    #[test]
    fn test_unknown_element_degrades_to_flattened_paragraph() {
        // Arrange: a construct the parser has no model for
        let cards = CardRegistry::new();
        let root = SurfaceNode::element(sid(0), "div").with_child(
            SurfaceNode::element(sid(1), "table").with_child(
                SurfaceNode::element(sid(2), "tr")
                    .with_child(
                        SurfaceNode::element(sid(3), "td")
                            .with_child(SurfaceNode::text(sid(4), "cell one ")),
                    )
                    .with_child(
                        SurfaceNode::element(sid(5), "td")
                            .with_child(SurfaceNode::text(sid(6), "cell two")),
                    ),
            ),
        );

        // Act
        let post = parser_fixture(&cards).parse(&root).unwrap();

        // Assert: exactly one plain paragraph, content preserved
        assert_eq!(post.len(), 1);
        assert_eq!(
            post.section_at(0).unwrap().1,
            &Section::paragraph_with_text("cell one cell two")
        );
    }

    #[test]
    fn test_continuation_div_inherits_previous_tag() {
        // Arrange: a heading followed by the div an editable surface
        // creates when Enter is pressed inside it
        let cards = CardRegistry::new();
        let root = SurfaceNode::element(sid(0), "div")
            .with_child(
                SurfaceNode::element(sid(1), "h2").with_child(SurfaceNode::text(sid(2), "Title")),
            )
            .with_child(
                SurfaceNode::element(sid(3), "div").with_child(SurfaceNode::text(sid(4), "more")),
            );

        // Act
        let post = parser_fixture(&cards).parse(&root).unwrap();

        // Assert: the continuation keeps the heading tag
        assert_eq!(
            post.section_at(1).unwrap().1.markup_tag(),
            Some(MarkupTag::Heading(2))
        );
    }

    #[test]
    fn test_list_containers_flatten_into_item_sections() {
        // Arrange: <ol><li>one</li><li>two</li></ol>
        let cards = CardRegistry::new();
        let root = SurfaceNode::element(sid(0), "div").with_child(
            SurfaceNode::element(sid(1), "ol")
                .with_child(
                    SurfaceNode::element(sid(2), "li").with_child(SurfaceNode::text(sid(3), "one")),
                )
                .with_child(
                    SurfaceNode::element(sid(4), "li").with_child(SurfaceNode::text(sid(5), "two")),
                ),
        );

        // Act
        let post = parser_fixture(&cards).parse(&root).unwrap();

        // Assert: two ordered list-item sections
        assert_eq!(post.len(), 2);
        for index in 0..2 {
            assert_eq!(
                post.section_at(index).unwrap().1.markup_tag(),
                Some(MarkupTag::ListItem(ListStyle::Ordered))
            );
        }
    }

    #[test]
    fn test_image_element_parses_to_image_section() {
        // Arrange: <img src="cat.png" alt="a cat">
        let cards = CardRegistry::new();
        let root = SurfaceNode::element(sid(0), "div").with_child(
            SurfaceNode::element(sid(1), "img")
                .with_attr("src", "cat.png")
                .with_attr("alt", "a cat"),
        );

        // Act
        let post = parser_fixture(&cards).parse(&root).unwrap();

        // Assert
        assert_eq!(
            post.section_at(0).unwrap().1,
            &Section::Image {
                src: "cat.png".to_string(),
                alt: Some("a cat".to_string()),
            }
        );
    }

    #[test]
    fn test_registered_card_element_parses_to_card_section() {
        // Arrange: a card element with a JSON payload attribute
        let mut cards = CardRegistry::new();
        cards.register("embed");
        let root = SurfaceNode::element(sid(0), "div").with_child(
            SurfaceNode::element(sid(1), "div")
                .with_attr(CARD_ATTR, "embed")
                .with_attr(CARD_PAYLOAD_ATTR, r#"{"url":"https://example.com"}"#),
        );

        // Act
        let post = SurfaceParser::new(&cards).parse(&root).unwrap();

        // Assert
        assert_eq!(
            post.section_at(0).unwrap().1,
            &Section::Card {
                name: "embed".to_string(),
                payload: json!({"url": "https://example.com"}),
            }
        );
    }

    #[test]
    fn test_unknown_card_is_an_error_under_the_default_fallback() {
        // Arrange: an unregistered card schema
        let cards = CardRegistry::new();
        let root = SurfaceNode::element(sid(0), "div")
            .with_child(SurfaceNode::element(sid(1), "div").with_attr(CARD_ATTR, "mystery"));

        // Act
        let result = SurfaceParser::new(&cards).parse(&root);

        // Assert: routed to the fallback, which declines by default
        assert_eq!(
            result.unwrap_err(),
            CardError::UnknownCard {
                name: "mystery".to_string()
            }
        );
    }

    #[test]
    fn test_empty_surface_parses_to_the_empty_document() {
        // Arrange: an editable root with no children
        let cards = CardRegistry::new();
        let root = SurfaceNode::element(sid(0), "div");

        // Act
        let post = parser_fixture(&cards).parse(&root).unwrap();

        // Assert: one empty paragraph, never zero sections
        assert_eq!(post.len(), 1);
        assert_eq!(post.section_at(0).unwrap().1, &Section::paragraph());
    }

    #[test]
    fn test_line_break_becomes_a_newline_marker() {
        // Arrange: <p>one<br>two</p>
        let cards = CardRegistry::new();
        let root = SurfaceNode::element(sid(0), "div").with_child(
            SurfaceNode::element(sid(1), "p")
                .with_child(SurfaceNode::text(sid(2), "one"))
                .with_child(SurfaceNode::element(sid(3), "br"))
                .with_child(SurfaceNode::text(sid(4), "two")),
        );

        // Act
        let post = parser_fixture(&cards).parse(&root).unwrap();

        // Assert
        let markers = post.section_at(0).unwrap().1.markers().unwrap();
        assert_eq!(markers[1].text, "\n");
        assert_eq!(post.section_at(0).unwrap().1.plain_text(), "one\ntwo");
    }
}

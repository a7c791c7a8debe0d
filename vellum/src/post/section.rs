//! Block-level document sections
//!
//! This module defines the structured representation of document content at
//! the block level: markup sections carrying inline markers, and atomic
//! sections (images, cards) carrying opaque payloads. The variant set is
//! closed on purpose; every consumer (parser, codec, renderer) matches
//! exhaustively, so a new section kind is a compile-enforced change to
//! each of them.

use super::marker::Marker;

/// List style for list-item sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Unordered,
    Ordered,
}

/// Tag discriminant for markup (text-bearing) sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupTag {
    /// A plain paragraph
    Paragraph,
    /// A heading; level is clamped to 1..=6 at construction sites
    Heading(u8),
    /// A block quote
    Blockquote,
    /// A single list item
    ListItem(ListStyle),
}

impl MarkupTag {
    /// The surface tag name this section materializes as
    pub fn surface_tag(&self) -> &'static str {
        match self {
            MarkupTag::Paragraph => "p",
            MarkupTag::Heading(1) => "h1",
            MarkupTag::Heading(2) => "h2",
            MarkupTag::Heading(3) => "h3",
            MarkupTag::Heading(4) => "h4",
            MarkupTag::Heading(5) => "h5",
            MarkupTag::Heading(_) => "h6",
            MarkupTag::Blockquote => "blockquote",
            MarkupTag::ListItem(_) => "li",
        }
    }

    /// Look up a markup tag by surface tag name
    pub fn from_surface_tag(tag: &str) -> Option<MarkupTag> {
        match tag {
            "p" => Some(MarkupTag::Paragraph),
            "h1" => Some(MarkupTag::Heading(1)),
            "h2" => Some(MarkupTag::Heading(2)),
            "h3" => Some(MarkupTag::Heading(3)),
            "h4" => Some(MarkupTag::Heading(4)),
            "h5" => Some(MarkupTag::Heading(5)),
            "h6" => Some(MarkupTag::Heading(6)),
            "blockquote" => Some(MarkupTag::Blockquote),
            "li" => Some(MarkupTag::ListItem(ListStyle::Unordered)),
            _ => None,
        }
    }
}

/// Block-level document unit
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// A text-bearing section: ordered markers under a markup tag
    Markup {
        /// Block tag (paragraph, heading, quote, list item)
        tag: MarkupTag,
        /// Ordered inline runs
        markers: Vec<Marker>,
    },

    /// An embedded image
    Image {
        /// Image source URL
        src: String,
        /// Alternative text, if any
        alt: Option<String>,
    },

    /// An atomic embed with a named schema and an opaque payload
    Card {
        /// Schema name, resolved against the session's card registry
        name: String,
        /// Payload data; the model does not interpret it
        payload: serde_json::Value,
    },
}

impl Section {
    /// Create an empty paragraph section
    pub fn paragraph() -> Self {
        Section::Markup {
            tag: MarkupTag::Paragraph,
            markers: Vec::new(),
        }
    }

    /// Create a paragraph holding a single plain-text marker
    pub fn paragraph_with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let markers = if text.is_empty() {
            Vec::new()
        } else {
            vec![Marker::new(text)]
        };
        Section::Markup {
            tag: MarkupTag::Paragraph,
            markers,
        }
    }

    /// The markers of a markup section, or `None` for atomic sections
    pub fn markers(&self) -> Option<&[Marker]> {
        match self {
            Section::Markup { markers, .. } => Some(markers),
            Section::Image { .. } | Section::Card { .. } => None,
        }
    }

    /// The markup tag of a text-bearing section
    pub fn markup_tag(&self) -> Option<MarkupTag> {
        match self {
            Section::Markup { tag, .. } => Some(*tag),
            Section::Image { .. } | Section::Card { .. } => None,
        }
    }

    /// Whether this is an atomic (non-text-bearing) section
    pub fn is_atomic(&self) -> bool {
        matches!(self, Section::Image { .. } | Section::Card { .. })
    }

    /// Plain text content of this section
    ///
    /// Markup sections concatenate their marker text; an image yields its
    /// alt text; a card yields nothing.
    pub fn plain_text(&self) -> String {
        match self {
            Section::Markup { markers, .. } => {
                markers.iter().map(|m| m.text.as_str()).collect()
            }
            Section::Image { alt, .. } => alt.clone().unwrap_or_default(),
            Section::Card { .. } => String::new(),
        }
    }
}

//! Inline marker representation with formatting
//!
//! A marker is a run of text with a set of format tags applied.
//! This is the fundamental inline unit of a markup section.

/// Inline format tags that can be applied to a marker
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Format {
    /// Bold formatting
    Bold,
    /// Italic formatting
    Italic,
    /// Underline formatting
    Underline,
    /// Strikethrough formatting
    Strikethrough,
    /// Inline code formatting
    Code,
    /// Subscript formatting
    Subscript,
    /// Superscript formatting
    Superscript,
    /// Hyperlink with target URL
    Link {
        /// Link destination
        href: String,
    },
}

impl Format {
    /// The canonical tag name for this format, as used by the surface
    /// markup and by the interchange format's markup table
    pub fn name(&self) -> &'static str {
        match self {
            Format::Bold => "b",
            Format::Italic => "i",
            Format::Underline => "u",
            Format::Strikethrough => "s",
            Format::Code => "code",
            Format::Subscript => "sub",
            Format::Superscript => "sup",
            Format::Link { .. } => "a",
        }
    }

    /// Look up an attribute-less format by tag name
    ///
    /// Returns `None` for unrecognized names and for `"a"`, which requires
    /// an `href` and is constructed explicitly.
    pub fn from_name(name: &str) -> Option<Format> {
        match name {
            "b" => Some(Format::Bold),
            "i" => Some(Format::Italic),
            "u" => Some(Format::Underline),
            "s" => Some(Format::Strikethrough),
            "code" => Some(Format::Code),
            "sub" => Some(Format::Subscript),
            "sup" => Some(Format::Superscript),
            _ => None,
        }
    }
}

/// A run of text with a set of formats applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// The text content
    pub text: String,

    /// Formats applied to the whole run, in application order
    pub formats: Vec<Format>,
}

impl Marker {
    /// Create a new plain text marker
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            formats: Vec::new(),
        }
    }

    /// Create a new marker with the given formats
    pub fn with_formats(text: impl Into<String>, formats: Vec<Format>) -> Self {
        Self {
            text: text.into(),
            formats,
        }
    }

    /// Check if this marker has any formatting applied
    pub fn has_formats(&self) -> bool {
        !self.formats.is_empty()
    }

    /// Whether `other` carries exactly the same format set
    ///
    /// Order-insensitive: `[Bold, Italic]` and `[Italic, Bold]` compare
    /// equal. Adjacent markers for which this holds are candidates for
    /// merging when the document is encoded.
    pub fn same_formats(&self, other: &Marker) -> bool {
        if self.formats.len() != other.formats.len() {
            return false;
        }
        let mut a = self.formats.clone();
        let mut b = other.formats.clone();
        a.sort();
        b.sort();
        a == b
    }
}

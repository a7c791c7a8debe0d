//! Interchange codec
//!
//! Bidirectional mapping between the document model and a versioned,
//! compact serialized representation. The serialized form is
//! self-describing: it enumerates, once per document, the distinct marker
//! formats and atomic-section schemas in use, then encodes every section
//! by index into those tables — the size of a document with many markers
//! is bounded by its content, not by repeated type names.
//!
//! Decoding is all-or-nothing: on any failure no partially-built post is
//! returned.

use crate::cards::{CardError, CardRegistry};
use crate::post::{Format, ListStyle, Marker, MarkupTag, Post, Section};
use indexmap::IndexSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Current interchange format version
pub const FORMAT_VERSION: u32 = 1;

/// Discriminant for text-bearing serialized sections
const SECTION_KIND_MARKUP: u8 = 1;

/// Discriminant for atomic serialized sections
const SECTION_KIND_ATOMIC: u8 = 2;

/// Built-in atomic schema name for image sections
const IMAGE_SCHEMA: &str = "image";

/// Errors that can occur while decoding a serialized document
#[derive(Error, Debug)]
pub enum InterchangeError {
    /// The document declares a version this codec does not speak
    #[error("unsupported interchange version {found} (this codec speaks {FORMAT_VERSION})")]
    UnsupportedVersion {
        /// The declared version
        found: u32,
    },

    /// The payload is structurally broken (dangling index, bad tag,
    /// missing required field)
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// An atomic section's schema could not be resolved
    #[error(transparent)]
    Card(#[from] CardError),

    /// The JSON text could not be parsed at all
    #[error("invalid interchange JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A marker-format descriptor in the document's markup table
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum MarkupDescriptor {
    /// An attribute-less format, by tag name (`"b"`, `"i"`, ...)
    Plain(String),
    /// A format with attributes, e.g. `["a", [["href", "..."]]]`
    Attributed(String, Vec<(String, String)>),
}

/// One encoded marker: format indices into the markup table, then text
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SerializedMarker(pub Vec<usize>, pub String);

/// One encoded section
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum SerializedSection {
    /// `[kind, wire tag, markers]`
    Markup(u8, String, Vec<SerializedMarker>),
    /// `[kind, schema index, payload]`
    Atomic(u8, usize, Value),
}

/// The serialized document
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SerializedDoc {
    /// Format version; decoders reject versions they do not speak
    pub version: u32,
    /// Distinct marker formats used anywhere in the document
    pub markups: Vec<MarkupDescriptor>,
    /// Distinct atomic-section schema names used anywhere in the document
    pub card_types: Vec<String>,
    /// Sections in document order
    pub sections: Vec<SerializedSection>,
}

impl SerializedDoc {
    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a JSON string
    ///
    /// This only checks JSON well-formedness and the outer shape;
    /// structural validity is checked by [`decode`].
    pub fn from_json(json: &str) -> Result<Self, InterchangeError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Encode a post into its serialized representation
///
/// Adjacent markers with identical format sets are merged on the way out;
/// the model tolerates them, the wire format does not repeat them.
pub fn encode(post: &Post) -> SerializedDoc {
    let mut markups: IndexSet<MarkupDescriptor> = IndexSet::new();
    let mut card_types: IndexSet<String> = IndexSet::new();
    let mut sections = Vec::with_capacity(post.len());

    for (_, section) in post.iter() {
        match section {
            Section::Markup { tag, markers } => {
                let merged = markers
                    .iter()
                    .cloned()
                    .coalesce(|a, b| {
                        if a.same_formats(&b) {
                            let text = a.text + &b.text;
                            Ok(Marker {
                                text,
                                formats: a.formats,
                            })
                        } else {
                            Err((a, b))
                        }
                    })
                    .map(|marker| {
                        let indices = marker
                            .formats
                            .iter()
                            .map(|format| markups.insert_full(describe_format(format)).0)
                            .collect();
                        SerializedMarker(indices, marker.text)
                    })
                    .collect();
                sections.push(SerializedSection::Markup(
                    SECTION_KIND_MARKUP,
                    wire_tag(*tag).to_string(),
                    merged,
                ));
            }
            Section::Image { src, alt } => {
                let schema = card_types.insert_full(IMAGE_SCHEMA.to_string()).0;
                sections.push(SerializedSection::Atomic(
                    SECTION_KIND_ATOMIC,
                    schema,
                    json!({ "src": src, "alt": alt }),
                ));
            }
            Section::Card { name, payload } => {
                let schema = card_types.insert_full(name.clone()).0;
                sections.push(SerializedSection::Atomic(
                    SECTION_KIND_ATOMIC,
                    schema,
                    payload.clone(),
                ));
            }
        }
    }

    SerializedDoc {
        version: FORMAT_VERSION,
        markups: markups.into_iter().collect(),
        card_types: card_types.into_iter().collect(),
        sections,
    }
}

/// Decode a serialized document into a post
///
/// # Parameters
/// * `doc` - The serialized document
/// * `cards` - Registry resolving atomic-section schemas; unknown schemas
///   go through its fallback and fail loudly if declined
///
/// # Returns
/// * `Ok(Post)` - The decoded post
/// * `Err(InterchangeError)` - Version mismatch, structural breakage, or an
///   unresolvable atomic schema; nothing partial is ever returned
pub fn decode(doc: &SerializedDoc, cards: &CardRegistry) -> Result<Post, InterchangeError> {
    if doc.version != FORMAT_VERSION {
        return Err(InterchangeError::UnsupportedVersion { found: doc.version });
    }

    let formats = doc
        .markups
        .iter()
        .map(resolve_descriptor)
        .collect::<Result<Vec<Format>, InterchangeError>>()?;

    let mut sections = Vec::with_capacity(doc.sections.len());
    for (position, serialized) in doc.sections.iter().enumerate() {
        let section = match serialized {
            SerializedSection::Markup(kind, tag, markers) => {
                if *kind != SECTION_KIND_MARKUP {
                    return Err(InterchangeError::MalformedDocument(format!(
                        "section {position} has kind {kind}, expected {SECTION_KIND_MARKUP}"
                    )));
                }
                let tag = parse_wire_tag(tag).ok_or_else(|| {
                    InterchangeError::MalformedDocument(format!(
                        "section {position} has unknown tag '{tag}'"
                    ))
                })?;
                let markers = markers
                    .iter()
                    .map(|SerializedMarker(indices, text)| {
                        let marker_formats = indices
                            .iter()
                            .map(|&index| {
                                formats.get(index).cloned().ok_or_else(|| {
                                    InterchangeError::MalformedDocument(format!(
                                        "section {position} references markup index {index}, \
                                         but only {} markups are enumerated",
                                        formats.len()
                                    ))
                                })
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(Marker::with_formats(text.clone(), marker_formats))
                    })
                    .collect::<Result<Vec<_>, InterchangeError>>()?;
                Section::Markup { tag, markers }
            }
            SerializedSection::Atomic(kind, schema, payload) => {
                if *kind != SECTION_KIND_ATOMIC {
                    return Err(InterchangeError::MalformedDocument(format!(
                        "section {position} has kind {kind}, expected {SECTION_KIND_ATOMIC}"
                    )));
                }
                let name = doc.card_types.get(*schema).ok_or_else(|| {
                    InterchangeError::MalformedDocument(format!(
                        "section {position} references schema index {schema}, \
                         but only {} schemas are enumerated",
                        doc.card_types.len()
                    ))
                })?;
                if name == IMAGE_SCHEMA {
                    decode_image(position, payload)?
                } else {
                    cards.resolve(name, payload)?
                }
            }
        };
        sections.push(section);
    }

    log::debug!("decoded {} sections", sections.len());
    Ok(Post::from_sections(sections))
}

fn decode_image(position: usize, payload: &Value) -> Result<Section, InterchangeError> {
    let src = payload
        .get("src")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            InterchangeError::MalformedDocument(format!(
                "image section {position} is missing its required 'src' field"
            ))
        })?
        .to_string();
    let alt = payload
        .get("alt")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(Section::Image { src, alt })
}

/// Wire tag names for markup sections
///
/// List items carry their style in the tag so the wire form stays a flat
/// section sequence.
fn wire_tag(tag: MarkupTag) -> &'static str {
    match tag {
        MarkupTag::ListItem(ListStyle::Unordered) => "ul-li",
        MarkupTag::ListItem(ListStyle::Ordered) => "ol-li",
        other => other.surface_tag(),
    }
}

fn parse_wire_tag(tag: &str) -> Option<MarkupTag> {
    match tag {
        "ul-li" => Some(MarkupTag::ListItem(ListStyle::Unordered)),
        "ol-li" => Some(MarkupTag::ListItem(ListStyle::Ordered)),
        "li" => None,
        other => MarkupTag::from_surface_tag(other),
    }
}

fn describe_format(format: &Format) -> MarkupDescriptor {
    match format {
        Format::Link { href } => MarkupDescriptor::Attributed(
            format.name().to_string(),
            vec![("href".to_string(), href.clone())],
        ),
        plain => MarkupDescriptor::Plain(plain.name().to_string()),
    }
}

fn resolve_descriptor(descriptor: &MarkupDescriptor) -> Result<Format, InterchangeError> {
    match descriptor {
        MarkupDescriptor::Plain(name) => Format::from_name(name).ok_or_else(|| {
            InterchangeError::MalformedDocument(format!("unknown markup name '{name}'"))
        }),
        MarkupDescriptor::Attributed(name, attrs) => {
            if name != "a" {
                return Err(InterchangeError::MalformedDocument(format!(
                    "markup '{name}' does not take attributes"
                )));
            }
            let href = attrs
                .iter()
                .find(|(attr, _)| attr == "href")
                .map(|(_, value)| value.clone())
                .ok_or_else(|| {
                    InterchangeError::MalformedDocument(
                        "link markup is missing its required 'href' attribute".to_string(),
                    )
                })?;
            Ok(Format::Link { href })
        }
    }
}

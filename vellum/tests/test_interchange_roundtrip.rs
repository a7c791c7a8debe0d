//! Interchange codec properties over full documents
//!
//! The round-trip law, the versioning contract, and structural validation
//! of hand-built (and hand-broken) wire documents.

use anyhow::Result;
use serde_json::{json, Value};
use vellum::{
    decode, encode, CardRegistry, Format, InterchangeError, ListStyle, Marker, MarkupTag, Post,
    Section, SerializedDoc,
};

fn rich_post() -> Post {
    Post::from_sections(vec![
        Section::Markup {
            tag: MarkupTag::Heading(2),
            markers: vec![Marker::new("A heading")],
        },
        Section::Markup {
            tag: MarkupTag::Paragraph,
            markers: vec![
                Marker::new("plain "),
                Marker::with_formats("bold", vec![Format::Bold]),
                Marker::with_formats(
                    " linked",
                    vec![Format::Link {
                        href: "https://example.com".to_string(),
                    }],
                ),
            ],
        },
        Section::Markup {
            tag: MarkupTag::Blockquote,
            markers: vec![Marker::with_formats("quoted", vec![Format::Italic])],
        },
        Section::Markup {
            tag: MarkupTag::ListItem(ListStyle::Ordered),
            markers: vec![Marker::new("step one")],
        },
        Section::Image {
            src: "figure.png".to_string(),
            alt: None,
        },
        Section::Card {
            name: "embed".to_string(),
            payload: json!({ "url": "https://example.com/v", "height": 320 }),
        },
    ])
}

fn sections_of(post: &Post) -> Vec<Section> {
    post.iter().map(|(_, section)| section.clone()).collect()
}

fn registry_with_embed() -> CardRegistry {
    let mut cards = CardRegistry::new();
    cards.register("embed");
    cards
}

#[test]
fn test_round_trip_law_over_a_rich_document() {
    // Arrange
    let post = rich_post();

    // Act: encode, serialize to text, parse back, decode
    let decoded = decode(&encode(&post), &registry_with_embed()).unwrap();

    // Assert: same ordered sections, markers, and format sets
    assert_eq!(sections_of(&decoded), sections_of(&post));
}

#[test]
fn test_round_trip_survives_the_textual_form() -> Result<()> {
    // Arrange
    let post = rich_post();

    // Act
    let json = encode(&post).to_json()?;
    let decoded = decode(&SerializedDoc::from_json(&json)?, &registry_with_embed())?;

    // Assert
    assert_eq!(sections_of(&decoded), sections_of(&post));
    Ok(())
}

#[test]
fn test_wire_sections_are_compact_arrays() -> Result<()> {
    // Arrange: a one-paragraph document
    let post = Post::from_sections(vec![Section::Markup {
        tag: MarkupTag::Paragraph,
        markers: vec![Marker::with_formats("hi", vec![Format::Bold])],
    }]);

    // Act: inspect the raw JSON shape
    let raw: Value = serde_json::from_str(&encode(&post).to_json()?)?;

    // Assert: sections encode by index into the enumerated tables, not by
    // repeating type names
    assert_eq!(raw["markups"], json!(["b"]));
    assert_eq!(raw["sections"][0], json!([1, "p", [[[0], "hi"]]]));
    Ok(())
}

#[test]
fn test_scenario_c_unknown_version_is_rejected() {
    // Arrange: a wire document declaring version 99
    let doc = SerializedDoc::from_json(
        r#"{ "version": 99, "markups": [], "card_types": [], "sections": [] }"#,
    )
    .unwrap();

    // Act
    let result = decode(&doc, &CardRegistry::new());

    // Assert: no post is produced
    assert!(matches!(
        result,
        Err(InterchangeError::UnsupportedVersion { found: 99 })
    ));
}

#[test]
fn test_scenario_d_dangling_markup_index_is_rejected() {
    // Arrange: three markups enumerated, index 5 referenced
    let doc = SerializedDoc::from_json(
        r#"{
            "version": 1,
            "markups": ["b", "i", "u"],
            "card_types": [],
            "sections": [[1, "p", [[[5], "dangling"]]]]
        }"#,
    )
    .unwrap();

    // Act
    let result = decode(&doc, &CardRegistry::new());

    // Assert
    assert!(matches!(
        result,
        Err(InterchangeError::MalformedDocument(_))
    ));
}

#[test]
fn test_decode_is_all_or_nothing() {
    // Arrange: a document whose *last* section is broken
    let doc = SerializedDoc::from_json(
        r#"{
            "version": 1,
            "markups": [],
            "card_types": ["image"],
            "sections": [
                [1, "p", [[[], "fine"]]],
                [2, 7, {}]
            ]
        }"#,
    )
    .unwrap();

    // Act + Assert: the valid prefix does not leak out
    assert!(matches!(
        decode(&doc, &CardRegistry::new()),
        Err(InterchangeError::MalformedDocument(_))
    ));
}

#[test]
fn test_adjacent_same_format_runs_normalize_without_changing_meaning() {
    // Arrange: the same paragraph, fragmented and whole
    let fragmented = Post::from_sections(vec![Section::Markup {
        tag: MarkupTag::Paragraph,
        markers: vec![
            Marker::with_formats("to", vec![Format::Code]),
            Marker::with_formats("gether", vec![Format::Code]),
        ],
    }]);
    let whole = Post::from_sections(vec![Section::Markup {
        tag: MarkupTag::Paragraph,
        markers: vec![Marker::with_formats("together", vec![Format::Code])],
    }]);
    let cards = CardRegistry::new();

    // Act
    let from_fragmented = decode(&encode(&fragmented), &cards).unwrap();
    let from_whole = decode(&encode(&whole), &cards).unwrap();

    // Assert: both decode to the merged form
    assert_eq!(sections_of(&from_fragmented), sections_of(&from_whole));
}

#[test]
fn test_substituting_fallback_rescues_unknown_cards() {
    // Arrange: a document with a card schema the reader does not know,
    // read with a fallback that degrades it to visible text
    let post = Post::from_sections(vec![Section::Card {
        name: "legacy-widget".to_string(),
        payload: Value::Null,
    }]);
    let mut cards = CardRegistry::new();
    cards.set_fallback(Box::new(|name, _| {
        Some(Section::paragraph_with_text(format!("[unsupported: {name}]")))
    }));

    // Act
    let decoded = decode(&encode(&post), &cards).unwrap();

    // Assert
    assert_eq!(
        decoded.section_at(0).unwrap().1.plain_text(),
        "[unsupported: legacy-widget]"
    );
}

#[test]
fn test_empty_document_round_trips() {
    // Arrange
    let post = Post::new();

    // Act
    let decoded = decode(&encode(&post), &CardRegistry::new()).unwrap();

    // Assert: still exactly one empty paragraph
    assert_eq!(decoded.len(), 1);
    assert_eq!(sections_of(&decoded), sections_of(&post));
}

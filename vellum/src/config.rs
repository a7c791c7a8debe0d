//! Editing session configuration
//!
//! Everything a host hands over when it opens an editing session: the
//! initial document (already-serialized form, an existing surface snapshot
//! to import, or nothing) and the card registry with its unknown-schema
//! fallback.

use crate::cards::CardRegistry;
use crate::interchange::SerializedDoc;
use crate::surface::SurfaceNode;

/// Where the session's initial document comes from
#[derive(Debug, Default)]
pub enum InitialContent {
    /// Start from the canonical empty document
    #[default]
    Empty,
    /// Decode a previously serialized document
    Serialized(SerializedDoc),
    /// Import an existing surface snapshot
    Surface(SurfaceNode),
}

/// Configuration accepted at session start
pub struct SessionConfig {
    /// The initial document
    pub initial: InitialContent,
    /// Atomic-section schemas this session understands
    pub cards: CardRegistry,
}

impl SessionConfig {
    /// An empty-document session with no registered cards
    pub fn new() -> Self {
        Self {
            initial: InitialContent::Empty,
            cards: CardRegistry::new(),
        }
    }

    /// Start from a serialized document (builder style)
    pub fn with_serialized(mut self, doc: SerializedDoc) -> Self {
        self.initial = InitialContent::Serialized(doc);
        self
    }

    /// Start by importing a surface snapshot (builder style)
    pub fn with_surface(mut self, snapshot: SurfaceNode) -> Self {
        self.initial = InitialContent::Surface(snapshot);
        self
    }

    /// Use a prepared card registry (builder style)
    pub fn with_cards(mut self, cards: CardRegistry) -> Self {
        self.cards = cards;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

//! Surface boundary types
//!
//! The live, user-editable surface is owned by the host (a wasm shell, a
//! webview bridge, a test harness). The core never holds a reference into
//! it; instead the host delivers immutable snapshots of it on every
//! mutation notification, and receives back patches describing the minimal
//! mutations that make the surface match the model again.
//!
//! Snapshot nodes carry stable identities assigned by the host. Identity is
//! what survives across snapshots: two snapshots showing the same id show
//! the same live surface node.

/// Stable identity of a live surface node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Surface ids at or above this base are allocated by the render pass for
/// nodes it materializes itself. Host-assigned ids must stay below it.
pub const SYNTHETIC_SURFACE_ID_BASE: u64 = 1 << 48;

/// Content of a snapshot node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceKind {
    /// An element with a tag, attributes, and ordered children
    Element {
        /// Lowercase tag name
        tag: String,
        /// Attribute name/value pairs in document order
        attrs: Vec<(String, String)>,
        /// Child nodes in document order
        children: Vec<SurfaceNode>,
    },
    /// A text node
    Text(String),
}

/// One node of a surface snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceNode {
    /// Stable identity of the live node this snapshot describes
    pub id: SurfaceId,
    /// Node content
    pub kind: SurfaceKind,
}

impl SurfaceNode {
    /// Create an element node with no attributes or children
    pub fn element(id: SurfaceId, tag: impl Into<String>) -> Self {
        Self {
            id,
            kind: SurfaceKind::Element {
                tag: tag.into(),
                attrs: Vec::new(),
                children: Vec::new(),
            },
        }
    }

    /// Create a text node
    pub fn text(id: SurfaceId, text: impl Into<String>) -> Self {
        Self {
            id,
            kind: SurfaceKind::Text(text.into()),
        }
    }

    /// Add an attribute (builder style)
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let SurfaceKind::Element { attrs, .. } = &mut self.kind {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    /// Add a child node (builder style)
    pub fn with_child(mut self, child: SurfaceNode) -> Self {
        if let SurfaceKind::Element { children, .. } = &mut self.kind {
            children.push(child);
        }
        self
    }

    /// Tag name, or `None` for text nodes
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            SurfaceKind::Element { tag, .. } => Some(tag.as_str()),
            SurfaceKind::Text(_) => None,
        }
    }

    /// Attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        match &self.kind {
            SurfaceKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(attr_name, _)| attr_name == name)
                .map(|(_, value)| value.as_str()),
            SurfaceKind::Text(_) => None,
        }
    }

    /// Children in document order (empty for text nodes)
    pub fn children(&self) -> &[SurfaceNode] {
        match &self.kind {
            SurfaceKind::Element { children, .. } => children,
            SurfaceKind::Text(_) => &[],
        }
    }

    /// Concatenated text content of this subtree
    pub fn flattened_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            SurfaceKind::Text(text) => out.push_str(text),
            SurfaceKind::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Whether this subtree contains a node with the given id
    pub fn contains(&self, id: SurfaceId) -> bool {
        if self.id == id {
            return true;
        }
        self.children().iter().any(|child| child.contains(id))
    }
}

/// The surface nodes the text cursor currently touches
///
/// A collapsed cursor has `anchor == focus`. The ids may name nodes at any
/// depth; the reconciler resolves them to the top-level children whose
/// subtrees contain them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where the selection started
    pub anchor: SurfaceId,
    /// Where the selection currently ends
    pub focus: SurfaceId,
}

impl Selection {
    /// A collapsed cursor at a single node
    pub fn caret(at: SurfaceId) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }
}

/// A minimal surface mutation produced by the render pass
///
/// Patches reference live nodes by id; fragments carry ids assigned by the
/// render pass (at or above [`SYNTHETIC_SURFACE_ID_BASE`]) that the host
/// adopts when it applies the patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfacePatch {
    /// Replace the node `target` with `fragment`
    ReplaceNode {
        /// Live node to replace
        target: SurfaceId,
        /// Replacement subtree
        fragment: SurfaceNode,
    },
    /// Insert `fragment` as a top-level child after `reference`
    /// (`None` prepends)
    InsertAfter {
        /// Preceding top-level sibling, or `None` for the front
        reference: Option<SurfaceId>,
        /// Inserted subtree
        fragment: SurfaceNode,
    },
    /// Remove the node `target` and its subtree
    RemoveNode {
        /// Live node to remove
        target: SurfaceId,
    },
}

//! Render nodes
//!
//! A render node is the shadow of exactly one document-model node. It
//! remembers which live surface node currently materializes that model
//! node (a weak, non-owning handle) and whether the materialization is up
//! to date.

use crate::post::SectionId;
use crate::surface::SurfaceId;

/// Which model node a render node shadows
///
/// No two render nodes in a tree shadow the same model node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostRef {
    /// The post root
    Post,
    /// A section
    Section(SectionId),
    /// One marker run within a section, by position
    Marker(SectionId, usize),
}

/// Lifecycle state of a render node
///
/// `Unrendered → Clean → Dirty → Clean → ...`; entering
/// `ScheduledForRemoval` is one-way and terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Created but never materialized on the surface
    Unrendered,
    /// The surface matches the model node
    Clean,
    /// The model node changed; the surface is stale
    Dirty,
    /// Will be detached and destroyed by the next render pass
    ScheduledForRemoval,
}

/// Id of a render node within its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderNodeId(pub(crate) u64);

/// Shadow of one model node
///
/// Ownership is top-down: the tree owns nodes, a node's `children` list
/// owns the order, and `parent` is a non-owning navigation aid.
#[derive(Debug)]
pub struct RenderNode {
    pub(crate) post_ref: PostRef,
    pub(crate) state: RenderState,
    pub(crate) surface: Option<SurfaceId>,
    pub(crate) parent: Option<RenderNodeId>,
    pub(crate) children: Vec<RenderNodeId>,
    /// Set on ancestors of dirty or removal-scheduled nodes so a render
    /// pass can skip fully clean subtrees
    pub(crate) dirty_descendant: bool,
}

impl RenderNode {
    pub(crate) fn new(post_ref: PostRef) -> Self {
        Self {
            post_ref,
            state: RenderState::Unrendered,
            surface: None,
            parent: None,
            children: Vec::new(),
            dirty_descendant: false,
        }
    }

    /// The model node this render node shadows
    pub fn post_ref(&self) -> PostRef {
        self.post_ref
    }

    /// Current lifecycle state
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// The live surface node currently materializing the model node
    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    /// Children in order
    pub fn children(&self) -> &[RenderNodeId] {
        &self.children
    }
}

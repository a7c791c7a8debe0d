//! Render tree
//!
//! Owns every render node of an editing session plus the identity map from
//! live surface nodes back to render nodes — the structure that answers
//! "which model node does this surface element correspond to" in O(1)
//! during reconciliation. Built once per document load, incrementally
//! patched for the session's lifetime.

use hashbrown::HashMap;

use crate::render_node::{PostRef, RenderNode, RenderNodeId, RenderState};
use crate::surface::{SurfaceId, SYNTHETIC_SURFACE_ID_BASE};

/// The shadow tree of an editing session
#[derive(Debug)]
pub struct RenderTree {
    nodes: HashMap<RenderNodeId, RenderNode>,
    root: RenderNodeId,
    by_surface: HashMap<SurfaceId, RenderNodeId>,
    by_post: HashMap<PostRef, RenderNodeId>,
    next_node: u64,
    next_surface: u64,
}

impl RenderTree {
    /// Create a tree holding only the root node (shadowing the post)
    pub fn new() -> Self {
        let root = RenderNodeId(0);
        let mut nodes = HashMap::new();
        let mut root_node = RenderNode::new(PostRef::Post);
        // The editable root element always exists on the surface
        root_node.state = RenderState::Clean;
        nodes.insert(root, root_node);

        let mut by_post = HashMap::new();
        by_post.insert(PostRef::Post, root);

        Self {
            nodes,
            root,
            by_surface: HashMap::new(),
            by_post,
            next_node: 1,
            next_surface: SYNTHETIC_SURFACE_ID_BASE,
        }
    }

    /// The root render node
    pub fn root(&self) -> RenderNodeId {
        self.root
    }

    /// Borrow a node
    ///
    /// Panics on a dangling id; render node ids never leave the session
    /// that minted them, so a miss is a bookkeeping bug.
    pub fn node(&self, id: RenderNodeId) -> &RenderNode {
        self.nodes
            .get(&id)
            .unwrap_or_else(|| panic!("render tree bookkeeping broken: dangling node id {id:?}"))
    }

    fn node_mut(&mut self, id: RenderNodeId) -> &mut RenderNode {
        self.nodes
            .get_mut(&id)
            .unwrap_or_else(|| panic!("render tree bookkeeping broken: dangling node id {id:?}"))
    }

    /// Create an unrendered node shadowing `post_ref`
    ///
    /// Panics if the model node is already shadowed — two shadows of one
    /// model node mean the reconciliation algorithm itself is broken.
    pub fn build_render_node(&mut self, post_ref: PostRef) -> RenderNodeId {
        assert!(
            !self.by_post.contains_key(&post_ref),
            "model node {post_ref:?} is already shadowed by a render node"
        );
        let id = RenderNodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, RenderNode::new(post_ref));
        self.by_post.insert(post_ref, id);
        id
    }

    /// Bind a node to the live surface node that materializes it
    ///
    /// Rebinding (a re-render replacing the materialization) releases the
    /// previous registration first.
    pub fn bind_surface(&mut self, id: RenderNodeId, surface: SurfaceId) {
        if let Some(previous) = self.node(id).surface {
            self.by_surface.remove(&previous);
        }
        self.node_mut(id).surface = Some(surface);
        self.by_surface.insert(surface, id);
    }

    /// Reverse lookup: the render node materialized by a surface node
    pub fn element_render_node(&self, surface: SurfaceId) -> Option<RenderNodeId> {
        self.by_surface.get(&surface).copied()
    }

    /// The render node shadowing a model node, if any
    pub fn model_render_node(&self, post_ref: PostRef) -> Option<RenderNodeId> {
        self.by_post.get(&post_ref).copied()
    }

    /// Splice `id` into the root's children after `after`; `None` prepends
    pub fn insert_after(&mut self, id: RenderNodeId, after: Option<RenderNodeId>) {
        let index = match after {
            Some(after_id) => {
                let children = &self.node(self.root).children;
                let position = children
                    .iter()
                    .position(|&child| child == after_id)
                    .unwrap_or_else(|| {
                        panic!("insert_after reference {after_id:?} is not a top-level node")
                    });
                position + 1
            }
            None => 0,
        };
        let root = self.root;
        self.node_mut(root).children.insert(index, id);
        self.node_mut(id).parent = Some(root);
        if self.node(id).state != RenderState::Clean {
            self.flag_ancestors(id);
        }
    }

    /// Append `id` as the last child of `parent`
    pub fn append_child(&mut self, parent: RenderNodeId, id: RenderNodeId) {
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
        if self.node(id).state != RenderState::Clean {
            self.flag_ancestors(id);
        }
    }

    /// Mark a node's materialization stale
    ///
    /// No effect on nodes already scheduled for removal; removal is
    /// terminal. Ancestors are flagged so the render pass descends into
    /// this subtree only.
    pub fn mark_dirty(&mut self, id: RenderNodeId) {
        let node = self.node_mut(id);
        match node.state {
            RenderState::ScheduledForRemoval => return,
            RenderState::Clean => node.state = RenderState::Dirty,
            RenderState::Unrendered | RenderState::Dirty => {}
        }
        self.flag_ancestors(id);
    }

    /// Mark a node freshly materialized
    pub fn mark_clean(&mut self, id: RenderNodeId) {
        let node = self.node_mut(id);
        if node.state == RenderState::ScheduledForRemoval {
            return;
        }
        node.state = RenderState::Clean;
    }

    /// Schedule a node for removal
    ///
    /// Idempotent. Detachment is deferred to the next render pass so an
    /// in-flight walk can still visit the node once to release its surface
    /// handle cleanly.
    pub fn schedule_for_removal(&mut self, id: RenderNodeId) {
        let node = self.node_mut(id);
        if node.state == RenderState::ScheduledForRemoval {
            return;
        }
        node.state = RenderState::ScheduledForRemoval;
        self.flag_ancestors(id);
    }

    /// Destroy a removal-scheduled node and its subtree
    ///
    /// Releases the node's surface handle (exactly once — the node ceases
    /// to exist afterwards) and unregisters the whole subtree from both
    /// identity maps.
    ///
    /// # Returns
    /// * `Option<SurfaceId>` - The released handle, for the removal patch
    pub fn detach(&mut self, id: RenderNodeId) -> Option<SurfaceId> {
        debug_assert_eq!(
            self.node(id).state,
            RenderState::ScheduledForRemoval,
            "detach of a node that was never scheduled for removal"
        );

        if let Some(parent) = self.node(id).parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.retain(|&child| child != id);
            }
        }

        let handle = self.node(id).surface;
        self.destroy_subtree(id);
        handle
    }

    fn destroy_subtree(&mut self, id: RenderNodeId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        if let Some(surface) = node.surface {
            self.by_surface.remove(&surface);
        }
        self.by_post.remove(&node.post_ref);
        for child in node.children {
            self.destroy_subtree(child);
        }
    }

    /// Drop and unregister all marker children of a section node
    ///
    /// Used when a section re-materializes: the old marker shadows are
    /// replaced wholesale by the new fragment's.
    pub fn clear_children(&mut self, id: RenderNodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.destroy_subtree(child);
        }
    }

    /// Whether this subtree needs a render-pass visit
    pub fn needs_visit(&self, id: RenderNodeId) -> bool {
        let node = self.node(id);
        node.state != RenderState::Clean || node.dirty_descendant
    }

    /// Clear the descendant flag after a pass has serviced a subtree
    pub fn clear_dirty_flag(&mut self, id: RenderNodeId) {
        self.node_mut(id).dirty_descendant = false;
    }

    /// Allocate a surface id for a node the render pass materializes
    pub fn allocate_surface_id(&mut self) -> SurfaceId {
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        id
    }

    fn flag_ancestors(&mut self, id: RenderNodeId) {
        let mut current = self.node(id).parent;
        while let Some(ancestor) = current {
            let node = self.node_mut(ancestor);
            if node.dirty_descendant {
                break;
            }
            node.dirty_descendant = true;
            current = node.parent;
        }
    }
}

impl Default for RenderTree {
    fn default() -> Self {
        Self::new()
    }
}

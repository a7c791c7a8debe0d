//! The editing session
//!
//! Owns one document's post, render tree, card registry, and event bus,
//! and drives reconciliation. All state is exclusively owned by the
//! session; the live surface is the one externally mutable thing, which is
//! why it only ever enters as a read-only snapshot.

use thiserror::Error;

use crate::cards::{CardError, CardRegistry};
use crate::config::{InitialContent, SessionConfig};
use crate::events::{EventBus, EventCallback, LifecycleEvent, SubscriberId};
use crate::interchange::{self, InterchangeError, SerializedDoc};
use crate::parser::SurfaceParser;
use crate::post::{Post, PostError, SectionId};
use crate::render_node::PostRef;
use crate::render_tree::RenderTree;
use crate::surface::{Selection, SurfaceNode, SurfacePatch};
use crate::{reconciler, renderer};

/// Errors surfaced to the host while opening or driving a session
#[derive(Error, Debug)]
pub enum SessionError {
    /// An atomic section could not be resolved against the registry
    #[error(transparent)]
    Card(#[from] CardError),

    /// The initial serialized document failed to decode
    #[error(transparent)]
    Interchange(#[from] InterchangeError),
}

/// One editing session over one document
pub struct EditSession {
    post: Post,
    tree: RenderTree,
    cards: CardRegistry,
    bus: EventBus,
    selection: Option<Selection>,
}

impl EditSession {
    /// Open a session from the host's configuration
    ///
    /// For serialized or empty initial content the model starts
    /// unmaterialized; call [`render`](Self::render) once to obtain the
    /// patches that put it on the surface. An imported surface snapshot is
    /// adopted as already materialized.
    ///
    /// # Returns
    /// * `Ok(EditSession)` - Ready to reconcile
    /// * `Err(SessionError)` - The initial document failed to decode or
    ///   referenced an unresolvable card schema
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let SessionConfig { initial, cards } = config;

        let (post, tree) = match initial {
            InitialContent::Empty => {
                let post = Post::new();
                let tree = shadow_all_unrendered(&post);
                (post, tree)
            }
            InitialContent::Serialized(doc) => {
                let post = interchange::decode(&doc, &cards)?;
                let tree = shadow_all_unrendered(&post);
                (post, tree)
            }
            InitialContent::Surface(snapshot) => {
                let post = SurfaceParser::new(&cards).parse(&snapshot)?;
                let tree = adopt_surface(&post, &snapshot);
                (post, tree)
            }
        };

        Ok(Self {
            post,
            tree,
            cards,
            bus: EventBus::new(),
            selection: None,
        })
    }

    /// Materialize whatever is not yet on the surface
    ///
    /// Used once after opening a session from serialized or empty content,
    /// and a no-op (empty patch list) whenever the tree is already clean.
    pub fn render(&mut self) -> Vec<SurfacePatch> {
        renderer::render_pass(&mut self.post, &mut self.tree)
    }

    /// Handle one surface-mutation notification
    ///
    /// Runs exactly one full reconciliation pass against the snapshot and
    /// notifies observers that the document changed.
    ///
    /// # Parameters
    /// * `snapshot` - The surface's current state, read fresh by the host
    /// * `selection` - The cursor context delivered with the notification
    ///
    /// # Returns
    /// * `Ok(Vec<SurfacePatch>)` - Patches the host applies to the surface
    /// * `Err(SessionError)` - A new atomic section had an unknown schema
    ///   and the fallback declined it
    pub fn surface_mutated(
        &mut self,
        snapshot: &SurfaceNode,
        selection: Option<Selection>,
    ) -> Result<Vec<SurfacePatch>, SessionError> {
        self.selection = selection;
        let patches = reconciler::reconcile(
            &mut self.post,
            &mut self.tree,
            &self.cards,
            snapshot,
            self.selection.as_ref(),
        )?;
        self.bus.emit(LifecycleEvent::Update);
        Ok(patches)
    }

    /// Handle a selection-change notification
    pub fn selection_changed(&mut self, selection: Option<Selection>) {
        match (self.selection, selection) {
            (None, Some(_)) => self.bus.emit(LifecycleEvent::Selection),
            (Some(_), Some(_)) => self.bus.emit(LifecycleEvent::SelectionUpdated),
            (Some(_), None) => self.bus.emit(LifecycleEvent::SelectionEnded),
            (None, None) => {}
        }
        self.selection = selection;
    }

    /// Dismiss the selection
    pub fn selection_ended(&mut self) {
        if self.selection.take().is_some() {
            self.bus.emit(LifecycleEvent::SelectionEnded);
        }
    }

    /// Signal that a command edited `section` through the post API
    ///
    /// Marks the section's shadow dirty and re-renders it.
    ///
    /// # Returns
    /// * `Ok(Vec<SurfacePatch>)` - The replacement patch for the section
    /// * `Err(PostError::InvalidReference)` - No such section
    pub fn section_updated(&mut self, section: SectionId) -> Result<Vec<SurfacePatch>, PostError> {
        if self.post.section(section).is_none() {
            return Err(PostError::InvalidReference);
        }
        let render_id = self
            .tree
            .model_render_node(PostRef::Section(section))
            .unwrap_or_else(|| {
                panic!("invariant violation: live section {section:?} has no render node")
            });
        self.tree.mark_dirty(render_id);
        let patches = renderer::render_pass(&mut self.post, &mut self.tree);
        self.bus.emit(LifecycleEvent::Update);
        Ok(patches)
    }

    /// Serialize the current document
    pub fn serialize(&self) -> SerializedDoc {
        interchange::encode(&self.post)
    }

    /// The document model
    pub fn post(&self) -> &Post {
        &self.post
    }

    /// Mutable access for command objects
    ///
    /// Commands mutate through the same post API as the reconciler; follow
    /// a mutation with [`section_updated`](Self::section_updated) so the
    /// surface catches up.
    pub fn post_mut(&mut self) -> &mut Post {
        &mut self.post
    }

    /// The render tree (read-only)
    pub fn render_tree(&self) -> &RenderTree {
        &self.tree
    }

    /// The selection delivered with the latest notification
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Register a lifecycle-event subscriber
    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriberId {
        self.bus.subscribe(callback)
    }

    /// Remove a lifecycle-event subscriber
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.bus.unsubscribe(id)
    }
}

/// Shadow every section of a freshly decoded post, all unrendered
fn shadow_all_unrendered(post: &Post) -> RenderTree {
    let mut tree = RenderTree::new();
    let mut previous = None;
    for (section_id, _) in post.iter() {
        let render_id = tree.build_render_node(PostRef::Section(section_id));
        tree.insert_after(render_id, previous);
        previous = Some(render_id);
    }
    tree
}

/// Shadow a post parsed from a surface snapshot, binding each section to
/// the surface node it came from and marking it clean
fn adopt_surface(post: &Post, snapshot: &SurfaceNode) -> RenderTree {
    let mut tree = RenderTree::new();
    let children = reconciler::effective_children(snapshot);
    let mut previous = None;

    for (index, (node, _)) in children.iter().enumerate() {
        let Some((section_id, _)) = post.section_at(index) else {
            break;
        };
        let render_id = tree.build_render_node(PostRef::Section(section_id));
        tree.insert_after(render_id, previous);
        tree.bind_surface(render_id, node.id);
        tree.mark_clean(render_id);
        previous = Some(render_id);
    }

    // An empty snapshot still parsed to the canonical empty paragraph; it
    // has no surface node yet and materializes on the first render pass
    for index in children.len()..post.len() {
        if let Some((section_id, _)) = post.section_at(index) {
            let render_id = tree.build_render_node(PostRef::Section(section_id));
            tree.insert_after(render_id, previous);
            previous = Some(render_id);
        }
    }

    tree
}

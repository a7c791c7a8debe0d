//! Materialization and the render pass
//!
//! The render pass walks the render tree and emits the minimal set of
//! surface patches that make the live surface match the model again:
//! every dirty node is re-materialized from its current model node and
//! marked clean, every removal-scheduled node has its surface handle
//! detached and is destroyed. Clean subtrees are skipped entirely.

use crate::parser::{CARD_ATTR, CARD_PAYLOAD_ATTR};
use crate::post::{Format, Marker, Post, Section, SectionId};
use crate::render_node::{PostRef, RenderNodeId, RenderState};
use crate::render_tree::RenderTree;
use crate::surface::{SurfaceId, SurfaceNode, SurfacePatch};

/// Walk the render tree, patching every non-clean top-level node
///
/// Removal-scheduled nodes are the point where their model sections are
/// finally dropped from the post: the shadow must acknowledge the removal
/// before the model node goes away, so a pass can never dereference a
/// freed section.
pub(crate) fn render_pass(post: &mut Post, tree: &mut RenderTree) -> Vec<SurfacePatch> {
    let root = tree.root();
    if !tree.needs_visit(root) {
        return Vec::new();
    }

    let mut patches = Vec::new();
    let children: Vec<RenderNodeId> = tree.node(root).children().to_vec();
    let mut previous_surface: Option<SurfaceId> = None;

    for child in children {
        match tree.node(child).state() {
            RenderState::ScheduledForRemoval => {
                let section_id = shadowed_section(tree, child);
                if let Some(target) = tree.detach(child) {
                    patches.push(SurfacePatch::RemoveNode { target });
                }
                // The model node outlives its shadow until the removal is
                // acknowledged here
                if post.section(section_id).is_some() {
                    let _ = post.remove_section(section_id);
                }
                // The node is destroyed; nothing left to clean up
                continue;
            }

            RenderState::Unrendered => {
                let fragment = rematerialize(post, tree, child);
                patches.push(SurfacePatch::InsertAfter {
                    reference: previous_surface,
                    fragment: fragment.clone(),
                });
                previous_surface = Some(fragment.id);
                tree.bind_surface(child, fragment.id);
                tree.mark_clean(child);
            }

            RenderState::Dirty => {
                let target = dirty_target(tree, child);
                let fragment = rematerialize(post, tree, child);
                patches.push(SurfacePatch::ReplaceNode {
                    target,
                    fragment: fragment.clone(),
                });
                previous_surface = Some(fragment.id);
                tree.bind_surface(child, fragment.id);
                tree.mark_clean(child);
            }

            RenderState::Clean => {
                if tree.needs_visit(child) {
                    // A marker shadow below went stale; the section
                    // re-materializes as a whole
                    let target = dirty_target(tree, child);
                    let fragment = rematerialize(post, tree, child);
                    patches.push(SurfacePatch::ReplaceNode {
                        target,
                        fragment: fragment.clone(),
                    });
                    previous_surface = Some(fragment.id);
                    tree.bind_surface(child, fragment.id);
                } else {
                    previous_surface = tree.node(child).surface();
                }
            }
        }
        tree.clear_dirty_flag(child);
    }

    tree.clear_dirty_flag(root);
    log::debug!("render pass emitted {} patch(es)", patches.len());
    patches
}

/// The surface node a dirty section currently occupies
fn dirty_target(tree: &RenderTree, id: RenderNodeId) -> SurfaceId {
    tree.node(id).surface().unwrap_or_else(|| {
        panic!(
            "render node for {:?} is stale but was never materialized",
            tree.node(id).post_ref()
        )
    })
}

/// The section a top-level render node shadows
fn shadowed_section(tree: &RenderTree, id: RenderNodeId) -> SectionId {
    match tree.node(id).post_ref() {
        PostRef::Section(section_id) => section_id,
        other => panic!("top-level render node shadows {other:?}, expected a section"),
    }
}

/// Materialize a section render node's current model content
///
/// Markup sections get one marker shadow per run, each bound to the
/// outermost node of its run fragment; the previous marker shadows (if
/// any) are replaced wholesale.
fn rematerialize(post: &Post, tree: &mut RenderTree, node: RenderNodeId) -> SurfaceNode {
    let section_id = shadowed_section(tree, node);
    let section = post
        .section(section_id)
        .unwrap_or_else(|| panic!("render node shadows missing section {section_id:?}"))
        .clone();

    tree.clear_children(node);

    match &section {
        Section::Markup { tag, markers } => {
            let mut fragment = SurfaceNode::element(tree.allocate_surface_id(), tag.surface_tag());
            for (index, marker) in markers.iter().enumerate() {
                let run = marker_fragment(tree, marker);
                let marker_node = tree.build_render_node(PostRef::Marker(section_id, index));
                tree.append_child(node, marker_node);
                tree.bind_surface(marker_node, run.id);
                tree.mark_clean(marker_node);
                fragment = fragment.with_child(run);
            }
            fragment
        }
        Section::Image { src, alt } => {
            let mut fragment =
                SurfaceNode::element(tree.allocate_surface_id(), "img").with_attr("src", src);
            if let Some(alt) = alt {
                fragment = fragment.with_attr("alt", alt);
            }
            fragment
        }
        Section::Card { name, payload } => {
            SurfaceNode::element(tree.allocate_surface_id(), "div")
                .with_attr(CARD_ATTR, name)
                .with_attr(CARD_PAYLOAD_ATTR, payload.to_string())
        }
    }
}

/// A marker's surface form: its text wrapped innermost-out by its formats
fn marker_fragment(tree: &mut RenderTree, marker: &Marker) -> SurfaceNode {
    let mut node = SurfaceNode::text(tree.allocate_surface_id(), marker.text.clone());
    for format in marker.formats.iter().rev() {
        let mut wrapper = SurfaceNode::element(tree.allocate_surface_id(), format.name());
        if let Format::Link { href } = format {
            wrapper = wrapper.with_attr("href", href.clone());
        }
        node = wrapper.with_child(node);
    }
    node
}

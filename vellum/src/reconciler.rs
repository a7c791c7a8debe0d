//! Reconciliation
//!
//! Keeps the post, the render tree, and the live surface mutually
//! consistent after an uncontrolled surface mutation, touching the minimum
//! possible region. One mutation notification triggers exactly one pass;
//! a pass runs to completion synchronously and is idempotent.
//!
//! The diff is structural and deliberately shallow: it walks only the
//! surface's top-level children, matching each against the render tree's
//! identity map. That keeps a pass linear in the number of blocks and
//! sidesteps diffing freeform nested mutations — correctness for in-block
//! edits comes from unconditionally re-parsing the small region under the
//! cursor instead.

use hashbrown::HashSet;

use crate::cards::{CardError, CardRegistry};
use crate::parser::SurfaceParser;
use crate::post::{ListStyle, Post, Section, SectionId};
use crate::render_node::PostRef;
use crate::render_tree::RenderTree;
use crate::renderer;
use crate::surface::{Selection, SurfaceKind, SurfaceNode, SurfacePatch};

/// One reconciliation pass
///
/// 1. Diff the surface's top-level children against the identity map,
///    parsing and splicing in anything unmatched.
/// 2. Schedule removal for every post section the surface no longer shows.
/// 3. Re-parse the sections under the cursor (plus the one just before
///    them, so a fresh line break can merge into the preceding block).
/// 4. Run the render pass.
///
/// The caller notifies observers afterwards (step 5).
///
/// # Panics
///
/// Panics if a live post section has no render node — that is a broken
/// reconciliation algorithm, not recoverable input.
pub(crate) fn reconcile(
    post: &mut Post,
    tree: &mut RenderTree,
    cards: &CardRegistry,
    snapshot: &SurfaceNode,
    selection: Option<&Selection>,
) -> Result<Vec<SurfacePatch>, CardError> {
    let parser = SurfaceParser::new(cards);
    let children = effective_children(snapshot);

    // Step 1: walk the surface children in order
    let mut sections_in_dom: HashSet<SectionId> = HashSet::with_capacity(children.len());
    let mut fresh: HashSet<SectionId> = HashSet::new();
    let mut previous: Option<SectionId> = None;
    let mut previous_render = None;
    let mut matched = 0usize;

    for (node, list_style) in &children {
        match tree.element_render_node(node.id) {
            Some(render_id) => {
                let PostRef::Section(section_id) = tree.node(render_id).post_ref() else {
                    panic!(
                        "top-level surface node {:?} is bound to a non-section render node",
                        node.id
                    );
                };
                sections_in_dom.insert(section_id);
                matched += 1;
                previous = Some(section_id);
                previous_render = Some(render_id);
            }
            None => {
                // A surface node the model has never seen: the user broke
                // a line, pasted, or the host injected content
                let section = parse_one(&parser, post, previous, *list_style, node)?;
                let section_id = match post.insert_section_after(section, previous) {
                    Ok(id) => id,
                    Err(_) => unreachable!("walk-threaded reference section is a member"),
                };
                let render_id = tree.build_render_node(PostRef::Section(section_id));
                tree.insert_after(render_id, previous_render);
                tree.bind_surface(render_id, node.id);
                // It was parsed from the surface, so it already matches
                // the surface verbatim
                tree.mark_clean(render_id);
                sections_in_dom.insert(section_id);
                fresh.insert(section_id);
                previous = Some(section_id);
                previous_render = Some(render_id);
            }
        }
    }

    // Step 2: anything the surface stopped showing was deleted by the user
    let missing: Vec<SectionId> = post
        .iter()
        .map(|(id, _)| id)
        .filter(|id| !sections_in_dom.contains(id))
        .collect();
    for section_id in &missing {
        match tree.model_render_node(PostRef::Section(*section_id)) {
            Some(render_id) => tree.schedule_for_removal(render_id),
            None => panic!(
                "invariant violation: live section {section_id:?} has no render node"
            ),
        }
    }

    // Step 3: in-place edits do not change node identity, so the sections
    // under the cursor are re-parsed even when step 1 matched them
    let mut reparsed = 0usize;
    if let Some(selection) = selection {
        let cursor_indices: Vec<usize> = children
            .iter()
            .enumerate()
            .filter(|(_, (node, _))| {
                node.contains(selection.anchor) || node.contains(selection.focus)
            })
            .map(|(index, _)| index)
            .collect();

        if let (Some(&first), Some(&last)) = (cursor_indices.first(), cursor_indices.last()) {
            for index in first.saturating_sub(1)..=last {
                let (node, list_style) = &children[index];
                let Some(render_id) = tree.element_render_node(node.id) else {
                    continue;
                };
                let PostRef::Section(section_id) = tree.node(render_id).post_ref() else {
                    continue;
                };
                if fresh.contains(&section_id) {
                    continue;
                }
                let before = post.previous_section(section_id);
                let section = parse_one(&parser, post, before, *list_style, node)?;
                if post.replace_section_content(section_id, section).is_err() {
                    panic!(
                        "invariant violation: cursor section {section_id:?} left the post mid-pass"
                    );
                }
                reparsed += 1;
            }
        }
    }

    // An emptied surface still yields a valid document: one empty paragraph
    if sections_in_dom.is_empty() {
        let section_id = post.append_section(Section::paragraph());
        let render_id = tree.build_render_node(PostRef::Section(section_id));
        tree.insert_after(render_id, previous_render);
        log::debug!("surface emptied the post, restoring the empty paragraph");
    }

    // Step 4: patch the surface from the render tree
    let patches = renderer::render_pass(post, tree);

    log::debug!(
        "reconciled: {matched} matched, {} new, {} removed, {reparsed} reparsed",
        fresh.len(),
        missing.len(),
    );
    Ok(patches)
}

/// Parse one effective child, honoring the list-style context of its
/// container when it has one
fn parse_one(
    parser: &SurfaceParser<'_>,
    post: &Post,
    previous: Option<SectionId>,
    list_style: Option<ListStyle>,
    node: &SurfaceNode,
) -> Result<Section, CardError> {
    match list_style {
        Some(style) => Ok(parser.parse_list_item(style, node)),
        None => {
            let previous_section = previous.and_then(|id| post.section(id)).cloned();
            parser.parse_section(previous_section.as_ref(), node)
        }
    }
}

/// The surface children the diff walks: top-level children, with list
/// containers looked through so each list item is its own block
///
/// Whitespace-only text nodes between blocks are layout noise and are
/// skipped, as are non-item children inside list containers.
pub(crate) fn effective_children(root: &SurfaceNode) -> Vec<(&SurfaceNode, Option<ListStyle>)> {
    let mut out = Vec::new();
    for child in root.children() {
        if let SurfaceKind::Text(text) = &child.kind {
            if text.trim().is_empty() {
                continue;
            }
        }
        match child.tag() {
            Some("ul") => collect_items(child, ListStyle::Unordered, &mut out),
            Some("ol") => collect_items(child, ListStyle::Ordered, &mut out),
            _ => out.push((child, None)),
        }
    }
    out
}

fn collect_items<'a>(
    container: &'a SurfaceNode,
    style: ListStyle,
    out: &mut Vec<(&'a SurfaceNode, Option<ListStyle>)>,
) {
    for item in container.children() {
        if item.tag() == Some("li") {
            out.push((item, Some(style)));
        }
    }
}

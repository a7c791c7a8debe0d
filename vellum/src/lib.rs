//! vellum - Rich-text editing core
//!
//! An embeddable core for rich-text editing surfaces: a structured
//! document model (the post), a parser from live-surface snapshots into
//! that model, a versioned interchange codec, and a reconciler that keeps
//! model, render tree, and surface mutually consistent after uncontrolled
//! user edits.
//!
//! The host owns the live surface and its selection; the core reads
//! snapshots and hands back minimal patches. See [`EditSession`] for the
//! entry point.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cards;
pub mod config;
pub mod editor;
pub mod events;
pub mod interchange;
pub mod parser;
pub mod post;
pub mod render_node;
pub mod render_tree;
pub mod surface;

// Internal orchestration
mod reconciler;
mod renderer;

// Re-export the types a host touches day to day
pub use cards::{CardError, CardRegistry};
pub use config::{InitialContent, SessionConfig};
pub use editor::{EditSession, SessionError};
pub use events::{LifecycleEvent, SubscriberId};
pub use interchange::{decode, encode, InterchangeError, SerializedDoc, FORMAT_VERSION};
pub use parser::SurfaceParser;
pub use post::{Format, ListStyle, Marker, MarkupTag, Post, PostError, Section, SectionId};
pub use render_node::{PostRef, RenderNodeId, RenderState};
pub use render_tree::RenderTree;
pub use surface::{Selection, SurfaceId, SurfaceKind, SurfaceNode, SurfacePatch};

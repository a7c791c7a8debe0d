//! Error types for document model operations

use thiserror::Error;

/// Errors that can occur when mutating a post through its structural API
///
/// Both variants indicate caller bugs rather than bad user input, so they
/// are propagated and never silently swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    /// A section reference does not belong to this post
    #[error("section reference does not belong to this post")]
    InvalidReference,

    /// An index-addressed operation was given an index outside `[0, len)`
    #[error("section index {index} out of range for post of length {len}")]
    IndexOutOfRange {
        /// The offending index
        index: usize,
        /// The post's section count at the time of the call
        len: usize,
    },
}

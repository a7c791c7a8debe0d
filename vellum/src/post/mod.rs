//! Document model
//!
//! This module defines the post — the ordered tree of sections the editor
//! keeps synchronized with the surface — together with the section and
//! marker types it is built from. The model is pure data plus structural
//! operations; it knows nothing about rendering or the surface.

use hashbrown::HashMap;

// Submodules
mod error;
mod marker;
mod section;

// Re-export public types
pub use error::PostError;
pub use marker::{Format, Marker};
pub use section::{ListStyle, MarkupTag, Section};

/// Stable identity of a section within its owning post
///
/// Identity survives re-parses and position changes; it is the only form of
/// cross-structure reference (the render tree never holds an index or a
/// pointer into the post).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(u64);

/// The document: an ordered sequence of identified sections
///
/// Sibling navigation is answered from a position cache rather than stored
/// prev/next pointers, so splicing sections can never leave a dangling
/// back-reference.
#[derive(Debug)]
pub struct Post {
    /// Sections in document order, each with its stable id
    sections: Vec<(SectionId, Section)>,

    /// Position cache: section id to current index
    positions: HashMap<SectionId, usize>,

    /// Next id to hand out
    next_id: u64,
}

impl Post {
    /// Create a new post holding a single empty paragraph
    ///
    /// A post is never empty after initialization; the empty document is a
    /// document with one empty section.
    pub fn new() -> Self {
        let mut post = Self::empty();
        post.append_section(Section::paragraph());
        post
    }

    /// Create a post from parsed or decoded sections
    ///
    /// An empty input produces the canonical empty document (one empty
    /// paragraph).
    pub fn from_sections(sections: Vec<Section>) -> Self {
        let mut post = Self::empty();
        for section in sections {
            post.append_section(section);
        }
        if post.sections.is_empty() {
            post.append_section(Section::paragraph());
        }
        post
    }

    fn empty() -> Self {
        Self {
            sections: Vec::new(),
            positions: HashMap::new(),
            next_id: 0,
        }
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the post holds no sections
    ///
    /// Only transiently true mid-mutation; the editing session restores the
    /// one-empty-paragraph invariant at every pass boundary.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterate sections in document order
    pub fn iter(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.sections.iter().map(|(id, section)| (*id, section))
    }

    /// Look up a section by id
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.positions
            .get(&id)
            .map(|&index| &self.sections[index].1)
    }

    /// Look up a section by position
    pub fn section_at(&self, index: usize) -> Option<(SectionId, &Section)> {
        self.sections
            .get(index)
            .map(|(id, section)| (*id, section))
    }

    /// Current position of a section, if it belongs to this post
    pub fn position_of(&self, id: SectionId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Insert a section after `after`; `None` prepends
    ///
    /// # Parameters
    /// * `section` - The section to insert
    /// * `after` - Reference section, or `None` to insert at the front
    ///
    /// # Returns
    /// * `Ok(SectionId)` - The id assigned to the inserted section
    /// * `Err(PostError::InvalidReference)` - `after` is not a member
    pub fn insert_section_after(
        &mut self,
        section: Section,
        after: Option<SectionId>,
    ) -> Result<SectionId, PostError> {
        let index = match after {
            Some(after_id) => {
                let position = self
                    .position_of(after_id)
                    .ok_or(PostError::InvalidReference)?;
                position + 1
            }
            None => 0,
        };

        let id = self.allocate_id();
        self.sections.insert(index, (id, section));
        self.refresh_positions(index);
        Ok(id)
    }

    /// Append a section at the end
    pub fn append_section(&mut self, section: Section) -> SectionId {
        let id = self.allocate_id();
        self.sections.push((id, section));
        self.positions.insert(id, self.sections.len() - 1);
        id
    }

    /// Detach a section by id
    ///
    /// # Returns
    /// * `Ok(Section)` - The detached section
    /// * `Err(PostError::InvalidReference)` - `id` is not a member
    pub fn remove_section(&mut self, id: SectionId) -> Result<Section, PostError> {
        let index = self.position_of(id).ok_or(PostError::InvalidReference)?;
        let (_, section) = self.sections.remove(index);
        self.positions.remove(&id);
        self.refresh_positions(index);
        Ok(section)
    }

    /// Replace the section at `index`, assigning a fresh identity
    ///
    /// # Returns
    /// * `Ok(SectionId)` - The id of the replacement section
    /// * `Err(PostError::IndexOutOfRange)` - `index` outside `[0, len)`
    pub fn replace_section_at(
        &mut self,
        index: usize,
        section: Section,
    ) -> Result<SectionId, PostError> {
        if index >= self.sections.len() {
            return Err(PostError::IndexOutOfRange {
                index,
                len: self.sections.len(),
            });
        }
        let old_id = self.sections[index].0;
        self.positions.remove(&old_id);

        let id = self.allocate_id();
        self.sections[index] = (id, section);
        self.positions.insert(id, index);
        Ok(id)
    }

    /// Detach the section at `index`
    pub fn remove_section_at(&mut self, index: usize) -> Result<Section, PostError> {
        if index >= self.sections.len() {
            return Err(PostError::IndexOutOfRange {
                index,
                len: self.sections.len(),
            });
        }
        let (id, section) = self.sections.remove(index);
        self.positions.remove(&id);
        self.refresh_positions(index);
        Ok(section)
    }

    /// Replace a section's content in place, keeping its identity
    ///
    /// This is the re-parse path: in-place surface edits rebuild a
    /// section's markers without disturbing its id or position.
    pub fn replace_section_content(
        &mut self,
        id: SectionId,
        section: Section,
    ) -> Result<(), PostError> {
        let index = self.position_of(id).ok_or(PostError::InvalidReference)?;
        self.sections[index].1 = section;
        Ok(())
    }

    /// The section before `id`, or `None` at the front (or for non-members)
    pub fn previous_section(&self, id: SectionId) -> Option<SectionId> {
        let index = self.position_of(id)?;
        if index == 0 {
            None
        } else {
            Some(self.sections[index - 1].0)
        }
    }

    /// The section after `id`, or `None` at the end (or for non-members)
    pub fn next_section(&self, id: SectionId) -> Option<SectionId> {
        let index = self.position_of(id)?;
        self.sections.get(index + 1).map(|(next_id, _)| *next_id)
    }

    /// Plain text of the whole post, one line per section
    pub fn plain_text(&self) -> String {
        self.sections
            .iter()
            .map(|(_, section)| section.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Total word count across all sections
    pub fn word_count(&self) -> usize {
        self.sections
            .iter()
            .map(|(_, section)| section.plain_text().split_whitespace().count())
            .sum()
    }

    fn allocate_id(&mut self) -> SectionId {
        let id = SectionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Rebuild the position cache from `from` to the end
    fn refresh_positions(&mut self, from: usize) {
        for (index, (id, _)) in self.sections.iter().enumerate().skip(from) {
            self.positions.insert(*id, index);
        }
    }
}

impl Default for Post {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_holds_one_empty_paragraph() {
        // Arrange + Act: a fresh post
        let post = Post::new();

        // Assert: exactly one empty paragraph section
        assert_eq!(post.len(), 1);
        let (_, section) = post.section_at(0).unwrap();
        assert_eq!(section, &Section::paragraph());
    }

    #[test]
    fn test_from_sections_of_empty_input_is_the_empty_document() {
        // Act: build from nothing
        let post = Post::from_sections(Vec::new());

        // Assert: canonical empty document
        assert_eq!(post.len(), 1);
        assert_eq!(post.section_at(0).unwrap().1, &Section::paragraph());
    }

    #[test]
    fn test_insert_after_none_prepends() {
        // Arrange: a post with one section
        let mut post = Post::from_sections(vec![Section::paragraph_with_text("second")]);

        // Act: insert with no reference section
        let id = post
            .insert_section_after(Section::paragraph_with_text("first"), None)
            .unwrap();

        // Assert: inserted at the front, cache consistent
        assert_eq!(post.position_of(id), Some(0));
        assert_eq!(post.section_at(0).unwrap().1.plain_text(), "first");
        assert_eq!(post.section_at(1).unwrap().1.plain_text(), "second");
    }

    #[test]
    fn test_insert_after_member_splices_behind_it() {
        // Arrange: two sections
        let mut post = Post::from_sections(vec![
            Section::paragraph_with_text("a"),
            Section::paragraph_with_text("c"),
        ]);
        let (a_id, _) = post.section_at(0).unwrap();

        // Act: insert between them
        let b_id = post
            .insert_section_after(Section::paragraph_with_text("b"), Some(a_id))
            .unwrap();

        // Assert: order is a, b, c
        assert_eq!(post.position_of(b_id), Some(1));
        assert_eq!(post.plain_text(), "a\nb\nc");
    }

    #[test]
    fn test_insert_after_foreign_reference_fails() {
        // Arrange: a section id minted by a different post
        let mut other = Post::new();
        let foreign = other
            .insert_section_after(Section::paragraph(), None)
            .unwrap();

        let mut post = Post::new();

        // Act: insert after a non-member reference
        let result = post.insert_section_after(Section::paragraph(), Some(foreign));

        // Assert: rejected, post unchanged
        assert_eq!(result, Err(PostError::InvalidReference));
        assert_eq!(post.len(), 1);
    }

    #[test]
    fn test_remove_section_detaches_and_reindexes() {
        // Arrange: three sections
        let mut post = Post::from_sections(vec![
            Section::paragraph_with_text("a"),
            Section::paragraph_with_text("b"),
            Section::paragraph_with_text("c"),
        ]);
        let (b_id, _) = post.section_at(1).unwrap();
        let (c_id, _) = post.section_at(2).unwrap();

        // Act: remove the middle one
        let removed = post.remove_section(b_id).unwrap();

        // Assert: detached section returned, positions shifted
        assert_eq!(removed.plain_text(), "b");
        assert_eq!(post.len(), 2);
        assert_eq!(post.position_of(c_id), Some(1));
        assert_eq!(post.remove_section(b_id), Err(PostError::InvalidReference));
    }

    #[test]
    fn test_index_addressed_operations_check_bounds() {
        // Arrange: one section
        let mut post = Post::new();

        // Act + Assert: out-of-range indices are rejected with context
        assert_eq!(
            post.remove_section_at(1),
            Err(PostError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            post.replace_section_at(5, Section::paragraph()),
            Err(PostError::IndexOutOfRange { index: 5, len: 1 })
        );
    }

    #[test]
    fn test_replace_section_at_assigns_fresh_identity() {
        // Arrange: one section
        let mut post = Post::new();
        let (old_id, _) = post.section_at(0).unwrap();

        // Act: replace it
        let new_id = post
            .replace_section_at(0, Section::paragraph_with_text("x"))
            .unwrap();

        // Assert: identity changed, old id no longer resolves
        assert_ne!(old_id, new_id);
        assert!(post.section(old_id).is_none());
        assert_eq!(post.section(new_id).unwrap().plain_text(), "x");
    }

    #[test]
    fn test_replace_section_content_keeps_identity_and_position() {
        // Arrange: two sections
        let mut post = Post::from_sections(vec![
            Section::paragraph_with_text("a"),
            Section::paragraph_with_text("b"),
        ]);
        let (b_id, _) = post.section_at(1).unwrap();

        // Act: rebuild the second section's content in place
        post.replace_section_content(b_id, Section::paragraph_with_text("b!"))
            .unwrap();

        // Assert: same id, same position, new content
        assert_eq!(post.position_of(b_id), Some(1));
        assert_eq!(post.section(b_id).unwrap().plain_text(), "b!");
    }

    #[test]
    fn test_sibling_navigation_at_the_ends() {
        // Arrange: three sections
        let mut post = Post::from_sections(vec![
            Section::paragraph_with_text("a"),
            Section::paragraph_with_text("b"),
            Section::paragraph_with_text("c"),
        ]);
        let (a_id, _) = post.section_at(0).unwrap();
        let (b_id, _) = post.section_at(1).unwrap();
        let (c_id, _) = post.section_at(2).unwrap();

        // Assert: navigation is derived from position
        assert_eq!(post.previous_section(a_id), None);
        assert_eq!(post.next_section(a_id), Some(b_id));
        assert_eq!(post.previous_section(c_id), Some(b_id));
        assert_eq!(post.next_section(c_id), None);

        // Act: splice out the middle and navigate again
        post.remove_section(b_id).unwrap();

        // Assert: no dangling neighbor references
        assert_eq!(post.next_section(a_id), Some(c_id));
        assert_eq!(post.previous_section(c_id), Some(a_id));
    }

    #[test]
    fn test_word_count_spans_sections() {
        // Arrange: mixed content
        let post = Post::from_sections(vec![
            Section::paragraph_with_text("Hello world"),
            Section::Image {
                src: "x.png".to_string(),
                alt: Some("a small cat".to_string()),
            },
        ]);

        // Assert: five words across both sections
        assert_eq!(post.word_count(), 5);
    }
}

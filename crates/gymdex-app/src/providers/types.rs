//! Shared provider types

use crate::data::types::Exercise;

/// One page of a catalog listing
#[derive(Debug, Clone)]
pub struct Page {
    /// Exercises in this page
    pub exercises: Vec<Exercise>,
    /// Whether more results may be available beyond this page.
    /// The upstream API reports no totals; paging stops at the first
    /// empty page.
    pub has_more: bool,
}

impl Page {
    /// Build a page from fetched exercises
    pub fn new(exercises: Vec<Exercise>) -> Self {
        Self {
            has_more: !exercises.is_empty(),
            exercises,
        }
    }

    /// Create an empty page
    pub fn empty() -> Self {
        Self {
            exercises: Vec::new(),
            has_more: false,
        }
    }
}

//! Exercise provider trait
//!
//! Defines the interface that exercise catalog providers must implement.

use crate::error::Result;
use crate::data::types::Exercise;

use super::types::Page;

/// A source of exercise catalog data
///
/// Implementations provide paging, taxonomy filtering, lookup, and search
/// for a specific catalog service.
pub trait ExerciseProvider: Send + Sync {
    /// Display name for the provider (e.g., "ExerciseDB")
    fn name(&self) -> &'static str;

    /// Machine-readable identifier (e.g., "exercisedb")
    fn id(&self) -> &'static str;

    /// List exercises, unfiltered
    fn list(&self, limit: usize, offset: usize) -> Result<Page>;

    /// List exercises for a body part
    fn by_body_part(&self, body_part: &str, limit: usize, offset: usize) -> Result<Page>;

    /// List exercises for a target muscle
    fn by_target(&self, target: &str, limit: usize, offset: usize) -> Result<Page>;

    /// List exercises for an equipment kind
    fn by_equipment(&self, equipment: &str, limit: usize, offset: usize) -> Result<Page>;

    /// Look up a single exercise by its catalog ID
    fn get_exercise(&self, id: &str) -> Result<Option<Exercise>>;

    /// The body-part taxonomy vocabulary
    fn body_parts(&self) -> Result<Vec<String>>;

    /// The target-muscle taxonomy vocabulary
    fn targets(&self) -> Result<Vec<String>>;

    /// The equipment taxonomy vocabulary
    fn equipments(&self) -> Result<Vec<String>>;

    /// Free-text search across name and taxonomy fields
    fn search(&self, query: &str, limit: usize, offset: usize) -> Result<Page>;
}

//! Exercise catalog providers
//!
//! Sources of exercise listings (ExerciseDB today).

pub mod exercisedb;
pub mod traits;
pub mod types;

// Re-exports
pub use exercisedb::ExerciseDbProvider;
pub use traits::ExerciseProvider;
pub use types::Page;

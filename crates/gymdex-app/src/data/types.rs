//! Common data types for persistence
//!
//! Shared types used across the data module.

use serde::{Deserialize, Serialize};

// =============================================================================
// HasGif - Trait for types with a cacheable demonstration GIF
// =============================================================================

/// Trait for types that carry a cacheable demonstration GIF
///
/// Gives the media cache a uniform interface over anything that points at
/// an animation (catalog records, favorites, search hits).
pub trait HasGif {
    /// Cache key for this item's GIF (typically the exercise ID)
    fn gif_cache_key(&self) -> String;

    /// URL to fetch the GIF from (if available)
    fn gif_url(&self) -> Option<&str>;
}

// =============================================================================
// Exercise - Catalog record
// =============================================================================

/// An exercise from the catalog
///
/// Immutable once fetched; identity is the stable `id` string. Field names
/// serialize in camelCase to match both the upstream API wire format and
/// the persisted favorites file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Stable catalog identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Body part taxonomy value (e.g. "chest", "lower legs")
    #[serde(default)]
    pub body_part: String,
    /// Target muscle taxonomy value
    #[serde(default)]
    pub target: String,
    /// Equipment taxonomy value
    #[serde(default)]
    pub equipment: String,
    /// Demonstration GIF URL
    #[serde(default)]
    pub gif_url: String,
}

impl Exercise {
    /// Create an exercise with minimal info
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            body_part: String::new(),
            target: String::new(),
            equipment: String::new(),
            gif_url: String::new(),
        }
    }

    /// Set the taxonomy fields
    pub fn with_taxonomy(
        mut self,
        body_part: impl Into<String>,
        target: impl Into<String>,
        equipment: impl Into<String>,
    ) -> Self {
        self.body_part = body_part.into();
        self.target = target.into();
        self.equipment = equipment.into();
        self
    }

    /// Set the demonstration GIF URL
    pub fn with_gif(mut self, gif_url: impl Into<String>) -> Self {
        self.gif_url = gif_url.into();
        self
    }
}

impl HasGif for Exercise {
    fn gif_cache_key(&self) -> String {
        self.id.clone()
    }

    fn gif_url(&self) -> Option<&str> {
        if self.gif_url.is_empty() {
            None
        } else {
            Some(&self.gif_url)
        }
    }
}

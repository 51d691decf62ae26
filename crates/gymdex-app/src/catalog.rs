//! Catalog browsing state
//!
//! Effective filter derivation, page accumulation, the auto-load cap, and
//! stale-response discarding for the exercise list view. The feed owns no
//! I/O: it issues `PageRequest`s, something else (the frontend's worker
//! thread) executes them against a provider, and the outcome comes back
//! through `apply`.

use crate::data::types::Exercise;
use crate::error::Result;
use crate::providers::{ExerciseProvider, Page};

// =============================================================================
// Filter
// =============================================================================

/// The effective catalog filter
///
/// At most one dimension is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Free-text search
    Search(String),
    /// Body-part taxonomy filter
    BodyPart(String),
    /// Target-muscle taxonomy filter
    Target(String),
    /// Equipment taxonomy filter
    Equipment(String),
    /// Unfiltered listing
    All,
}

impl Filter {
    /// Derive the effective filter from independent parameters.
    ///
    /// Precedence: search > body part > target > equipment > unfiltered.
    /// Blank values count as absent.
    pub fn from_params(
        search: Option<&str>,
        body_part: Option<&str>,
        target: Option<&str>,
        equipment: Option<&str>,
    ) -> Self {
        fn present(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|s| !s.is_empty())
        }

        if let Some(q) = present(search) {
            Filter::Search(q.to_string())
        } else if let Some(p) = present(body_part) {
            Filter::BodyPart(p.to_string())
        } else if let Some(t) = present(target) {
            Filter::Target(t.to_string())
        } else if let Some(e) = present(equipment) {
            Filter::Equipment(e.to_string())
        } else {
            Filter::All
        }
    }

    /// Fetch one page for this filter from the given provider
    pub fn fetch(&self, provider: &dyn ExerciseProvider, limit: usize, offset: usize) -> Result<Page> {
        match self {
            Filter::Search(q) => provider.search(q, limit, offset),
            Filter::BodyPart(p) => provider.by_body_part(p, limit, offset),
            Filter::Target(t) => provider.by_target(t, limit, offset),
            Filter::Equipment(e) => provider.by_equipment(e, limit, offset),
            Filter::All => provider.list(limit, offset),
        }
    }

    /// Human-readable heading for a list view
    pub fn title(&self) -> String {
        match self {
            Filter::Search(q) => format!("Results for \"{}\"", q),
            Filter::BodyPart(p) => format!("{} exercises", capitalize(p)),
            Filter::Target(t) => format!("{} exercises", capitalize(t)),
            Filter::Equipment(e) => format!("Exercises with {}", e),
            Filter::All => "Exercises".to_string(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// =============================================================================
// CatalogFeed
// =============================================================================

/// A page request issued by the feed
///
/// Carries the token that `apply` uses to discard responses from
/// superseded requests (a slow earlier response must not overwrite a
/// faster later one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub token: u64,
    pub filter: Filter,
    pub limit: usize,
    pub offset: usize,
}

/// Accumulated list-view state for the current filter
pub struct CatalogFeed {
    filter: Filter,
    exercises: Vec<Exercise>,
    page_size: usize,
    max_auto_loads: u32,
    auto_loads: u32,
    has_more: bool,
    next_offset: usize,
    latest_token: u64,
    in_flight: bool,
    error: Option<String>,
}

impl CatalogFeed {
    pub fn new(page_size: usize, max_auto_loads: u32) -> Self {
        Self {
            filter: Filter::All,
            exercises: Vec::new(),
            page_size,
            max_auto_loads,
            auto_loads: 0,
            has_more: true,
            next_offset: 0,
            latest_token: 0,
            in_flight: false,
            error: None,
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True once the auto-load budget for this filter session is spent
    /// while more pages remain; further pages need an explicit action.
    pub fn auto_load_exhausted(&self) -> bool {
        self.has_more && self.auto_loads >= self.max_auto_loads
    }

    /// Switch to a different filter and request its first page.
    ///
    /// Returns `None` when the filter is unchanged. Switching resets the
    /// accumulated exercises and the auto-load counter, and invalidates any
    /// in-flight request.
    pub fn set_filter(&mut self, filter: Filter) -> Option<PageRequest> {
        if filter == self.filter {
            return None;
        }
        self.filter = filter;
        Some(self.reload())
    }

    /// Reset the accumulation for the current filter and request page zero.
    /// Also serves as the retry affordance after a failed fetch.
    pub fn reload(&mut self) -> PageRequest {
        self.exercises.clear();
        self.auto_loads = 0;
        self.has_more = true;
        self.next_offset = 0;
        self.error = None;
        self.issue()
    }

    /// Request the next page on behalf of the scroll-into-view behavior.
    ///
    /// Subject to the auto-load cap; returns `None` when the cap is spent,
    /// a request is already in flight, or there is nothing more to load.
    pub fn request_auto(&mut self) -> Option<PageRequest> {
        if !self.has_more || self.in_flight || self.auto_loads >= self.max_auto_loads {
            return None;
        }
        self.auto_loads += 1;
        Some(self.issue())
    }

    /// Request the next page on behalf of an explicit user action.
    /// Never capped.
    pub fn request_more(&mut self) -> Option<PageRequest> {
        if !self.has_more || self.in_flight {
            return None;
        }
        Some(self.issue())
    }

    fn issue(&mut self) -> PageRequest {
        self.latest_token += 1;
        self.in_flight = true;
        PageRequest {
            token: self.latest_token,
            filter: self.filter.clone(),
            limit: self.page_size,
            offset: self.next_offset,
        }
    }

    /// Feed the outcome of an executed request back into the state.
    ///
    /// Responses whose token is not the latest issued request are dropped
    /// (the request was superseded by a filter change or reload); returns
    /// whether the outcome was accepted.
    pub fn apply(&mut self, token: u64, outcome: Result<Page>) -> bool {
        if token != self.latest_token {
            return false;
        }
        self.in_flight = false;

        match outcome {
            Ok(page) => {
                self.has_more = page.has_more;
                self.next_offset += self.page_size;
                self.exercises.extend(page.exercises);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
        true
    }
}

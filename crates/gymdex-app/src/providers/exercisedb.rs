//! ExerciseDB API provider
//!
//! Implementation of `ExerciseProvider` for the ExerciseDB catalog served
//! through RapidAPI (<https://exercisedb.p.rapidapi.com>).

use crate::config::providers::EXERCISEDB_DEFAULT_SERVER;
use crate::data::types::Exercise;
use crate::error::Result;
use crate::network::HttpClient;

use super::traits::ExerciseProvider;
use super::types::Page;

use serde::Deserialize;
use std::sync::{Arc, Mutex};

// =============================================================================
// Internal API response types (serde)
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DbExercise {
    id: String,
    name: String,
    #[serde(default)]
    body_part: String,
    #[serde(default)]
    target: String,
    #[serde(default)]
    equipment: String,
    #[serde(default)]
    gif_url: String,
}

impl From<DbExercise> for Exercise {
    fn from(db: DbExercise) -> Self {
        Exercise::new(db.id, db.name)
            .with_taxonomy(db.body_part, db.target, db.equipment)
            .with_gif(db.gif_url)
    }
}

// =============================================================================
// ExerciseDbProvider
// =============================================================================

/// ExerciseDB catalog provider
///
/// The upstream API has no search endpoint, so `search` pulls the full
/// catalog once (limit=0 returns everything), keeps it around, and filters
/// client-side.
pub struct ExerciseDbProvider {
    client: HttpClient,
    base_url: String,
    /// Full catalog, fetched lazily for client-side search
    search_index: Mutex<Option<Arc<Vec<Exercise>>>>,
}

impl ExerciseDbProvider {
    /// Create a provider against the default server
    pub fn new(api_key: &str, api_host: &str) -> Result<Self> {
        Self::with_base_url(EXERCISEDB_DEFAULT_SERVER, api_key, api_host)
    }

    /// Create a provider with a custom base URL (for testing or mirrors)
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: &str,
        api_host: &str,
    ) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(api_key, api_host)?,
            base_url: base_url.into(),
            search_index: Mutex::new(None),
        })
    }

    /// Build a full API URL from an endpoint path
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch one page from a listing endpoint
    fn fetch_page(&self, path: &str, limit: usize, offset: usize) -> Result<Page> {
        let url = self.url(&format!("{}?limit={}&offset={}", path, limit, offset));
        let rows: Vec<DbExercise> = self.client.get_json(&url)?;
        Ok(Page::new(rows.into_iter().map(Exercise::from).collect()))
    }

    /// Fetch a taxonomy vocabulary list
    fn fetch_taxonomy(&self, path: &str) -> Result<Vec<String>> {
        self.client.get_json(&self.url(path))
    }

    /// The full catalog, fetched once and kept for the provider's lifetime
    fn full_catalog(&self) -> Result<Arc<Vec<Exercise>>> {
        let mut index = self.search_index.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(all) = index.as_ref() {
            return Ok(Arc::clone(all));
        }

        // limit=0 asks the API for the entire catalog
        let rows: Vec<DbExercise> = self.client.get_json(&self.url("/exercises?limit=0"))?;
        let all: Arc<Vec<Exercise>> = Arc::new(rows.into_iter().map(Exercise::from).collect());
        *index = Some(Arc::clone(&all));
        Ok(all)
    }
}

impl ExerciseProvider for ExerciseDbProvider {
    fn name(&self) -> &'static str {
        "ExerciseDB"
    }

    fn id(&self) -> &'static str {
        "exercisedb"
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Page> {
        self.fetch_page("/exercises", limit, offset)
    }

    fn by_body_part(&self, body_part: &str, limit: usize, offset: usize) -> Result<Page> {
        let path = format!("/exercises/bodyPart/{}", encode_segment(body_part));
        self.fetch_page(&path, limit, offset)
    }

    fn by_target(&self, target: &str, limit: usize, offset: usize) -> Result<Page> {
        let path = format!("/exercises/target/{}", encode_segment(target));
        self.fetch_page(&path, limit, offset)
    }

    fn by_equipment(&self, equipment: &str, limit: usize, offset: usize) -> Result<Page> {
        let path = format!("/exercises/equipment/{}", encode_segment(equipment));
        self.fetch_page(&path, limit, offset)
    }

    fn get_exercise(&self, id: &str) -> Result<Option<Exercise>> {
        if id.is_empty() {
            return Ok(None);
        }
        let url = self.url(&format!("/exercises/exercise/{}", encode_segment(id)));
        let row: Option<DbExercise> = self.client.get_json_opt(&url)?;
        Ok(row.map(Exercise::from))
    }

    fn body_parts(&self) -> Result<Vec<String>> {
        self.fetch_taxonomy("/exercises/bodyPartList")
    }

    fn targets(&self) -> Result<Vec<String>> {
        self.fetch_taxonomy("/exercises/targetList")
    }

    fn equipments(&self) -> Result<Vec<String>> {
        self.fetch_taxonomy("/exercises/equipmentList")
    }

    fn search(&self, query: &str, limit: usize, offset: usize) -> Result<Page> {
        let all = self.full_catalog()?;
        let needle = query.to_lowercase();

        let window: Vec<Exercise> = all
            .iter()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle)
                    || e.body_part.to_lowercase().contains(&needle)
                    || e.target.to_lowercase().contains(&needle)
                    || e.equipment.to_lowercase().contains(&needle)
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(Page::new(window))
    }
}

/// Percent-encode a path segment (taxonomy values contain spaces)
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

//! Application settings management
//!
//! User preferences and API credentials.

use crate::config::providers::{EXERCISEDB_DEFAULT_HOST, EXERCISEDB_DEFAULT_SERVER};
use crate::config::ui::{MAX_AUTO_LOADS, PAGE_SIZE};
use crate::data::storage;
use crate::data::types::Exercise;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Settings data file name
const SETTINGS_FILE: &str = "settings.json";

/// Settings file format version for migrations
const SETTINGS_VERSION: u32 = 1;

/// Environment variable that overrides the stored API key
pub const API_KEY_ENV: &str = "GYMDEX_API_KEY";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// File format version
    #[serde(default = "default_version")]
    pub version: u32,

    // === API ===
    /// RapidAPI key; the GYMDEX_API_KEY environment variable takes
    /// precedence when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// RapidAPI host header value
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// API server base URL
    #[serde(default = "default_api_server")]
    pub api_server: String,

    // === Browsing ===
    /// Exercises fetched per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Automatic load-more actions per filter session
    #[serde(default = "default_max_auto_loads")]
    pub max_auto_loads: u32,

    /// Last exercise opened in the detail view (for resume)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_viewed: Option<Exercise>,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_api_host() -> String {
    EXERCISEDB_DEFAULT_HOST.to_string()
}

fn default_api_server() -> String {
    EXERCISEDB_DEFAULT_SERVER.to_string()
}

fn default_page_size() -> usize {
    PAGE_SIZE
}

fn default_max_auto_loads() -> u32 {
    MAX_AUTO_LOADS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            api_key: None,
            api_host: default_api_host(),
            api_server: default_api_server(),
            page_size: default_page_size(),
            max_auto_loads: default_max_auto_loads(),
            last_viewed: None,
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from the default storage location
    pub fn load() -> Result<Self> {
        match storage::load::<Settings>(SETTINGS_FILE)? {
            Some(settings) => Ok(settings),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from a specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        match storage::load_from::<Settings>(path)? {
            Some(settings) => Ok(settings),
            None => Ok(Self::default()),
        }
    }

    /// Save settings to the default storage location
    pub fn save(&self) -> Result<()> {
        storage::save(SETTINGS_FILE, self)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        storage::save_to(path, self)
    }

    /// The API key to use: environment override first, stored key second
    pub fn effective_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }
}

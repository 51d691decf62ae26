//! Media cache for exercise GIFs
//!
//! Caches demonstration GIFs locally using the exercise ID as filename.
//! Uses the system cache directory for proper cache semantics.

use crate::config::app::NAME;
use crate::data::types::HasGif;
use crate::error::{AppError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Supported media extensions (in order of preference for lookup)
const MEDIA_EXTENSIONS: &[&str] = &["gif", "png", "jpg", "jpeg", "webp"];

/// Get the application cache directory path
///
/// Uses the system cache directory:
/// - Linux: `~/.cache/gymdex/`
/// - macOS: `~/Library/Caches/gymdex/`
/// - Windows: `C:\Users\<User>\AppData\Local\gymdex\cache\`
pub fn cache_dir() -> Result<PathBuf> {
    dirs::cache_dir().map(|p| p.join(NAME)).ok_or_else(|| {
        AppError::Config(
            "Could not determine cache directory. HOME environment variable may not be set."
                .to_string(),
        )
    })
}

/// Ensure the cache directory exists
pub fn ensure_cache_dir() -> Result<PathBuf> {
    let dir = cache_dir()?;
    fs::create_dir_all(&dir)
        .map_err(|e| AppError::Config(format!("Failed to create cache directory {:?}: {}", dir, e)))?;
    Ok(dir)
}

/// Media cache manager for exercise GIFs
pub struct MediaCache {
    cache_dir: PathBuf,
}

impl MediaCache {
    /// Create a new media cache using the default cache directory
    pub fn new() -> Result<Self> {
        let cache_dir = ensure_cache_dir()?;
        Ok(Self { cache_dir })
    }

    /// Create a new media cache with a custom directory (for testing)
    pub fn with_dir(cache_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&cache_dir).map_err(|e| {
            AppError::Config(format!(
                "Failed to create cache directory {:?}: {}",
                cache_dir, e
            ))
        })?;
        Ok(Self { cache_dir })
    }

    /// Get the cache directory path
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Check if a cached file exists for the given ID
    pub fn has(&self, id: &str) -> bool {
        self.find_cached_path(id).is_some()
    }

    /// Get the path to a cached file (if it exists)
    ///
    /// Searches for the file with any supported extension.
    pub fn get_path(&self, id: &str) -> Option<PathBuf> {
        self.find_cached_path(id)
    }

    /// Load cached media data
    pub fn get(&self, id: &str) -> Option<Vec<u8>> {
        let path = self.find_cached_path(id)?;
        fs::read(&path).ok()
    }

    /// Save media data to cache
    ///
    /// The extension is determined from the content or the URL hint.
    /// Falls back to "gif" (the catalog's format) if it cannot be determined.
    pub fn put(&self, id: &str, data: &[u8], url_or_hint: Option<&str>) -> Result<PathBuf> {
        let extension = determine_extension(data, url_or_hint);
        let path = self.cache_dir.join(format!("{}.{}", id, extension));

        // Remove any existing cached file with a different extension
        self.delete(id);

        fs::write(&path, data)
            .map_err(|e| AppError::Config(format!("Failed to write cached media {:?}: {}", path, e)))?;

        Ok(path)
    }

    /// Delete the cached file for the given ID (any extension)
    pub fn delete(&self, id: &str) {
        if let Some(path) = self.find_cached_path(id) {
            let _ = fs::remove_file(path);
        }
    }

    // =========================================================================
    // Generic methods for HasGif types
    // =========================================================================

    /// Check if a cached GIF exists for the given item
    pub fn has_gif<T: HasGif>(&self, item: &T) -> bool {
        self.has(&item.gif_cache_key())
    }

    /// Get the path to a cached GIF (if it exists)
    pub fn get_gif_path<T: HasGif>(&self, item: &T) -> Option<PathBuf> {
        self.get_path(&item.gif_cache_key())
    }

    /// Load cached GIF data for the given item
    pub fn get_gif<T: HasGif>(&self, item: &T) -> Option<Vec<u8>> {
        self.get(&item.gif_cache_key())
    }

    /// Save GIF data to cache for the given item
    ///
    /// Uses the item's gif_url as a hint for the file extension.
    pub fn put_gif<T: HasGif>(&self, item: &T, data: &[u8]) -> Result<PathBuf> {
        self.put(&item.gif_cache_key(), data, item.gif_url())
    }

    /// Delete the cached GIF for the given item
    pub fn delete_gif<T: HasGif>(&self, item: &T) {
        self.delete(&item.gif_cache_key())
    }

    // =========================================================================
    // Maintenance operations
    // =========================================================================

    /// Remove cached files that don't belong to any of the provided IDs.
    /// Returns the number of files removed.
    pub fn cleanup_orphaned(&self, valid_ids: &HashSet<String>) -> usize {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        if !valid_ids.contains(stem) && fs::remove_file(&path).is_ok() {
                            removed += 1;
                        }
                    }
                }
            }
        }

        removed
    }

    /// Get all cached IDs
    pub fn list_ids(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        entries
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                let ext = path.extension()?.to_str()?;
                if MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                    path.file_stem()?.to_str().map(String::from)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Get total cache size in bytes
    pub fn total_size(&self) -> u64 {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        entries
            .flatten()
            .filter_map(|entry| entry.metadata().ok())
            .map(|m| m.len())
            .sum()
    }

    /// Clear all cached files
    pub fn clear(&self) -> Result<usize> {
        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| AppError::Config(format!("Failed to read cache directory: {}", e)))?;

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Find the cached file path for an ID (checking all extensions)
    fn find_cached_path(&self, id: &str) -> Option<PathBuf> {
        for ext in MEDIA_EXTENSIONS {
            let path = self.cache_dir.join(format!("{}.{}", id, ext));
            if path.exists() {
                return Some(path);
            }
        }
        None
    }
}

/// Determine the best extension for the media data
fn determine_extension(data: &[u8], url_or_hint: Option<&str>) -> &'static str {
    if let Some(ext) = detect_format_from_magic(data) {
        return ext;
    }

    if let Some(url) = url_or_hint {
        if let Some(ext) = extract_extension_from_url(url) {
            return ext;
        }
    }

    "gif"
}

/// Detect media format from magic bytes
fn detect_format_from_magic(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("gif");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpg");
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("webp");
    }

    None
}

/// Extract extension from a URL, ignoring query string and fragment
fn extract_extension_from_url(url: &str) -> Option<&'static str> {
    let path = url.split('?').next()?.split('#').next()?;
    let filename = path.rsplit('/').next()?;
    let ext = filename.rsplit('.').next()?.to_lowercase();

    match ext.as_str() {
        "gif" => Some("gif"),
        "png" => Some("png"),
        "jpg" | "jpeg" => Some("jpg"),
        "webp" => Some("webp"),
        _ => None,
    }
}

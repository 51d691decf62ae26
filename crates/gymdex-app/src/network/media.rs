//! GIF fetching and caching service
//!
//! Unified interface for retrieving exercise demonstration GIFs,
//! handling both cache lookups and network fetching.

use crate::config::network::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, USER_AGENT};
use crate::data::cache::MediaCache;
use crate::data::types::HasGif;
use crate::error::{AppError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Service for fetching and caching exercise GIFs
///
/// Checks the cache first, fetches from the network when needed. The GIF
/// CDN needs no credentials, so this uses its own plain client rather than
/// the API one.
pub struct MediaService {
    cache: MediaCache,
    client: reqwest::blocking::Client,
}

impl MediaService {
    /// Create a media service with default settings
    pub fn new() -> Result<Self> {
        Self::with_cache(MediaCache::new()?)
    }

    /// Create a media service with a custom cache (for testing)
    pub fn with_cache(cache: MediaCache) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()
            .map_err(AppError::from)?;

        Ok(Self { cache, client })
    }

    /// Get access to the underlying cache
    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// Get GIF bytes for an item, fetching from the network if not cached
    ///
    /// Returns `None` if the item has no GIF URL, or the fetch fails and
    /// nothing is cached.
    pub fn get<T: HasGif>(&self, item: &T) -> Option<Vec<u8>> {
        if let Some(data) = self.cache.get_gif(item) {
            return Some(data);
        }

        let url = item.gif_url()?;
        let data = self.fetch_raw(url).ok()?;

        // Cache it (ignore errors - we still have the data)
        let _ = self.cache.put_gif(item, &data);

        Some(data)
    }

    /// Get GIF bytes only if already cached (no network request)
    pub fn get_cached<T: HasGif>(&self, item: &T) -> Option<Vec<u8>> {
        self.cache.get_gif(item)
    }

    /// Get the path to the cached GIF file (if cached)
    pub fn get_cached_path<T: HasGif>(&self, item: &T) -> Option<PathBuf> {
        self.cache.get_gif_path(item)
    }

    /// Check if a GIF is cached for the given item
    pub fn is_cached<T: HasGif>(&self, item: &T) -> bool {
        self.cache.has_gif(item)
    }

    /// Ensure a GIF is cached, downloading if necessary.
    /// Returns the cached file path.
    pub fn ensure_cached<T: HasGif>(&self, item: &T) -> Result<PathBuf> {
        if let Some(path) = self.cache.get_gif_path(item) {
            return Ok(path);
        }

        let url = item
            .gif_url()
            .ok_or_else(|| AppError::NotFound("Item has no GIF URL".to_string()))?;

        let data = self.fetch_raw(url)?;
        self.cache.put_gif(item, &data)
    }

    /// Prefetch GIFs for multiple items
    ///
    /// Downloads and caches GIFs that aren't already cached. Returns the
    /// number fetched. Blocking; call from a worker thread for background
    /// prefetching.
    pub fn prefetch<T: HasGif>(&self, items: &[T]) -> usize {
        let mut fetched = 0;

        for item in items {
            if item.gif_url().is_none() || self.cache.has_gif(item) {
                continue;
            }
            if self.ensure_cached(item).is_ok() {
                fetched += 1;
            }
        }

        fetched
    }

    /// Fetch media bytes from a URL without caching
    pub fn fetch_raw(&self, url: &str) -> Result<Vec<u8>> {
        if url.is_empty() {
            return Err(AppError::NotFound("Empty URL".to_string()));
        }

        let response = self.client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::Exercise;
    use std::env::temp_dir;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_cache() -> MediaCache {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = temp_dir().join(format!("gymdex_media_test_{}", id));
        let _ = std::fs::remove_dir_all(&dir);
        MediaCache::with_dir(dir).unwrap()
    }

    const GIF_DATA: &[u8] = b"GIF89a\x00\x00\x00\x00";

    #[test]
    fn test_service_creation() {
        let service = MediaService::with_cache(temp_cache()).unwrap();
        assert!(service.cache().dir().exists());
    }

    #[test]
    fn test_not_cached_initially() {
        let service = MediaService::with_cache(temp_cache()).unwrap();
        let exercise = Exercise::new("0001", "3/4 sit-up");

        assert!(!service.is_cached(&exercise));
        assert!(service.get_cached(&exercise).is_none());
        assert!(service.get_cached_path(&exercise).is_none());
    }

    #[test]
    fn test_manual_cache_then_get() {
        let service = MediaService::with_cache(temp_cache()).unwrap();
        let exercise = Exercise::new("0001", "3/4 sit-up")
            .with_gif("https://v2.exercisedb.io/image/0001.gif");

        service.cache().put_gif(&exercise, GIF_DATA).unwrap();

        assert!(service.is_cached(&exercise));
        assert_eq!(service.get_cached(&exercise).unwrap(), GIF_DATA);
        assert!(service
            .get_cached_path(&exercise)
            .unwrap()
            .to_string_lossy()
            .ends_with("0001.gif"));
    }

    #[test]
    fn test_ensure_cached_returns_existing_path() {
        let service = MediaService::with_cache(temp_cache()).unwrap();
        let exercise = Exercise::new("0001", "3/4 sit-up")
            .with_gif("https://v2.exercisedb.io/image/0001.gif");

        service.cache().put_gif(&exercise, GIF_DATA).unwrap();

        // Already cached: no network request happens
        let path = service.ensure_cached(&exercise).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_exercise_without_gif_url() {
        let service = MediaService::with_cache(temp_cache()).unwrap();
        let exercise = Exercise::new("0001", "3/4 sit-up");

        assert!(service.ensure_cached(&exercise).is_err());
        assert!(service.get(&exercise).is_none());
    }

    #[test]
    fn test_prefetch_skips_cached_and_urlless() {
        let service = MediaService::with_cache(temp_cache()).unwrap();

        let cached = Exercise::new("0001", "sit-up").with_gif("https://img/0001.gif");
        service.cache().put_gif(&cached, GIF_DATA).unwrap();
        let urlless = Exercise::new("0002", "side bend");

        let fetched = service.prefetch(&[cached, urlless]);
        assert_eq!(fetched, 0);
    }

    #[test]
    fn test_fetch_raw_empty_url() {
        let service = MediaService::with_cache(temp_cache()).unwrap();
        assert!(service.fetch_raw("").is_err());
    }
}

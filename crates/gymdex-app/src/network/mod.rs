//! Network operations
//!
//! HTTP client and the GIF fetch/cache service.

pub mod client;
pub mod media;

// Re-export commonly used types
pub use client::HttpClient;
pub use media::MediaService;

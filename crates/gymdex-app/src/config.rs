//! Configuration constants for gymdex app services

/// Application metadata
pub mod app {
    /// Application name (used for config directory, etc.)
    pub const NAME: &str = "gymdex";
}

/// Provider-related configuration
pub mod providers {
    /// Default ExerciseDB API server (RapidAPI gateway)
    pub const EXERCISEDB_DEFAULT_SERVER: &str = "https://exercisedb.p.rapidapi.com";

    /// RapidAPI host header matching the default server
    pub const EXERCISEDB_DEFAULT_HOST: &str = "exercisedb.p.rapidapi.com";
}

/// UI-related configuration
pub mod ui {
    /// Exercises fetched per page
    pub const PAGE_SIZE: usize = 12;

    /// Automatic load-more actions allowed per filter session.
    /// Beyond this the user has to ask for the next page explicitly.
    pub const MAX_AUTO_LOADS: u32 = 3;
}

/// Network configuration
pub mod network {
    /// User agent sent with every request
    pub const USER_AGENT: &str = concat!("gymdex/", env!("CARGO_PKG_VERSION"));

    /// TCP connect timeout
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Full-response read timeout
    pub const READ_TIMEOUT_SECS: u64 = 30;
}

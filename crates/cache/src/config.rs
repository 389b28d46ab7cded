//! Cache configuration.
//!
//! The cache has a single tunable: the ceiling on total resident bytes.
//! Configuration can be created programmatically or loaded from the
//! environment.

use thiserror::Error;

/// Default budget: 1 GiB of decoded resources.
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024 * 1024;

/// Configuration for the resource cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Ceiling on total resident bytes across all cached entries.
    pub max_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with a budget in megabytes.
    pub fn new(max_mb: u64) -> Self {
        Self {
            max_bytes: max_mb * 1024 * 1024,
        }
    }

    /// Sets the budget in megabytes.
    pub fn with_max_mb(mut self, mb: u64) -> Self {
        self.max_bytes = mb * 1024 * 1024;
        self
    }

    /// Sets the budget in bytes.
    pub fn with_max_bytes(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `IMAGE_VIEWER_CACHE_MAX_MB`: budget in MB (default: 1024)
    ///
    /// # Errors
    /// Returns an error if the variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("IMAGE_VIEWER_CACHE_MAX_MB") {
            config.max_bytes = val
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue("IMAGE_VIEWER_CACHE_MAX_MB".to_string()))?
                * 1024
                * 1024;
        }

        Ok(config)
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for environment variable {0}")]
    InvalidValue(String),
}

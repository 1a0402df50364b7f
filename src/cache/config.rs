//! Cache configuration.
//!
//! Controls the tagged CMS fetch cache and the rendered response cache.

use std::num::NonZeroUsize;

const DEFAULT_FETCH_LIMIT: usize = 64;
const DEFAULT_RESPONSE_LIMIT: usize = 64;
const DEFAULT_RESPONSE_BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Enable the tagged CMS fetch cache.
    pub enable_fetch_cache: bool,
    /// Enable the rendered response cache.
    pub enable_response_cache: bool,
    /// Maximum CMS response bodies kept.
    pub fetch_limit: usize,
    /// Maximum rendered responses kept.
    pub response_limit: usize,
    /// Responses larger than this are served but not stored.
    pub response_body_limit_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable_fetch_cache: true,
            enable_response_cache: true,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            response_limit: DEFAULT_RESPONSE_LIMIT,
            response_body_limit_bytes: DEFAULT_RESPONSE_BODY_LIMIT_BYTES,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enable_fetch_cache: settings.enable_fetch_cache,
            enable_response_cache: settings.enable_response_cache,
            fetch_limit: settings.fetch_limit.get(),
            response_limit: settings.response_limit.get(),
            response_body_limit_bytes: settings.response_body_limit_bytes,
        }
    }
}

impl CacheConfig {
    /// Returns true if any cache layer is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enable_fetch_cache || self.enable_response_cache
    }

    /// Returns the fetch limit as NonZeroUsize, clamping to 1 if zero.
    pub fn fetch_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.fetch_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the response limit as NonZeroUsize, clamping to 1 if zero.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

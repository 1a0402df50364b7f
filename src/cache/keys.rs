//! Cache key definitions.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Tag attached to every cached CMS response.
pub const CMS_TAG: &str = "microcms";

/// Response cache key: request path plus a hash of the raw query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseKey {
    pub path: String,
    pub query_hash: u64,
}

impl ResponseKey {
    pub fn new(path: impl Into<String>, query: &str) -> Self {
        Self {
            path: path.into(),
            query_hash: hash_query(query),
        }
    }
}

/// Unified cache key, used by the tag registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A CMS response identified by its request URL.
    Fetch(String),
    Response(ResponseKey),
}

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Hash a query string for response cache keys.
pub fn hash_query(query: &str) -> u64 {
    hash_value(&query)
}

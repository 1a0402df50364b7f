//! Bidirectional tag registry.
//!
//! Tracks which cache entries carry which tags so a tag can be invalidated
//! without knowing the URLs it covers.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

/// Tracks tag → cache_keys and cache_key → tags mappings.
pub struct TagRegistry {
    tag_to_keys: RwLock<HashMap<String, HashSet<CacheKey>>>,
    key_to_tags: RwLock<HashMap<CacheKey, HashSet<String>>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self {
            tag_to_keys: RwLock::new(HashMap::new()),
            key_to_tags: RwLock::new(HashMap::new()),
        }
    }

    /// Register a cache entry under the given tags, replacing earlier tags.
    pub fn register<I, S>(&self, cache_key: CacheKey, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: HashSet<String> = tags.into_iter().map(Into::into).collect();
        self.unregister(&cache_key);

        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "register.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "register.key_to_tags");

        for tag in &tags {
            t2k.entry(tag.clone())
                .or_default()
                .insert(cache_key.clone());
        }
        k2t.insert(cache_key, tags);
    }

    /// Get all cache keys carrying a tag.
    pub fn keys_for_tag(&self, tag: &str) -> HashSet<CacheKey> {
        rw_read(&self.tag_to_keys, SOURCE, "keys_for_tag")
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove a cache key and clean up tag mappings.
    ///
    /// Called when a cache entry is evicted or invalidated.
    pub fn unregister(&self, cache_key: &CacheKey) {
        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "unregister.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "unregister.key_to_tags");

        if let Some(tags) = k2t.remove(cache_key) {
            for tag in tags {
                if let Some(keys) = t2k.get_mut(&tag) {
                    keys.remove(cache_key);
                    if keys.is_empty() {
                        t2k.remove(&tag);
                    }
                }
            }
        }
    }

    /// Remove every mapping for a tag and return the keys that carried it.
    pub fn take_tag(&self, tag: &str) -> HashSet<CacheKey> {
        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "take_tag.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "take_tag.key_to_tags");

        let affected = t2k.remove(tag).unwrap_or_default();
        for cache_key in &affected {
            if let Some(tags) = k2t.get_mut(cache_key) {
                tags.remove(tag);
                if tags.is_empty() {
                    k2t.remove(cache_key);
                }
            }
        }

        affected
    }

    pub fn clear(&self) {
        rw_write(&self.tag_to_keys, SOURCE, "clear.tag_to_keys").clear();
        rw_write(&self.key_to_tags, SOURCE, "clear.key_to_tags").clear();
    }

    /// Number of tags currently tracked.
    pub fn tag_count(&self) -> usize {
        rw_read(&self.tag_to_keys, SOURCE, "tag_count").len()
    }

    /// Number of cache keys currently tracked.
    pub fn key_count(&self) -> usize {
        rw_read(&self.key_to_tags, SOURCE, "key_count").len()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

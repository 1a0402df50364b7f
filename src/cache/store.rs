//! Cache storage implementations.
//!
//! Fetch store: raw CMS response bodies keyed by request URL.
//! Response store: rendered HTTP responses keyed by path and query.

use std::sync::RwLock;

use bytes::Bytes;
use lru::LruCache;

use super::config::CacheConfig;
use super::keys::ResponseKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Raw CMS response bodies keyed by request URL.
pub struct FetchStore {
    bodies: RwLock<LruCache<String, Bytes>>,
}

impl FetchStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            bodies: RwLock::new(LruCache::new(config.fetch_limit_non_zero())),
        }
    }

    pub fn get(&self, url: &str) -> Option<Bytes> {
        rw_write(&self.bodies, SOURCE, "fetch_get").get(url).cloned()
    }

    /// Store a body, returning the URL evicted to make room, if any.
    pub fn set(&self, url: String, body: Bytes) -> Option<String> {
        rw_write(&self.bodies, SOURCE, "fetch_set")
            .push(url.clone(), body)
            .and_then(|(evicted, _)| (evicted != url).then_some(evicted))
    }

    pub fn invalidate(&self, url: &str) -> bool {
        rw_write(&self.bodies, SOURCE, "fetch_invalidate")
            .pop(url)
            .is_some()
    }

    pub fn invalidate_all(&self) {
        rw_write(&self.bodies, SOURCE, "fetch_invalidate_all").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.bodies, SOURCE, "fetch_len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cached HTTP response.
#[derive(Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Rendered response cache for public pages.
pub struct ResponseStore {
    responses: RwLock<LruCache<ResponseKey, CachedResponse>>,
}

impl ResponseStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            responses: RwLock::new(LruCache::new(config.response_limit_non_zero())),
        }
    }

    pub fn get(&self, key: &ResponseKey) -> Option<CachedResponse> {
        rw_write(&self.responses, SOURCE, "response_get")
            .get(key)
            .cloned()
    }

    /// Store a response, returning the key evicted to make room, if any.
    pub fn set(&self, key: ResponseKey, response: CachedResponse) -> Option<ResponseKey> {
        rw_write(&self.responses, SOURCE, "response_set")
            .push(key.clone(), response)
            .and_then(|(evicted, _)| (evicted != key).then_some(evicted))
    }

    pub fn invalidate(&self, key: &ResponseKey) -> bool {
        rw_write(&self.responses, SOURCE, "response_invalidate")
            .pop(key)
            .is_some()
    }

    /// Drop every stored variant (any query string) of a path.
    pub fn invalidate_path(&self, path: &str) -> Vec<ResponseKey> {
        let mut responses = rw_write(&self.responses, SOURCE, "response_invalidate_path");
        let doomed: Vec<ResponseKey> = responses
            .iter()
            .filter(|(key, _)| key.path == path)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            responses.pop(key);
        }
        doomed
    }

    pub fn invalidate_all(&self) {
        rw_write(&self.responses, SOURCE, "response_invalidate_all").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.responses, SOURCE, "response_len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

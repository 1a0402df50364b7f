//! Process-wide cache shared by the CMS client and the response middleware.

use std::sync::{Arc, RwLock};

use bytes::Bytes;
use metrics::counter;
use tracing::debug;

use crate::application::revalidate::CacheInvalidator;

use super::config::CacheConfig;
use super::keys::{CacheKey, ResponseKey};
use super::lock::{rw_read, rw_write};
use super::registry::TagRegistry;
use super::store::{CachedResponse, FetchStore, ResponseStore};

const METRIC_FETCH_HIT: &str = "folio_cache_fetch_hit_total";
const METRIC_FETCH_MISS: &str = "folio_cache_fetch_miss_total";
const METRIC_FETCH_EVICT: &str = "folio_cache_fetch_evict_total";
const METRIC_RESPONSE_HIT: &str = "folio_cache_response_hit_total";
const METRIC_RESPONSE_MISS: &str = "folio_cache_response_miss_total";
const METRIC_RESPONSE_EVICT: &str = "folio_cache_response_evict_total";
const METRIC_INVALIDATED: &str = "folio_cache_invalidated_total";

const GENERATION_LOCK: &str = "generation";

/// Invalidation epoch observed when a read began.
///
/// A store carrying a generation older than the current one is skipped: the
/// entry was produced from data an invalidation has since declared stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Tag-aware fetch cache plus rendered response cache.
///
/// Both layers register their entries in one [`TagRegistry`], so invalidating
/// a tag drops CMS bodies and every page rendered from them.
#[derive(Clone)]
pub struct SiteCache {
    config: CacheConfig,
    fetch: Arc<FetchStore>,
    responses: Arc<ResponseStore>,
    registry: Arc<TagRegistry>,
    generation: Arc<RwLock<u64>>,
}

impl SiteCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            fetch: Arc::new(FetchStore::new(&config)),
            responses: Arc::new(ResponseStore::new(&config)),
            registry: Arc::new(TagRegistry::new()),
            generation: Arc::new(RwLock::new(0)),
            config,
        }
    }

    /// A cache with both layers switched off.
    pub fn disabled() -> Self {
        Self::new(CacheConfig {
            enable_fetch_cache: false,
            enable_response_cache: false,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Capture before starting work whose result will be stored.
    pub fn generation(&self) -> Generation {
        Generation(*rw_read(&self.generation, GENERATION_LOCK, "observe"))
    }

    pub fn cached_fetch(&self, url: &str) -> Option<Bytes> {
        if !self.config.enable_fetch_cache {
            return None;
        }

        let hit = self.fetch.get(url);
        if hit.is_some() {
            counter!(METRIC_FETCH_HIT).increment(1);
        } else {
            counter!(METRIC_FETCH_MISS).increment(1);
        }
        hit
    }

    /// Store a successfully decoded CMS body under the given tags.
    ///
    /// Returns `false` when the fetch layer is off or an invalidation ran
    /// after `since` was observed.
    pub fn store_fetch(&self, url: &str, body: Bytes, tags: &[&str], since: Generation) -> bool {
        if !self.config.enable_fetch_cache {
            return false;
        }

        // Held across the insert so an invalidation cannot slip in between.
        let current = rw_read(&self.generation, GENERATION_LOCK, "store_fetch");
        if *current != since.0 {
            debug!(cache = "fetch", url, "invalidated while in flight; not storing");
            return false;
        }

        if let Some(evicted) = self.fetch.set(url.to_string(), body) {
            counter!(METRIC_FETCH_EVICT).increment(1);
            self.registry.unregister(&CacheKey::Fetch(evicted));
        }
        self.registry
            .register(CacheKey::Fetch(url.to_string()), tags.iter().copied());
        true
    }

    pub fn cached_response(&self, key: &ResponseKey) -> Option<CachedResponse> {
        if !self.config.enable_response_cache {
            return None;
        }

        let hit = self.responses.get(key);
        if hit.is_some() {
            counter!(METRIC_RESPONSE_HIT).increment(1);
        } else {
            counter!(METRIC_RESPONSE_MISS).increment(1);
        }
        hit
    }

    pub fn store_response(
        &self,
        key: ResponseKey,
        response: CachedResponse,
        tags: &[&str],
        since: Generation,
    ) -> bool {
        if !self.config.enable_response_cache {
            return false;
        }

        let current = rw_read(&self.generation, GENERATION_LOCK, "store_response");
        if *current != since.0 {
            debug!(
                cache = "response",
                path = key.path.as_str(),
                "invalidated while rendering; not storing"
            );
            return false;
        }

        if let Some(evicted) = self.responses.set(key.clone(), response) {
            counter!(METRIC_RESPONSE_EVICT).increment(1);
            self.registry.unregister(&CacheKey::Response(evicted));
        }
        self.registry
            .register(CacheKey::Response(key), tags.iter().copied());
        true
    }

    pub fn fetch_len(&self) -> usize {
        self.fetch.len()
    }

    pub fn response_len(&self) -> usize {
        self.responses.len()
    }

    pub fn clear(&self) {
        let mut current = rw_write(&self.generation, GENERATION_LOCK, "clear");
        *current = current.wrapping_add(1);
        self.fetch.invalidate_all();
        self.responses.invalidate_all();
        self.registry.clear();
    }
}

impl CacheInvalidator for SiteCache {
    fn invalidate_tag(&self, tag: &str) -> usize {
        let mut current = rw_write(&self.generation, GENERATION_LOCK, "invalidate_tag");
        *current = current.wrapping_add(1);

        let keys = self.registry.take_tag(tag);
        let mut dropped = 0;

        for key in &keys {
            let removed = match key {
                CacheKey::Fetch(url) => self.fetch.invalidate(url),
                CacheKey::Response(response_key) => self.responses.invalidate(response_key),
            };
            if removed {
                dropped += 1;
            }
            self.registry.unregister(key);
        }
        drop(current);

        counter!(METRIC_INVALIDATED, "kind" => "tag").increment(1);
        debug!(cache = "site", tag, dropped, "invalidated tag");
        dropped
    }

    fn invalidate_path(&self, path: &str) -> usize {
        let mut current = rw_write(&self.generation, GENERATION_LOCK, "invalidate_path");
        *current = current.wrapping_add(1);

        let dropped = self.responses.invalidate_path(path);
        for key in &dropped {
            self.registry.unregister(&CacheKey::Response(key.clone()));
        }
        drop(current);

        counter!(METRIC_INVALIDATED, "kind" => "path").increment(1);
        debug!(cache = "site", path, dropped = dropped.len(), "invalidated path");
        dropped.len()
    }
}

//! Folio cache system.
//!
//! Two layers share one tag registry:
//!
//! - **Fetch cache**: raw CMS response bodies keyed by URL, tagged `microcms`
//! - **Response cache**: rendered public pages keyed by path and query
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enable_fetch_cache = true
//! enable_response_cache = true
//! fetch_limit = 64
//! response_limit = 64
//! ```

mod config;
mod keys;
mod lock;
mod middleware;
mod registry;
mod site;
mod store;

pub use config::CacheConfig;
pub use keys::{CMS_TAG, CacheKey, ResponseKey, hash_query, hash_value};
pub use middleware::{CacheState, response_cache_layer};
pub use registry::TagRegistry;
pub use site::{Generation, SiteCache};
pub use store::{CachedResponse, FetchStore, ResponseStore};

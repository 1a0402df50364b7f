//! Response cache middleware.
//!
//! Caches successful GET responses of public pages and serves cached copies
//! until the page's path or the CMS tag is invalidated.

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument, warn};

use super::{
    SiteCache,
    keys::{CMS_TAG, ResponseKey},
    store::CachedResponse,
};

/// Shared cache state for middleware.
#[derive(Clone)]
pub struct CacheState {
    pub cache: SiteCache,
}

/// Middleware for rendered response caching.
///
/// Only GET requests answered with `200 OK` are stored, tagged with the CMS
/// tag. Responses carrying `Cache-Control: no-store` are passed through.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(state): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.cache.config().enable_response_cache {
        return next.run(request).await;
    }

    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = ResponseKey::new(
        request.uri().path(),
        request.uri().query().unwrap_or(""),
    );

    if let Some(cached) = state.cache.cached_response(&key) {
        debug!(cache = "response", outcome = "hit", "serving cached response");
        return build_response(cached);
    }

    debug!(
        cache = "response",
        outcome = "miss",
        "cache miss, executing handler"
    );

    let since = state.cache.generation();
    let response = next.run(request).await;
    if response.status() != StatusCode::OK || is_no_store(&response) {
        return response;
    }

    let limit = state.cache.config().response_body_limit_bytes;
    let (parts, body) = response.into_parts();
    let fits = body
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= limit as u64);
    if !fits {
        debug!(cache = "response", limit, "response too large or unsized; not caching");
        return Response::from_parts(parts, body);
    }

    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(cache = "response", limit, error = %err, "response body not cacheable");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect(),
        body: bytes.clone(),
    };

    debug!(cache = "response", bytes = bytes.len(), "caching response");
    state.cache.store_response(key, cached, &[CMS_TAG], since);

    Response::from_parts(parts, Body::from(bytes))
}

fn is_no_store(response: &Response) -> bool {
    response
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("no-store"))
}

/// Build a response from cached data.
fn build_response(cached: CachedResponse) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

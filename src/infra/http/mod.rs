mod auth;
mod middleware;
mod public;
mod revalidate;

pub use auth::{BasicAuthState, EXEMPT_PATHS};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use revalidate::{SIGNATURE_HEADER, SIGNATURE_HEADER_ALIAS};

use std::{any::Any, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use crate::{
    application::{error::ErrorReport, revalidate::RevalidationService, site::SiteService},
    cache::{CacheState, response_cache_layer},
};

use self::{
    auth::basic_auth_gate,
    middleware::{log_responses, set_request_context},
    revalidate::{panic_message, revalidate_status, revalidate_webhook, webhook_panic_response},
};

#[derive(Clone)]
pub struct HttpState {
    pub site: Arc<SiteService>,
    pub revalidation: RevalidationService,
    pub cache: Option<CacheState>,
    pub basic_auth: Option<BasicAuthState>,
    pub webhook_body_limit: usize,
}

pub fn build_router(state: HttpState) -> Router {
    // Public pages share the rendered response cache.
    let cached_routes = Router::new()
        .route("/", get(public::index))
        .route("/about", get(public::about))
        .fallback(public::fallback);

    let cached_routes = if let Some(cache_state) = state.cache.clone() {
        cached_routes.layer(from_fn_with_state(cache_state, response_cache_layer))
    } else {
        cached_routes
    };

    let webhook_routes = Router::new()
        .route(
            "/api/revalidate",
            get(revalidate_status).post(revalidate_webhook),
        )
        .route("/revalidate", get(revalidate_status).post(revalidate_webhook))
        .layer(DefaultBodyLimit::max(state.webhook_body_limit))
        .layer(CatchPanicLayer::custom(webhook_panic_response));

    let router = cached_routes
        .merge(webhook_routes)
        .route("/_health", get(public::health))
        .with_state(state.clone());

    let router = match state.basic_auth {
        Some(auth) => router.layer(from_fn_with_state(auth, basic_auth_gate)),
        None => router,
    };

    router
        .layer(from_fn(log_responses))
        .layer(from_fn(set_request_context))
        .layer(CatchPanicLayer::custom(page_panic_response))
}

fn page_panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic_message(panic.as_ref());
    error!(target = "folio::http", detail = %detail, "request handler panicked");

    let mut response =
        (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error occurred").into_response();
    ErrorReport::from_message(
        "infra::http::page_panic_response",
        StatusCode::INTERNAL_SERVER_ERROR,
        detail,
    )
    .attach(&mut response);
    response
}

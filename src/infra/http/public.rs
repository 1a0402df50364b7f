use axum::{
    extract::State,
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};

use crate::{
    application::site::SitePage,
    presentation::views::{
        AboutTemplate, HomeTemplate, LayoutContext, render_not_found_response,
        render_template_response,
    },
};

use super::HttpState;

pub(super) async fn index(State(state): State<HttpState>) -> Response {
    let SitePage {
        chrome,
        content,
        degraded,
    } = state.site.home().await;

    let view = LayoutContext::new(chrome, content);
    let response = render_template_response(HomeTemplate { view }, StatusCode::OK);
    uncacheable_if(degraded, response)
}

pub(super) async fn about(State(state): State<HttpState>) -> Response {
    let SitePage {
        chrome,
        content,
        degraded,
    } = state.site.about().await;

    let response = match content {
        Some(content) => {
            let view = LayoutContext::new(chrome, content);
            render_template_response(AboutTemplate { view }, StatusCode::OK)
        }
        None => render_not_found_response(chrome),
    };
    uncacheable_if(degraded, response)
}

pub(super) async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub(super) async fn fallback(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.site.chrome().await)
}

/// Pages built from fallback content must not enter the response cache.
fn uncacheable_if(degraded: bool, mut response: Response) -> Response {
    if degraded {
        response
            .headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
    response
}

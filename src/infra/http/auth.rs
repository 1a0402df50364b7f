//! Site-wide HTTP Basic authentication gate.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        HeaderValue, Request, StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use subtle::ConstantTimeEq;

use crate::{application::error::ErrorReport, config::BasicAuthSettings};

const REALM: &str = r#"Basic realm="Secure Area""#;

/// Paths reachable without credentials.
pub const EXEMPT_PATHS: &[&str] = &[
    "/api/revalidate",
    "/revalidate",
    "/api/auth",
    "/favicon.ico",
    "/_health",
];

#[derive(Clone)]
pub struct BasicAuthState {
    credentials: Arc<BasicAuthSettings>,
}

impl BasicAuthState {
    pub fn new(credentials: BasicAuthSettings) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }

    fn accepts(&self, header: Option<&HeaderValue>) -> bool {
        let Some((user, password)) = header.and_then(decode_basic) else {
            return false;
        };
        let user_ok = user.as_bytes().ct_eq(self.credentials.user.as_bytes());
        let password_ok = password
            .as_bytes()
            .ct_eq(self.credentials.password.as_bytes());
        (user_ok & password_ok).unwrap_u8() == 1
    }
}

pub async fn basic_auth_gate(
    State(state): State<BasicAuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if is_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    if state.accepts(request.headers().get(AUTHORIZATION)) {
        return next.run(request).await;
    }

    unauthorized()
}

pub fn is_exempt(path: &str) -> bool {
    EXEMPT_PATHS.contains(&path)
}

/// `user:password` from a `Basic` authorization value. The password may
/// itself contain `:`.
fn decode_basic(value: &HeaderValue) -> Option<(String, String)> {
    let value = value.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

fn unauthorized() -> Response {
    let mut response = (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, HeaderValue::from_static(REALM))],
        "Authentication required",
    )
        .into_response();
    ErrorReport::from_message(
        "infra::http::auth::basic_auth_gate",
        StatusCode::UNAUTHORIZED,
        "missing or invalid basic credentials",
    )
    .attach(&mut response);
    response
}

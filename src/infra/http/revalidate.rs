//! Webhook endpoint for signed revalidation.

use std::any::Any;

use axum::{
    Json,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use crate::application::{
    error::{ErrorReport, HttpError},
    revalidate::{RevalidateError, supported_apis},
};

use super::HttpState;

pub const SIGNATURE_HEADER: &str = "x-microcms-signature";
pub const SIGNATURE_HEADER_ALIAS: &str = "x-signature";

const SOURCE: &str = "infra::http::revalidate";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointStatus {
    status: &'static str,
    message: &'static str,
    supported_apis: Vec<&'static str>,
}

pub(super) async fn revalidate_status() -> impl IntoResponse {
    Json(EndpointStatus {
        status: "ok",
        message: "Revalidate webhook endpoint is ready",
        supported_apis: supported_apis(),
    })
}

pub(super) async fn revalidate_webhook(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejection_to_http(rejection).into_response(),
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .or_else(|| headers.get(SIGNATURE_HEADER_ALIAS))
        .map(|value| value.as_bytes());

    match state.revalidation.revalidate(body, signature) {
        Ok(receipt) => Json(receipt).into_response(),
        Err(err) => revalidate_error_to_http(err).into_response(),
    }
}

fn revalidate_error_to_http(err: RevalidateError) -> HttpError {
    match err {
        RevalidateError::Unconfigured => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Webhook secret not configured",
            &err,
        ),
        RevalidateError::MissingSignature | RevalidateError::SignatureMismatch => {
            HttpError::from_error(SOURCE, StatusCode::UNAUTHORIZED, "Invalid signature", &err)
        }
        RevalidateError::Payload(_) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Revalidation failed",
            &err,
        ),
    }
    .json()
}

/// Unreadable or oversized bodies still answer with the JSON error shape.
fn body_rejection_to_http(rejection: BytesRejection) -> HttpError {
    let status = rejection.status();
    warn!(
        target = "folio::revalidate",
        status = status.as_u16(),
        error = %rejection,
        "webhook body rejected"
    );
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "Payload too large"
    } else {
        "Invalid request body"
    };
    HttpError::from_error(SOURCE, status, message, &rejection).json()
}

/// Panics inside the webhook answer like any other processing failure.
pub(super) fn webhook_panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic_message(panic.as_ref());
    error!(target = "folio::revalidate", detail = %detail, "webhook handler panicked");

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Revalidation failed" })),
    )
        .into_response();
    ErrorReport::from_message(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, detail)
        .attach(&mut response);
    response
}

pub(super) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic without message".to_string()
    }
}

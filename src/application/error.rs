use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{config::LoadError, infra::error::InfraError};

/// Internal failure detail attached to a response for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorFormat {
    Text,
    Json,
}

/// An error response: a fixed public message plus a private report.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    format: ErrorFormat,
    report: ErrorReport,
}

impl HttpError {
    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            format: ErrorFormat::Text,
            report,
        }
    }

    /// Render the public message as `{"error": "..."}`.
    pub fn json(mut self) -> Self {
        self.format = ErrorFormat::Json;
        self
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = match self.format {
            ErrorFormat::Text => (self.status, self.public_message).into_response(),
            ErrorFormat::Json => {
                (self.status, Json(json!({ "error": self.public_message }))).into_response()
            }
        };
        self.report.attach(&mut response);
        response
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn json_error_hides_detail_and_keeps_report() {
        let detail = std::io::Error::other("digest mismatch for 42 byte body");
        let response = HttpError::from_error(
            "tests",
            StatusCode::UNAUTHORIZED,
            "Invalid signature",
            &detail,
        )
        .json()
        .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .cloned()
            .expect("report attached");
        assert_eq!(report.messages, vec!["digest mismatch for 42 byte body"]);

        let body = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(value, json!({"error": "Invalid signature"}));
    }

    #[test]
    fn report_walks_error_sources() {
        let io = std::io::Error::other("socket closed");
        let err = AppError::from(InfraError::from(io));
        let report =
            ErrorReport::from_error("tests", StatusCode::INTERNAL_SERVER_ERROR, &err);
        assert!(report.messages[0].contains("socket closed"));
    }
}

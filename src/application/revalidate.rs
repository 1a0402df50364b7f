//! Signed on-demand revalidation.
//!
//! A CMS webhook names the content type that changed. Once its HMAC-SHA256
//! signature checks out against the raw body, the shared CMS tag and every
//! route that renders that content type are invalidated.

use std::sync::Arc;

use bytes::Bytes;
use hmac::{Hmac, Mac};
use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::cache::CMS_TAG;
use crate::domain::entities::{WebhookEvent, WebhookPayloadError};

type HmacSha256 = Hmac<Sha256>;

const METRIC_REVALIDATE: &str = "folio_revalidate_total";

/// Content type → routes rendered from it, in invalidation order.
pub const ROUTE_MAP: &[(&str, &[&str])] = &[
    ("works", &["/"]),
    ("career", &["/"]),
    ("skills", &["/"]),
    ("settings", &["/", "/about"]),
];

/// Routes invalidated for content types missing from [`ROUTE_MAP`].
pub const FALLBACK_ROUTES: &[&str] = &["/"];

/// Invalidation target for verified webhooks.
///
/// Both operations are idempotent and return how many entries were dropped.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate_tag(&self, tag: &str) -> usize;

    fn invalidate_path(&self, path: &str) -> usize;
}

#[derive(Debug, Error)]
pub enum RevalidateError {
    #[error("webhook secret is not configured")]
    Unconfigured,
    #[error("signature header is missing")]
    MissingSignature,
    #[error("signature does not match the request body")]
    SignatureMismatch,
    #[error("webhook payload is malformed: {0}")]
    Payload(#[from] WebhookPayloadError),
}

impl RevalidateError {
    fn outcome(&self) -> &'static str {
        match self {
            RevalidateError::Unconfigured => "unconfigured",
            RevalidateError::MissingSignature | RevalidateError::SignatureMismatch => {
                "unauthorized"
            }
            RevalidateError::Payload(_) => "failed",
        }
    }
}

/// Success payload of a webhook delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevalidationReceipt {
    pub revalidated: bool,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    /// Echoed as sent; absent members serialize as `null`.
    pub api: Value,
    #[serde(rename = "type")]
    pub change_type: Value,
    pub paths: Vec<String>,
}

/// Routes to invalidate for a content type.
pub fn routes_for(api: &str) -> &'static [&'static str] {
    ROUTE_MAP
        .iter()
        .find(|(name, _)| *name == api)
        .map(|(_, routes)| *routes)
        .unwrap_or(FALLBACK_ROUTES)
}

/// Content types with a dedicated route mapping.
pub fn supported_apis() -> Vec<&'static str> {
    ROUTE_MAP.iter().map(|(name, _)| *name).collect()
}

/// Lowercase hex HMAC-SHA256 of `body` keyed with `secret`.
pub fn expected_signature(secret: &[u8], body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a provided signature against the raw body.
///
/// The comparison is byte-exact: no trimming and no case folding.
pub fn verify_signature(secret: &[u8], body: &[u8], provided: &[u8]) -> bool {
    match expected_signature(secret, body) {
        Some(expected) => expected.as_bytes().ct_eq(provided).unwrap_u8() == 1,
        None => false,
    }
}

fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}

/// Runs the verify → parse → invalidate sequence for one delivery.
#[derive(Clone)]
pub struct RevalidationService {
    secret: Option<Arc<str>>,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl RevalidationService {
    pub fn new(secret: Option<String>, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        Self {
            secret: secret.map(Arc::from),
            invalidator,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify and apply one webhook delivery.
    ///
    /// Nothing is invalidated unless the signature matches `raw` exactly.
    pub fn revalidate(
        &self,
        raw: Bytes,
        signature: Option<&[u8]>,
    ) -> Result<RevalidationReceipt, RevalidateError> {
        let result = self.process(raw, signature);

        let outcome = match &result {
            Ok(_) => "revalidated",
            Err(err) => err.outcome(),
        };
        counter!(METRIC_REVALIDATE, "outcome" => outcome).increment(1);

        result
    }

    fn process(
        &self,
        raw: Bytes,
        signature: Option<&[u8]>,
    ) -> Result<RevalidationReceipt, RevalidateError> {
        let secret = self.secret.as_ref().ok_or(RevalidateError::Unconfigured)?;
        let signature = signature.ok_or(RevalidateError::MissingSignature)?;

        if !verify_signature(secret.as_bytes(), &raw, signature) {
            warn!(
                target = "folio::revalidate",
                body_len = raw.len(),
                "rejected webhook with invalid signature"
            );
            return Err(RevalidateError::SignatureMismatch);
        }

        debug!(
            target = "folio::revalidate",
            body = %String::from_utf8_lossy(&raw),
            "verified webhook payload"
        );

        let event = WebhookEvent::from_verified_body(raw)?;
        let routes = routes_for(event.api_name().unwrap_or_default());

        let dropped_tagged = self.invalidator.invalidate_tag(CMS_TAG);
        let mut paths = Vec::with_capacity(routes.len());
        for route in routes {
            self.invalidator.invalidate_path(route);
            paths.push((*route).to_string());
        }

        info!(
            target = "folio::revalidate",
            api = %event.api,
            change_type = %event.change_type,
            paths = ?paths,
            dropped_tagged,
            "revalidated content"
        );

        Ok(RevalidationReceipt {
            revalidated: true,
            timestamp: now_millis(),
            api: event.api,
            change_type: event.change_type,
            paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records invalidation calls in order.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("recorder lock").clone()
        }
    }

    impl CacheInvalidator for Recorder {
        fn invalidate_tag(&self, tag: &str) -> usize {
            self.calls
                .lock()
                .expect("recorder lock")
                .push(format!("tag:{tag}"));
            0
        }

        fn invalidate_path(&self, path: &str) -> usize {
            self.calls
                .lock()
                .expect("recorder lock")
                .push(format!("path:{path}"));
            0
        }
    }

    fn service(secret: Option<&str>) -> (RevalidationService, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let service = RevalidationService::new(secret.map(str::to_string), recorder.clone());
        (service, recorder)
    }

    fn signed(secret: &str, body: &'static [u8]) -> (Bytes, String) {
        let signature = expected_signature(secret.as_bytes(), body).expect("hmac key");
        (Bytes::from_static(body), signature)
    }

    #[test]
    fn route_table_matches_content_types() {
        assert_eq!(routes_for("works"), ["/"]);
        assert_eq!(routes_for("career"), ["/"]);
        assert_eq!(routes_for("skills"), ["/"]);
        assert_eq!(routes_for("settings"), ["/", "/about"]);
        assert_eq!(routes_for("unknown-type"), ["/"]);
        assert_eq!(routes_for(""), ["/"]);
        assert_eq!(
            supported_apis(),
            vec!["works", "career", "skills", "settings"]
        );
    }

    #[test]
    fn signature_is_lowercase_hex_sha256() {
        let signature = expected_signature(b"s3cret", br#"{"api":"works","type":"update"}"#)
            .expect("hmac key");
        assert_eq!(signature.len(), 64);
        assert!(
            signature
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn only_the_exact_digest_verifies() {
        let body = br#"{"api":"works","type":"update"}"#;
        let good = expected_signature(b"s3cret", body).expect("hmac key");
        assert!(verify_signature(b"s3cret", body, good.as_bytes()));

        let mut flipped = good.clone().into_bytes();
        flipped[10] = if flipped[10] == b'0' { b'1' } else { b'0' };
        assert!(!verify_signature(b"s3cret", body, &flipped));

        assert!(!verify_signature(b"s3cret", body, &good.as_bytes()[..63]));
        assert!(!verify_signature(b"other", body, good.as_bytes()));
        assert!(!verify_signature(
            b"s3cret",
            body,
            good.to_uppercase().as_bytes()
        ));
        assert!(!verify_signature(
            b"s3cret",
            br#"{"api":"works","type":"update"} "#,
            good.as_bytes()
        ));
        assert!(!verify_signature(b"s3cret", body, b""));
    }

    #[test]
    fn verified_delivery_invalidates_tag_then_paths_in_order() {
        let (service, recorder) = service(Some("s3cret"));
        let (body, signature) = signed("s3cret", br#"{"api":"settings","type":"edit"}"#);

        let receipt = service
            .revalidate(body, Some(signature.as_bytes()))
            .expect("verified");

        assert!(receipt.revalidated);
        assert_eq!(receipt.api, Value::from("settings"));
        assert_eq!(receipt.change_type, Value::from("edit"));
        assert_eq!(receipt.paths, vec!["/", "/about"]);
        assert!(receipt.timestamp > 0);
        assert_eq!(
            recorder.calls(),
            vec!["tag:microcms", "path:/", "path:/about"]
        );
    }

    #[test]
    fn unconfigured_secret_fails_closed() {
        let (service, recorder) = service(None);
        let (body, signature) = signed("s3cret", br#"{"api":"works"}"#);

        let err = service
            .revalidate(body, Some(signature.as_bytes()))
            .expect_err("no secret");
        assert!(matches!(err, RevalidateError::Unconfigured));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn missing_or_wrong_signature_invalidates_nothing() {
        let (service, recorder) = service(Some("s3cret"));
        let (body, signature) = signed("other-secret", br#"{"api":"works"}"#);

        let err = service.revalidate(body.clone(), None).expect_err("missing");
        assert!(matches!(err, RevalidateError::MissingSignature));

        let err = service
            .revalidate(body, Some(signature.as_bytes()))
            .expect_err("forged");
        assert!(matches!(err, RevalidateError::SignatureMismatch));

        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn malformed_verified_payload_is_a_processing_failure() {
        let (service, recorder) = service(Some("s3cret"));

        for raw in [
            &b"not json"[..],
            &br#"["works"]"#[..],
            &br#""works""#[..],
            &b"42"[..],
        ] {
            let signature = expected_signature(b"s3cret", raw).expect("hmac key");
            let err = service
                .revalidate(Bytes::copy_from_slice(raw), Some(signature.as_bytes()))
                .expect_err("malformed");
            assert!(matches!(err, RevalidateError::Payload(_)));
        }
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn missing_or_non_string_api_falls_back_to_home() {
        let (service, recorder) = service(Some("s3cret"));

        for (raw, api) in [
            (&br#"{"type":"edit"}"#[..], Value::Null),
            (&br#"{"api":42,"type":"new"}"#[..], Value::from(42)),
        ] {
            let signature = expected_signature(b"s3cret", raw).expect("hmac key");
            let receipt = service
                .revalidate(Bytes::copy_from_slice(raw), Some(signature.as_bytes()))
                .expect("object payload");
            assert_eq!(receipt.paths, vec!["/"]);
            assert_eq!(receipt.api, api);
        }
        assert_eq!(
            recorder.calls(),
            vec!["tag:microcms", "path:/", "tag:microcms", "path:/"]
        );
    }

    #[test]
    fn receipt_serializes_absent_members_as_null() {
        let (service, _) = service(Some("s3cret"));
        let (body, signature) = signed("s3cret", br#"{"type":"edit"}"#);

        let receipt = service
            .revalidate(body, Some(signature.as_bytes()))
            .expect("verified");
        let json = serde_json::to_value(&receipt).expect("serialize");

        assert_eq!(json["api"], Value::Null);
        assert_eq!(json["type"], "edit");
        assert_eq!(json["revalidated"], true);
    }

    #[test]
    fn repeated_delivery_yields_identical_paths() {
        let (service, _) = service(Some("s3cret"));
        let (body, signature) = signed("s3cret", br#"{"api":"unknown-type","type":"new"}"#);

        let first = service
            .revalidate(body.clone(), Some(signature.as_bytes()))
            .expect("first");
        let second = service
            .revalidate(body, Some(signature.as_bytes()))
            .expect("second");

        assert_eq!(first.paths, vec!["/"]);
        assert_eq!(first.paths, second.paths);
    }
}

//! Read contract between page services and the CMS.
//!
//! Reads never fail from the caller's point of view: a failed read yields a
//! [`FetchOutcome::Degraded`] carrying the safe fallback (empty collection or
//! absent singleton) together with the reason.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{AboutContent, ExperienceItem, SiteSettings, SkillItem, WorkItem};

/// CMS endpoint names.
pub mod endpoints {
    pub const WORKS: &str = "works";
    pub const CAREER: &str = "career";
    pub const SKILLS: &str = "skills";
    pub const SETTINGS: &str = "settings";
    pub const ABOUT: &str = "about";
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CmsError {
    #[error("request to `{endpoint}` failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("`{endpoint}` answered with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("`{endpoint}` returned malformed JSON: {message}")]
    Decode { endpoint: String, message: String },
    #[error("`{endpoint}` payload has an unexpected shape: {reason}")]
    Shape { endpoint: String, reason: String },
    #[error("invalid endpoint `{endpoint}`: {message}")]
    Endpoint { endpoint: String, message: String },
}

impl CmsError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CmsError::Transport { .. } => "transport",
            CmsError::Status { .. } => "status",
            CmsError::Decode { .. } => "decode",
            CmsError::Shape { .. } => "shape",
            CmsError::Endpoint { .. } => "endpoint",
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            CmsError::Transport { endpoint, .. }
            | CmsError::Status { endpoint, .. }
            | CmsError::Decode { endpoint, .. }
            | CmsError::Shape { endpoint, .. }
            | CmsError::Endpoint { endpoint, .. } => endpoint,
        }
    }
}

/// Result of one CMS read: the value, or the fallback plus the failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Loaded(T),
    Degraded { fallback: T, error: CmsError },
}

impl<T: Default> FetchOutcome<T> {
    /// A failed read carrying the type's empty value.
    pub fn degraded(error: CmsError) -> Self {
        Self::Degraded {
            fallback: T::default(),
            error,
        }
    }
}

impl<T> FetchOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Loaded(value) | Self::Degraded { fallback: value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Loaded(value) | Self::Degraded { fallback: value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn error(&self) -> Option<&CmsError> {
        match self {
            Self::Loaded(_) => None,
            Self::Degraded { error, .. } => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            Self::Loaded(value) => FetchOutcome::Loaded(f(value)),
            Self::Degraded { fallback, error } => FetchOutcome::Degraded {
                fallback: f(fallback),
                error,
            },
        }
    }
}

/// Source of site content.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn works(&self) -> FetchOutcome<Vec<WorkItem>>;

    async fn career(&self) -> FetchOutcome<Vec<ExperienceItem>>;

    async fn skills(&self) -> FetchOutcome<Vec<SkillItem>>;

    async fn settings(&self) -> FetchOutcome<Option<SiteSettings>>;

    async fn about(&self) -> FetchOutcome<Option<AboutContent>>;
}

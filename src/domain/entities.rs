//! Content entities as delivered by the CMS.
//!
//! Entities are created fresh on every read and never mutated afterwards; a
//! newer copy replaces the old one on the next fetch.

use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::types::{CompanyType, SkillCategory, Technology, WorkCategory};
use crate::domain::validators;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaAsset {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub eyecatch: MediaAsset,
    pub introduction_url: String,
    #[serde(deserialize_with = "select::single")]
    pub category: WorkCategory,
    pub duration: String,
    pub technologies: Vec<Technology>,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceItem {
    pub id: String,
    pub company_name: String,
    pub company_logo: MediaAsset,
    pub job_title: String,
    pub work_experiences: Vec<String>,
    pub duration: String,
    pub url: String,
    #[serde(deserialize_with = "select::single")]
    pub company_type: CompanyType,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillItem {
    pub id: String,
    pub name: String,
    pub icon: MediaAsset,
    #[serde(deserialize_with = "select::single")]
    pub category: SkillCategory,
    pub years_of_experience: String,
    pub details: String,
}

/// Site-wide settings singleton. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteSettings {
    pub id: Option<String>,
    pub mv_image: Option<MediaAsset>,
    pub favicon: Option<MediaAsset>,
    pub profile_image: Option<MediaAsset>,
    pub name: Option<String>,
    pub name_en: Option<String>,
    pub introduction_message: Option<String>,
    pub detail_message: Option<String>,
    pub about_content: Option<String>,
}

/// Content of the about page singleton.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AboutContent {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub mv_image: Option<MediaAsset>,
}

/// A CMS entity that can be shape-checked before it is decoded.
pub trait ContentEntity: DeserializeOwned + Send + 'static {
    /// Label used in logs.
    const KIND: &'static str;

    fn validate(value: &Value) -> bool;

    /// Identifier used to detect duplicates within one collection.
    fn id(&self) -> Option<&str> {
        None
    }
}

impl ContentEntity for WorkItem {
    const KIND: &'static str = "work";

    fn validate(value: &Value) -> bool {
        validators::validate_work(value)
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl ContentEntity for ExperienceItem {
    const KIND: &'static str = "experience";

    fn validate(value: &Value) -> bool {
        validators::validate_experience(value)
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl ContentEntity for SkillItem {
    const KIND: &'static str = "skill";

    fn validate(value: &Value) -> bool {
        validators::validate_skill(value)
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl ContentEntity for SiteSettings {
    const KIND: &'static str = "settings";

    fn validate(value: &Value) -> bool {
        validators::validate_settings(value)
    }
}

impl ContentEntity for AboutContent {
    const KIND: &'static str = "about";

    fn validate(value: &Value) -> bool {
        validators::validate_about(value)
    }
}

/// A content change notification pushed by the CMS.
///
/// Only built from a body whose signature has already been verified. The
/// `api` and `type` members are kept as sent: an absent or non-string `api`
/// still names a change, just not one with known routes.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub api: Value,
    pub change_type: Value,
    pub raw: Bytes,
}

#[derive(Debug, Error)]
pub enum WebhookPayloadError {
    #[error("body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("body is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
}

impl WebhookEvent {
    pub fn from_verified_body(raw: Bytes) -> Result<Self, WebhookPayloadError> {
        let mut object = match serde_json::from_slice::<Value>(&raw)? {
            Value::Object(object) => object,
            other => return Err(WebhookPayloadError::NotAnObject(json_kind(&other))),
        };
        Ok(Self {
            api: object.remove("api").unwrap_or(Value::Null),
            change_type: object.remove("type").unwrap_or(Value::Null),
            raw,
        })
    }

    /// The content type name, when `api` is a string.
    pub fn api_name(&self) -> Option<&str> {
        self.api.as_str()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// CMS select fields arrive either as a bare label or as a one-element list.
pub(crate) mod select {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    pub fn single<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        match OneOrMany::<T>::deserialize(deserializer)? {
            OneOrMany::One(value) => Ok(value),
            OneOrMany::Many(mut values) if values.len() == 1 => Ok(values.remove(0)),
            OneOrMany::Many(values) => Err(D::Error::custom(format!(
                "expected exactly one selected value, found {}",
                values.len()
            ))),
        }
    }
}

//! HTTP client for the headless CMS.
//!
//! Every read degrades instead of failing: transport errors, non-2xx answers
//! and malformed bodies yield the empty fallback, are logged, and counted in
//! `folio_cms_fetch_failure_total`. Successful bodies are kept in the tagged
//! fetch cache until the `microcms` tag is invalidated.

use std::{collections::HashSet, num::NonZeroU32};

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use reqwest::{
    Client, Url,
    header::{HeaderName, HeaderValue},
};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{
    application::content::{CmsError, ContentSource, FetchOutcome, endpoints},
    cache::{CMS_TAG, SiteCache},
    config::CmsSettings,
    domain::entities::{
        AboutContent, ContentEntity, ExperienceItem, SiteSettings, SkillItem, WorkItem,
    },
    infra::error::InfraError,
};

const METRIC_FETCH_FAILURE: &str = "folio_cms_fetch_failure_total";

#[derive(Clone)]
pub struct CmsClient {
    http: Client,
    base_url: Url,
    api_key_header: HeaderName,
    api_key: HeaderValue,
    page_limit: NonZeroU32,
    cache: SiteCache,
}

impl CmsClient {
    pub fn new(settings: &CmsSettings, cache: SiteCache) -> Result<Self, InfraError> {
        let mut api_key = HeaderValue::from_str(&settings.api_key)
            .map_err(|err| InfraError::configuration(format!("cms.api_key: {err}")))?;
        api_key.set_sensitive(true);

        let http = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            api_key_header: settings.api_key_header.clone(),
            api_key,
            page_limit: settings.page_limit,
            cache,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("folio/", env!("CARGO_PKG_VERSION"))
    }

    pub async fn get_works(&self) -> FetchOutcome<Vec<WorkItem>> {
        self.fetch_collection(endpoints::WORKS).await
    }

    pub async fn get_career(&self) -> FetchOutcome<Vec<ExperienceItem>> {
        self.fetch_collection(endpoints::CAREER).await
    }

    pub async fn get_skills(&self) -> FetchOutcome<Vec<SkillItem>> {
        self.fetch_collection(endpoints::SKILLS).await
    }

    pub async fn get_settings(&self) -> FetchOutcome<Option<SiteSettings>> {
        self.fetch_singleton(endpoints::SETTINGS).await
    }

    pub async fn get_about(&self) -> FetchOutcome<Option<AboutContent>> {
        self.fetch_singleton(endpoints::ABOUT).await
    }

    /// Read a list endpoint (`?limit=` page size) and keep its valid items.
    pub async fn fetch_collection<T: ContentEntity>(&self, endpoint: &str) -> FetchOutcome<Vec<T>> {
        let url = match self.endpoint_url(endpoint, Some(self.page_limit)) {
            Ok(url) => url,
            Err(err) => return degrade(err),
        };

        match self
            .fetch_decoded(endpoint, &url, |body| decode_collection::<T>(endpoint, body))
            .await
        {
            Ok(items) => FetchOutcome::Loaded(items),
            Err(err) => degrade(err),
        }
    }

    /// Read an object endpoint. A JSON `null` body is an absent singleton.
    pub async fn fetch_singleton<T: ContentEntity>(&self, endpoint: &str) -> FetchOutcome<Option<T>> {
        let url = match self.endpoint_url(endpoint, None) {
            Ok(url) => url,
            Err(err) => return degrade(err),
        };

        match self
            .fetch_decoded(endpoint, &url, |body| decode_singleton::<T>(endpoint, body))
            .await
        {
            Ok(value) => FetchOutcome::Loaded(value),
            Err(err) => degrade(err),
        }
    }

    fn endpoint_url(&self, endpoint: &str, limit: Option<NonZeroU32>) -> Result<Url, CmsError> {
        let mut url = self.base_url.join(endpoint).map_err(|err| CmsError::Endpoint {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        })?;
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.get().to_string());
        }
        Ok(url)
    }

    /// Serve from the fetch cache or the network, then decode. Only bodies
    /// that decode are stored.
    async fn fetch_decoded<T>(
        &self,
        endpoint: &str,
        url: &Url,
        decode: impl Fn(&[u8]) -> Result<T, CmsError>,
    ) -> Result<T, CmsError> {
        if let Some(body) = self.cache.cached_fetch(url.as_str()) {
            match decode(&body) {
                Ok(value) => {
                    debug!(target = "folio::cms", endpoint, "served from fetch cache");
                    return Ok(value);
                }
                Err(err) => {
                    warn!(
                        target = "folio::cms",
                        endpoint,
                        error = %err,
                        "cached body no longer decodes; refetching"
                    );
                }
            }
        }

        let since = self.cache.generation();
        let body = self.request(endpoint, url).await?;
        let value = decode(&body)?;
        self.cache.store_fetch(url.as_str(), body, &[CMS_TAG], since);
        Ok(value)
    }

    async fn request(&self, endpoint: &str, url: &Url) -> Result<Bytes, CmsError> {
        let transport = |err: reqwest::Error| CmsError::Transport {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        };

        let response = self
            .http
            .get(url.clone())
            .header(self.api_key_header.clone(), self.api_key.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(transport)
    }
}

fn degrade<T: Default>(err: CmsError) -> FetchOutcome<T> {
    let endpoint = err.endpoint().to_string();

    match &err {
        CmsError::Transport { .. } | CmsError::Status { status: 500.., .. } => {
            error!(
                target = "folio::cms",
                endpoint = %endpoint,
                kind = err.kind(),
                error = %err,
                "cms read failed; using fallback"
            );
        }
        _ => {
            warn!(
                target = "folio::cms",
                endpoint = %endpoint,
                kind = err.kind(),
                error = %err,
                "cms read failed; using fallback"
            );
        }
    }
    counter!(METRIC_FETCH_FAILURE, "endpoint" => endpoint, "kind" => err.kind()).increment(1);

    FetchOutcome::degraded(err)
}

fn parse_json(endpoint: &str, body: &[u8]) -> Result<Value, CmsError> {
    serde_json::from_slice(body).map_err(|err| CmsError::Decode {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    })
}

/// Decode a `{ "contents": [...] }` list body.
///
/// Items failing validation are skipped one by one; later duplicates of an
/// id are dropped.
pub(crate) fn decode_collection<T: ContentEntity>(
    endpoint: &str,
    body: &[u8],
) -> Result<Vec<T>, CmsError> {
    let value = parse_json(endpoint, body)?;
    let contents = value
        .get("contents")
        .and_then(Value::as_array)
        .ok_or_else(|| CmsError::Shape {
            endpoint: endpoint.to_string(),
            reason: "missing `contents` array".to_string(),
        })?;

    let mut items = Vec::with_capacity(contents.len());
    let mut seen = HashSet::new();
    for (index, raw) in contents.iter().enumerate() {
        if !T::validate(raw) {
            let id = raw.get("id").and_then(serde_json::Value::as_str).unwrap_or("");
            warn!(
                target = "folio::cms",
                endpoint,
                kind = T::KIND,
                index,
                id,
                "skipping item that fails validation"
            );
            continue;
        }

        let item = match T::deserialize(raw) {
            Ok(item) => item,
            Err(err) => {
                warn!(
                    target = "folio::cms",
                    endpoint,
                    kind = T::KIND,
                    index,
                    error = %err,
                    "skipping item that does not decode"
                );
                continue;
            }
        };

        if let Some(id) = item.id()
            && !seen.insert(id.to_string())
        {
            warn!(
                target = "folio::cms",
                endpoint,
                kind = T::KIND,
                id,
                "dropping duplicate item id"
            );
            continue;
        }

        items.push(item);
    }

    Ok(items)
}

pub(crate) fn decode_singleton<T: ContentEntity>(
    endpoint: &str,
    body: &[u8],
) -> Result<Option<T>, CmsError> {
    let value = parse_json(endpoint, body)?;
    if value.is_null() {
        return Ok(None);
    }

    if !T::validate(&value) {
        return Err(CmsError::Shape {
            endpoint: endpoint.to_string(),
            reason: format!("{} failed validation", T::KIND),
        });
    }

    T::deserialize(&value).map(Some).map_err(|err| CmsError::Shape {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    })
}

#[async_trait]
impl ContentSource for CmsClient {
    async fn works(&self) -> FetchOutcome<Vec<WorkItem>> {
        self.get_works().await
    }

    async fn career(&self) -> FetchOutcome<Vec<ExperienceItem>> {
        self.get_career().await
    }

    async fn skills(&self) -> FetchOutcome<Vec<SkillItem>> {
        self.get_skills().await
    }

    async fn settings(&self) -> FetchOutcome<Option<SiteSettings>> {
        self.get_settings().await
    }

    async fn about(&self) -> FetchOutcome<Option<AboutContent>> {
        self.get_about().await
    }
}

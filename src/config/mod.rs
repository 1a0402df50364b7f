//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use reqwest::header::HeaderName;
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{CliArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_CMS_HOST_SUFFIX: &str = "microcms.io";
const DEFAULT_API_KEY_HEADER: &str = "X-MICROCMS-API-KEY";
const DEFAULT_CMS_TIMEOUT_SECS: u64 = 10;
pub(crate) const DEFAULT_PAGE_LIMIT: u32 = 100;
const DEFAULT_WEBHOOK_BODY_LIMIT_BYTES: u64 = 1024 * 1024;
const DEFAULT_FETCH_CACHE_LIMIT: usize = 64;
const DEFAULT_RESPONSE_CACHE_LIMIT: usize = 64;
const DEFAULT_RESPONSE_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cms: CmsSettings,
    pub webhook: WebhookSettings,
    pub cache: CacheSettings,
    pub basic_auth: Option<BasicAuthSettings>,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Connection details for the headless CMS.
#[derive(Clone)]
pub struct CmsSettings {
    /// API root; always ends with `/`.
    pub base_url: Url,
    pub api_key: String,
    pub api_key_header: HeaderName,
    pub request_timeout: Duration,
    /// Page-size ceiling for collection reads. Larger collections are truncated.
    pub page_limit: NonZeroU32,
}

impl std::fmt::Debug for CmsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsSettings")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("api_key_header", &self.api_key_header)
            .field("request_timeout", &self.request_timeout)
            .field("page_limit", &self.page_limit)
            .finish()
    }
}

#[derive(Clone)]
pub struct WebhookSettings {
    /// Shared HMAC secret. `None` keeps the endpoint failing closed.
    pub secret: Option<String>,
    pub max_body_bytes: usize,
}

impl std::fmt::Debug for WebhookSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSettings")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enable_fetch_cache: bool,
    pub enable_response_cache: bool,
    pub fetch_limit: NonZeroUsize,
    pub response_limit: NonZeroUsize,
    pub response_body_limit_bytes: usize,
}

#[derive(Clone)]
pub struct BasicAuthSettings {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for BasicAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthSettings")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FOLIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_serve_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cms: RawCmsSettings,
    webhook: RawWebhookSettings,
    cache: RawCacheSettings,
    basic_auth: RawBasicAuthSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(domain) = overrides.cms_service_domain.as_ref() {
            self.cms.service_domain = Some(domain.clone());
        }
        if let Some(key) = overrides.cms_api_key.as_ref() {
            self.cms.api_key = Some(key.clone());
        }
        if let Some(url) = overrides.cms_base_url.as_ref() {
            self.cms.base_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.cms_request_timeout_seconds {
            self.cms.request_timeout_seconds = Some(seconds);
        }
        if let Some(secret) = overrides.webhook_secret.as_ref() {
            self.webhook.secret = Some(secret.clone());
        }
        if let Some(user) = overrides.basic_auth_user.as_ref() {
            self.basic_auth.user = Some(user.clone());
        }
        if let Some(password) = overrides.basic_auth_password.as_ref() {
            self.basic_auth.password = Some(password.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cms,
            webhook,
            cache,
            basic_auth,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            cms: build_cms_settings(cms)?,
            webhook: build_webhook_settings(webhook)?,
            cache: build_cache_settings(cache)?,
            basic_auth: build_basic_auth_settings(basic_auth),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cms_settings(cms: RawCmsSettings) -> Result<CmsSettings, LoadError> {
    let base_url = match non_blank(cms.base_url) {
        Some(url) => {
            parse_api_root(&url).map_err(|reason| LoadError::invalid("cms.base_url", reason))?
        }
        None => {
            let domain = non_blank(cms.service_domain).ok_or_else(|| {
                LoadError::invalid("cms.service_domain", "CMS service domain is required")
            })?;
            let url = format!("https://{}/api/v1/", expand_service_domain(&domain));
            parse_api_root(&url)
                .map_err(|reason| LoadError::invalid("cms.service_domain", reason))?
        }
    };

    let api_key = non_blank(cms.api_key)
        .ok_or_else(|| LoadError::invalid("cms.api_key", "CMS API key is required"))?;

    let header = cms
        .api_key_header
        .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string());
    let api_key_header = HeaderName::from_bytes(header.trim().as_bytes()).map_err(|err| {
        LoadError::invalid("cms.api_key_header", format!("invalid header name: {err}"))
    })?;

    let timeout_secs = cms
        .request_timeout_seconds
        .unwrap_or(DEFAULT_CMS_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "cms.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let page_limit = non_zero_u32(
        cms.page_limit.unwrap_or(DEFAULT_PAGE_LIMIT.into()),
        "cms.page_limit",
    )?;

    Ok(CmsSettings {
        base_url,
        api_key,
        api_key_header,
        request_timeout: Duration::from_secs(timeout_secs),
        page_limit,
    })
}

fn build_webhook_settings(webhook: RawWebhookSettings) -> Result<WebhookSettings, LoadError> {
    let limit = webhook
        .max_body_bytes
        .unwrap_or(DEFAULT_WEBHOOK_BODY_LIMIT_BYTES);
    if limit == 0 {
        return Err(LoadError::invalid(
            "webhook.max_body_bytes",
            "must be greater than zero",
        ));
    }
    let max_body_bytes = usize::try_from(limit).map_err(|_| {
        LoadError::invalid(
            "webhook.max_body_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(WebhookSettings {
        secret: non_blank(webhook.secret),
        max_body_bytes,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let fetch_limit = NonZeroUsize::new(cache.fetch_limit.unwrap_or(DEFAULT_FETCH_CACHE_LIMIT))
        .ok_or_else(|| LoadError::invalid("cache.fetch_limit", "must be greater than zero"))?;
    let response_limit =
        NonZeroUsize::new(cache.response_limit.unwrap_or(DEFAULT_RESPONSE_CACHE_LIMIT))
            .ok_or_else(|| {
                LoadError::invalid("cache.response_limit", "must be greater than zero")
            })?;

    let response_body_limit_bytes = cache
        .response_body_limit_bytes
        .unwrap_or(DEFAULT_RESPONSE_BODY_LIMIT_BYTES);
    if response_body_limit_bytes == 0 {
        return Err(LoadError::invalid(
            "cache.response_body_limit_bytes",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        enable_fetch_cache: cache.enable_fetch_cache.unwrap_or(true),
        enable_response_cache: cache.enable_response_cache.unwrap_or(true),
        fetch_limit,
        response_limit,
        response_body_limit_bytes,
    })
}

/// The gate is active only when both credentials are present.
fn build_basic_auth_settings(basic_auth: RawBasicAuthSettings) -> Option<BasicAuthSettings> {
    let user = basic_auth.user.filter(|value| !value.is_empty())?;
    let password = basic_auth.password.filter(|value| !value.is_empty())?;
    Some(BasicAuthSettings { user, password })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCmsSettings {
    service_domain: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    api_key_header: Option<String>,
    request_timeout_seconds: Option<u64>,
    page_limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWebhookSettings {
    secret: Option<String>,
    max_body_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enable_fetch_cache: Option<bool>,
    enable_response_cache: Option<bool>,
    fetch_limit: Option<usize>,
    response_limit: Option<usize>,
    response_body_limit_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBasicAuthSettings {
    user: Option<String>,
    password: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// A bare service id (no dot) names a hosted microCMS service.
fn expand_service_domain(domain: &str) -> String {
    if domain.contains('.') {
        domain.to_string()
    } else {
        format!("{domain}.{DEFAULT_CMS_HOST_SUFFIX}")
    }
}

fn parse_api_root(candidate: &str) -> Result<Url, String> {
    let mut url =
        Url::parse(candidate).map_err(|err| format!("invalid URL `{candidate}`: {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::{Args, Parser, builder::BoolishValueParser};

/// Command-line arguments for the Folio binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Folio portfolio server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// CMS service domain, or a bare microCMS service id.
    #[arg(
        long = "cms-service-domain",
        env = "MICROCMS_SERVICE_DOMAIN",
        value_name = "DOMAIN"
    )]
    pub cms_service_domain: Option<String>,

    /// CMS read API key.
    #[arg(
        long = "cms-api-key",
        env = "MICROCMS_API_KEY",
        value_name = "KEY",
        hide_env_values = true
    )]
    pub cms_api_key: Option<String>,

    /// Override the CMS API root (e.g. a local mock).
    #[arg(long = "cms-base-url", value_name = "URL")]
    pub cms_base_url: Option<String>,

    /// Override the outbound CMS request timeout.
    #[arg(long = "cms-request-timeout-seconds", value_name = "SECONDS")]
    pub cms_request_timeout_seconds: Option<u64>,

    /// Shared secret used to verify webhook signatures.
    #[arg(
        long = "webhook-secret",
        env = "MICROCMS_WEBHOOK_SECRET",
        value_name = "SECRET",
        hide_env_values = true
    )]
    pub webhook_secret: Option<String>,

    /// Basic-auth user for the public site.
    #[arg(long = "basic-auth-user", env = "BASIC_AUTH_USER", value_name = "USER")]
    pub basic_auth_user: Option<String>,

    /// Basic-auth password for the public site.
    #[arg(
        long = "basic-auth-password",
        env = "BASIC_AUTH_PASSWORD",
        value_name = "PASSWORD",
        hide_env_values = true
    )]
    pub basic_auth_password: Option<String>,
}

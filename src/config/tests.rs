use std::io::Write as _;

use super::*;

fn raw_with_cms() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.cms.service_domain = Some("portfolio".to_string());
    raw.cms.api_key = Some("read-key".to_string());
    raw
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_cms();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_apply_when_only_credentials_are_set() {
    let settings = Settings::from_raw(raw_with_cms()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.cms.request_timeout, Duration::from_secs(10));
    assert_eq!(settings.cms.page_limit.get(), 100);
    assert_eq!(settings.cms.api_key_header.as_str(), "x-microcms-api-key");
    assert_eq!(settings.webhook.max_body_bytes, 1024 * 1024);
    assert!(settings.webhook.secret.is_none());
    assert!(settings.cache.enable_fetch_cache);
    assert!(settings.cache.enable_response_cache);
    assert!(settings.basic_auth.is_none());
}

#[test]
fn bare_service_id_expands_to_hosted_domain() {
    let settings = Settings::from_raw(raw_with_cms()).expect("valid settings");
    assert_eq!(
        settings.cms.base_url.as_str(),
        "https://portfolio.microcms.io/api/v1/"
    );
}

#[test]
fn qualified_service_domain_is_used_verbatim() {
    let mut raw = raw_with_cms();
    raw.cms.service_domain = Some("cms.example.com".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.cms.base_url.as_str(),
        "https://cms.example.com/api/v1/"
    );
}

#[test]
fn base_url_override_gains_trailing_slash() {
    let mut raw = raw_with_cms();
    raw.cms.service_domain = None;
    raw.cms.base_url = Some("http://127.0.0.1:9000/api/v1".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.cms.base_url.as_str(),
        "http://127.0.0.1:9000/api/v1/"
    );
}

#[test]
fn missing_service_domain_is_fatal() {
    let mut raw = raw_with_cms();
    raw.cms.service_domain = Some("   ".to_string());

    let err = Settings::from_raw(raw).expect_err("domain required");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cms.service_domain",
            ..
        }
    ));
}

#[test]
fn missing_api_key_is_fatal() {
    let mut raw = raw_with_cms();
    raw.cms.api_key = None;

    let err = Settings::from_raw(raw).expect_err("key required");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cms.api_key",
            ..
        }
    ));
}

#[test]
fn blank_webhook_secret_counts_as_unset() {
    let mut raw = raw_with_cms();
    raw.webhook.secret = Some(String::new());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.webhook.secret.is_none());
}

#[test]
fn basic_auth_requires_both_credentials() {
    let mut raw = raw_with_cms();
    raw.basic_auth.user = Some("admin".to_string());

    let settings = Settings::from_raw(raw.clone()).expect("valid settings");
    assert!(settings.basic_auth.is_none());

    raw.basic_auth.password = Some("hunter2".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    let auth = settings.basic_auth.expect("gate enabled");
    assert_eq!(auth.user, "admin");
    assert_eq!(auth.password, "hunter2");
}

#[test]
fn zero_limits_are_rejected() {
    let mut raw = raw_with_cms();
    raw.cache.fetch_limit = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = raw_with_cms();
    raw.webhook.max_body_bytes = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = raw_with_cms();
    raw.cms.page_limit = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn invalid_api_key_header_is_rejected() {
    let mut raw = raw_with_cms();
    raw.cms.api_key_header = Some("not a header".to_string());

    let err = Settings::from_raw(raw).expect_err("header must be a token");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cms.api_key_header",
            ..
        }
    ));
}

#[test]
fn debug_output_redacts_secrets() {
    let mut raw = raw_with_cms();
    raw.webhook.secret = Some("s3cret".to_string());
    raw.basic_auth.user = Some("admin".to_string());
    raw.basic_auth.password = Some("hunter2".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    let rendered = format!("{settings:?}");
    assert!(!rendered.contains("read-key"));
    assert!(!rendered.contains("s3cret"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = raw_with_cms();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "folio",
        "--server-host",
        "0.0.0.0",
        "--cms-service-domain",
        "portfolio",
        "--webhook-secret",
        "s3cret",
    ]);

    assert_eq!(args.overrides.server_host.as_deref(), Some("0.0.0.0"));
    assert_eq!(
        args.overrides.cms_service_domain.as_deref(),
        Some("portfolio")
    );
    assert_eq!(args.overrides.webhook_secret.as_deref(), Some("s3cret"));
}

#[test]
fn config_file_layer_is_loaded() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(
        file,
        "[server]\nport = 8088\n\n[cms]\nservice_domain = \"cms.example.com\"\napi_key = \"from-file\"\n\n[webhook]\nsecret = \"file-secret\""
    )
    .expect("write config");

    let args = CliArgs {
        config_file: Some(file.path().to_path_buf()),
        overrides: ServeOverrides {
            webhook_secret: Some("cli-secret".to_string()),
            ..Default::default()
        },
    };

    let settings = load(&args).expect("settings load");
    assert_eq!(settings.server.addr.port(), 8088);
    assert_eq!(settings.cms.api_key, "from-file");
    assert_eq!(settings.webhook.secret.as_deref(), Some("cli-secret"));
}

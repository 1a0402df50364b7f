use std::{process, sync::Arc};

use folio::{
    application::{error::AppError, revalidate::RevalidationService, site::SiteService},
    cache::{CacheConfig, CacheState, SiteCache},
    config,
    infra::{
        cms::CmsClient,
        error::InfraError,
        http::{self, BasicAuthState, HttpState},
        telemetry,
    },
};
use tokio::{net::TcpListener, sync::Notify};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let state = build_http_state(&settings)?;
    serve_http(&settings, state).await
}

fn build_http_state(settings: &config::Settings) -> Result<HttpState, AppError> {
    let cache = SiteCache::new(CacheConfig::from(&settings.cache));
    if !cache.config().is_enabled() {
        info!(
            target = "folio::startup",
            "caching disabled; every page render reads the CMS"
        );
    }
    let cms = Arc::new(CmsClient::new(&settings.cms, cache.clone())?);
    let site = Arc::new(SiteService::new(cms));

    let revalidation =
        RevalidationService::new(settings.webhook.secret.clone(), Arc::new(cache.clone()));
    if !revalidation.is_configured() {
        warn!(
            target = "folio::startup",
            "webhook secret not configured; revalidation requests will be refused"
        );
    }

    let response_cache = if cache.config().enable_response_cache {
        Some(CacheState { cache })
    } else {
        None
    };

    Ok(HttpState {
        site,
        revalidation,
        cache: response_cache,
        basic_auth: settings.basic_auth.clone().map(BasicAuthState::new),
        webhook_body_limit: settings.webhook.max_body_bytes,
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "folio::startup",
        addr = %settings.server.addr,
        basic_auth = settings.basic_auth.is_some(),
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    let shutdown = Arc::new(Notify::new());
    let notified = shutdown.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { notified.notified().await })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| AppError::unexpected(format!("server error: {err}")));
        }
        () = shutdown_signal() => shutdown.notify_one(),
    }

    // Shutdown was requested; give in-flight requests `grace` to finish.
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        Err(_) => {
            warn!(
                target = "folio::startup",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!(target = "folio::startup", "shutdown signal received");
}

//! HTTP server facade for folio with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{routing::get, Router};

use folio_kernel::ModuleRegistry;

pub mod error;
pub mod page;
pub mod router;

pub use router::collect_openapi;

use router::RouterBuilder;

/// Start the HTTP server with the given module registry.
///
/// Serves until ctrl-c, then returns so the caller can stop modules.
pub async fn start_server(
    registry: &ModuleRegistry,
    settings: &folio_kernel::settings::Settings,
) -> anyhow::Result<()> {
    let app = build_router(registry, settings);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", settings.server.host, settings.server.port))
            .await
            .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Build the main HTTP router with all module routes merged in.
pub fn build_router(
    registry: &ModuleRegistry,
    settings: &folio_kernel::settings::Settings,
) -> Router {
    let mut router_builder = RouterBuilder::new();

    router_builder = router_builder
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms);

    router_builder = router_builder.route("/healthz", get(health_check));

    for module in registry.modules() {
        tracing::info!(module = module.name(), "mounting module routes");
        router_builder = router_builder.mount_module(module.routes());
    }

    router_builder = router_builder.with_openapi(registry);

    router_builder.build()
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install ctrl-c handler");
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

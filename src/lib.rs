//! Folio application library: module wiring and server bootstrap.

pub mod modules;

use folio_kernel::module::InitCtx;
use folio_kernel::settings::Settings;
use folio_kernel::ModuleRegistry;

/// Build the registry with every application module registered.
pub fn build_registry(settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings);
    registry
}

/// Run the module lifecycle around the HTTP server: init, start, serve until
/// shutdown, stop.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let registry = build_registry(&settings);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    folio_http::start_server(&registry, &settings).await?;

    registry.stop_modules().await
}

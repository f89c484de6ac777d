use anyhow::Context;
use folio_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load folio settings")?;
    folio_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        host = %settings.server.host,
        port = settings.server.port,
        "folio-app bootstrap starting"
    );

    folio_app::serve(settings).await
}

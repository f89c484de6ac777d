//! Tracing pipeline bootstrap.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

use folio_kernel::settings::{LogFormat, TelemetrySettings};

/// Initialize the tracing/logging pipeline.
///
/// The filter honors `RUST_LOG` and defaults to `info`. Calling this twice
/// fails, as with any global subscriber install.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|error| anyhow!("failed to initialize tracing: {error}"))?;

    tracing::debug!(format = ?settings.log_format, "telemetry initialized");
    Ok(())
}

use anyhow::Context;
use clap::{Parser, Subcommand};

use folio_kernel::settings::Settings;

#[derive(Parser)]
#[command(name = "folio-cli", about = "Book catalog service", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Override the configured bind host.
        #[arg(long)]
        host: Option<String>,
        /// Override the configured bind port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the merged OpenAPI document to stdout.
    Openapi,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().with_context(|| "failed to load folio settings")?;

    match cli.command {
        Command::Serve { host, port } => {
            folio_telemetry::init(&settings.telemetry)?;

            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }

            tracing::info!(env = ?settings.environment, "folio serve starting");

            tokio::runtime::Runtime::new()
                .context("failed to build tokio runtime")?
                .block_on(folio_app::serve(settings))
        }
        Command::Openapi => {
            let registry = folio_app::build_registry(&settings);
            let spec = folio_http::collect_openapi(&registry);
            println!("{}", serde_json::to_string_pretty(&spec)?);
            Ok(())
        }
    }
}

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use staffing_catalog::{
    cli::{self, Cli, Command},
    config,
    service::CatalogService,
    store::{MemoryStore, PgStore, Store},
    telemetry, ui,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::init()?;

    // Logs would draw over the browser, so only plain commands get a subscriber
    if !matches!(cli.command, Command::Browse) {
        telemetry::init(&config)?;
    }

    match config.database_url() {
        Some(url) => {
            let store = PgStore::connect(url, &config).await?;
            info!(max_connections = config.max_connections, "database connection established");
            run(CatalogService::new(store), cli.command).await
        }
        None => {
            warn!("DATABASE_URL is not set; using an in-memory store that is discarded on exit");
            run(CatalogService::new(MemoryStore::new()), cli.command).await
        }
    }
}

async fn run<S: Store>(service: CatalogService<S>, command: Command) -> Result<ExitCode> {
    if let Command::Browse = command {
        ui::run(&service).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let envelope = cli::execute(&service, command).await?;
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    if envelope.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}


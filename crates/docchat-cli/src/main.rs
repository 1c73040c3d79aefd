use std::sync::Arc;

use anyhow::Context;
use docchat_cli::{config::Config, logging::init_logging, Repl};
use docchat_client::HttpChatBackend;
use docchat_session::SessionController;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.logging);

    tracing::info!("Starting docchat");
    tracing::info!("Backend: {}", config.backend.base_url);

    let backend = HttpChatBackend::from_config(&config.backend)
        .context("Failed to create backend client")?;
    let controller = SessionController::new(Arc::new(backend));

    let mut repl = Repl::new(controller, std::io::stdout());
    repl.run(BufReader::new(tokio::io::stdin())).await?;

    tracing::info!("Exiting");
    Ok(())
}

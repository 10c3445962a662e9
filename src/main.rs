//! llamashim HTTP server
//!
//! Starts an Axum web server exposing the OpenAI-compatible chat API.

use clap::Parser;
use llamashim::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Wrote configuration template to {}", path.display());
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // Load configuration
    let config = Config::load(cli.config.as_deref())?.with_bind_overrides(cli.host, cli.port)?;

    // Initialize telemetry
    telemetry::init(&config.observability.log_level);

    let config = Arc::new(config);
    let state = AppState::new(config.clone())?;

    tracing::info!(
        model = %state.adapter().model_id(),
        backend = %state.adapter().backend_name(),
        include_assistant = state.adapter().options().include_assistant,
        "Starting llamashim on {}:{}",
        config.server.host,
        config.server.port
    );

    let app = handlers::router(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("OpenAI base URL: http://{}/v1", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

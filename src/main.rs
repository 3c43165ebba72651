mod channels;
mod config;
mod registry;
mod routes;
mod state;
mod ws;

use tokio::net::TcpListener;

use channels::ChannelDirectory;
use config::{generate_config_template, Config};
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "syncast_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "syncast_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("syncast server v{} starting", env!("CARGO_PKG_VERSION"));

    // Build the channel directory from config, fixed for the process lifetime
    let directory = ChannelDirectory::from_config(config.channels.clone());
    tracing::info!("serving {} audio channels", directory.len());

    // Build application state: registry + directory behind Arcs
    let app_state = AppState::new(directory);

    // Build router
    let app = routes::build_router(app_state);

    // Bind and serve
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

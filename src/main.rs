use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use subscription_service::db;
use subscription_service::server::config::ServerConfig;
use subscription_service::web::{create_axum_router, templates::Templates};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    dotenv().ok();

    // Logging needs the log directory, so configuration errors go to stderr.
    let server_config = ServerConfig::load(args.config.as_deref()).map_err(|e| {
        eprintln!("Failed to load server configuration: {e}");
        e
    })?;

    init_logging(&server_config.log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting subscription service");

    // --- Database Setup ---
    let db_pool = db::connect(&server_config.database_url, server_config.max_connections)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to initialize database.");
            e
        })?;

    // --- Templates ---
    let templates = Templates::load().map_err(|e| {
        error!(error = %e, "Failed to load HTML templates.");
        e
    })?;

    // --- Axum HTTP Server Setup ---
    let app = create_axum_router(db_pool, templates);

    let addr: SocketAddr = server_config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

use clap::Parser;
use std::error::Error;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use freight_broker::db::JsonStore;
use freight_broker::server::config::ServerConfig;
use freight_broker::timocom::TimocomClient;
use freight_broker::version::VERSION;
use freight_broker::web::{create_axum_router, AppState};

#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

/// The returned guard flushes the file writer on drop; keep it alive for the process lifetime.
fn init_logging(log_dir: &str) -> WorkerGuard {
    // JSON to a daily rotated file
    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, "freight-broker.log"));
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("freight-broker {VERSION}");
        return Ok(());
    }

    let args = Args::parse();

    let config = ServerConfig::load(args.config.as_deref())?;
    let _log_guard = init_logging(&config.log_dir);
    info!(version = VERSION, listen_address = %config.listen_address, "Starting freight broker.");
    config.warn_if_incomplete();

    let store = JsonStore::open(&config.data_file).await.map_err(|e| {
        error!(error = %e, path = %config.data_file, "Failed to open data file.");
        e
    })?;
    let timocom = TimocomClient::new(&config)?;
    info!(base_url = timocom.base_url(), "Freight exchange client ready.");

    let listener = TcpListener::bind(&config.listen_address).await.map_err(|e| {
        error!(error = %e, address = %config.listen_address, "Failed to bind listen address.");
        e
    })?;
    let app = create_axum_router(AppState::new(store, timocom, config));

    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

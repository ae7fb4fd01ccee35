use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use wisdom21::config::{self, CliArgs, Config};
use wisdom21::worker::start_rollover_worker;
use wisdom21::{create_app, db, AppState};

/// Installs the console logger and, if a log directory is configured, a JSON
/// file logger that rolls over daily
///
/// The returned guard flushes the file logger when dropped and must be kept
/// alive for as long as the server runs.
fn init_logging(config: &Config, debug: bool) -> Option<WorkerGuard> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "wisdom21.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let args = CliArgs::parse();
    let debug = args.debug;
    let config = config::get_config(args);

    let _guard = init_logging(&config, debug);
    info!("Starting wisdom21 server");

    // Initialize the database pool and bring the schema up to date
    let pool = Arc::new(db::init_pool(&config.database_url)?);
    {
        let mut conn = pool.get().context("Failed to get a connection for migrations")?;
        db::run_migrations(&mut conn)?;
    }

    let worker = start_rollover_worker(pool.clone(), config.rollover_check_interval(), config.auto_advance);

    let state = Arc::new(AppState::new(pool, &config));
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    worker.shutdown().await;
    info!("Server stopped");

    Ok(())
}

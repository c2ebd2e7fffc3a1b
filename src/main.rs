use clap::Parser;
use oinp_monitor::monitor::{
    ConfigStore, HttpRoundSource, MonitorError, MonitorScheduler, SeenStateStore,
};
use oinp_monitor::notifications::NotificationService;
use oinp_monitor::server::config::ServerConfig;
use oinp_monitor::version::VERSION;
use oinp_monitor::web;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "monitor.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let server_config = ServerConfig::load(args.config.as_deref())?;
    init_logging(&server_config.log_dir);
    info!("Starting OINP monitor, version: {}", VERSION);

    let source = HttpRoundSource::new(&server_config.source_url, server_config.request_timeout())?;
    let notifications = NotificationService::new(
        server_config.request_timeout(),
        &server_config.telegram_api_base,
    )?;
    let scheduler = MonitorScheduler::new(
        Arc::new(source),
        Arc::new(notifications),
        ConfigStore::in_dir(&server_config.data_dir),
        SeenStateStore::in_dir(&server_config.data_dir),
    );

    match scheduler.start().await {
        Ok(state) => info!(?state, "Monitoring resumed from saved configuration."),
        Err(MonitorError::Inactive) => info!("Monitoring is inactive; waiting for it to be enabled."),
        Err(e) => warn!("Failed to start monitoring: {}", e),
    }

    let app = web::create_router(scheduler.clone());
    let listener = tokio::net::TcpListener::bind(&server_config.listen_addr).await?;
    info!("HTTP API listening on {}", server_config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    info!("OINP monitor stopped.");
    Ok(())
}

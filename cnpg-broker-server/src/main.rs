use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod api;
mod auth;
mod cli;
mod commands;
mod config;
mod metrics;

use cli::{Args, Mode};
use commands::instance::{self, BrokerClient};
use config::Config;

/// Initialize tracing:
/// 1. Console output (stderr), so client output on stdout stays clean
/// 2. Optional daily-rolled file in BROKER_LOG_DIR
///
/// The returned guard flushes the file writer and must live until exit.
fn initialize_tracing(config: &Config) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    // RUST_LOG wins over BROKER_LOG_LEVEL
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("Invalid log level '{}'", config.log_level))?,
    };

    let console_layer = if config.log_timestamp {
        fmt::layer().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).without_time().boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "cnpg-broker.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(file_writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    let config = Config::load()?;
    let _guard = initialize_tracing(&config)?;

    let client = BrokerClient::new(&args.url, &config);
    let output = args.output.as_str();

    // Route to appropriate handler
    match args.mode {
        Mode::Serve { port } => {
            commands::serve::run_serve(config, port).await
        }
        Mode::Catalog => {
            instance::run_catalog(&client, output).await
        }
        Mode::Provision { instance_id, service, plan } => {
            instance::run_provision(&client, &instance_id, &service, &plan, output).await
        }
        Mode::Status { instance_id } => {
            instance::run_status(&client, &instance_id, output).await
        }
        Mode::Update { instance_id, service, plan } => {
            instance::run_update(&client, &instance_id, &service, &plan, output).await
        }
        Mode::Deprovision { instance_id } => {
            instance::run_deprovision(&client, &instance_id, output).await
        }
        Mode::Bind { instance_id, binding_id } => {
            instance::run_bind(&client, &instance_id, &binding_id, output).await
        }
        Mode::Unbind { instance_id, binding_id } => {
            instance::run_unbind(&client, &instance_id, &binding_id, output).await
        }
    }
}

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod errors;
mod handlers;
mod models;
mod services;

use cli::{Cli, Command};
use config::AppConfig;
use errors::AppError;
use services::admin::BucketAdmin;

#[tokio::main]
async fn main() {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("s3ops: {err}");
        std::process::exit(err.exit_code);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    // --- Parse config ---
    let config = AppConfig::from_env_and_args(&cli.global)?;
    tracing::debug!("resolved config: {config:?}");

    // --- Initialize shared client ---
    let client = config.connect().await;

    // --- Dispatch ---
    match cli.command {
        Command::Bucket(command) => {
            let admin = BucketAdmin::new(client);
            handlers::bucket_handlers::dispatch(&admin, &config, command).await
        }
        Command::Object(command) => {
            handlers::object_handlers::dispatch(client, &config, command).await
        }
        Command::Sweep {
            bucket,
            prefix,
            months,
            json,
        } => handlers::object_handlers::sweep(client, bucket, prefix, months, json).await,
    }
}

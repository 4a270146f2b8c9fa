//! Fieldforce terminal console.

#![forbid(unsafe_code)]

mod commands;
mod console_config;

use std::env;

use fieldforce_core::AppError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::Console;
use crate::console_config::{Command, ConsoleConfig};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    let config = ConsoleConfig::load()?;
    info!(api_base_url = %config.api_base_url, "fieldforce console starting");

    let console = Console::connect(config)?;
    console.run(command).await.inspect_err(|error| {
        warn!(error = %error, "command failed");
        eprintln!("{}", error.user_message());
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

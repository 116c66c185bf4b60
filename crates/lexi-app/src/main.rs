use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use lexi_config::StoreBackend;
use lexi_core::state::AppState;
use tokio::signal;

mod backend;
mod console;
mod controller;
mod events;
mod logging;
mod profile;

#[cfg(test)]
mod tests;

use self::backend::Backends;
use self::controller::AppController;

#[derive(Debug, Parser)]
#[command(name = "lexi", about = "Vocabulary notebook and quiz", version)]
struct Cli {
    /// Profile to load from the profiles directory
    #[arg(long, default_value = "main")]
    profile: String,

    /// Load this config file instead of a profile
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the in-process store regardless of configuration
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => profile::load_config_file(path)?,
        None => {
            profile::init_user_config()?;
            profile::load_user_profile(&cli.profile)?
        }
    }
    .with_env();

    if cli.memory {
        config.store.backend = StoreBackend::Memory;
    }

    logging::init_tracing(&config.log);
    tracing::info!("starting with {:?} store", config.store.backend);

    let backends = Backends::from_config(&config)?;
    let state = Arc::new(AppState::new(config));
    let controller = AppController::new(state);
    let mut tasks = controller.spawn_tasks(backends);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::debug!("task finished"),
                Ok(Err(e)) => tracing::error!("task failed: {e:#}"),
                Err(e) => tracing::error!("task panicked: {e}"),
            }
        }
    }

    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        if let Ok(Err(e)) = result {
            tracing::error!("task failed during shutdown: {e:#}");
        }
    }

    Ok(())
}

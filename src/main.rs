use anyhow::Result;
use counter_signals::prelude::*;
use tracing::info;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigStore::load()?;

    let log_config: LogConfig = config.get()?;
    // Keeps the file writer alive until exit.
    let _log_guard = init_logging(&log_config)?;

    info!("Starting counter-signals...");
    if let Some(path) = config.path() {
        info!("Configuration file: {}", path.display());
    }

    let app = App::from_config(&config).await?;
    app.run().await?;

    info!("counter-signals stopped");
    Ok(())
}

//! sales-ledger: HTTP service over the indexed sales store
//!
//! ## Configuration
//! - `config.yaml` in the working directory, or the file named by
//!   SALES_LEDGER_CONFIG (or the first CLI argument)
//! - SALES_LEDGER_SERVER__PORT, SALES_LEDGER_STORAGE__GRANULARITY, ...
//! - PORT: HTTP port (default: 8005)
//! - SALES_LEDGER_LOG: tracing filter (default: logging.level)

use tracing::info;

use sales_ledger::config::Config;
use sales_ledger::service::SalesService;
use sales_ledger::storage::init_storage;
use sales_ledger::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref())?;

    init_tracing(&config.logging);

    let storage = init_storage(&config.storage)?;
    let service = SalesService::new(storage);

    info!(
        address = %config.server.socket_addr()?,
        granularity = config.storage.granularity,
        "sales-ledger starting"
    );

    sales_ledger::http::serve(service, &config.server).await?;

    info!("sales-ledger stopped");
    Ok(())
}

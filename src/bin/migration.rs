use apartment_billing::{config, migrator};
use tracing::info;

/// Applies pending migrations to the configured database, or to the URL
/// given as the first argument.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let database_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| cfg.database_url.clone());

    info!("Migrating database");
    migrator::run_migration(&database_url).await?;
    Ok(())
}

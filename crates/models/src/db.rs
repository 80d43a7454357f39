use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

/// Connect using pool limits and timeouts from configuration. Store calls
/// must fail within a bound rather than hang; the acquire/connect timeouts
/// are that bound.
pub async fn connect_with(cfg: &configs::DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(cfg.url.clone());
    opts.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .sqlx_logging(cfg.sqlx_logging);
    let db = Database::connect(opts).await?;
    Ok(db)
}

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::auth::ServerState;
use crate::routes;
use service::{
    accounts::{
        repo::seaorm::SeaOrmAccountRepository,
        service::{AccountConfig, AccountService},
    },
    catalog::{repo::seaorm::SeaOrmCatalogRepository, CatalogService},
    throttle::RateLimits,
    ApiCache, Throttle,
};

fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Host and port come from configs, which already folds in the
/// SERVER_HOST/SERVER_PORT environment fallbacks.
fn load_bind_addr(cfg: &configs::AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Wire the application state from config: database, cache, services.
pub async fn build_state(cfg: &configs::AppConfig) -> anyhow::Result<ServerState> {
    let db = models::db::connect_with(&cfg.database).await?;
    Migrator::up(&db, None).await?;

    let cache = Arc::new(ApiCache::new(
        Duration::from_secs(cfg.cache.ttl_secs),
        cfg.cache.max_entries,
    ));

    let jwt_secret = if cfg.auth.jwt_secret.trim().is_empty() {
        warn!("JWT_SECRET not set, using development default");
        "dev-secret-change-me".to_string()
    } else {
        cfg.auth.jwt_secret.clone()
    };

    let accounts = Arc::new(AccountService::new(
        Arc::new(SeaOrmAccountRepository { db: db.clone() }),
        AccountConfig {
            jwt_secret: Some(jwt_secret.clone()),
            token_expiry_hours: cfg.auth.token_expiry_hours,
        },
    ));
    let catalog = Arc::new(CatalogService::new(
        Arc::new(SeaOrmCatalogRepository { db }),
        Arc::clone(&cache),
    ));

    let throttle = cfg.throttle.enabled.then(|| {
        Arc::new(Throttle::new(RateLimits {
            staff_per_window: cfg.throttle.staff_per_min,
            user_per_window: cfg.throttle.user_per_min,
        }))
    });

    Ok(ServerState { accounts, catalog, cache, throttle, jwt_secret })
}

/// Public entry: build the app and run the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = configs::AppConfig::load_and_validate().unwrap_or_else(|e| {
        warn!(error = %e, "config load failed, using defaults plus environment");
        let mut cfg = configs::AppConfig::default();
        cfg.server.normalize_from_env();
        cfg.database.normalize_from_env();
        cfg.auth.normalize_from_env();
        cfg
    });

    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(build_cors(), state);

    let addr = load_bind_addr(&cfg)?;
    info!(%addr, "starting nearby-services API");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

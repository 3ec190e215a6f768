use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderValue;
use common::cdn::build_invalidator;
use common::storage::build_blob_store;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use server::config::{AppConfig, CorsConfig};
use server::database::init_db;
use server::files::{CollectorRegistry, GarbageCollector, run_file_gc};
use server::indexes::ensure_indexes;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    ensure_indexes(&db).await?;

    let blob_store = build_blob_store(&config.storage)
        .await
        .context("Failed to initialise blob store")?;
    let cdn = build_invalidator(&config.cdn).context("Failed to initialise CDN invalidator")?;
    info!(
        storage = ?config.storage.backend,
        cdn = ?config.cdn.backend,
        "Storage backends ready"
    );

    let collectors = Arc::new(CollectorRegistry::for_mappings(&db));
    let gc = GarbageCollector::new(
        db.clone(),
        collectors,
        blob_store.clone(),
        cdn,
        config.gc.clone(),
    );

    if config.gc.enabled {
        tokio::spawn(run_file_gc(gc.clone()));
    } else {
        warn!("File garbage collection is disabled");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let cors = cors_layer(&config.server.cors);

    let state = AppState {
        db,
        config: Arc::new(config),
        blob_store,
        gc,
    };
    let app = server::build_router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age))
}

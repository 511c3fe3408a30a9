use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use smartlink::config::Config;
use smartlink::geo::GeoResolver;
use smartlink::storage::{CachedRepository, ClickRecorder, LinkRepository, SqliteStore};
use smartlink::tracking::{create_tracking_router, RateLimiter, TrackingState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    info!("Using SQLite storage: {}", config.database.url);
    let store = Arc::new(
        SqliteStore::new(&config.database.url, config.database.max_connections).await?,
    );
    store.init().await?;
    info!("Database initialized successfully");

    // Destination lookups go through a read cache; click writes hit the
    // store directly.
    let repository: Arc<dyn LinkRepository> = Arc::new(CachedRepository::new(
        Arc::clone(&store) as Arc<dyn LinkRepository>,
        config.tracking.link_cache_max_entries,
        Duration::from_secs(config.tracking.link_cache_ttl_secs),
    ));
    let recorder: Arc<dyn ClickRecorder> = Arc::clone(&store) as Arc<dyn ClickRecorder>;

    // Geolocation chain: primary and fallback HTTP providers behind a
    // shared TTL cache
    let geo = Arc::new(GeoResolver::from_config(&config.geo)?);
    info!(
        "🌍 Geolocation providers: {} (primary), {} (fallback)",
        config.geo.primary_url, config.geo.fallback_url
    );

    let rate_limiter = config.tracking.rate_limit.as_ref().map(|limits| {
        info!(
            "Rate limiting enabled: {} requests / {}s per client",
            limits.max_requests, limits.window_secs
        );
        RateLimiter::new(limits.max_requests, Duration::from_secs(limits.window_secs))
    });

    let state = Arc::new(TrackingState {
        repository,
        recorder,
        geo,
        rate_limiter,
        expose_errors: config.tracking.expose_error_details,
        debug_tracking_param: config.tracking.debug_tracking_param,
    });

    let app = create_tracking_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Click tracking server listening on http://{}", addr);
    info!("   - POST http://{}/api/track/click", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

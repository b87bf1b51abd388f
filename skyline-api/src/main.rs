use anyhow::Context;
use skyline_api::{app, demo, state::AppState};
use skyline_core::memory::InMemoryStore;
use skyline_store::{app_config::Config, DbClient, RedisClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyline_api=debug,skyline_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Skyline API on port {}", config.server.port);

    let mut app_state = match &config.database {
        Some(db_config) => {
            let db = DbClient::new(db_config)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            AppState::postgres(&db)
        }
        None => {
            tracing::warn!("No database configured, using in-memory store");
            let store = InMemoryStore::new();
            demo::seed_demo_data(&store);
            AppState::in_memory(store)
        }
    };

    // Rate limiting is only enabled with Redis
    if let Some(redis_config) = &config.redis {
        let redis = RedisClient::new(&redis_config.url).context("Invalid Redis URL")?;
        app_state = app_state.with_rate_limiter(Arc::new(redis), config.rate_limit.clone());
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use placement_backend::config::{get_config, init_config};
use placement_backend::database::create_pool;
use placement_backend::error::Result;
use placement_backend::routes::build_router;
use placement_backend::store::postgres::PgStore;
use placement_backend::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "placement_backend=debug,tower_http=debug,sqlx=warn".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    init_config()?;
    let config = get_config();

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|err| placement_backend::error::Error::Internal(err.to_string()))?;

    let store = Arc::new(PgStore::new(pool));
    let state = AppState::new(store, config);
    let app = build_router(state);

    let listener = TcpListener::bind(&config.server_address).await?;
    info!(address = %config.server_address, "placement backend listening");
    axum::serve(listener, app).await?;

    Ok(())
}

use quietroom::auth::TokenCodec;
use quietroom::config::Config;
use quietroom::{AppState, app, db};

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let db_pool = db::connect(&config.database_url).await?;

    let state = AppState {
        db_pool,
        tokens: TokenCodec::new(config.token_secret.as_bytes()),
        token_ttl: config.token_ttl,
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}

use anyhow::{Context, anyhow};

/// Environment-derived configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub token_secret: String,
    pub token_ttl: time::Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://quietroom.db".to_string());
        let bind_addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let token_secret =
            dotenv::var("APP_SECRET").map_err(|_| anyhow!("APP_SECRET must be set"))?;
        let ttl_minutes = match dotenv::var("TOKEN_TTL_MINUTES") {
            Ok(v) => v
                .parse::<i64>()
                .context("TOKEN_TTL_MINUTES must be an integer")?,
            // a day, matching the original deployment default
            Err(_) => 24 * 60,
        };

        Ok(Config {
            database_url,
            bind_addr,
            token_secret,
            token_ttl: time::Duration::minutes(ttl_minutes),
        })
    }
}

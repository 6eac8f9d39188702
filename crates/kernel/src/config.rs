//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::report::MAX_ITEMS_PER_PAGE;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL of the host database.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Statement timeout applied to every report scope (default: 10s).
    pub statement_timeout: Duration,

    /// Largest page a report will return (default: 200).
    pub max_items_per_page: u32,

    /// Base URL of the host's node API (default: `{site_url}/api`).
    pub host_api_url: String,

    /// Public site URL, used to make relative node URLs absolute.
    pub site_url: String,

    /// Timeout for each warm-up resolver call and ping (default: 10s).
    pub warmup_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let statement_timeout = env::var("STATEMENT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map(Duration::from_secs)
            .context("STATEMENT_TIMEOUT_SECS must be a whole number of seconds")?;

        let max_items_per_page = env::var("MAX_ITEMS_PER_PAGE")
            .unwrap_or_else(|_| MAX_ITEMS_PER_PAGE.to_string())
            .parse()
            .context("MAX_ITEMS_PER_PAGE must be a valid u32")?;

        let site_url = env::var("SITE_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

        let host_api_url = env::var("HOST_API_URL")
            .unwrap_or_else(|_| format!("{}/api", site_url.trim_end_matches('/')));

        let warmup_timeout = env::var("WARMUP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map(Duration::from_secs)
            .context("WARMUP_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            statement_timeout,
            max_items_per_page,
            host_api_url,
            site_url,
            warmup_timeout,
        })
    }
}

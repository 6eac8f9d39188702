//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::report::{
    HttpUrlResolver, PgReportStore, ReportingService, UrlResolver, WarmupOptions, WarmupPinger,
};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Reports over the host database.
    reports: ReportingService,

    /// Resolves warm-up nodes to public URLs.
    resolver: Arc<dyn UrlResolver>,

    /// Issues warm-up requests.
    pinger: WarmupPinger,

    warmup: WarmupOptions,
}

impl AppState {
    /// Create new application state, connecting to the host database.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        let store = PgReportStore::new(pool, config.statement_timeout);
        let reports = ReportingService::new(Arc::new(store))
            .with_max_items_per_page(config.max_items_per_page);

        let resolver = HttpUrlResolver::new(
            &config.host_api_url,
            &config.site_url,
            config.warmup_timeout,
        )
        .context("failed to create url resolver")?;

        info!(
            host_api = %config.host_api_url,
            site = %config.site_url,
            "warm-up resolver configured"
        );

        let pinger =
            WarmupPinger::new(config.warmup_timeout).context("failed to create warm-up pinger")?;

        Ok(Self::from_parts(
            reports,
            Arc::new(resolver),
            pinger,
            WarmupOptions {
                call_timeout: config.warmup_timeout,
            },
        ))
    }

    /// Assemble state from already-built services.
    pub fn from_parts(
        reports: ReportingService,
        resolver: Arc<dyn UrlResolver>,
        pinger: WarmupPinger,
        warmup: WarmupOptions,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                reports,
                resolver,
                pinger,
                warmup,
            }),
        }
    }

    pub fn reports(&self) -> &ReportingService {
        &self.inner.reports
    }

    pub fn resolver(&self) -> Arc<dyn UrlResolver> {
        Arc::clone(&self.inner.resolver)
    }

    pub fn pinger(&self) -> &WarmupPinger {
        &self.inner.pinger
    }

    pub fn warmup_options(&self) -> WarmupOptions {
        self.inner.warmup
    }
}

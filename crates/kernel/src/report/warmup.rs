//! Template warm-up.
//!
//! Turns representative node ids into public URLs through a [`UrlResolver`]
//! and pings them so the host compiles each template's view ahead of real
//! traffic. Resolution is best-effort: a node that cannot be resolved, has
//! no URL, errors or times out is logged and skipped.

use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_stream::stream;
use async_trait::async_trait;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Lazy sequence of warm-up URLs.
pub type UrlStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// A content node as the host's resolver sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHandle {
    pub id: i32,
    /// URL as the host reports it; may be relative or absent.
    pub url: Option<String>,
}

/// Resolves content nodes to public URLs.
#[async_trait]
pub trait UrlResolver: Send + Sync {
    /// Look up a node. `None` when the host has no such content.
    async fn resolve_node(&self, id: i32) -> Result<Option<ContentHandle>>;

    /// Absolute public URL of a node. `None` when it has none (e.g. unpublished).
    async fn absolute_url(&self, node: &ContentHandle) -> Result<Option<String>>;
}

/// Warm-up tuning.
#[derive(Debug, Clone, Copy)]
pub struct WarmupOptions {
    /// Upper bound on each resolver call.
    pub call_timeout: Duration,
}

impl Default for WarmupOptions {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Resolve node ids to URLs lazily, in order.
///
/// Nothing is resolved until the stream is polled. Dropping the stream or
/// cancelling `cancel` stops the scan; ids not yet reached are never resolved.
pub fn resolve_urls(
    node_ids: Vec<i32>,
    resolver: Arc<dyn UrlResolver>,
    options: WarmupOptions,
    cancel: CancellationToken,
) -> UrlStream {
    Box::pin(stream! {
        for id in node_ids {
            let resolved = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                url = resolve_one(resolver.as_ref(), id, options.call_timeout) => Some(url),
            };

            match resolved {
                None => {
                    debug!(node_id = id, "warm-up scan cancelled");
                    break;
                }
                Some(Some(url)) => yield url,
                Some(None) => {}
            }
        }
    })
}

async fn resolve_one(resolver: &dyn UrlResolver, id: i32, limit: Duration) -> Option<String> {
    let node = match tokio::time::timeout(limit, resolver.resolve_node(id)).await {
        Ok(Ok(Some(node))) => node,
        Ok(Ok(None)) => {
            debug!(node_id = id, "no content for node, skipping");
            return None;
        }
        Ok(Err(e)) => {
            warn!(node_id = id, error = %e, "node resolution failed, skipping");
            return None;
        }
        Err(_) => {
            warn!(node_id = id, "node resolution timed out, skipping");
            return None;
        }
    };

    match tokio::time::timeout(limit, resolver.absolute_url(&node)).await {
        Ok(Ok(Some(url))) => Some(url),
        Ok(Ok(None)) => {
            debug!(node_id = id, "node has no public url, skipping");
            None
        }
        Ok(Err(e)) => {
            warn!(node_id = id, error = %e, "url resolution failed, skipping");
            None
        }
        Err(_) => {
            warn!(node_id = id, "url resolution timed out, skipping");
            None
        }
    }
}

/// Node as returned by the host's node API.
#[derive(Debug, Deserialize)]
struct NodeResponse {
    id: i32,
    url: Option<String>,
}

/// Resolver backed by the host's HTTP node API.
///
/// `GET {api}/nodes/{id}` answers `{"id": .., "url": ..}` or 404. Relative
/// URLs are made absolute against the public site URL.
#[derive(Clone)]
pub struct HttpUrlResolver {
    client: reqwest::Client,
    api_base: String,
    site_base: Url,
}

impl HttpUrlResolver {
    pub fn new(api_base: &str, site_base: &str, timeout: Duration) -> Result<Self> {
        let site_base = Url::parse(site_base).context("SITE_URL must be an absolute URL")?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build resolver HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            site_base,
        })
    }
}

#[async_trait]
impl UrlResolver for HttpUrlResolver {
    async fn resolve_node(&self, id: i32) -> Result<Option<ContentHandle>> {
        let response = self
            .client
            .get(format!("{}/nodes/{id}", self.api_base))
            .send()
            .await
            .context("node API request failed")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let node: NodeResponse = response
            .error_for_status()
            .context("node API returned an error")?
            .json()
            .await
            .context("invalid node API response")?;

        Ok(Some(ContentHandle {
            id: node.id,
            url: node.url,
        }))
    }

    async fn absolute_url(&self, node: &ContentHandle) -> Result<Option<String>> {
        // The host reports "#" for content without a route
        let Some(raw) = node.url.as_deref().map(str::trim).filter(|u| !u.is_empty() && *u != "#")
        else {
            return Ok(None);
        };

        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .site_base
                .join(raw)
                .with_context(|| format!("cannot join {raw} onto site url"))?,
            Err(e) => return Err(e).with_context(|| format!("invalid node url {raw}")),
        };

        Ok(Some(url.to_string()))
    }
}

/// Result of pinging one warm-up URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingOutcome {
    pub url: String,
    /// HTTP status, when a response arrived.
    pub status: Option<u16>,
    pub elapsed_ms: u64,
    /// Transport error, when no response arrived.
    pub error: Option<String>,
}

impl PingOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..400).contains(&s))
    }
}

/// Issues the warm-up GET requests.
#[derive(Clone)]
pub struct WarmupPinger {
    client: reqwest::Client,
}

impl WarmupPinger {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build warm-up HTTP client")?;

        Ok(Self { client })
    }

    /// GET one URL. Failures are reported in the outcome.
    pub async fn ping(&self, url: &str) -> PingOutcome {
        let started = Instant::now();
        let result = self.client.get(url).send().await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(url, status, elapsed_ms, "warm-up ping");
                PingOutcome {
                    url: url.to_string(),
                    status: Some(status),
                    elapsed_ms,
                    error: None,
                }
            }
            Err(e) => {
                warn!(url, error = %e, "warm-up ping failed");
                PingOutcome {
                    url: url.to_string(),
                    status: None,
                    elapsed_ms,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Ping every URL the stream yields, one at a time.
    pub async fn ping_all(&self, mut urls: UrlStream) -> Vec<PingOutcome> {
        let mut outcomes = Vec::new();
        while let Some(url) = urls.next().await {
            outcomes.push(self.ping(&url).await);
        }
        outcomes
    }
}

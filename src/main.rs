//! Caching Proxy demo
//!
//! Memoizes a slow page "download" keyed by URL and shows that repeated
//! lookups are served from the cache.

use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caching_proxy::{CacheConfig, CachingProxy};

/// Cache key for a web page.
#[derive(Debug, Clone, Serialize)]
struct PageKey {
    url: String,
}

/// Stands in for an HTTP fetch.
async fn download(key: PageKey) -> Result<String> {
    info!("fetch {}", key.url);
    tokio::time::sleep(Duration::from_millis(200)).await;
    Ok(format!("<html><body>{}</body></html>", key.url))
}

/// Entry point for the caching proxy demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Look the same page up twice; only the first lookup fetches
/// 4. Clear the cache so no expiry timers outlive the demo
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=info,caching_proxy_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: max_count={:?}, stale_time={:?}, unused_time={:?}, dedupe_misses={}",
        config.max_count, config.stale_time, config.unused_time, config.dedupe_misses
    );

    let pages: CachingProxy<PageKey, String, _> = CachingProxy::new(config, download);
    let key = PageKey {
        url: "https://example.com".to_string(),
    };

    // Logs "fetch"
    let first = pages.get(&key).await?;
    // Served from the cache, no "fetch"
    let second = pages.get(&key).await?;
    info!("Cached copy matches: {}", first == second);

    let stats = pages.stats();
    info!(
        "hits={}, misses={}, entries={}, hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.total_entries,
        stats.hit_rate()
    );

    let released = pages.clear();
    info!("Released {} entries, shutdown complete", released);
    Ok(())
}

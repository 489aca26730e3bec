//! Mini TTL Cache demo
//!
//! Stores two entries, reads them back and shuts the engine down.

use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_ttl_cache::{Config, TtlCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity={}, sweep_interval={}ms",
        config.capacity, config.sweep_interval_ms
    );

    let cache = TtlCache::with_config(config)?;

    cache.set("DJ", "Dante J", Duration::from_secs(5));
    cache.set("DM", "MOtley", Duration::from_secs(10));

    for key in ["DJ", "DM"] {
        match cache.get(key) {
            Some(hit) => println!(
                "Value: {}\t TTL: {:?}",
                String::from_utf8_lossy(&hit.value),
                hit.ttl
            ),
            None => println!("Value: <absent>\t TTL: 0s"),
        }
    }

    cache.stop().await?;
    info!("Cache stopped");

    Ok(())
}

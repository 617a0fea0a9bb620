use std::sync::Arc;

use tinyweb::auth::MemoryUserStore;
use tinyweb::config::Config;
use tinyweb::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.level())
        .init();

    let users = Arc::new(MemoryUserStore::new());

    tokio::select! {
        res = server::listener::run(&cfg, users) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

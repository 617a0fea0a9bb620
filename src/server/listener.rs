use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::auth::UserVerifier;
use crate::config::Config;
use crate::http::connection::Connection;
use crate::server::ServerContext;

pub async fn run(cfg: &Config, users: Arc<dyn UserVerifier>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.listen_addr))?;
    info!("Listening on {}, serving {}", cfg.listen_addr, cfg.doc_root.display());

    serve(listener, Arc::new(ServerContext::new(cfg, users))).await
}

/// Accepts connections forever, one task per client.
pub async fn serve(listener: TcpListener, ctx: Arc<ServerContext>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, ctx);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {:#}", peer, e);
            }
        });
    }
}

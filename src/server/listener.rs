use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{Instrument, info, warn};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::server::docroot::DocRoot;

/// Pause after a failed accept, so descriptor exhaustion doesn't spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let docroot = Arc::new(DocRoot::open(&cfg.static_files)?);

    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.listen_addr))?;
    info!(
        "Listening on {}, serving {}",
        cfg.server.listen_addr,
        docroot.root().display()
    );

    serve(listener, docroot).await
}

/// Accepts connections forever, handling each on its own task.
pub async fn serve(listener: TcpListener, docroot: Arc<DocRoot>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        info!("Accepted connection from {}", peer);

        let docroot = Arc::clone(&docroot);
        tokio::spawn(
            async move {
                let mut conn = Connection::new(socket, docroot);
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error from {}: {}", peer, e);
                }
            }
            .instrument(tracing::info_span!("conn", %peer)),
        );
    }
}

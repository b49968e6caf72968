//! Bulk read responder.
//!
//! Plain TCP listener that ignores whatever the client sends: every accepted
//! connection gets a fixed `200 OK` status line, a blank line, then one line
//! per stored post, and is closed. Connections are served one at a time.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::storage::Store;

/// Status line and header terminator sent before the posts.
pub const SUCCESS_HEADER: &str = "HTTP/1.1 200 OK\r\n\r\n";

/// Separator written after every post line.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Serves the full post list to every inbound connection.
pub struct BulkReadResponder {
    listener: TcpListener,
    store: Arc<dyn Store>,
}

impl BulkReadResponder {
    /// Bind the listener. Fails if the address is unavailable.
    pub async fn bind(addr: &str, store: Arc<dyn Store>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        log::info!("Bulk read responder listening on {}", listener.local_addr()?);
        Ok(Self { listener, store })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Accept and answer connections forever, one at a time.
    pub async fn run(self) {
        loop {
            let (mut stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(error) => {
                    log::warn!("Failed to accept connection: {}", error);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            match Self::respond(self.store.as_ref(), &mut stream).await {
                Ok(count) => log::debug!("Sent {} posts to {}", count, peer),
                Err(error) => log::warn!("Failed to answer {}: {}", peer, error),
            }
        }
    }

    async fn respond(store: &dyn Store, stream: &mut TcpStream) -> std::io::Result<usize> {
        stream.write_all(SUCCESS_HEADER.as_bytes()).await?;
        let posts = store.get_all().await;
        for post in &posts {
            let line = format!("{post}{LINE_SEPARATOR}");
            stream.write_all(line.as_bytes()).await?;
        }
        stream.shutdown().await?;
        Ok(posts.len())
    }
}

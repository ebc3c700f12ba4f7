// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use crate::server::listener::{bind_tcp, Accept};
use anyhow::{Context, Result};
use hyper::{server::conn::Http, Body, Request, Response};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tower::Service;

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Builder pattern so a frontend can inject its per-connection handler.
///
/// The handler is built per accepted connection from the peer address, so
/// the service knows which client it is serving.
pub struct ServerBuilder<F, H>
where
    F: Fn(SocketAddr) -> H,
    H: Service<Request<Body>, Response = Response<Body>> + Send + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    addr: String,
    make_handler: Option<F>,
}

impl<F, H> ServerBuilder<F, H>
where
    F: Fn(SocketAddr) -> H,
    H: Service<Request<Body>, Response = Response<Body>> + Send + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            make_handler: None,
        }
    }

    /// Inject the handler factory (usually wraps `proxy::Proxy`).
    pub fn with_handler(mut self, make_handler: F) -> Self {
        self.make_handler = Some(make_handler);
        self
    }

    /// Consume the builder, bind the TCP listener, spawn Hyper tasks.
    pub async fn serve(self) -> Result<()> {
        let listener = bind_tcp(&self.addr).await?;
        self.serve_on(listener).await
    }

    /// Same as [`serve`](Self::serve) on an already bound listener.
    ///
    /// Failed accepts are retried with a growing delay; only an error that
    /// means the listener itself is unusable ends the loop.
    pub async fn serve_on<A: Accept>(self, mut listener: A) -> Result<()> {
        let make_handler = self
            .make_handler
            .context("handler must be set via with_handler()")?;
        tracing::info!("HTTP server listening on {}", listener.local_addr()?);

        let mut backoff = ACCEPT_BACKOFF_MIN;
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => {
                    backoff = ACCEPT_BACKOFF_MIN;
                    accepted
                }
                Err(err) if is_connection_error(&err) => {
                    tracing::debug!(%err, "accepted connection already closed");
                    continue;
                }
                Err(err) if err.kind() == io::ErrorKind::InvalidInput => {
                    return Err(err).context("Listener is no longer usable");
                }
                Err(err) => {
                    tracing::warn!(%err, ?backoff, "accept error, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(ACCEPT_BACKOFF_MAX);
                    continue;
                }
            };
            let svc = make_handler(peer);

            // One Tokio task per connection.
            tokio::spawn(async move {
                let http = Http::new();
                if let Err(err) = http.serve_connection(stream, svc).await {
                    tracing::warn!(%peer, %err, "connection error");
                }
            });
        }
    }
}

// The peer gave up before we got to it; nothing is wrong with the listener.
fn is_connection_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_skipped() {
        let aborted = io::Error::from(io::ErrorKind::ConnectionAborted);
        assert!(is_connection_error(&aborted));

        let emfile = io::Error::new(io::ErrorKind::Other, "Too many open files");
        assert!(!is_connection_error(&emfile));
    }
}

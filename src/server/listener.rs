// ────────────────────────────────
// src/server/listener.rs
// Encapsulates low‑level TCP bind/accept so we can swap TLS later.
// ────────────────────────────────
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use hyper::http::uri::Authority;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

/// Source of inbound connections for the accept loop.
#[async_trait]
pub trait Accept: Send {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn accept(&mut self) -> io::Result<(Self::Stream, SocketAddr)>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl Accept for TcpListener {
    type Stream = TcpStream;

    async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}

/// Binds `addr`, resolving host names; the first address that binds wins.
pub async fn bind_tcp(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    Ok(listener)
}

/// Checks a bind address and returns it in the form `bind_tcp` expects.
///
/// Accepts `ip:port`, `host:port`, or `:port`. The short form listens on
/// every IPv4 interface (`0.0.0.0`) only; use `[::]:port` for IPv6.
pub fn parse_bind(bind: &str) -> Result<String> {
    let bind = bind.trim();
    let full = if bind.starts_with(':') {
        format!("0.0.0.0{}", bind)
    } else {
        bind.to_string()
    };

    let authority: Authority = full
        .parse()
        .with_context(|| format!("Invalid bind address {:?}", bind))?;
    if authority.port_u16().is_none() || authority.host().is_empty() {
        bail!("Invalid bind address {:?}: expected host:port", bind);
    }
    Ok(full)
}

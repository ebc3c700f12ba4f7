// src/proxy/mod.rs
mod backend;
mod forwarder;
mod proxy;

pub use backend::Backend;
pub use forwarder::{strip_hop_by_hop, Forwarder, HttpForwarder};
pub use proxy::{Proxy, ProxyError, Route, X_REAL_IP};

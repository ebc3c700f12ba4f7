// src/proxy/backend.rs
use std::fmt;

/// One upstream server a frontend may forward requests to.
///
/// Backends are immutable values; pool membership changes add or remove
/// whole `Backend`s and never touch the fields of one already in rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    name: String,
    address: String,
}

impl Backend {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Logical identifier, only used for logs and metrics labels.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `host:port` the request is forwarded to.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

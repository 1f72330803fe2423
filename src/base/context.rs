//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into transport errors that keep the underlying
//! message.

use crate::base::neterror::{HttpError, TransportKind};
use std::io;
use std::net::SocketAddr;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use sqlhttp::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).await.connection_context(addr)?;
    /// // Error: "dial tcp 127.0.0.1:1: connection refused"
    /// ```
    fn connection_context(self, addr: SocketAddr) -> Result<T, HttpError>;

    /// Add DNS resolution context to an IO error.
    fn dns_context(self, domain: &str) -> Result<T, HttpError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, addr: SocketAddr) -> Result<T, HttpError> {
        self.map_err(|e| {
            let kind = match e.kind() {
                io::ErrorKind::ConnectionRefused => TransportKind::ConnectionRefused,
                io::ErrorKind::ConnectionReset => TransportKind::ConnectionReset,
                io::ErrorKind::TimedOut => TransportKind::TimedOut,
                _ => TransportKind::ConnectionFailed,
            };
            HttpError::transport(kind, format!("dial tcp {}: {}", addr, e))
        })
    }

    fn dns_context(self, domain: &str) -> Result<T, HttpError> {
        self.map_err(|e| {
            HttpError::transport(
                TransportKind::NameNotResolved,
                format!("lookup {}: {}", domain, e),
            )
        })
    }
}

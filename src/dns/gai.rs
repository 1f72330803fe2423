//! System resolver using getaddrinfo.

use super::{Addrs, Name, Resolve, Resolving};
use crate::base::context::IoResultExt;
use crate::base::neterror::{HttpError, TransportKind};
use std::{io, net::ToSocketAddrs};

/// Resolves through the operating system's `getaddrinfo`, on tokio's
/// blocking pool so the connect path never stalls a worker.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let host = name.as_str().to_string();

            let result = tokio::task::spawn_blocking(move || {
                tracing::debug!(host = %host, "resolving via getaddrinfo");
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|iter| iter.collect::<Vec<_>>())
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "DNS resolution task failed");
                HttpError::transport(
                    TransportKind::NameNotResolved,
                    format!("lookup {}: {}", name, e),
                )
            })?;

            let addrs = result
                .and_then(|addrs| {
                    if addrs.is_empty() {
                        Err(io::Error::new(io::ErrorKind::NotFound, "no such host"))
                    } else {
                        Ok(addrs)
                    }
                })
                .dns_context(name.as_str())
                .inspect_err(|e| tracing::debug!(error = %e, "DNS resolution failed"))?;

            tracing::debug!(domain = %name, count = addrs.len(), "DNS resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

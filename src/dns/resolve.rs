//! Resolver abstraction used by the connect path.

use crate::base::neterror::Result;
use std::{collections::HashMap, fmt, future::Future, net::SocketAddr, pin::Pin, sync::Arc};

/// A host name to resolve into IP addresses.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Resolved addresses.
pub type Addrs = Box<dyn Iterator<Item = SocketAddr> + Send>;

/// Future returned by [`Resolve::resolve`].
pub type Resolving = Pin<Box<dyn Future<Output = Result<Addrs>> + Send>>;

/// Name resolution.
///
/// Returned addresses may carry any port; the connect path replaces it with
/// the port of the request URL. Failures are reported as
/// `HttpError::Transport` with `TransportKind::NameNotResolved`.
pub trait Resolve: Send + Sync {
    fn resolve(&self, name: Name) -> Resolving;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

/// Resolver that answers fixed host names from a table and delegates the
/// rest.
///
/// ```rust,ignore
/// let resolver = DnsResolverWithOverrides::new(Arc::new(GaiResolver::new()), HashMap::new())
///     .with_override("api.local", vec!["127.0.0.1:0".parse().unwrap()]);
/// ```
pub struct DnsResolverWithOverrides {
    inner: Arc<dyn Resolve>,
    overrides: HashMap<String, Vec<SocketAddr>>,
}

impl DnsResolverWithOverrides {
    pub fn new(inner: Arc<dyn Resolve>, overrides: HashMap<String, Vec<SocketAddr>>) -> Self {
        let overrides = overrides
            .into_iter()
            .map(|(host, addrs)| (host.to_ascii_lowercase(), addrs))
            .collect();
        Self { inner, overrides }
    }

    /// Adds or replaces the addresses answered for `host`.
    pub fn with_override(mut self, host: &str, addrs: Vec<SocketAddr>) -> Self {
        self.overrides.insert(host.to_ascii_lowercase(), addrs);
        self
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Resolve for DnsResolverWithOverrides {
    fn resolve(&self, name: Name) -> Resolving {
        if let Some(addrs) = self.overrides.get(&name.as_str().to_ascii_lowercase()) {
            let addrs: Addrs = Box::new(addrs.clone().into_iter());
            return Box::pin(std::future::ready(Ok(addrs)));
        }
        self.inner.resolve(name)
    }
}

impl fmt::Debug for DnsResolverWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolverWithOverrides")
            .field("override_count", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::neterror::{HttpError, TransportKind};
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_name_conversions() {
        assert_eq!(Name::from("example.com").as_str(), "example.com");
        assert_eq!(Name::from(String::from("a.test")).to_string(), "a.test");
        assert_eq!(Name::new("x"), Name::new("x"));
    }

    struct FailingResolver;

    impl Resolve for FailingResolver {
        fn resolve(&self, name: Name) -> Resolving {
            Box::pin(async move {
                Err(HttpError::transport(
                    TransportKind::NameNotResolved,
                    format!("lookup {}: no such host", name),
                ))
            })
        }
    }

    #[tokio::test]
    async fn test_override_hit_is_case_insensitive() {
        let resolver = DnsResolverWithOverrides::new(Arc::new(FailingResolver), HashMap::new())
            .with_override(
                "Service.Local",
                vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)],
            );

        let addrs: Vec<_> = resolver
            .resolve(Name::new("service.local"))
            .await
            .unwrap()
            .collect();
        assert_eq!(addrs, vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)]);
        assert_eq!(resolver.override_count(), 1);
    }

    #[tokio::test]
    async fn test_override_miss_delegates() {
        let resolver = DnsResolverWithOverrides::new(Arc::new(FailingResolver), HashMap::new());
        let err = match resolver.resolve(Name::new("elsewhere.test")).await {
            Ok(_) => panic!("expected failure"),
            Err(e) => e,
        };
        assert_eq!(err.to_string(), "lookup elsewhere.test: no such host");
    }
}

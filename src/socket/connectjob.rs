use crate::base::context::IoResultExt;
use crate::base::neterror::{HttpError, Result, TransportKind};
use crate::base::timing::{TimingEvent, Trace};
use crate::dns::{Name, Resolve};
use crate::socket::client::SocketType;
use crate::socket::tls::TlsConfig;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpStream;
use tracing::debug;
use url::{Host, Url};

/// Establishes the connection for one request: DNS, then TCP, then TLS
/// for https. Each phase stamps its start and end into the trace, and the
/// peer address is recorded as soon as TCP connects.
pub struct ConnectJob<'a> {
    resolver: &'a dyn Resolve,
    tls: &'a TlsConfig,
    trace: &'a Trace,
}

impl<'a> ConnectJob<'a> {
    pub fn new(resolver: &'a dyn Resolve, tls: &'a TlsConfig, trace: &'a Trace) -> Self {
        Self {
            resolver,
            tls,
            trace,
        }
    }

    pub async fn connect(&self, url: &Url) -> Result<SocketType> {
        let host = url
            .host()
            .ok_or_else(|| HttpError::invalid_url(url.as_str(), "missing host"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| HttpError::invalid_url(url.as_str(), "missing port"))?;

        let addrs = match host {
            Host::Ipv4(ip) => vec![SocketAddr::new(IpAddr::V4(ip), port)],
            Host::Ipv6(ip) => vec![SocketAddr::new(IpAddr::V6(ip), port)],
            Host::Domain(domain) => self.resolve(domain, port).await?,
        };

        let stream = self.connect_tcp(&addrs).await?;
        if let Ok(peer) = stream.peer_addr() {
            self.trace.set_remote(peer);
        }
        let _ = stream.set_nodelay(true);

        let socket = if url.scheme() == "https" {
            let host = url.host_str().unwrap_or_default();
            self.handshake(host, stream).await?
        } else {
            SocketType::Tcp(stream)
        };

        self.trace.stamp(TimingEvent::Connection);
        Ok(socket)
    }

    async fn resolve(&self, domain: &str, port: u16) -> Result<Vec<SocketAddr>> {
        self.trace.stamp(TimingEvent::DnsStart);
        let resolved = self.resolver.resolve(Name::new(domain)).await;
        self.trace.stamp(TimingEvent::DnsEnd);

        let addrs: Vec<SocketAddr> = resolved?
            .map(|mut addr| {
                addr.set_port(port);
                addr
            })
            .collect();
        if addrs.is_empty() {
            return Err(HttpError::transport(
                TransportKind::NameNotResolved,
                format!("lookup {}: no such host", domain),
            ));
        }
        Ok(addrs)
    }

    /// Tries each address in order, returning the first connection.
    async fn connect_tcp(&self, addrs: &[SocketAddr]) -> Result<TcpStream> {
        let mut last_err = None;
        for addr in addrs {
            self.trace.stamp(TimingEvent::ConnectStart);
            let attempt = TcpStream::connect(addr).await.connection_context(*addr);
            self.trace.stamp(TimingEvent::ConnectEnd);
            match attempt {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            HttpError::transport(TransportKind::ConnectionFailed, "dial tcp: no addresses")
        }))
    }

    async fn handshake(&self, host: &str, stream: TcpStream) -> Result<SocketType> {
        self.trace.stamp(TimingEvent::TlsHandshakeStart);

        let connector = self.tls.connector()?;
        let mut config = connector.configure().map_err(|e| {
            HttpError::transport(TransportKind::Tls, format!("tls: {}", e))
        })?;
        if !TlsConfig::should_set_sni(host) {
            config.set_use_server_name_indication(false);
        }
        if !self.tls.verify_peer {
            config.set_verify_hostname(false);
        }

        let domain = host.trim_start_matches('[').trim_end_matches(']');
        let result = tokio_boring::connect(config, domain, stream).await;
        self.trace.stamp(TimingEvent::TlsHandshakeEnd);

        match result {
            Ok(tls) => {
                let socket = SocketType::Ssl(tls);
                debug!(
                    host,
                    alpn = ?socket.negotiated_alpn().map(String::from_utf8_lossy),
                    "TLS handshake complete"
                );
                Ok(socket)
            }
            Err(e) => {
                debug!(host, error = %e, "TLS handshake failed");
                Err(HttpError::transport(TransportKind::Tls, format!("tls: {}", e)))
            }
        }
    }
}

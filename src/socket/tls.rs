use crate::base::neterror::{HttpError, Result, TransportKind};
use boring::ssl::{SslConnector, SslMethod, SslVerifyMode, SslVersion};

fn tls_error(e: impl std::fmt::Display) -> HttpError {
    HttpError::transport(TransportKind::Tls, format!("tls: {}", e))
}

/// TLS client settings for https requests.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Verify the server certificate chain and host name.
    pub verify_peer: bool,
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    /// ALPN protocols offered, most preferred first. Only HTTP/1.1 is
    /// spoken on the resulting connection.
    pub alpn_protos: Vec<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify_peer: true,
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            alpn_protos: vec!["http/1.1".to_string()],
        }
    }
}

impl TlsConfig {
    /// ALPN protocol list in wire format (length-prefixed).
    pub fn alpn_wire(&self) -> Result<Vec<u8>> {
        let mut wire = Vec::new();
        for proto in &self.alpn_protos {
            let len = u8::try_from(proto.len())
                .map_err(|_| tls_error(format!("ALPN protocol too long: {}", proto)))?;
            wire.push(len);
            wire.extend_from_slice(proto.as_bytes());
        }
        Ok(wire)
    }

    /// Builds a connector carrying these settings.
    pub fn connector(&self) -> Result<SslConnector> {
        let mut builder = SslConnector::builder(SslMethod::tls()).map_err(tls_error)?;
        builder
            .set_min_proto_version(self.min_version)
            .map_err(tls_error)?;
        builder
            .set_max_proto_version(self.max_version)
            .map_err(tls_error)?;
        if !self.alpn_protos.is_empty() {
            builder.set_alpn_protos(&self.alpn_wire()?).map_err(tls_error)?;
        }
        builder.set_verify(if self.verify_peer {
            SslVerifyMode::PEER
        } else {
            SslVerifyMode::NONE
        });
        Ok(builder.build())
    }

    /// SNI must not be sent for IP literals (RFC 6066).
    pub fn should_set_sni(host: &str) -> bool {
        host.trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .is_err()
    }
}

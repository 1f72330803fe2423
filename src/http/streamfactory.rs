use crate::base::neterror::{HttpError, Result, TransportKind};
use crate::base::timing::Trace;
use crate::dns::Resolve;
use crate::socket::connectjob::ConnectJob;
use crate::socket::stream::TracedSocket;
use crate::socket::tls::TlsConfig;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::spawn;
use tracing::debug;
use url::Url;

pub(crate) fn protocol_error(e: hyper::Error) -> HttpError {
    let kind = if e.is_timeout() {
        TransportKind::TimedOut
    } else {
        TransportKind::Protocol
    };
    HttpError::transport(kind, e.to_string())
}

/// An HTTP/1.1 connection ready to carry one request.
pub struct HttpStream {
    sender: http1::SendRequest<Full<Bytes>>,
}

impl HttpStream {
    pub async fn send_request(&mut self, req: Request<Full<Bytes>>) -> Result<Response<Incoming>> {
        self.sender.send_request(req).await.map_err(|e| {
            debug!(error = %e, "request failed");
            protocol_error(e)
        })
    }
}

/// Opens fresh HTTP/1.1 connections. Connections are never pooled; each
/// transaction gets its own socket so its timings describe a full
/// connection lifecycle.
pub struct HttpStreamFactory {
    resolver: Arc<dyn Resolve>,
    tls: TlsConfig,
}

impl HttpStreamFactory {
    pub fn new(resolver: Arc<dyn Resolve>, tls: TlsConfig) -> Self {
        Self { resolver, tls }
    }

    pub async fn create_stream(&self, url: &Url, trace: &Trace) -> Result<HttpStream> {
        let socket = ConnectJob::new(self.resolver.as_ref(), &self.tls, trace)
            .connect(url)
            .await?;

        let io = TokioIo::new(TracedSocket::new(socket, trace.clone()));
        let (sender, conn) = http1::Builder::new()
            .title_case_headers(true)
            .handshake(io)
            .await
            .map_err(protocol_error)?;

        spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "connection closed with error");
            }
        });

        Ok(HttpStream { sender })
    }
}

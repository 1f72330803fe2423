//! Transaction executor with builder pattern.
//!
//! A [`Client`] owns the I/O runtime, the connect path and the shared
//! [`Governor`]. Every request, whatever entry point it comes from, passes
//! through [`Client::execute`]: wait for a dispatch slot, snapshot the
//! timeout, then run the transaction on the runtime.
//!
//! All entry points block the calling thread and must not be called from
//! inside an async context.
//!
//! # Example
//!
//! ```rust,no_run
//! use sqlhttp::Client;
//! use std::time::Duration;
//!
//! let client = Client::builder()
//!     .timeout(Duration::from_secs(2))
//!     .default_header("Accept", "application/json")
//!     .build()?;
//!
//! let body = client.get_body("https://example.com/", "", "")?;
//! println!("{} bytes", body.len());
//! # Ok::<(), sqlhttp::HttpError>(())
//! ```

use crate::base::neterror::{HttpError, Result, TransportKind};
use crate::base::timing::{TimingEvent, Trace};
use crate::dns::{DnsResolverWithOverrides, GaiResolver, Resolve};
use crate::governor::{Governor, GovernorConfig, DEFAULT_MIN_INTERVAL, DEFAULT_TIMEOUT};
use crate::http::headers::HeaderSet;
use crate::http::request::{RequestParams, RequestSpec};
use crate::http::streamfactory::HttpStreamFactory;
use crate::http::transaction::{HttpNetworkTransaction, DEFAULT_MAX_REDIRECTS};
use crate::http::TransactionResult;
use crate::rows::TransactionCursor;
use crate::socket::tls::TlsConfig;
use bytes::Bytes;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

/// `User-Agent` sent when the caller supplies no headers.
pub const DEFAULT_USER_AGENT: &str = concat!("sqlhttp/", env!("CARGO_PKG_VERSION"));

/// What a dispatch should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The response body; transport failures are errors.
    Body,
    /// The response header block; transport failures are errors.
    Headers,
    /// One transaction row; transport failures stay inside the row.
    Row,
}

#[derive(Debug)]
pub enum Projected {
    Body(Bytes),
    Headers(String),
    Row(TransactionCursor),
}

impl Projected {
    pub fn into_body(self) -> Option<Bytes> {
        match self {
            Projected::Body(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_headers(self) -> Option<String> {
        match self {
            Projected::Headers(h) => Some(h),
            _ => None,
        }
    }

    pub fn into_row(self) -> Option<TransactionCursor> {
        match self {
            Projected::Row(r) => Some(r),
            _ => None,
        }
    }
}

struct ClientInner {
    runtime: Arc<Runtime>,
    factory: HttpStreamFactory,
    governor: Arc<Governor>,
    default_headers: HeaderSet,
    max_redirects: usize,
}

/// HTTP transaction executor.
///
/// Cheap to clone; clones share the runtime and the governor.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

static GLOBAL: OnceLock<Client> = OnceLock::new();

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The process-wide client behind the free functions, built with
    /// defaults on first use.
    pub fn global() -> Result<&'static Client> {
        if let Some(client) = GLOBAL.get() {
            return Ok(client);
        }
        let client = Client::builder().build()?;
        Ok(GLOBAL.get_or_init(|| client))
    }

    pub fn governor(&self) -> &Arc<Governor> {
        &self.inner.governor
    }

    pub fn default_headers(&self) -> &HeaderSet {
        &self.inner.default_headers
    }

    /// Builds a request from textual parts, seeded with this client's
    /// default headers.
    pub fn build_request(&self, params: &RequestParams<'_>) -> Result<RequestSpec> {
        RequestSpec::build(params, &self.inner.default_headers)
    }

    /// Dispatches `spec` and returns the outcome. A transport failure is
    /// recorded in the result rather than returned.
    pub fn execute(&self, spec: RequestSpec) -> TransactionResult {
        self.inner.governor.acquire_slot();
        let timeout = self.inner.governor.timeout();
        let trace = Trace::new();
        trace.stamp_once(TimingEvent::Start);
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);

        trace!(method = %spec.method(), url = %spec.url(), "dispatching");
        let outcome = self.inner.runtime.block_on(async {
            let mut transaction =
                HttpNetworkTransaction::new(&self.inner.factory, spec.clone(), trace.clone());
            transaction.set_max_redirects(self.inner.max_redirects);

            let started = match deadline {
                Some(deadline) => timeout_at(deadline, transaction.start()).await,
                None => Ok(transaction.start().await),
            };
            match started {
                Ok(Ok(())) => transaction.take_response().ok_or_else(|| {
                    HttpError::transport(TransportKind::Protocol, "no response received")
                }),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(HttpError::transport(
                    TransportKind::TimedOut,
                    format!(
                        "timeout of {}ms exceeded awaiting response headers",
                        timeout.as_millis()
                    ),
                )),
            }
        });

        if let Err(e) = &outcome {
            debug!(url = %spec.url(), error = %e, code = e.as_i32(), "transaction failed");
        }
        TransactionResult::new(
            spec,
            outcome,
            trace,
            deadline,
            self.inner.runtime.clone(),
        )
    }

    /// Builds, dispatches and projects a request in one step. Builder
    /// errors abort before any network activity.
    pub fn perform_and_project(
        &self,
        params: &RequestParams<'_>,
        projection: Projection,
    ) -> Result<Projected> {
        let spec = self.build_request(params)?;
        let result = self.execute(spec);
        match projection {
            Projection::Row => Ok(Projected::Row(TransactionCursor::new(result))),
            Projection::Body => {
                let mut result = result.into_response()?;
                let body = result.response_body()?.unwrap_or_default();
                Ok(Projected::Body(body))
            }
            Projection::Headers => {
                let result = result.into_response()?;
                Ok(Projected::Headers(
                    result.response_headers().unwrap_or_default(),
                ))
            }
        }
    }

    pub fn do_body(&self, params: RequestParams<'_>) -> Result<Bytes> {
        self.perform_and_project(&params, Projection::Body)
            .map(|p| p.into_body().unwrap_or_default())
    }

    pub fn do_headers(&self, params: RequestParams<'_>) -> Result<String> {
        self.perform_and_project(&params, Projection::Headers)
            .map(|p| p.into_headers().unwrap_or_default())
    }

    /// The transaction row for an arbitrary request.
    pub fn do_row(&self, params: RequestParams<'_>) -> Result<TransactionCursor> {
        self.perform_and_project(&params, Projection::Row)?
            .into_row()
            .ok_or(HttpError::CursorNotPositioned)
    }

    pub fn get_body(&self, url: &str, headers: &str, cookies: &str) -> Result<Bytes> {
        self.do_body(RequestParams::new("GET", url).headers(headers).cookies(cookies))
    }

    pub fn get_headers(&self, url: &str, headers: &str, cookies: &str) -> Result<String> {
        self.do_headers(RequestParams::new("GET", url).headers(headers).cookies(cookies))
    }

    pub fn get(&self, url: &str, headers: &str, cookies: &str) -> Result<TransactionCursor> {
        self.do_row(RequestParams::new("GET", url).headers(headers).cookies(cookies))
    }

    pub fn post_body(&self, url: &str, headers: &str, body: &[u8], cookies: &str) -> Result<Bytes> {
        self.do_body(
            RequestParams::new("POST", url)
                .headers(headers)
                .body(body)
                .cookies(cookies),
        )
    }

    pub fn post_headers(
        &self,
        url: &str,
        headers: &str,
        body: &[u8],
        cookies: &str,
    ) -> Result<String> {
        self.do_headers(
            RequestParams::new("POST", url)
                .headers(headers)
                .body(body)
                .cookies(cookies),
        )
    }

    pub fn post(
        &self,
        url: &str,
        headers: &str,
        body: &[u8],
        cookies: &str,
    ) -> Result<TransactionCursor> {
        self.do_row(
            RequestParams::new("POST", url)
                .headers(headers)
                .body(body)
                .cookies(cookies),
        )
    }

    /// Sets the minimum spacing between dispatches; returns `interval_ms`.
    pub fn rate_limit(&self, interval_ms: u64) -> u64 {
        self.inner
            .governor
            .set_rate_limit(Duration::from_millis(interval_ms));
        interval_ms
    }

    /// Sets the per-request timeout; returns `timeout_ms`.
    pub fn timeout_set(&self, timeout_ms: u64) -> u64 {
        self.inner
            .governor
            .set_timeout(Duration::from_millis(timeout_ms));
        timeout_ms
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("governor", &self.inner.governor.config())
            .field("default_headers", &self.inner.default_headers)
            .field("max_redirects", &self.inner.max_redirects)
            .finish_non_exhaustive()
    }
}

/// Builder for creating a [`Client`].
pub struct ClientBuilder {
    min_interval: Duration,
    timeout: Duration,
    default_headers: HeaderSet,
    resolver: Option<Arc<dyn Resolve>>,
    dns_overrides: HashMap<String, Vec<SocketAddr>>,
    worker_threads: Option<usize>,
    tls: TlsConfig,
    max_redirects: usize,
    governor: Option<Arc<Governor>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        let mut default_headers = HeaderSet::new();
        default_headers.append("User-Agent", DEFAULT_USER_AGENT);
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            default_headers,
            resolver: None,
            dns_overrides: HashMap::new(),
            worker_threads: None,
            tls: TlsConfig::default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            governor: None,
        }
    }
}

impl ClientBuilder {
    /// Initial minimum spacing between dispatches.
    pub fn rate_limit(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Initial per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent when the caller supplies none.
    pub fn default_header(mut self, key: &str, value: &str) -> Self {
        self.default_headers.append(key, value);
        self
    }

    /// Replaces the default header set.
    pub fn default_headers(mut self, headers: HeaderSet) -> Self {
        self.default_headers = headers;
        self
    }

    /// Use a custom resolver instead of the system one.
    pub fn dns_resolver<R: Resolve + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Answer `host` with fixed addresses instead of resolving it.
    pub fn resolve(mut self, host: &str, addr: SocketAddr) -> Self {
        self.dns_overrides
            .entry(host.to_string())
            .or_default()
            .push(addr);
        self
    }

    /// Worker threads of the internal runtime.
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads.max(1));
        self
    }

    pub fn tls_config(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// Skip certificate verification.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.tls.verify_peer = !accept;
        self
    }

    /// Redirect hops to follow; 0 returns redirect responses as-is.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Share an existing governor, so several clients draw from one
    /// dispatch budget. Overrides `rate_limit` and `timeout`.
    pub fn governor(mut self, governor: Arc<Governor>) -> Self {
        self.governor = Some(governor);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        let mut runtime = tokio::runtime::Builder::new_multi_thread();
        runtime.enable_all().thread_name("sqlhttp-io");
        if let Some(threads) = self.worker_threads {
            runtime.worker_threads(threads);
        }
        let runtime = runtime.build().map_err(|e| {
            HttpError::transport(TransportKind::Runtime, format!("starting runtime: {}", e))
        })?;

        let base: Arc<dyn Resolve> = self
            .resolver
            .unwrap_or_else(|| Arc::new(GaiResolver::new()));
        let resolver: Arc<dyn Resolve> = if self.dns_overrides.is_empty() {
            base
        } else {
            Arc::new(DnsResolverWithOverrides::new(base, self.dns_overrides))
        };

        let governor = self.governor.unwrap_or_else(|| {
            Arc::new(Governor::new(GovernorConfig {
                min_interval: self.min_interval,
                timeout: self.timeout,
            }))
        });

        Ok(Client {
            inner: Arc::new(ClientInner {
                runtime: Arc::new(runtime),
                factory: HttpStreamFactory::new(resolver, self.tls),
                governor,
                default_headers: self.default_headers,
                max_redirects: self.max_redirects,
            }),
        })
    }
}

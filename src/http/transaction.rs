use crate::base::neterror::{HttpError, Result, TransportKind};
use crate::base::timing::Trace;
use crate::http::request::RequestSpec;
use crate::http::response::HttpResponse;
use crate::http::streamfactory::{HttpStream, HttpStreamFactory};
use http::{header, Response, StatusCode};
use hyper::body::Incoming;
use tracing::debug;

/// Redirect hops followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    CreateStream,
    SendRequest,
    ReadHeaders,
    Done,
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Drives one request through connect, send and response headers,
/// following redirects. Every hop opens its own connection and stamps the
/// shared trace; the trace therefore describes the final hop.
pub struct HttpNetworkTransaction<'a> {
    factory: &'a HttpStreamFactory,
    trace: Trace,
    request: RequestSpec,
    state: State,
    stream: Option<HttpStream>,
    response: Option<Response<Incoming>>,
    max_redirects: usize,
    redirects: usize,
}

impl<'a> HttpNetworkTransaction<'a> {
    pub fn new(factory: &'a HttpStreamFactory, request: RequestSpec, trace: Trace) -> Self {
        Self {
            factory,
            trace,
            request,
            state: State::Idle,
            stream: None,
            response: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            redirects: 0,
        }
    }

    pub fn set_max_redirects(&mut self, max: usize) {
        self.max_redirects = max;
    }

    pub async fn start(&mut self) -> Result<()> {
        self.state = State::CreateStream;
        self.do_loop().await
    }

    async fn do_loop(&mut self) -> Result<()> {
        loop {
            match self.state {
                State::Idle | State::Done => return Ok(()),
                State::CreateStream => {
                    let scheme = self.request.url().scheme();
                    if scheme != "http" && scheme != "https" {
                        return Err(HttpError::transport(
                            TransportKind::UnsupportedScheme,
                            format!("unsupported protocol scheme {:?}", scheme),
                        ));
                    }
                    if self.redirects > 0 {
                        self.trace.begin_hop();
                    }
                    self.stream = Some(
                        self.factory
                            .create_stream(self.request.url(), &self.trace)
                            .await?,
                    );
                    self.state = State::SendRequest;
                }
                State::SendRequest => {
                    let req = self.request.to_http_request()?;
                    let stream = self.stream.as_mut().ok_or_else(|| {
                        HttpError::transport(TransportKind::ConnectionFailed, "connection closed")
                    })?;
                    self.response = Some(stream.send_request(req).await?);
                    self.state = State::ReadHeaders;
                }
                State::ReadHeaders => {
                    self.state = State::Done;
                    if let Some(location) = self.redirect_location() {
                        self.follow(&location)?;
                    }
                }
            }
        }
    }

    fn redirect_location(&self) -> Option<String> {
        let response = self.response.as_ref()?;
        if self.max_redirects == 0 || !is_redirect(response.status()) {
            return None;
        }
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    fn follow(&mut self, location: &str) -> Result<()> {
        if self.redirects >= self.max_redirects {
            return Err(HttpError::transport(
                TransportKind::TooManyRedirects,
                format!("stopped after {} redirects", self.max_redirects),
            ));
        }
        let status = self
            .response
            .as_ref()
            .map(|r| r.status())
            .unwrap_or(StatusCode::FOUND);
        self.request = self.request.redirected(status, location)?;
        self.redirects += 1;
        debug!(url = %self.request.url(), hop = self.redirects, "following redirect");

        self.stream = None;
        self.response = None;
        self.state = State::CreateStream;
        Ok(())
    }

    /// Take ownership of the final response. Can only be called once.
    pub fn take_response(&mut self) -> Option<HttpResponse> {
        self.response.take().map(HttpResponse::from_hyper)
    }
}

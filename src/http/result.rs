//! Outcome of one transaction and its projections.

use crate::base::neterror::{HttpError, Result};
use crate::base::timing::{Timings, Trace};
use crate::cookies::{cookie_list_json, request_cookie_strings, response_cookie_strings};
use crate::http::request::RequestSpec;
use crate::http::response::HttpResponse;
use bytes::Bytes;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::time::Instant;

/// The request as sent plus, when the exchange succeeded, the response.
///
/// Every field is computed on demand. The response body stays on the wire
/// until [`response_body`](Self::response_body) is first called.
pub struct TransactionResult {
    request: RequestSpec,
    response: Option<HttpResponse>,
    error: Option<HttpError>,
    trace: Trace,
    deadline: Option<Instant>,
    runtime: Arc<Runtime>,
}

impl TransactionResult {
    pub(crate) fn new(
        request: RequestSpec,
        outcome: Result<HttpResponse>,
        trace: Trace,
        deadline: Option<Instant>,
        runtime: Arc<Runtime>,
    ) -> Self {
        let (response, error) = match outcome {
            Ok(response) => (Some(response), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            request,
            response,
            error,
            trace,
            deadline,
            runtime,
        }
    }

    pub fn request(&self) -> &RequestSpec {
        &self.request
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// The transport failure, if the exchange produced no response.
    pub fn error(&self) -> Option<&HttpError> {
        self.error.as_ref()
    }

    pub fn request_url(&self) -> &str {
        self.request.url().as_str()
    }

    pub fn request_method(&self) -> &str {
        self.request.method().as_str()
    }

    pub fn request_headers(&self) -> String {
        self.request.headers().serialize()
    }

    /// JSON array of `name=value` cookie strings sent with the request.
    pub fn request_cookies(&self) -> String {
        cookie_list_json(&request_cookie_strings(self.request.headers()))
    }

    pub fn request_body(&self) -> Bytes {
        self.request.body().bytes()
    }

    pub fn response_status(&self) -> Option<String> {
        self.response.as_ref().map(HttpResponse::status_text)
    }

    pub fn response_status_code(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status().as_u16())
    }

    pub fn response_headers(&self) -> Option<String> {
        self.response.as_ref().map(|r| r.headers().serialize())
    }

    /// JSON array of the raw `Set-Cookie` values received.
    pub fn response_cookies(&self) -> Option<String> {
        self.response
            .as_ref()
            .map(|r| cookie_list_json(&response_cookie_strings(r.headers())))
    }

    /// The response body, read from the wire on first access.
    pub fn response_body(&mut self) -> Result<Option<Bytes>> {
        let Some(response) = self.response.as_mut() else {
            return Ok(None);
        };
        let (deadline, trace) = (self.deadline, &self.trace);
        self.runtime
            .block_on(response.body_mut().bytes(deadline, trace))
            .map(Some)
    }

    /// Peer address, empty when no connection was made.
    pub fn remote_address(&self) -> String {
        self.trace
            .remote()
            .map(|addr| addr.to_string())
            .unwrap_or_default()
    }

    pub fn timings(&self) -> Timings {
        self.trace.timings()
    }

    pub fn timings_json(&self) -> String {
        self.timings().to_json()
    }

    /// `{"error": "<message>"}` for a failed exchange, `None` otherwise.
    pub fn meta(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }

    /// Converts a failed exchange into its error.
    pub fn into_response(mut self) -> Result<Self> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

impl std::fmt::Debug for TransactionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionResult")
            .field("url", &self.request_url())
            .field("method", &self.request_method())
            .field("status", &self.response_status_code())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

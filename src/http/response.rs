//! Received response.

use crate::http::headers::HeaderSet;
use crate::http::ResponseBody;
use bytes::Bytes;
use http::StatusCode;
use hyper::body::Incoming;
use hyper::ext::ReasonPhrase;

/// Status line, headers and lazily read body of a response.
#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    reason: String,
    headers: HeaderSet,
    body: ResponseBody,
}

impl HttpResponse {
    pub fn from_hyper(resp: http::Response<Incoming>) -> Self {
        let (parts, body) = resp.into_parts();
        let reason = parts
            .extensions
            .get::<ReasonPhrase>()
            .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
            .or_else(|| parts.status.canonical_reason().map(str::to_string))
            .unwrap_or_default();
        Self {
            status: parts.status,
            reason,
            headers: HeaderSet::from_header_map(&parts.headers),
            body: ResponseBody::new(body),
        }
    }

    /// A response whose body is already buffered.
    pub fn buffered(status: StatusCode, headers: HeaderSet, body: Bytes) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: ResponseBody::buffered(body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Status text: the code followed by the reason phrase, e.g. `200 OK`.
    pub fn status_text(&self) -> String {
        if self.reason.is_empty() {
            self.status.as_str().to_string()
        } else {
            format!("{} {}", self.status.as_str(), self.reason)
        }
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.body
    }
}

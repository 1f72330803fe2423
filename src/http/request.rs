//! Canonical outbound requests.

use crate::base::neterror::{HttpError, Result};
use crate::cookies::CookieMap;
use crate::http::headers::HeaderSet;
use crate::http::requestbody::RequestBody;
use bytes::Bytes;
use http::{header, HeaderValue, Method, Request, StatusCode, Version};
use http_body_util::Full;
use url::{Position, Url};

/// Textual inputs to [`RequestSpec::build`], as a host passes them.
/// Empty strings mean "not supplied".
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestParams<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub headers: &'a str,
    pub body: Option<&'a [u8]>,
    pub cookies: &'a str,
}

impl<'a> RequestParams<'a> {
    pub fn new(method: &'a str, url: &'a str) -> Self {
        Self {
            method,
            url,
            ..Default::default()
        }
    }

    pub fn headers(mut self, headers: &'a str) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: &'a [u8]) -> Self {
        self.body = Some(body);
        self
    }

    pub fn cookies(mut self, cookies: &'a str) -> Self {
        self.cookies = cookies;
        self
    }
}

/// A request ready for dispatch, with headers normalized the way they are
/// sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    method: Method,
    url: Url,
    headers: HeaderSet,
    cookies: CookieMap,
    body: RequestBody,
}

impl RequestSpec {
    /// Assembles a request from textual parts.
    ///
    /// `defaults` seed the header set. Non-empty caller headers replace them
    /// entirely. Cookies are attached after headers, so they extend a
    /// caller-supplied `Cookie` header.
    pub fn build(params: &RequestParams<'_>, defaults: &HeaderSet) -> Result<Self> {
        let method = parse_method(params.method)?;
        if params.url.is_empty() {
            return Err(HttpError::invalid_url(params.url, "empty url"));
        }
        let url = Url::parse(params.url).map_err(|e| HttpError::invalid_url(params.url, e))?;

        let mut headers = defaults.clone();
        if !params.headers.is_empty() {
            headers.clear();
            for (key, value) in HeaderSet::parse(params.headers).iter() {
                headers.append(key, value);
            }
        }

        let cookies = if params.cookies.is_empty() {
            CookieMap::new()
        } else {
            CookieMap::decode(params.cookies)?
        };
        cookies.attach(&mut headers);
        headers.to_header_map()?;

        Ok(Self {
            method,
            url,
            headers,
            cookies,
            body: params.body.into(),
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn cookies(&self) -> &CookieMap {
        &self.cookies
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// `Host` header value: the host plus any non-default port.
    pub fn host_header(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Origin-form request target (`/path?query`).
    pub fn request_target(&self) -> &str {
        &self.url[Position::BeforePath..Position::AfterQuery]
    }

    /// Builds the HTTP/1.1 request handed to the connection.
    pub fn to_http_request(&self) -> Result<Request<Full<Bytes>>> {
        let mut req = Request::builder()
            .method(self.method.clone())
            .uri(self.request_target())
            .version(Version::HTTP_11)
            .body(self.body.to_full())
            .map_err(|e| HttpError::invalid_url(self.url.as_str(), e))?;

        *req.headers_mut() = self.headers.to_header_map()?;
        if !req.headers().contains_key(header::HOST) {
            let host = HeaderValue::from_str(&self.host_header())
                .map_err(|e| HttpError::invalid_url(self.url.as_str(), e))?;
            req.headers_mut().insert(header::HOST, host);
        }
        Ok(req)
    }

    /// The request to send after a redirect response pointing at `location`.
    ///
    /// 301, 302 and 303 turn anything but HEAD into a body-less GET; 307 and
    /// 308 resend unchanged. Credentials are dropped when the host changes.
    pub fn redirected(&self, status: StatusCode, location: &str) -> Result<Self> {
        let url = self
            .url
            .join(location)
            .map_err(|e| HttpError::invalid_url(location, e))?;

        let mut next = self.clone();
        if matches!(status.as_u16(), 301..=303) && next.method != Method::HEAD {
            next.method = Method::GET;
            next.body = RequestBody::Empty;
            next.headers.remove("Content-Type");
            next.headers.remove("Content-Length");
        }
        if url.host_str() != self.url.host_str() {
            next.headers.remove("Cookie");
            next.headers.remove("Authorization");
        }
        next.url = url;
        Ok(next)
    }
}

fn parse_method(method: &str) -> Result<Method> {
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.as_bytes()).map_err(|_| HttpError::InvalidMethod {
        method: method.to_string(),
    })
}

use thiserror::Error;

/// Classification of a failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// DNS lookup failed or returned no addresses.
    NameNotResolved,
    /// The peer actively refused the connection.
    ConnectionRefused,
    /// The connection was reset mid-exchange.
    ConnectionReset,
    /// Any other failure to establish the TCP connection.
    ConnectionFailed,
    /// TLS setup or handshake failed.
    Tls,
    /// The per-request timeout expired.
    TimedOut,
    /// The URL scheme is not http or https.
    UnsupportedScheme,
    /// The peer spoke something that is not valid HTTP/1.1.
    Protocol,
    /// Reading the response body failed.
    BodyRead,
    /// Redirect limit exhausted.
    TooManyRedirects,
    /// The internal I/O runtime could not be started.
    Runtime,
}

impl TransportKind {
    pub fn as_i32(&self) -> i32 {
        match self {
            TransportKind::ConnectionReset => -101,
            TransportKind::ConnectionRefused => -102,
            TransportKind::ConnectionFailed => -104,
            TransportKind::NameNotResolved => -105,
            TransportKind::Tls => -107,
            TransportKind::TimedOut => -118,
            TransportKind::UnsupportedScheme => -302,
            TransportKind::TooManyRedirects => -310,
            TransportKind::Protocol => -370,
            TransportKind::BodyRead => -330,
            TransportKind::Runtime => -950,
        }
    }
}

/// Every failure the crate reports.
///
/// Builder-level variants (`Arity`, `Usage`, `InvalidMethod`, `InvalidUrl`,
/// `MalformedCookie`, `MalformedHeader`) are raised before any network
/// activity. `Transport` carries the underlying network error text verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("{function} must have even-numbered arguments")]
    Arity { function: &'static str },

    #[error("usage: {usage}")]
    Usage { usage: &'static str },

    #[error("invalid method {method:?}")]
    InvalidMethod { method: String },

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid cookies: {reason}")]
    MalformedCookie { reason: String },

    #[error("malformed MIME header line: {line}")]
    MalformedHeader { line: String },

    #[error("{message}")]
    Transport {
        kind: TransportKind,
        message: String,
    },

    #[error("cursor is not positioned on a row")]
    CursorNotPositioned,

    #[error("no such column: {0}")]
    NoSuchColumn(String),

    #[error("no such function: {0}")]
    NoSuchFunction(String),
}

impl HttpError {
    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        HttpError::Transport {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        HttpError::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed_cookie(reason: impl ToString) -> Self {
        HttpError::MalformedCookie {
            reason: reason.to_string(),
        }
    }

    /// True for failures raised while talking to the network.
    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::Transport { .. })
    }

    pub fn transport_kind(&self) -> Option<TransportKind> {
        match self {
            HttpError::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Stable numeric code a host can report next to the message.
    pub fn as_i32(&self) -> i32 {
        match self {
            HttpError::Transport { kind, .. } => kind.as_i32(),
            HttpError::InvalidUrl { .. } => -300,
            HttpError::InvalidMethod { .. } => -322,
            HttpError::MalformedHeader { .. } => -325,
            HttpError::MalformedCookie { .. } => -903,
            HttpError::Arity { .. } => -910,
            HttpError::Usage { .. } => -911,
            HttpError::CursorNotPositioned => -920,
            HttpError::NoSuchColumn(_) => -921,
            HttpError::NoSuchFunction(_) => -922,
        }
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;

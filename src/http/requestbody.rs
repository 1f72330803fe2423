//! Request payload.

use bytes::Bytes;
use http_body_util::Full;

/// Payload attached to an outbound request. An absent body and an empty
/// one are sent identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&[u8]> for RequestBody {
    fn from(v: &[u8]) -> Self {
        RequestBody::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl<T: Into<RequestBody>> From<Option<T>> for RequestBody {
    fn from(o: Option<T>) -> Self {
        o.map(Into::into).unwrap_or_default()
    }
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            RequestBody::Empty => 0,
            RequestBody::Bytes(b) => b.len(),
        }
    }

    /// The payload bytes, empty for [`RequestBody::Empty`].
    pub fn bytes(&self) -> Bytes {
        match self {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Bytes(b) => b.clone(),
        }
    }

    /// Body type handed to the HTTP/1.1 connection.
    pub fn to_full(&self) -> Full<Bytes> {
        Full::new(self.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body() {
        let body = RequestBody::Empty;
        assert!(body.is_empty());
        assert!(body.bytes().is_empty());
    }

    #[test]
    fn test_zero_length_bytes_is_empty() {
        let body = RequestBody::Bytes(Bytes::new());
        assert!(body.is_empty());
    }

    #[test]
    fn test_from_conversions() {
        let body: RequestBody = "hello world".to_string().into();
        assert_eq!(body.len(), 11);

        let body: RequestBody = vec![0u8, 159, 146, 150].into();
        assert_eq!(body.bytes().as_ref(), &[0u8, 159, 146, 150]);

        let body: RequestBody = Bytes::from_static(b"raw").into();
        assert_eq!(body.len(), 3);
    }

    #[test]
    fn test_from_option() {
        let none: RequestBody = Option::<Vec<u8>>::None.into();
        assert_eq!(none, RequestBody::Empty);

        let some: RequestBody = Some("a=1").into();
        assert_eq!(some.bytes(), Bytes::from_static(b"a=1"));
    }
}

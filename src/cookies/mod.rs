//! Cookie codec.
//!
//! Converts between flat name/value mappings, their JSON text encoding and
//! the `Cookie` / `Set-Cookie` headers of an exchange.
//!
//! ```rust
//! use sqlhttp::cookies::{CookieMap, encode_pairs};
//!
//! let text = encode_pairs(&["a", "1", "b", "2"]).unwrap();
//! assert_eq!(text, r#"{"a":"1","b":"2"}"#);
//! assert_eq!(CookieMap::decode(&text).unwrap().get("b"), Some("2"));
//! ```

pub mod jar;

pub use jar::{
    cookie_list_json, encode_pairs, request_cookie_strings, response_cookie_strings, CookieMap,
};

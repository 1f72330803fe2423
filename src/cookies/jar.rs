//! Flat cookie mappings and their JSON text form.

use crate::base::neterror::{HttpError, Result};
use crate::http::headers::HeaderSet;
use cookie::Cookie;
use std::collections::BTreeMap;

/// Unique cookie name to value.
///
/// Entries iterate in name order, which is also the order cookies are
/// attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieMap {
    entries: BTreeMap<String, String>,
}

impl CookieMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from alternating name, value arguments. Later
    /// duplicates overwrite earlier ones.
    pub fn from_pairs<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        if args.len() % 2 != 0 {
            return Err(HttpError::Arity {
                function: "cookies",
            });
        }
        let mut map = CookieMap::new();
        for pair in args.chunks(2) {
            map.insert(pair[0].as_ref(), pair[1].as_ref());
        }
        Ok(map)
    }

    /// Decodes a flat JSON object of string values. `null` decodes to an
    /// empty mapping.
    pub fn decode(text: &str) -> Result<Self> {
        let parsed: Option<BTreeMap<String, String>> =
            serde_json::from_str(text).map_err(HttpError::malformed_cookie)?;
        Ok(Self {
            entries: parsed.unwrap_or_default(),
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "{}".to_string())
    }

    /// `name=value` pairs joined the way a `Cookie` request header carries them.
    pub fn header_value(&self) -> String {
        self.iter()
            .map(|(name, value)| Cookie::new(name, value).stripped().to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Adds every entry to the request's `Cookie` header, extending an
    /// existing header rather than replacing it.
    pub fn attach(&self, headers: &mut HeaderSet) {
        if self.is_empty() {
            return;
        }
        let value = self.header_value();
        let merged = match headers.get_first("Cookie") {
            Some(existing) if !existing.is_empty() => format!("{}; {}", existing, value),
            _ => value,
        };
        headers.set("Cookie", merged);
    }
}

/// Encodes alternating name, value arguments as a JSON object.
pub fn encode_pairs<S: AsRef<str>>(args: &[S]) -> Result<String> {
    CookieMap::from_pairs(args).map(|m| m.to_json())
}

/// Cookies carried by the request's `Cookie` headers, as `name=value` strings.
pub fn request_cookie_strings(headers: &HeaderSet) -> Vec<String> {
    headers
        .get_all("Cookie")
        .iter()
        .flat_map(|line| line.split(';'))
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .filter_map(|piece| Cookie::parse(piece).ok())
        .map(|c| c.stripped().to_string())
        .collect()
}

/// Raw `Set-Cookie` values of a response; values that do not parse as a
/// cookie are skipped.
pub fn response_cookie_strings(headers: &HeaderSet) -> Vec<String> {
    headers
        .get_all("Set-Cookie")
        .iter()
        .filter(|raw| Cookie::parse(raw.as_str()).is_ok())
        .cloned()
        .collect()
}

/// JSON array text of cookie strings.
pub fn cookie_list_json(cookies: &[String]) -> String {
    serde_json::to_string(cookies).unwrap_or_else(|_| "[]".to_string())
}

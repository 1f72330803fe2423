//! Wire-format header blocks.
//!
//! [`HeaderSet`] is an ordered, case-insensitive multimap. Keys keep the
//! order of their first appearance and values keep insertion order within
//! a key, so enumeration is stable for the lifetime of the set.

use crate::base::neterror::{HttpError, Result};
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

const WHITESPACE: &[char] = &[' ', '\t'];

fn is_continuation(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

/// Canonical MIME form of a header key: the first letter and every letter
/// after a hyphen upper case, the rest lower case (`content-type` becomes
/// `Content-Type`). Keys containing non-token bytes are returned unchanged.
pub fn canonical_key(key: &str) -> String {
    if key.is_empty() || !key.bytes().all(is_token_byte) {
        return key.to_string();
    }
    let mut upper = true;
    key.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

/// Ordered collection of header keys, each with one or more values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parses a header block, keeping whatever was read before the first
    /// malformed line.
    pub fn parse(text: &str) -> Self {
        let (set, err) = read_block(text);
        if let Some(err) = err {
            debug!(error = %err, parsed_keys = set.key_count(), "tolerating malformed header block");
        }
        set
    }

    /// Parses a header block, failing on the first malformed line.
    ///
    /// A block that ends without the terminating blank line is accepted.
    pub fn parse_strict(text: &str) -> Result<Self> {
        match read_block(text) {
            (set, None) => Ok(set),
            (_, Some(err)) => Err(err),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// Adds a value, keeping any values already stored for the key.
    pub fn append(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(key) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((canonical_key(key), vec![value])),
        }
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(key) {
            Some(i) => self.entries[i].1 = vec![value],
            None => self.entries.push((canonical_key(key), vec![value])),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn has(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get_first(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// All values for `key` in insertion order; empty when absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.position(key)
            .map(|i| self.entries[i].1.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// The key at `index` with its values, in first-appearance order.
    pub fn entry(&self, index: usize) -> Option<(&str, &[String])> {
        self.entries
            .get(index)
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Every (key, value) pair in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Number of (key, value) pairs.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wire form: one `Key: value\r\n` line per pair. Newlines inside
    /// values are replaced by spaces so a value can never start a new line.
    /// No terminating blank line is written; append `\r\n` for a complete
    /// header block.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.iter() {
            out.push_str(key);
            out.push_str(": ");
            out.extend(value.chars().map(|c| match c {
                '\r' | '\n' => ' ',
                c => c,
            }));
            out.push_str("\r\n");
        }
        out
    }

    /// Converts to an [`http::HeaderMap`] for dispatch.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.len());
        for (key, value) in self.iter() {
            let name = HeaderName::from_str(key).map_err(|_| HttpError::MalformedHeader {
                line: format!("{}: {}", key, value),
            })?;
            let value =
                HeaderValue::from_bytes(value.as_bytes()).map_err(|_| HttpError::MalformedHeader {
                    line: format!("{}: {}", key, value),
                })?;
            map.append(name, value);
        }
        Ok(map)
    }

    /// Builds a set from a received [`http::HeaderMap`], canonicalizing keys.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut set = HeaderSet::new();
        for (name, value) in map.iter() {
            set.append(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        set
    }
}

impl fmt::Display for HeaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for HeaderSet {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self> {
        HeaderSet::parse_strict(s)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        for (k, v) in iter {
            set.append(k.as_ref(), v);
        }
        set
    }
}

/// Builds a header block from alternating key, value arguments.
pub fn build_from_pairs<S: AsRef<str>>(args: &[S]) -> Result<String> {
    if args.len() % 2 != 0 {
        return Err(HttpError::Arity {
            function: "headers",
        });
    }
    let set: HeaderSet = args
        .chunks(2)
        .map(|pair| (pair[0].as_ref(), pair[1].as_ref().to_string()))
        .collect();
    Ok(set.serialize())
}

fn malformed(line: &str) -> HttpError {
    HttpError::MalformedHeader {
        line: line.to_string(),
    }
}

/// Reads `Key: value` lines up to the first blank line or end of input.
/// Returns everything read so far alongside the first error, if any.
fn read_block(text: &str) -> (HeaderSet, Option<HttpError>) {
    let mut set = HeaderSet::new();
    let mut lines = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .peekable();

    if let Some(first) = lines.peek() {
        if is_continuation(first) {
            return (set, Some(malformed(first)));
        }
    }

    while let Some(line) = lines.next() {
        if line.is_empty() {
            break;
        }

        let mut logical = line.trim_end_matches(WHITESPACE).to_string();
        while let Some(next) = lines.peek() {
            if !is_continuation(next) {
                break;
            }
            logical.push(' ');
            logical.push_str(next.trim_matches(WHITESPACE));
            lines.next();
        }

        let Some((key, value)) = logical.split_once(':') else {
            return (set, Some(malformed(&logical)));
        };
        if key.is_empty() || !key.bytes().all(is_token_byte) {
            return (set, Some(malformed(&logical)));
        }
        set.append(key, value.trim_start_matches(WHITESPACE));
    }

    (set, None)
}

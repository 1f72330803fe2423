//! Host-facing entry points.
//!
//! A SQL host registers each scalar function and table-valued function by
//! name and forwards calls here with its argument values. [`invoke`] runs a
//! scalar function, [`open_table`] opens the cursor of a table-valued one.
//! Names may carry the `http_` prefix the host exposes them under.
//!
//! The pure helpers (`headers`, `headers_get`, `cookies`, ...) are also
//! usable directly.

use crate::base::neterror::{HttpError, Result};
use crate::base::timing::format_timestamp;
use crate::client::{Client, Projected, Projection};
use crate::cookies::encode_pairs;
use crate::http::headers::{build_from_pairs, HeaderSet};
use crate::http::request::RequestParams;
use crate::rows::{HeadersEachCursor, RowCursor, Value};
use bytes::Bytes;
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

/// Builds a header block from alternating key, value arguments.
pub fn headers<S: AsRef<str>>(pairs: &[S]) -> Result<String> {
    build_from_pairs(pairs)
}

/// 1 if `wire` holds at least one `key` header, else 0.
pub fn headers_has(wire: &str, key: &str) -> i64 {
    i64::from(HeaderSet::parse(wire).has(key))
}

/// First value of `key` in `wire`.
pub fn headers_get(wire: &str, key: &str) -> Option<String> {
    HeaderSet::parse(wire).get_first(key).map(str::to_string)
}

/// JSON array of every value of `key` in `wire`, in order.
pub fn headers_all(wire: &str, key: &str) -> String {
    let set = HeaderSet::parse(wire);
    serde_json::to_string(set.get_all(key)).unwrap_or_else(|_| "[]".to_string())
}

const ZONE_NAMES: &[&str] = &[" GMT", " UTC", " UT", " Z"];

/// Parses an RFC 2822 / RFC 1123 date header value into a UTC timestamp.
/// Unparseable values give `None`.
pub fn headers_date(value: &str) -> Option<String> {
    parse_http_date(value.trim()).map(format_timestamp)
}

fn parse_http_date(value: &str) -> Option<OffsetDateTime> {
    if let Ok(at) = OffsetDateTime::parse(value, &Rfc2822) {
        return Some(at);
    }
    // Named zones are rewritten to their numeric offset.
    let numeric = ZONE_NAMES
        .iter()
        .find_map(|zone| value.strip_suffix(zone))
        .map(|rest| format!("{} +0000", rest))?;
    OffsetDateTime::parse(&numeric, &Rfc2822).ok()
}

/// JSON object text from alternating name, value arguments.
pub fn cookies<S: AsRef<str>>(pairs: &[S]) -> Result<String> {
    encode_pairs(pairs)
}

/// `application/x-www-form-urlencoded` text from alternating key, value
/// arguments. Keys come out sorted; a repeated key keeps its last value.
pub fn post_form_urlencoded<S: AsRef<str>>(pairs: &[S]) -> Result<String> {
    if pairs.len() % 2 != 0 {
        return Err(HttpError::Arity {
            function: "post_form_urlencoded",
        });
    }
    let form: BTreeMap<&str, &str> = pairs
        .chunks(2)
        .map(|pair| (pair[0].as_ref(), pair[1].as_ref()))
        .collect();
    Ok(url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form)
        .finish())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// `(url, headers, cookies)`
    Get,
    /// `(url, headers, body, cookies)`
    Post,
    /// `(method, url, headers, body, cookies)`
    Do,
}

impl Shape {
    fn arity(self) -> (usize, usize) {
        match self {
            Shape::Get => (1, 3),
            Shape::Post => (1, 4),
            Shape::Do => (2, 5),
        }
    }
}

struct RequestEntry {
    name: &'static str,
    shape: Shape,
    projection: Projection,
    usage: &'static str,
}

const REQUEST_ENTRY_POINTS: &[RequestEntry] = &[
    RequestEntry {
        name: "get_body",
        shape: Shape::Get,
        projection: Projection::Body,
        usage: "get_body(url, headers, cookies)",
    },
    RequestEntry {
        name: "get_headers",
        shape: Shape::Get,
        projection: Projection::Headers,
        usage: "get_headers(url, headers, cookies)",
    },
    RequestEntry {
        name: "post_body",
        shape: Shape::Post,
        projection: Projection::Body,
        usage: "post_body(url, headers, body, cookies)",
    },
    RequestEntry {
        name: "post_headers",
        shape: Shape::Post,
        projection: Projection::Headers,
        usage: "post_headers(url, headers, body, cookies)",
    },
    RequestEntry {
        name: "do_body",
        shape: Shape::Do,
        projection: Projection::Body,
        usage: "do_body(method, url, headers, body, cookies)",
    },
    RequestEntry {
        name: "do_headers",
        shape: Shape::Do,
        projection: Projection::Headers,
        usage: "do_headers(method, url, headers, body, cookies)",
    },
    RequestEntry {
        name: "get",
        shape: Shape::Get,
        projection: Projection::Row,
        usage: "get(url, headers, cookies)",
    },
    RequestEntry {
        name: "post",
        shape: Shape::Post,
        projection: Projection::Row,
        usage: "post(url, headers, body, cookies)",
    },
    RequestEntry {
        name: "do",
        shape: Shape::Do,
        projection: Projection::Row,
        usage: "do(method, url, headers, body, cookies)",
    },
];

fn request_entry(name: &str) -> Option<&'static RequestEntry> {
    REQUEST_ENTRY_POINTS.iter().find(|e| e.name == name)
}

fn bare_name(name: &str) -> &str {
    name.strip_prefix("http_").unwrap_or(name)
}

fn check_arity(args: &[Value], min: usize, max: usize, usage: &'static str) -> Result<()> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(HttpError::Usage { usage })
    }
}

/// Text of argument `i`; missing and null arguments read as "".
fn text(args: &[Value], i: usize) -> String {
    args.get(i).and_then(Value::as_text).unwrap_or_default()
}

fn texts(args: &[Value]) -> Vec<String> {
    (0..args.len()).map(|i| text(args, i)).collect()
}

fn integer(args: &[Value], i: usize, usage: &'static str) -> Result<i64> {
    args.get(i)
        .and_then(Value::as_integer)
        .ok_or(HttpError::Usage { usage })
}

/// Owned request arguments, borrowed as [`RequestParams`].
struct RequestArgs {
    method: String,
    url: String,
    headers: String,
    body: Option<Bytes>,
    cookies: String,
}

impl RequestArgs {
    fn from_values(shape: Shape, args: &[Value]) -> Self {
        let body = |i: usize| args.get(i).and_then(Value::as_bytes);
        match shape {
            Shape::Get => Self {
                method: "GET".to_string(),
                url: text(args, 0),
                headers: text(args, 1),
                body: None,
                cookies: text(args, 2),
            },
            Shape::Post => Self {
                method: "POST".to_string(),
                url: text(args, 0),
                headers: text(args, 1),
                body: body(2),
                cookies: text(args, 3),
            },
            Shape::Do => Self {
                method: text(args, 0),
                url: text(args, 1),
                headers: text(args, 2),
                body: body(3),
                cookies: text(args, 4),
            },
        }
    }

    fn params(&self) -> RequestParams<'_> {
        RequestParams {
            method: &self.method,
            url: &self.url,
            headers: &self.headers,
            body: self.body.as_deref(),
            cookies: &self.cookies,
        }
    }
}

fn perform(
    client: &Client,
    entry: &RequestEntry,
    args: &[Value],
) -> Result<Projected> {
    let (min, max) = entry.shape.arity();
    check_arity(args, min, max, entry.usage)?;
    let request = RequestArgs::from_values(entry.shape, args);
    client.perform_and_project(&request.params(), entry.projection)
}

/// Runs the scalar function `name` with host arguments.
pub fn invoke(client: &Client, name: &str, args: &[Value]) -> Result<Value> {
    let name = bare_name(name);
    if let Some(entry) = request_entry(name) {
        if entry.projection == Projection::Row {
            return Err(HttpError::NoSuchFunction(name.to_string()));
        }
        return match perform(client, entry, args)? {
            Projected::Body(body) => Ok(Value::from(body)),
            Projected::Headers(wire) => Ok(Value::from(wire)),
            Projected::Row(_) => Err(HttpError::NoSuchFunction(name.to_string())),
        };
    }

    match name {
        "headers" => headers(&texts(args)).map(Value::from),
        "headers_has" => {
            check_arity(args, 2, 2, "headers_has(headers, key)")?;
            Ok(Value::from(headers_has(&text(args, 0), &text(args, 1))))
        }
        "headers_get" => {
            check_arity(args, 2, 2, "headers_get(headers, key)")?;
            Ok(Value::from(headers_get(&text(args, 0), &text(args, 1))))
        }
        "headers_all" => {
            check_arity(args, 2, 2, "headers_all(headers, key)")?;
            Ok(Value::from(headers_all(&text(args, 0), &text(args, 1))))
        }
        "headers_date" => {
            check_arity(args, 1, 1, "headers_date(value)")?;
            Ok(Value::from(headers_date(&text(args, 0))))
        }
        "cookies" => cookies(&texts(args)).map(Value::from),
        "post_form_urlencoded" => post_form_urlencoded(&texts(args)).map(Value::from),
        "rate_limit" => {
            const USAGE: &str = "rate_limit(interval_ms)";
            check_arity(args, 1, 1, USAGE)?;
            let ms = integer(args, 0, USAGE)?;
            client.rate_limit(ms.max(0) as u64);
            Ok(Value::from(ms))
        }
        "timeout_set" => {
            const USAGE: &str = "timeout_set(timeout_ms)";
            check_arity(args, 1, 1, USAGE)?;
            let ms = integer(args, 0, USAGE)?;
            client.timeout_set(ms.max(0) as u64);
            Ok(Value::from(ms))
        }
        _ => Err(HttpError::NoSuchFunction(name.to_string())),
    }
}

/// Opens the cursor of the table-valued function `name`.
pub fn open_table(client: &Client, name: &str, args: &[Value]) -> Result<Box<dyn RowCursor>> {
    let name = bare_name(name);
    if name == "headers_each" {
        check_arity(args, 1, 2, "headers_each(headers, key)")?;
        let only_key = args.get(1).and_then(Value::as_text);
        return Ok(Box::new(HeadersEachCursor::parse(
            &text(args, 0),
            only_key.as_deref(),
        )));
    }
    match request_entry(name) {
        Some(entry) if entry.projection == Projection::Row => {
            match perform(client, entry, args)? {
                Projected::Row(cursor) => Ok(Box::new(cursor)),
                _ => Err(HttpError::NoSuchFunction(name.to_string())),
            }
        }
        _ => Err(HttpError::NoSuchFunction(name.to_string())),
    }
}

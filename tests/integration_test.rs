//! Tests against real servers. Run with `--ignored`.

use sqlhttp::rows::RowCursor;
use sqlhttp::Client;
use std::time::Duration;

fn client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap()
}

/// Test real HTTPS request to httpbin.org
#[test]
#[ignore] // Run with --ignored flag for network tests
fn test_real_https_get() {
    let body = client()
        .get_body("https://httpbin.org/get?probe=1", "", "")
        .unwrap();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("httpbin.org"));
    assert!(text.contains("probe"));
}

/// Test POST request
#[test]
#[ignore]
fn test_https_post_echo() {
    let body = client()
        .post_body(
            "https://httpbin.org/post",
            "Content-Type: text/plain\r\n",
            b"test data",
            r#"{"flavor":"oat"}"#,
        )
        .unwrap();
    let echoed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(echoed["data"], "test data");
    assert_eq!(echoed["headers"]["Cookie"], "flavor=oat");
}

/// TLS phases are timed
#[test]
#[ignore]
fn test_https_row_timings() {
    let mut row = client().get("https://example.com/", "", "").unwrap();
    assert!(row.next());
    assert_eq!(
        row.column_by_name("response_status_code").unwrap().as_integer(),
        Some(200)
    );
    let timings = row.column_by_name("timings").unwrap().as_text().unwrap();
    for key in ["dns_start", "dns_end", "tls_handshake_start", "tls_handshake_end"] {
        assert!(timings.contains(key), "missing {} in {}", key, timings);
    }
    assert!(row.column_by_name("remote_address").unwrap().as_text().unwrap().ends_with(":443"));
}

/// Test redirect following
#[test]
#[ignore]
fn test_real_redirects() {
    let body = client()
        .get_body("https://httpbin.org/redirect/3", "", "")
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("/get"));
}

/// Date headers from a live response parse
#[test]
#[ignore]
fn test_live_date_header() {
    let wire = client().get_headers("https://example.com/", "", "").unwrap();
    let date = sqlhttp::functions::headers_get(&wire, "Date").unwrap();
    assert!(sqlhttp::functions::headers_date(&date).is_some());
}

mod common;

use common::{ok_response, request_body, request_header, request_line, TestServer};
use sqlhttp::client::DEFAULT_USER_AGENT;
use sqlhttp::{Client, HttpError, RequestParams};

fn client() -> Client {
    common::init_tracing();
    Client::builder().worker_threads(2).build().unwrap()
}

#[test]
fn test_get_body() {
    let server = TestServer::ok("hello");
    let body = client().get_body(&server.url("/greet?x=1"), "", "").unwrap();
    assert_eq!(&body[..], b"hello");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(request_line(&requests[0]), "GET /greet?x=1 HTTP/1.1");
    assert_eq!(
        request_header(&requests[0], "Host").as_deref(),
        Some(server.addr.to_string().as_str())
    );
}

#[test]
fn test_default_user_agent() {
    let server = TestServer::ok("");
    client().get_body(&server.url("/"), "", "").unwrap();
    let sent = &server.requests()[0];
    assert_eq!(request_header(sent, "User-Agent").as_deref(), Some(DEFAULT_USER_AGENT));
}

#[test]
fn test_caller_headers_replace_defaults() {
    let server = TestServer::ok("");
    client()
        .get_body(&server.url("/"), "X-Token: abc\r\nAccept: text/plain\r\n", "")
        .unwrap();
    let sent = &server.requests()[0];
    assert_eq!(request_header(sent, "X-Token").as_deref(), Some("abc"));
    assert_eq!(request_header(sent, "Accept").as_deref(), Some("text/plain"));
    assert_eq!(request_header(sent, "User-Agent"), None);
}

#[test]
fn test_get_headers() {
    let server = TestServer::start(|_| {
        "HTTP/1.1 200 OK\r\nX-Thing: a\r\nX-Thing: b\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string()
    });
    let wire = client().get_headers(&server.url("/"), "", "").unwrap();
    let parsed = sqlhttp::HeaderSet::parse(&wire);
    assert_eq!(parsed.get_all("x-thing"), &["a".to_string(), "b".to_string()]);
    assert_eq!(parsed.get_first("Content-Length"), Some("0"));
    assert!(wire.contains("X-Thing: a\r\n"));
}

#[test]
fn test_post_body_sends_payload() {
    let server = TestServer::start(|req| ok_response(&format!("got {}", request_body(req))));
    let body = client()
        .post_body(
            &server.url("/submit"),
            "Content-Type: application/x-www-form-urlencoded\r\n",
            b"a=1&b=2",
            "",
        )
        .unwrap();
    assert_eq!(&body[..], b"got a=1&b=2");

    let sent = &server.requests()[0];
    assert_eq!(request_line(sent), "POST /submit HTTP/1.1");
    assert_eq!(request_header(sent, "Content-Length").as_deref(), Some("7"));
}

#[test]
fn test_do_body_custom_method() {
    let server = TestServer::ok("deleted");
    let body = client()
        .do_body(RequestParams::new("DELETE", &server.url("/item/7")))
        .unwrap();
    assert_eq!(&body[..], b"deleted");
    assert_eq!(request_line(&server.requests()[0]), "DELETE /item/7 HTTP/1.1");
}

#[test]
fn test_empty_method_means_get() {
    let server = TestServer::ok("");
    client()
        .do_headers(RequestParams::new("", &server.url("/")))
        .unwrap();
    assert!(request_line(&server.requests()[0]).starts_with("GET "));
}

#[test]
fn test_cookies_become_one_header() {
    let server = TestServer::ok("");
    client()
        .get_body(&server.url("/"), "", r#"{"b":"2","a":"1"}"#)
        .unwrap();
    let sent = &server.requests()[0];
    assert_eq!(request_header(sent, "Cookie").as_deref(), Some("a=1; b=2"));
}

#[test]
fn test_cookies_extend_caller_cookie_header() {
    let server = TestServer::ok("");
    client()
        .get_body(&server.url("/"), "Cookie: z=26\r\n", r#"{"a":"1"}"#)
        .unwrap();
    let sent = &server.requests()[0];
    assert_eq!(request_header(sent, "Cookie").as_deref(), Some("z=26; a=1"));
}

#[test]
fn test_builder_errors_abort_before_dispatch() {
    let server = TestServer::ok("");
    let client = client();

    let err = client.get_body(&server.url("/"), "", "[1,2]").unwrap_err();
    assert!(matches!(err, HttpError::MalformedCookie { .. }));

    let err = client
        .do_body(RequestParams::new("BAD METHOD", &server.url("/")))
        .unwrap_err();
    assert!(matches!(err, HttpError::InvalidMethod { .. }));

    let err = client.get_body("not a url", "", "").unwrap_err();
    assert!(matches!(err, HttpError::InvalidUrl { .. }));

    assert!(server.requests().is_empty());
}

#[test]
fn test_unsendable_header_value_fails_at_build() {
    let server = TestServer::ok("");
    let client = client();

    let err = client
        .get_body(&server.url("/"), "X-Trace: a\x01b\r\n", "")
        .unwrap_err();
    assert!(matches!(err, HttpError::MalformedHeader { .. }));
    assert!(client
        .get(&server.url("/row"), "X-Trace: a\x01b\r\n", "")
        .is_err());

    assert!(server.requests().is_empty());
}

#[test]
fn test_non_success_status_is_not_an_error() {
    let server = TestServer::start(|_| {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 4\r\nConnection: close\r\n\r\nnope".to_string()
    });
    let body = client().get_body(&server.url("/missing"), "", "").unwrap();
    assert_eq!(&body[..], b"nope");
}

#[test]
fn test_unreachable_host_is_transport_error() {
    // Nothing listens on the discard port.
    let err = client().get_body("http://127.0.0.1:9/", "", "").unwrap_err();
    assert!(err.is_transport(), "unexpected error: {:?}", err);
    assert!(err.as_i32() < 0);
    assert!(err.to_string().contains("127.0.0.1:9"));
}

#[test]
fn test_global_client_is_shared() {
    let a = Client::global().unwrap();
    let b = Client::global().unwrap();
    assert!(std::ptr::eq(a, b));
}

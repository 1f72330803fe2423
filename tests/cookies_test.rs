use sqlhttp::cookies::{encode_pairs, request_cookie_strings, response_cookie_strings, CookieMap};
use sqlhttp::{HeaderSet, HttpError};

#[test]
fn test_encode_then_decode_last_wins() {
    let text = encode_pairs(&["a", "1", "b", "2", "a", "3"]).unwrap();
    assert_eq!(text, r#"{"a":"3","b":"2"}"#);

    let decoded = CookieMap::decode(&text).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded.get("a"), Some("3"));
    assert_eq!(decoded.get("b"), Some("2"));
}

#[test]
fn test_odd_argument_count() {
    let err = encode_pairs(&["a", "1", "b"]).unwrap_err();
    assert!(matches!(err, HttpError::Arity { function: "cookies" }));
    assert_eq!(err.to_string(), "cookies must have even-numbered arguments");
}

#[test]
fn test_decode_rejects_non_string_values() {
    assert!(matches!(
        CookieMap::decode(r#"{"a":1}"#),
        Err(HttpError::MalformedCookie { .. })
    ));
    assert!(matches!(
        CookieMap::decode(r#"{"a":{"b":"c"}}"#),
        Err(HttpError::MalformedCookie { .. })
    ));
    assert!(CookieMap::decode("null").unwrap().is_empty());
    assert!(CookieMap::decode("{}").unwrap().is_empty());
}

#[test]
fn test_attach_merges_into_single_header() {
    let mut headers = HeaderSet::parse("Accept: */*\r\n");
    let cookies = CookieMap::decode(r#"{"session":"xyz","theme":"dark"}"#).unwrap();
    cookies.attach(&mut headers);
    assert_eq!(headers.get_all("Cookie"), &["session=xyz; theme=dark".to_string()]);

    assert_eq!(
        request_cookie_strings(&headers),
        vec!["session=xyz".to_string(), "theme=dark".to_string()]
    );
}

#[test]
fn test_attach_nothing_leaves_headers_alone() {
    let mut headers = HeaderSet::parse("Accept: */*\r\n");
    CookieMap::new().attach(&mut headers);
    assert!(!headers.has("Cookie"));
}

#[test]
fn test_response_cookie_strings_kept_verbatim() {
    let headers = HeaderSet::parse(
        "Set-Cookie: id=a3fWa; Expires=Wed, 21 Oct 2015 07:28:00 GMT\r\nSet-Cookie: lang=en\r\n",
    );
    assert_eq!(
        response_cookie_strings(&headers),
        vec![
            "id=a3fWa; Expires=Wed, 21 Oct 2015 07:28:00 GMT".to_string(),
            "lang=en".to_string(),
        ]
    );
}

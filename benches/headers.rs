use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sqlhttp::cookies::CookieMap;
use sqlhttp::HeaderSet;

const BROWSER_BLOCK: &str = "Accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7\r\n\
Accept-Encoding: gzip, deflate, br\r\n\
Accept-Language: en-GB,en;q=0.9\r\n\
Cache-Control: max-age=0\r\n\
Cookie: WMF-Last-Access=xxxxxxxxxxx; WMF-Last-Access-Global=xxxxxxxxxxx; GeoIP=xxxxxxxxxxxxxxxxxxxxxxxxxxx; NetworkProbeLimit=0.001\r\n\
Sec-Fetch-Dest: document\r\n\
Sec-Fetch-Mode: navigate\r\n\
Sec-Fetch-Site: none\r\n\
Sec-Fetch-User: ?1\r\n\
Set-Cookie: a=1\r\n\
Set-Cookie: b=2\r\n\
Upgrade-Insecure-Requests: 1\r\n\
User-Agent: Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36\r\n\
\r\n";

fn benchmark_headers_parse(c: &mut Criterion) {
    c.bench_function("headers_parse", |b| {
        b.iter(|| HeaderSet::parse(black_box(BROWSER_BLOCK)))
    });
}

fn benchmark_headers_serialize(c: &mut Criterion) {
    let headers = HeaderSet::parse(BROWSER_BLOCK);
    c.bench_function("headers_serialize", |b| {
        b.iter(|| black_box(&headers).serialize())
    });
}

fn benchmark_headers_to_header_map(c: &mut Criterion) {
    let headers = HeaderSet::parse(BROWSER_BLOCK);
    // Per-request conversion cost at dispatch
    c.bench_function("headers_to_header_map", |b| {
        b.iter(|| black_box(&headers).to_header_map())
    });
}

fn benchmark_cookie_attach(c: &mut Criterion) {
    let cookies = CookieMap::decode(r#"{"session":"abc123","theme":"dark","lang":"en-GB"}"#)
        .unwrap();
    let headers = HeaderSet::parse("Accept: */*\r\nCookie: existing=1\r\n");
    c.bench_function("cookie_attach", |b| {
        b.iter(|| {
            let mut headers = headers.clone();
            cookies.attach(&mut headers);
            black_box(headers)
        })
    });
}

criterion_group!(
    benches,
    benchmark_headers_parse,
    benchmark_headers_serialize,
    benchmark_headers_to_header_map,
    benchmark_cookie_attach
);
criterion_main!(benches);

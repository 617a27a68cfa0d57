mod common;

use ladle_http::{FetchError, FetchOpts, Fetcher, StatusCode, header_map};
use std::io::{Read, Write};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The blocking client owns its own runtime, so it must be built and used off
/// the async test runtime.
async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.expect("blocking task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_returns_body_and_status() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("x-custom", "yes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<h1>Hello</h1>", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/page", server.uri());
    let page = blocking(move || {
        Fetcher::new()
            .unwrap()
            .fetch(&url, [("X-Custom", "yes")])
    })
    .await
    .expect("fetch ok");

    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body, "<h1>Hello</h1>");
    assert_eq!(
        page.content_type.as_deref(),
        Some("text/html; charset=utf-8")
    );
    assert_eq!(page.url.path(), "/page");
}

#[tokio::test(flavor = "multi_thread")]
async fn default_user_agent_is_sent_unless_overridden() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let default_ua = concat!("ladle/", env!("CARGO_PKG_VERSION"));
    Mock::given(path("/default"))
        .and(header("user-agent", default_ua))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/custom"))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    blocking(move || {
        let fetcher = Fetcher::new().unwrap();
        fetcher
            .fetch(&format!("{base}/default"), Vec::<(&str, &str)>::new())
            .expect("default ua");
        fetcher
            .fetch(&format!("{base}/custom"), [("User-Agent", "Mozilla/5.0")])
            .expect("custom ua");
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn forbidden_is_an_http_status_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("go away"))
        .mount(&server)
        .await;

    let url = format!("{}/secret", server.uri());
    let err = blocking(move || {
        Fetcher::new()
            .unwrap()
            .fetch(&url, Vec::<(&str, &str)>::new())
    })
    .await
    .expect_err("403 must fail");

    match &err {
        FetchError::HttpStatus {
            url,
            status,
            snippet,
        } => {
            assert_eq!(*status, StatusCode::FORBIDDEN);
            assert!(url.ends_with("/secret"));
            assert_eq!(snippet, "go away");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
    assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
    assert!(!err.is_network());
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_server_times_out_as_network_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let url = server.uri();
    let err = blocking(move || {
        Fetcher::new().unwrap().fetch_with(
            &url,
            FetchOpts {
                timeout: Some(Duration::from_millis(200)),
                ..Default::default()
            },
        )
    })
    .await
    .expect_err("must time out");

    assert!(err.is_network(), "got {err:?}");
    assert!(err.status().is_none());
}

#[test]
fn refused_connection_is_a_network_error() {
    common::init_test_tracing();
    // Bind then drop a listener so the port is very likely closed.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let err = Fetcher::new()
        .unwrap()
        .with_timeout(Duration::from_secs(2))
        .fetch(
            &format!("http://127.0.0.1:{port}/"),
            Vec::<(&str, &str)>::new(),
        )
        .expect_err("nothing listens there");
    match err {
        FetchError::Network { url, .. } => assert!(url.contains(&port.to_string())),
        other => panic!("expected Network, got {other:?}"),
    }
}

#[test]
fn error_status_with_truncated_body_is_still_an_http_status_error() {
    common::init_test_tracing();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 2048];
        let _ = stream.read(&mut buf);
        // Promise 1000 bytes, send 5, hang up.
        stream
            .write_all(b"HTTP/1.1 403 Forbidden\r\nContent-Length: 1000\r\n\r\nshort")
            .unwrap();
    });

    let err = Fetcher::new()
        .unwrap()
        .with_timeout(Duration::from_secs(5))
        .fetch(
            &format!("http://127.0.0.1:{port}/"),
            Vec::<(&str, &str)>::new(),
        )
        .expect_err("403 must fail");
    server.join().unwrap();

    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN), "got {err:?}");
    assert!(!err.is_network());
}

#[test]
fn bad_inputs_fail_before_any_request() {
    let fetcher = Fetcher::new().unwrap();
    assert!(matches!(
        fetcher.fetch("::not a url::", Vec::<(&str, &str)>::new()),
        Err(FetchError::Url(_))
    ));
    assert!(matches!(
        fetcher.fetch("http://127.0.0.1/", [("bad name", "v")]),
        Err(FetchError::Build(_))
    ));
    assert!(header_map([("Accept", "text/html")]).is_ok());
}

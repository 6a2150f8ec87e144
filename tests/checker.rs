mod support;

use std::time::Duration;

use pagewatch::error::AppError;
use pagewatch::models::{ProgramSettings, Update};
use pagewatch::services::{CheckOutcome, Fetcher, HttpFetcher};
use support::{Harness, StubFetcher, StubMailer, mail_settings, page};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[tokio::test]
async fn test_first_check_stores_baseline() {
    let h = Harness::new(StubFetcher::new(&["<p>abc</p>"]), StubMailer::default());
    let settings = ProgramSettings::default();
    let p = page("url = \"https://example.com/\"\nselector = \"p\"", &settings);

    let outcome = h.checker.check(&p, &settings).await.unwrap();

    assert_eq!(outcome, CheckOutcome::Baseline);
    assert_eq!(h.cache.read(&p.url).await.unwrap().as_deref(), Some("<p>abc</p>"));
    assert!(h.registry.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_change_flags_update() {
    let h = Harness::new(
        StubFetcher::new(&["<p>abc</p>", "<p>abcX</p>"]),
        StubMailer::default(),
    );
    let settings = ProgramSettings::default();
    let p = page("url = \"https://example.com/\"\nselector = \"p\"", &settings);

    h.checker.check(&p, &settings).await.unwrap();
    let outcome = h.checker.check(&p, &settings).await.unwrap();

    assert_eq!(outcome, CheckOutcome::Updated { notified: false });
    assert!(h.registry.snapshot().await.contains(&Update::from(&p.url)));
    assert_eq!(h.cache.read(&p.url).await.unwrap().as_deref(), Some("<p>abcX</p>"));

    let persisted = std::fs::read_to_string(h.dir.path().join("updates.json")).unwrap();
    let map: serde_json::Value = serde_json::from_str(&persisted).unwrap();
    assert_eq!(map["https://example.com/"], serde_json::Value::Bool(true));
}

#[tokio::test]
async fn test_change_within_threshold_is_ignored() {
    let h = Harness::new(
        StubFetcher::new(&["<p>abc</p>", "<p>abd</p>"]),
        StubMailer::default(),
    );
    let settings = ProgramSettings::default();
    let p = page(
        "url = \"https://example.com/\"\nselector = \"p\"\nthreshold = 0.5",
        &settings,
    );

    h.checker.check(&p, &settings).await.unwrap();
    let outcome = h.checker.check(&p, &settings).await.unwrap();

    assert_eq!(outcome, CheckOutcome::Unchanged);
    assert!(h.registry.snapshot().await.is_empty());
    assert_eq!(h.cache.read(&p.url).await.unwrap().as_deref(), Some("<p>abc</p>"));
}

#[tokio::test]
async fn test_timeout_leaves_state_untouched() {
    let h = Harness::with_timeout(
        StubFetcher::with_delay(&["<p>abc</p>"], Duration::from_millis(500)),
        StubMailer::default(),
        Duration::from_millis(50),
    );
    let settings = ProgramSettings::default();
    let p = page("url = \"https://slow.example/\"", &settings);

    let err = h.checker.check(&p, &settings).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "timeout: https://slow.example/");
    assert_eq!(h.cache.read(&p.url).await.unwrap(), None);
    assert!(h.registry.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_checks_of_one_page_serialize() {
    let h = Harness::with_timeout(
        StubFetcher::with_delay(&["<p>one</p>", "<p>two</p>"], Duration::from_millis(10)),
        StubMailer::default(),
        Duration::from_secs(5),
    );
    let settings = ProgramSettings::default();
    let p = page("url = \"https://example.com/\"\nselector = \"p\"", &settings);

    let (a, b) = tokio::join!(h.checker.check(&p, &settings), h.checker.check(&p, &settings));
    let mut outcomes = vec![a.unwrap(), b.unwrap()];
    outcomes.sort_by_key(|o| matches!(o, CheckOutcome::Updated { .. }));

    assert_eq!(
        outcomes,
        vec![CheckOutcome::Baseline, CheckOutcome::Updated { notified: false }]
    );
    let cached = h.cache.read(&p.url).await.unwrap().unwrap();
    assert!(cached == "<p>one</p>" || cached == "<p>two</p>");
}

#[tokio::test]
async fn test_update_sends_readable_mail() {
    let h = Harness::new(
        StubFetcher::new(&[
            "<p>3 new posts</p><div>x</div>",
            "<p>4 new posts</p><div>x</div>",
        ]),
        StubMailer::default(),
    );
    let settings = mail_settings();
    let p = page(
        "url = \"https://example.com/\"\nselector = \"p\"\ninclude = \"[0-9]+\"\nnotify = \"me@example.org\"",
        &settings,
    );

    h.checker.check(&p, &settings).await.unwrap();
    let outcome = h.checker.check(&p, &settings).await.unwrap();

    assert_eq!(outcome, CheckOutcome::Updated { notified: true });
    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "me@example.org");
    assert_eq!(sent[0].url, "https://example.com/");
    assert_eq!(sent[0].body, "<p>4 new posts</p>");
}

#[tokio::test]
async fn test_no_mail_without_account() {
    let h = Harness::new(
        StubFetcher::new(&["<p>abc</p>", "<p>xyz</p>"]),
        StubMailer::default(),
    );
    let settings = ProgramSettings::default();
    let p = page(
        "url = \"https://example.com/\"\nnotify = \"me@example.org\"",
        &settings,
    );

    h.checker.check(&p, &settings).await.unwrap();
    let outcome = h.checker.check(&p, &settings).await.unwrap();

    assert_eq!(outcome, CheckOutcome::Updated { notified: false });
    assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_mail_failure_keeps_flag_but_not_cache() {
    let h = Harness::new(
        StubFetcher::new(&["<p>abc</p>", "<p>xyz</p>"]),
        StubMailer::failing(),
    );
    let settings = mail_settings();
    let p = page(
        "url = \"https://example.com/\"\nselector = \"p\"\nnotify = \"me@example.org\"",
        &settings,
    );

    h.checker.check(&p, &settings).await.unwrap();
    let err = h.checker.check(&p, &settings).await.unwrap_err();

    assert!(matches!(err, AppError::Mail(_)));
    assert!(h.registry.snapshot().await.contains(&Update::from(&p.url)));
    assert_eq!(h.cache.read(&p.url).await.unwrap().as_deref(), Some("<p>abc</p>"));
}

/// Answer one HTTP request with `response` and hand back the raw request.
async fn serve_once(response: &'static [u8]) -> (u16, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.ends_with(b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream.write_all(response).await.unwrap();
        stream.shutdown().await.unwrap();
        String::from_utf8_lossy(&request).into_owned()
    });
    (port, handle)
}

fn local_fetcher() -> HttpFetcher {
    HttpFetcher::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
}

#[tokio::test]
async fn test_http_error_status() {
    let (port, server) =
        serve_once(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await;
    let settings = ProgramSettings::default();
    let p = page(&format!("url = \"http://127.0.0.1:{port}/gone\""), &settings);

    let err = local_fetcher().fetch(&p).await.unwrap_err();
    server.await.unwrap();

    match err {
        AppError::Status { status, reason, .. } => {
            assert_eq!(status, 404);
            assert_eq!(reason, "Not Found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_custom_headers_are_sent() {
    let (port, server) = serve_once(
        b"HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: 11\r\nConnection: close\r\n\r\n<p>hey</p>\n",
    )
    .await;
    let settings = ProgramSettings::default();
    let p = page(
        &format!(
            "url = \"http://127.0.0.1:{port}/\"\n[page.headers]\nX-Token = \"abc\"\nUser-Agent = \"custom-agent\""
        ),
        &settings,
    );

    let body = local_fetcher().fetch(&p).await.unwrap();
    let request = server.await.unwrap().to_ascii_lowercase();

    assert_eq!(body, "<p>hey</p>\n");
    assert!(request.contains("x-token: abc"));
    assert!(request.contains("user-agent: custom-agent"));
}

#[tokio::test]
async fn test_declared_charset_is_transcoded() {
    let (port, server) = serve_once(
        b"HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=iso-8859-1\r\nContent-Length: 10\r\nConnection: close\r\n\r\n<p>\xe5\xe4\xf6</p>",
    )
    .await;
    let settings = ProgramSettings::default();
    let p = page(&format!("url = \"http://127.0.0.1:{port}/\""), &settings);

    let body = local_fetcher().fetch(&p).await.unwrap();
    server.await.unwrap();

    assert_eq!(body, "<p>åäö</p>");
}

#[tokio::test]
async fn test_longest_cache_name_stores_baseline() {
    let h = Harness::new(StubFetcher::new(&["<p>abc</p>"]), StubMailer::default());
    let settings = ProgramSettings::default();
    // Encoded as 26 bytes of prefix, 225 of path and 4 of extension.
    let url = format!("https://example.com/{}", "x".repeat(225));
    let p = page(&format!("url = \"{url}\""), &settings);
    assert_eq!(h.cache.path_for(&p.url).unwrap().file_name().unwrap().len(), 255);

    let outcome = h.checker.check(&p, &settings).await.unwrap();

    assert_eq!(outcome, CheckOutcome::Baseline);
    assert_eq!(h.cache.read(&p.url).await.unwrap().as_deref(), Some("<p>abc</p>"));
}

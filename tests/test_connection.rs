mod common;

use common::{TempDir, read_response};
use lantern::http::connection::Connection;
use lantern::server::docroot::DocRoot;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const GUARD: Duration = Duration::from_secs(10);

fn site() -> (TempDir, Arc<DocRoot>) {
    let dir = TempDir::new("conn");
    dir.write("index.html", "<h1>home</h1>");
    dir.write("a.txt", "alpha");
    dir.write("b.txt", "bravo!");
    let root = Arc::new(DocRoot::new(dir.path(), "index.html").unwrap());
    (dir, root)
}

/// Connects a client to a server-side `Connection` running on its own task.
async fn connect(docroot: Arc<DocRoot>, idle: Duration) -> (TcpStream, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap())
        .await
        .unwrap();
    let (server, _) = listener.accept().await.unwrap();

    let handle = tokio::spawn(async move {
        Connection::with_idle_timeout(server, docroot, idle)
            .run()
            .await
            .unwrap();
    });

    (client, handle)
}

async fn read_all(client: &mut TcpStream) -> Vec<u8> {
    let mut out = Vec::new();
    timeout(GUARD, client.read_to_end(&mut out))
        .await
        .unwrap()
        .unwrap();
    out
}

#[tokio::test]
async fn test_idle_timeout_without_bytes_closes_silently() {
    let (_dir, root) = site();
    let (mut client, handle) = connect(root, Duration::from_millis(200)).await;

    let out = read_all(&mut client).await;

    assert!(out.is_empty());
    timeout(GUARD, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_idle_timeout_after_partial_request_line_sends_one_400() {
    let (_dir, root) = site();
    let (mut client, handle) = connect(root, Duration::from_millis(200)).await;

    client.write_all(b"GET /index.ht").await.unwrap();
    let out = String::from_utf8(read_all(&mut client).await).unwrap();

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(out.contains("Connection: close\r\n"));
    assert_eq!(out.matches("HTTP/1.1").count(), 1);
    timeout(GUARD, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_idle_timeout_mid_headers_sends_400() {
    let (_dir, root) = site();
    let (mut client, _handle) = connect(root, Duration::from_millis(200)).await;

    client
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n")
        .await
        .unwrap();
    let out = String::from_utf8(read_all(&mut client).await).unwrap();

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_peer_close_without_request_writes_nothing() {
    let (_dir, root) = site();
    let (mut client, handle) = connect(root, Duration::from_secs(5)).await;

    client.shutdown().await.unwrap();
    let out = read_all(&mut client).await;

    assert!(out.is_empty());
    timeout(GUARD, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_malformed_request_gets_400_and_close() {
    let (_dir, root) = site();
    let (mut client, _handle) = connect(root, Duration::from_secs(5)).await;

    client
        .write_all(b"FETCH / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let out = String::from_utf8(read_all(&mut client).await).unwrap();

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(out.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn test_missing_host_gets_400() {
    let (_dir, root) = site();
    let (mut client, _handle) = connect(root, Duration::from_secs(5)).await;

    client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    let out = String::from_utf8(read_all(&mut client).await).unwrap();

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_sequential_requests_share_one_socket() {
    let (_dir, root) = site();
    let (client, handle) = connect(root, Duration::from_secs(5)).await;
    let mut client = BufReader::new(client);

    client
        .get_mut()
        .write_all(b"GET /a.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let first = timeout(GUARD, read_response(&mut client)).await.unwrap();

    client
        .get_mut()
        .write_all(b"GET /b.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let second = timeout(GUARD, read_response(&mut client)).await.unwrap();

    assert_eq!(first.status_line, "HTTP/1.1 200 OK");
    assert_eq!(first.body, b"alpha");
    assert_eq!(second.status_line, "HTTP/1.1 200 OK");
    assert_eq!(second.body, b"bravo!");
    assert!(!first.headers.contains_key("Connection"));

    // Still open: a third request is answered on the same socket
    client
        .get_mut()
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let third = timeout(GUARD, read_response(&mut client)).await.unwrap();
    assert_eq!(third.body, b"<h1>home</h1>");
    assert!(!handle.is_finished());
}

#[tokio::test]
async fn test_connection_close_ends_after_response() {
    let (_dir, root) = site();
    let (client, handle) = connect(root, Duration::from_secs(5)).await;
    let mut client = BufReader::new(client);

    client
        .get_mut()
        .write_all(b"GET /a.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let response = timeout(GUARD, read_response(&mut client)).await.unwrap();

    assert_eq!(response.status_line, "HTTP/1.1 200 OK");
    assert_eq!(response.headers.get("Connection").unwrap(), "close");
    assert_eq!(response.headers.get("Content-Type").unwrap(), "text/plain");
    assert_eq!(response.body, b"alpha");

    let mut rest = Vec::new();
    timeout(GUARD, client.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
    assert!(rest.is_empty());
    timeout(GUARD, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_not_found_keeps_connection_open() {
    let (_dir, root) = site();
    let (client, _handle) = connect(root, Duration::from_secs(5)).await;
    let mut client = BufReader::new(client);

    client
        .get_mut()
        .write_all(b"GET /nope.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let missing = timeout(GUARD, read_response(&mut client)).await.unwrap();

    assert_eq!(missing.status_line, "HTTP/1.1 404 Not Found");
    assert!(missing.headers.contains_key("Date"));
    assert!(!missing.headers.contains_key("Connection"));

    client
        .get_mut()
        .write_all(b"GET /a.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let found = timeout(GUARD, read_response(&mut client)).await.unwrap();
    assert_eq!(found.status_line, "HTTP/1.1 200 OK");
}

#[tokio::test]
async fn test_traversal_over_the_wire_is_not_found() {
    let (dir, _) = site();
    dir.write("site/index.html", "public");
    let root = Arc::new(DocRoot::new(dir.path().join("site"), "index.html").unwrap());
    let (client, _handle) = connect(root, Duration::from_secs(5)).await;
    let mut client = BufReader::new(client);

    client
        .get_mut()
        .write_all(b"GET /../a.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let response = timeout(GUARD, read_response(&mut client)).await.unwrap();

    assert_eq!(response.status_line, "HTTP/1.1 404 Not Found");
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_one_connection_timing_out_does_not_affect_another() {
    let (_dir, root) = site();
    let (mut idle, idle_handle) = connect(Arc::clone(&root), Duration::from_millis(200)).await;
    let (busy, busy_handle) = connect(root, Duration::from_secs(5)).await;
    let mut busy = BufReader::new(busy);

    busy.get_mut()
        .write_all(b"GET /a.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let first = timeout(GUARD, read_response(&mut busy)).await.unwrap();
    assert_eq!(first.body, b"alpha");

    // Let the idle connection expire
    assert!(read_all(&mut idle).await.is_empty());
    timeout(GUARD, idle_handle).await.unwrap().unwrap();

    busy.get_mut()
        .write_all(b"GET /b.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let second = timeout(GUARD, read_response(&mut busy)).await.unwrap();
    assert_eq!(second.body, b"bravo!");
    assert!(!busy_handle.is_finished());
}

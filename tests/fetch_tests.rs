use gtfs_rt_arrivals::error::FeedError;
use gtfs_rt_arrivals::fetch::{BasicClient, auth::ApiKey, fetch_bytes, load_source};
use gtfs_rt_arrivals::gtfs_rt::{FeedHeader, FeedMessage};
use gtfs_rt_arrivals::parser::parse_feed;
use prost::Message;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves exactly one HTTP response, returning the raw request it received.
async fn serve_once(status_line: &'static str, body: Vec<u8>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let head = format!(
            "{status_line}\r\nContent-Type: application/x-protobuf\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.unwrap();

        String::from_utf8_lossy(&request).to_lowercase()
    });

    (format!("http://{addr}/feed"), handle)
}

fn local_client() -> BasicClient {
    BasicClient::from(reqwest::Client::builder().no_proxy().build().unwrap())
}

fn encoded_feed() -> Vec<u8> {
    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1_760_000_000),
            ..Default::default()
        },
        entity: vec![],
    }
    .encode_to_vec()
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let (url, server) = serve_once("HTTP/1.1 200 OK", encoded_feed()).await;

    let bytes = fetch_bytes(&local_client(), &url).await.unwrap();
    let feed = parse_feed(&bytes).unwrap();
    assert_eq!(feed.header.gtfs_realtime_version, "2.0");

    let request = server.await.unwrap();
    assert!(request.starts_with("get /feed http/1.1"));
    assert!(request.contains("accept: application/x-protobuf"));
    assert!(!request.contains("x-api-key"));
}

#[tokio::test]
async fn test_fetch_sends_api_key_header() {
    let (url, server) = serve_once("HTTP/1.1 200 OK", encoded_feed()).await;

    let client = ApiKey::mta(local_client(), "secret-key").unwrap();
    load_source(&client, &url).await.unwrap();

    let request = server.await.unwrap();
    assert!(request.contains("x-api-key: secret-key"));
}

#[tokio::test]
async fn test_unauthorized_without_key_is_auth_required() {
    let (url, server) = serve_once("HTTP/1.1 403 Forbidden", Vec::new()).await;

    let err = fetch_bytes(&local_client(), &url).await.unwrap_err();
    assert!(err.is_auth_required());
    assert!(matches!(err, FeedError::AuthRequired { status: 403 }));
    server.await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_with_key_is_plain_status_error() {
    let (url, server) = serve_once("HTTP/1.1 401 Unauthorized", Vec::new()).await;

    let client = ApiKey::mta(local_client(), "wrong-key").unwrap();
    let err = fetch_bytes(&client, &url).await.unwrap_err();
    assert!(matches!(err, FeedError::Status { status: 401 }));
    server.await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_status_error() {
    let (url, server) = serve_once("HTTP/1.1 503 Service Unavailable", Vec::new()).await;

    let err = fetch_bytes(&local_client(), &url).await.unwrap_err();
    assert!(matches!(err, FeedError::Status { status: 503 }));
    server.await.unwrap();
}

#[tokio::test]
async fn test_garbage_body_fails_to_decode() {
    let (url, server) = serve_once("HTTP/1.1 200 OK", b"<html>oops</html>".to_vec()).await;

    let bytes = fetch_bytes(&local_client(), &url).await.unwrap();
    let err = parse_feed(&bytes).unwrap_err();
    assert!(matches!(err, FeedError::Decode(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetch_bytes(&local_client(), &format!("http://{addr}/feed"))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Network(_)));
}

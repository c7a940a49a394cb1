#![allow(clippy::unwrap_used)]
// Integration tests for `CameraClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wundercam_api::control::cmd;
use wundercam_api::{CameraClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CameraClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = CameraClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Control endpoint ────────────────────────────────────────────────

#[tokio::test]
async fn test_command_returns_object() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/fcgi_client.cgi"))
        .and(query_param("cmd", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "SdcardplugFlag": 2,
            "capacity": 29_800
        })))
        .mount(&server)
        .await;

    let data = client.command(cmd::STORAGE_STATUS, &[]).await.unwrap();
    assert_eq!(data["SdcardplugFlag"], json!(2));
    assert_eq!(data["capacity"], json!(29_800));
}

#[tokio::test]
async fn test_command_sends_fields_as_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/fcgi_client.cgi"))
        .and(query_param("cmd", "25"))
        .and(query_param("ISO", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ISO": 3 })))
        .expect(1)
        .mount(&server)
        .await;

    let data = client
        .command(cmd::SET_ISO, &[("ISO", "3".to_owned())])
        .await
        .unwrap();
    assert_eq!(data["ISO"], json!(3));
}

#[tokio::test]
async fn test_command_rejects_non_object() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/fcgi_client.cgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let result = client.command(4, &[]).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_command_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/fcgi_client.cgi"))
        .respond_with(ResponseTemplate::new(500).set_body_string("cgi crashed"))
        .mount(&server)
        .await;

    let err = client.command(4, &[]).await.unwrap_err();
    match &err {
        Error::Http { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "cgi crashed");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_read_status_merges_every_block() {
    let (server, client) = setup().await;

    for command in cmd::STATUS_SWEEP {
        let mut block = serde_json::Map::new();
        block.insert(format!("Block{command}"), json!(command));
        Mock::given(method("GET"))
            .and(path("/fcgi_client.cgi"))
            .and(query_param("cmd", command.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::Value::Object(block)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let data = client.read_status().await.unwrap();
    assert_eq!(data.len(), cmd::STATUS_SWEEP.len());
    assert_eq!(data["Block37"], json!(37));
}

#[tokio::test]
async fn test_trigger() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/fcgi_client.cgi"))
        .and(query_param("cmd", "24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ErrorCode": 0 })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.trigger().await.unwrap();
    assert_eq!(ack["ErrorCode"], json!(0));
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let server = MockServer::start().await;
    let transport = TransportConfig::default().with_timeout(Duration::from_millis(100));
    let client = CameraClient::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let result = client.command(3, &[]).await;
    assert!(
        matches!(result, Err(Error::Timeout { .. })),
        "expected Timeout error, got: {result:?}"
    );
}

// ── File server ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_directory() {
    let (server, client) = setup().await;

    let index = r#"<html><body><pre><a href="../">../</a>
<a href="Vid_20190901_101500_001.mp4">Vid_20190901_101500_001.mp4</a>  01-Sep-2019 10:15  88123456
</pre></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/DCIM/Video/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index))
        .mount(&server)
        .await;

    let entries = client.list_directory("DCIM/Video/").await.unwrap();
    assert_eq!(entries, vec!["Vid_20190901_101500_001.mp4".to_owned()]);
}

#[tokio::test]
async fn test_list_missing_directory() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/DCIM/Image/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.list_directory("DCIM/Image/").await.unwrap_err();
    assert!(err.is_not_found(), "expected not found, got: {err:?}");
}

#[tokio::test]
async fn test_fetch_reports_content_type() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/DCIM/Image/Img_20190901_101500_001.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]),
        )
        .mount(&server)
        .await;

    let download = client
        .fetch("DCIM/Image/Img_20190901_101500_001.jpg")
        .await
        .unwrap();
    assert_eq!(download.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(download.bytes.as_ref(), &[0xFF, 0xD8, 0xFF, 0xE0]);
}

use axum::Router;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use card_relay::{RelayState, serve};
use std::net::SocketAddr;
use tokio::net::TcpListener;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png";

async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route(
            "/card.png",
            get(|| async { ([("content-type", "image/png")], PNG_BYTES).into_response() }),
        )
        .route(
            "/untyped",
            get(|| async { Response::new(Body::from(vec![1u8, 2, 3])) }),
        )
        .route("/moved", get(|| async { Redirect::temporary("/card.png") }))
        .route(
            "/gone",
            get(|| async { (StatusCode::GONE, "nothing here").into_response() }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_relay() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, RelayState::new().unwrap()));
    addr
}

async fn relay_get(relay: SocketAddr, target: Option<&str>) -> reqwest::Response {
    let mut request = reqwest::Client::new().get(format!("http://{}/img", relay));
    if let Some(target) = target {
        request = request.query(&[("url", target)]);
    }
    request.send().await.unwrap()
}

#[tokio::test]
async fn test_missing_url_is_bad_request() {
    let relay = spawn_relay().await;

    let response = relay_get(relay, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "Missing url");

    let response = relay_get(relay, Some("")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upstream_bytes_are_relayed_verbatim() {
    let upstream = spawn_upstream().await;
    let relay = spawn_relay().await;

    let response = relay_get(relay, Some(&format!("http://{}/card.png", upstream))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["content-type"], "image/png");
    assert_eq!(headers["cache-control"], "public, max-age=3600");
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(&response.bytes().await.unwrap()[..], PNG_BYTES);
}

#[tokio::test]
async fn test_missing_content_type_falls_back() {
    let upstream = spawn_upstream().await;
    let relay = spawn_relay().await;

    let response = relay_get(relay, Some(&format!("http://{}/untyped", upstream))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/octet-stream");
    assert_eq!(&response.bytes().await.unwrap()[..], &[1, 2, 3]);
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let upstream = spawn_upstream().await;
    let relay = spawn_relay().await;

    let response = relay_get(relay, Some(&format!("http://{}/moved", upstream))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&response.bytes().await.unwrap()[..], PNG_BYTES);
}

#[tokio::test]
async fn test_upstream_status_is_propagated() {
    let upstream = spawn_upstream().await;
    let relay = spawn_relay().await;

    let response = relay_get(relay, Some(&format!("http://{}/gone", upstream))).await;
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(response.text().await.unwrap(), "Upstream error");

    let response = relay_get(relay, Some(&format!("http://{}/no-route", upstream))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreachable_upstream_is_proxy_error() {
    let relay = spawn_relay().await;

    let response = relay_get(relay, Some("not a url at all")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(response.text().await.unwrap(), "Proxy error");
}

#[tokio::test]
async fn test_root_describes_the_endpoint() {
    let relay = spawn_relay().await;
    let response = reqwest::get(format!("http://{}/", relay)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("/img?url="));
}

//! Image relay
//!
//! `GET /img?url=<absolute URL>` fetches the URL server-side and streams the
//! body back unchanged, so callers that can't fetch cross-origin images
//! directly can still load them.

use axum::Router;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

/// Listen address used when none is given
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

const CACHE_POLICY: &str = "public, max-age=3600";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Clone)]
pub struct RelayState {
    client: reqwest::Client,
}

impl RelayState {
    /// Client that follows redirects
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[derive(Debug, Deserialize)]
struct ImageQuery {
    url: Option<String>,
}

/// Routes: `/` (description) and `/img`
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/img", get(relay_image))
        .layer(axum::middleware::map_response(allow_any_origin))
        .with_state(state)
}

/// Serve on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, state: RelayState) -> Result<()> {
    let addr = listener.local_addr()?;
    log::info!("Relay listening on http://{}/img?url=...", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Bind and serve
pub async fn run(bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    serve(listener, RelayState::new()?).await
}

async fn root() -> &'static str {
    "Image relay running. Use /img?url=<absolute image URL>"
}

async fn relay_image(State(state): State<RelayState>, Query(query): Query<ImageQuery>) -> Response {
    let Some(url) = query.url.filter(|url| !url.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing url").into_response();
    };

    let upstream = match state.client.get(&url).send().await {
        Ok(upstream) => upstream,
        Err(e) => {
            log::warn!("Relay fetch of {} failed: {}", url, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Proxy error").into_response();
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        log::debug!("Upstream {} answered {}", url, status);
        return (status, "Upstream error").into_response();
    }

    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));

    let mut response = Body::from_stream(upstream.bytes_stream()).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_POLICY));
    response
}

async fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

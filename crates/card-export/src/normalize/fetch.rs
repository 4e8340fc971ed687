//! Fetching raw image bytes

use crate::types::{ExportError, Result};
use bytes::Bytes;
use card_layout::ImageSource;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Per-request timeout for remote images
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads the bytes behind a URL
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Bytes>> + Send;
}

/// `reqwest`-backed fetcher; redirects are followed
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ExportError::Fetch {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes> {
        let fetch_error = |reason: String| ExportError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_error(format!("status {}", response.status())));
        }

        response.bytes().await.map_err(|e| fetch_error(e.to_string()))
    }
}

/// Relay request for a remote URL: `<relay>?url=<percent-encoded target>`
pub fn relay_url(relay: &Url, target: &str) -> Url {
    let mut url = relay.clone();
    url.query_pairs_mut().clear().append_pair("url", target);
    url
}

/// Read a source's bytes directly, without the relay
pub(crate) async fn load_direct<F: ImageFetcher>(source: &ImageSource, fetcher: &F) -> Result<Bytes> {
    match source {
        ImageSource::Local(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        ImageSource::Inline { data, .. } => Ok(data.clone()),
        ImageSource::Remote(remote) => {
            let url = Url::parse(remote).map_err(|e| ExportError::Fetch {
                url: remote.clone(),
                reason: e.to_string(),
            })?;
            fetcher.fetch(&url).await
        }
    }
}

//! Image normalization
//!
//! Every distinct image a job needs is loaded, decoded and re-encoded to
//! JPEG independently. A remote image whose direct fetch fails is fetched
//! once more through the relay. Failures are recorded per image and never
//! stop the others.

mod encode;
mod fetch;

pub use encode::{CanonicalImage, JPEG_QUALITY, to_canonical_jpeg};
pub use fetch::{FETCH_TIMEOUT, HttpFetcher, ImageFetcher, relay_url};

use crate::types::{ExportError, Result};
use card_layout::{ImageSource, SourceKey};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use url::Url;

/// Default cap on images loaded at the same time
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Relay endpoint used as the single retry for remote images
    pub relay: Option<Url>,
    pub max_in_flight: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            relay: None,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Outcome for one distinct source
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedImage {
    Ready(CanonicalImage),
    Failed(String),
}

impl NormalizedImage {
    pub fn image(&self) -> Option<&CanonicalImage> {
        match self {
            NormalizedImage::Ready(image) => Some(image),
            NormalizedImage::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, NormalizedImage::Failed(_))
    }
}

/// Normalized images keyed by source identity
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    images: HashMap<SourceKey, NormalizedImage>,
}

impl ImageSet {
    pub fn insert(&mut self, key: SourceKey, image: NormalizedImage) {
        self.images.insert(key, image);
    }

    pub fn get(&self, key: &SourceKey) -> Option<&NormalizedImage> {
        self.images.get(key)
    }

    /// The JPEG for a source, if it normalized successfully
    pub fn image(&self, key: &SourceKey) -> Option<&CanonicalImage> {
        self.images.get(key).and_then(NormalizedImage::image)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.images.values().filter(|i| i.is_failed()).count()
    }

    /// Sources that failed, sorted for stable reporting
    pub fn failed_keys(&self) -> Vec<&SourceKey> {
        let mut keys: Vec<&SourceKey> = self
            .images
            .iter()
            .filter(|(_, image)| image.is_failed())
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys
    }
}

/// Normalize each distinct source, at most `max_in_flight` at a time.
///
/// Sources sharing a key are loaded once. `on_settled(done, total)` is called
/// after each source finishes, in completion order.
pub async fn normalize_sources<F: ImageFetcher>(
    sources: &[ImageSource],
    fetcher: &F,
    options: &NormalizeOptions,
    mut on_settled: impl FnMut(usize, usize),
) -> ImageSet {
    let mut seen = std::collections::HashSet::new();
    let distinct: Vec<(SourceKey, &ImageSource)> = sources
        .iter()
        .map(|source| (source.key(), source))
        .filter(|(key, _)| seen.insert(key.clone()))
        .collect();
    let total = distinct.len();
    let relay = options.relay.as_ref();

    let mut results = stream::iter(distinct)
        .map(|(key, source)| async move {
            let outcome = match normalize_one(source, fetcher, relay).await {
                Ok(image) => NormalizedImage::Ready(image),
                Err(e) => {
                    log::warn!("Image {} failed: {}", key, e);
                    NormalizedImage::Failed(e.to_string())
                }
            };
            (key, outcome)
        })
        .buffer_unordered(options.max_in_flight.max(1));

    let mut set = ImageSet::default();
    while let Some((key, outcome)) = results.next().await {
        set.insert(key, outcome);
        on_settled(set.len(), total);
    }
    set
}

/// Load, decode and re-encode one source
pub async fn normalize_one<F: ImageFetcher>(
    source: &ImageSource,
    fetcher: &F,
    relay: Option<&Url>,
) -> Result<CanonicalImage> {
    let bytes = match fetch::load_direct(source, fetcher).await {
        Ok(bytes) => bytes,
        Err(direct_error) => match (source, relay) {
            (ImageSource::Remote(remote), Some(relay)) => {
                log::debug!("Direct fetch of {} failed ({}), retrying via relay", remote, direct_error);
                fetcher.fetch(&relay_url(relay, remote)).await?
            }
            _ => return Err(direct_error),
        },
    };

    tokio::task::spawn_blocking(move || to_canonical_jpeg(&bytes))
        .await
        .map_err(ExportError::from)?
}

use bytes::Bytes;
use card_export::normalize::{normalize_one, relay_url};
use card_export::*;
use card_layout::ImageSource;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use url::Url;

const RELAY: &str = "http://relay.test/img";

fn png(width: u32, height: u32) -> Bytes {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([30, 60, 90])));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    Bytes::from(bytes.into_inner())
}

/// Serves canned responses and records every requested URL
#[derive(Default)]
struct FakeFetcher {
    responses: HashMap<String, Bytes>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn serve(mut self, url: &str, body: Bytes) -> Self {
        self.responses.insert(url.to_string(), body);
        self
    }

    fn serve_via_relay(self, target: &str, body: Bytes) -> Self {
        let url = relay_url(&Url::parse(RELAY).unwrap(), target);
        self.serve(url.as_str(), body)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ExportError::Fetch {
                url: url.to_string(),
                reason: "status 404 Not Found".to_string(),
            })
    }
}

fn options() -> NormalizeOptions {
    NormalizeOptions {
        relay: Some(Url::parse(RELAY).unwrap()),
        max_in_flight: 2,
    }
}

fn remote(url: &str) -> ImageSource {
    ImageSource::Remote(url.to_string())
}

#[tokio::test]
async fn test_two_of_five_failing_sources_are_reported_missing() {
    let fetcher = FakeFetcher::default()
        .serve("https://a.test/1.png", png(10, 14))
        .serve("https://a.test/2.png", png(10, 14))
        .serve_via_relay("https://b.test/3.png", png(12, 12));

    let sources = vec![
        remote("https://a.test/1.png"),
        remote("https://a.test/2.png"),
        remote("https://b.test/3.png"),
        remote("https://dead.test/4.png"),
        remote("https://dead.test/5.png"),
    ];

    let mut settled = Vec::new();
    let set = normalize_sources(&sources, &fetcher, &options(), |current, total| {
        settled.push((current, total))
    })
    .await;

    assert_eq!(set.len(), 5);
    assert_eq!(set.failed_count(), 2);
    for source in &sources[..3] {
        let image = set.image(&source.key()).expect("normalized image");
        assert_eq!(&image.jpeg[..2], &[0xFF, 0xD8]);
    }
    assert_eq!(set.image(&sources[2].key()).unwrap().width_px, 12);
    assert_eq!(
        settled,
        vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]
    );
}

#[tokio::test]
async fn test_relay_is_tried_exactly_once_after_direct_failure() {
    let fetcher = FakeFetcher::default();
    let source = remote("https://dead.test/x.png");

    let result = normalize_one(&source, &fetcher, options().relay.as_ref()).await;
    assert!(matches!(result, Err(ExportError::Fetch { .. })));

    let requests = fetcher.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], "https://dead.test/x.png");
    assert!(requests[1].starts_with("http://relay.test/img?url=https%3A%2F%2Fdead.test"));
}

#[tokio::test]
async fn test_undecodable_bytes_are_not_retried() {
    let fetcher =
        FakeFetcher::default().serve("https://a.test/page.png", Bytes::from_static(b"<html>"));
    let source = remote("https://a.test/page.png");

    let result = normalize_one(&source, &fetcher, options().relay.as_ref()).await;
    assert!(matches!(result, Err(ExportError::Decode(_))));
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn test_without_relay_a_failed_fetch_is_final() {
    let fetcher = FakeFetcher::default();
    let result = normalize_one(&remote("https://dead.test/x.png"), &fetcher, None).await;
    assert!(result.is_err());
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn test_local_and_inline_sources_skip_the_network() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.png");
    tokio::fs::write(&path, png(8, 8)).await.unwrap();

    let fetcher = FakeFetcher::default();
    let sources = vec![
        ImageSource::Local(path),
        ImageSource::inline("image/png", png(6, 9)),
        ImageSource::Local(dir.path().join("missing.png")),
    ];
    let set = normalize_sources(&sources, &fetcher, &options(), |_, _| {}).await;

    assert!(fetcher.requests().is_empty());
    assert_eq!(set.failed_count(), 1);
    assert_eq!(set.failed_keys(), vec![&sources[2].key()]);
    assert_eq!(set.image(&sources[1].key()).unwrap().height_px, 9);
}

#[tokio::test]
async fn test_duplicate_sources_are_loaded_once() {
    let fetcher = FakeFetcher::default().serve("https://a.test/1.png", png(4, 4));
    let sources = vec![remote("https://a.test/1.png"), remote("https://a.test/1.png")];

    let set = normalize_sources(&sources, &fetcher, &options(), |_, _| {}).await;
    assert_eq!(set.len(), 1);
    assert_eq!(fetcher.requests().len(), 1);
}

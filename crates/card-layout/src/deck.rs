//! Deck model and quantity expansion
//!
//! A deck is an ordered list of unique cards, each with a print quantity,
//! plus an optional back image shared by every card.

use crate::options::SheetSettings;
use crate::types::*;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;

/// Raster file extensions accepted from disk
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "avif", "heic"];

/// Extensions a remote link must end with to be taken as a direct image
const REMOTE_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "avif"];

/// Where a card image comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ImageSource {
    /// A file on the local disk
    Local(PathBuf),
    /// Raw bytes held in memory (serialized as a `data:` URL)
    Inline { mime: String, data: Bytes },
    /// An `http(s)` URL
    Remote(String),
}

/// Whether the bytes are already at hand or have to be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

impl ImageSource {
    /// Parse a `src` string: data URL, http(s) URL, or file path
    pub fn parse(src: &str) -> Result<Self> {
        let src = src.trim();
        if src.is_empty() {
            return Err(LayoutError::Config("Empty image source".to_string()));
        }
        if let Some(rest) = src.strip_prefix("data:") {
            return parse_data_url(rest);
        }
        if is_http_url(src) {
            return Ok(ImageSource::Remote(src.to_string()));
        }
        Ok(ImageSource::Local(PathBuf::from(src.strip_prefix("file://").unwrap_or(src))))
    }

    pub fn inline(mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        ImageSource::Inline {
            mime: mime.into(),
            data: data.into(),
        }
    }

    pub fn origin(&self) -> Origin {
        match self {
            ImageSource::Remote(_) => Origin::Remote,
            ImageSource::Local(_) | ImageSource::Inline { .. } => Origin::Local,
        }
    }

    /// Identity used to normalize each distinct image once
    pub fn key(&self) -> SourceKey {
        match self {
            ImageSource::Local(path) => SourceKey(format!("file:{}", path.display())),
            ImageSource::Inline { data, .. } => {
                SourceKey(format!("inline:{:x}", Sha256::digest(data)))
            }
            ImageSource::Remote(url) => SourceKey(url.clone()),
        }
    }

    /// The `src` form used in deck JSON
    pub fn to_src(&self) -> String {
        match self {
            ImageSource::Local(path) => path.display().to_string(),
            ImageSource::Inline { mime, data } => {
                format!("data:{};base64,{}", mime, BASE64.encode(data))
            }
            ImageSource::Remote(url) => url.clone(),
        }
    }

    /// Short display name, used when a card has none
    pub fn display_name(&self) -> String {
        match self {
            ImageSource::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string()),
            ImageSource::Inline { .. } => "image".to_string(),
            ImageSource::Remote(url) => url
                .split('?')
                .next()
                .and_then(|path| path.rsplit('/').next())
                .filter(|name| !name.is_empty())
                .unwrap_or("image")
                .to_string(),
        }
    }
}

impl TryFrom<String> for ImageSource {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self> {
        ImageSource::parse(&value)
    }
}

impl From<ImageSource> for String {
    fn from(value: ImageSource) -> Self {
        value.to_src()
    }
}

fn parse_data_url(rest: &str) -> Result<ImageSource> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| LayoutError::Config("Malformed data URL".to_string()))?;
    let Some(mime) = meta.strip_suffix(";base64") else {
        return Err(LayoutError::Config(
            "Only base64 data URLs are supported".to_string(),
        ));
    };
    let data = BASE64
        .decode(payload.trim())
        .map_err(|e| LayoutError::Config(format!("Invalid base64 in data URL: {}", e)))?;
    let mime = if mime.is_empty() {
        "application/octet-stream"
    } else {
        mime
    };
    Ok(ImageSource::inline(mime, data))
}

fn is_http_url(src: &str) -> bool {
    let lower = src.get(..8).unwrap_or(src).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn extension_of(path: &str) -> Option<String> {
    let file = path.rsplit(['/', '\\']).next()?;
    let (_, ext) = file.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// True if the file name has a raster extension we accept
pub fn is_image_path(path: &std::path::Path) -> bool {
    path.to_str()
        .and_then(extension_of)
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// True if the link points straight at an image (query string ignored)
pub fn is_direct_image_url(url: &str) -> bool {
    let url = url.trim();
    if !is_http_url(url) {
        return false;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    extension_of(path).is_some_and(|ext| REMOTE_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Stable identity of an image source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(pub String);

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry in the working card list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "src")]
    pub source: ImageSource,
    #[serde(rename = "qty", default = "default_quantity")]
    pub quantity: i32,
    /// Numeric identifier when imported from a flat text deck
    #[serde(rename = "cardId", default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

impl Card {
    pub fn new(source: ImageSource) -> Self {
        Self {
            name: source.display_name(),
            source,
            quantity: 1,
            card_id: None,
        }
    }

    pub fn with_quantity(mut self, quantity: i32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Quantity used for printing; anything below one prints once
    pub fn print_quantity(&self) -> usize {
        self.quantity.max(1) as usize
    }

    pub fn origin(&self) -> Origin {
        self.source.origin()
    }
}

/// Cards, shared back image and settings: the unit that gets persisted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Deck {
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(rename = "backImage", default)]
    pub back_image: Option<ImageSource>,
    #[serde(default)]
    pub settings: SheetSettings,
}

impl Deck {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards,
            ..Default::default()
        }
    }

    /// Parse deck JSON (`{ cards, backImage, settings }`)
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        tokio::fs::write(path, self.to_json()?).await?;
        Ok(())
    }

    pub fn unique_cards(&self) -> usize {
        self.cards.len()
    }

    pub fn total_prints(&self) -> usize {
        self.cards.iter().map(Card::print_quantity).sum()
    }
}

/// One physical print position: a single repetition of a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintSlot {
    /// Position in the expanded front sequence
    pub sequence_index: usize,
    /// Index of the card in the deck list
    pub card_index: usize,
    /// Image drawn in this slot
    pub source: SourceKey,
}

/// Expand quantities into the flat print sequence.
///
/// Each card's repetitions are contiguous and cards keep their list order.
pub fn expand_quantities(cards: &[Card]) -> Vec<PrintSlot> {
    let mut slots = Vec::with_capacity(cards.iter().map(Card::print_quantity).sum());
    for (card_index, card) in cards.iter().enumerate() {
        let source = card.source.key();
        for _ in 0..card.print_quantity() {
            slots.push(PrintSlot {
                sequence_index: slots.len(),
                card_index,
                source: source.clone(),
            });
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(src: &str, quantity: i32) -> Card {
        Card::new(ImageSource::parse(src).unwrap()).with_quantity(quantity)
    }

    #[test]
    fn test_expand_preserves_order_and_count() {
        let cards = vec![card("a.png", 2), card("b.png", 1), card("c.png", 3)];
        let slots = expand_quantities(&cards);

        assert_eq!(slots.len(), 6);
        let order: Vec<usize> = slots.iter().map(|s| s.card_index).collect();
        assert_eq!(order, vec![0, 0, 1, 2, 2, 2]);
        let seq: Vec<usize> = slots.iter().map(|s| s.sequence_index).collect();
        assert_eq!(seq, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_expand_clamps_non_positive_quantity() {
        let cards = vec![card("a.png", 0), card("b.png", -4)];
        let slots = expand_quantities(&cards);
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            ImageSource::parse("https://example.com/x.jpg").unwrap(),
            ImageSource::Remote("https://example.com/x.jpg".to_string())
        );
        assert_eq!(
            ImageSource::parse("cards/x.png").unwrap(),
            ImageSource::Local(PathBuf::from("cards/x.png"))
        );

        let inline = ImageSource::parse("data:image/png;base64,AAEC").unwrap();
        match &inline {
            ImageSource::Inline { mime, data } => {
                assert_eq!(mime, "image/png");
                assert_eq!(&data[..], &[0, 1, 2]);
            }
            other => panic!("Expected inline source, got {:?}", other),
        }
        assert_eq!(inline.to_src(), "data:image/png;base64,AAEC");
        assert!(ImageSource::parse("data:text/plain,hello").is_err());
    }

    #[test]
    fn test_source_keys_distinguish_content() {
        let a = ImageSource::inline("image/png", vec![1u8, 2, 3]);
        let b = ImageSource::inline("image/png", vec![1u8, 2, 4]);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), a.clone().key());
        assert_eq!(a.origin(), Origin::Local);
        assert_eq!(
            ImageSource::Remote("https://x/y.png".into()).origin(),
            Origin::Remote
        );
    }

    #[test]
    fn test_direct_image_url_rule() {
        assert!(is_direct_image_url("https://example.com/card.JPG?size=big"));
        assert!(is_direct_image_url("http://example.com/a/b.webp"));
        assert!(!is_direct_image_url("https://example.com/page.html"));
        assert!(!is_direct_image_url("ftp://example.com/card.png"));
        assert!(is_image_path(std::path::Path::new("dir/card.heic")));
        assert!(!is_image_path(std::path::Path::new("dir/deck.ydk")));
    }

    #[test]
    fn test_deck_json_uses_src_and_qty() {
        let mut deck = Deck::new(vec![card("https://example.com/1.jpg", 3)]);
        deck.cards[0].card_id = Some("1".to_string());
        let json = deck.to_json().unwrap();
        assert!(json.contains("\"src\": \"https://example.com/1.jpg\""));
        assert!(json.contains("\"qty\": 3"));
        assert!(json.contains("\"cardId\": \"1\""));

        let parsed = Deck::from_json(&json).unwrap();
        assert_eq!(parsed, deck);
    }

    #[test]
    fn test_display_name_from_url() {
        let source = ImageSource::parse("https://example.com/cards/abc.png?x=1").unwrap();
        assert_eq!(source.display_name(), "abc.png");
    }
}

//! Flat text deck interchange
//!
//! The format is one numeric card id per line, with `#`-prefixed section
//! headers and comments and `!`-prefixed markers. Repeated ids are copies.

use crate::constants::{YDK_HEADER, YDK_IMAGE_URL_BASE};
use crate::deck::{Card, ImageSource};
use crate::types::{LayoutError, Result};
use std::collections::HashMap;

/// One distinct id and how many times it appears
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YdkEntry {
    pub id: String,
    pub quantity: usize,
}

/// Parse deck text into distinct ids in first-seen order.
///
/// Blank lines, `#` and `!` lines and anything that isn't purely digits are
/// ignored. Sections are not distinguished.
pub fn parse_ydk(text: &str) -> Vec<YdkEntry> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if !line.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let count = counts.entry(line).or_insert_with(|| {
            order.push(line);
            0
        });
        *count += 1;
    }

    order
        .into_iter()
        .map(|id| YdkEntry {
            id: id.to_string(),
            quantity: counts.get(id).copied().unwrap_or(1),
        })
        .collect()
}

/// Remote image for a card id
pub fn ydk_image_url(id: &str) -> String {
    format!("{}{}.jpg", YDK_IMAGE_URL_BASE, id)
}

/// Cards for every entry, pointing at the remote image for each id
pub fn cards_from_ydk(text: &str) -> Vec<Card> {
    parse_ydk(text)
        .into_iter()
        .map(|entry| Card {
            name: format!("ID {}", entry.id),
            source: ImageSource::Remote(ydk_image_url(&entry.id)),
            quantity: entry.quantity as i32,
            card_id: Some(entry.id),
        })
        .collect()
}

/// Serialize the cards that carry an id.
///
/// Each copy gets its own line. Fails when no card has an id.
pub fn serialize_ydk(cards: &[Card]) -> Result<String> {
    let with_ids: Vec<(&str, usize)> = cards
        .iter()
        .filter_map(|card| card.card_id.as_deref().map(|id| (id, card.print_quantity())))
        .collect();

    if with_ids.is_empty() {
        return Err(LayoutError::Config(
            "No cards with an id to export".to_string(),
        ));
    }

    let mut lines = vec![YDK_HEADER.to_string(), "#main".to_string()];
    for (id, quantity) in with_ids {
        lines.extend(std::iter::repeat_n(id.to_string(), quantity));
    }
    lines.push("#extra".to_string());
    lines.push("!side".to_string());

    Ok(lines.join("\n"))
}

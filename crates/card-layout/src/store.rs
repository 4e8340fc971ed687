//! File-backed deck store
//!
//! Named decks are kept as one JSON file each inside a directory. The deck
//! name is stored in the file, the file name is a sanitized form of it.

use crate::deck::{Card, Deck};
use crate::types::{LayoutError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A deck as persisted by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDeck {
    pub name: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub deck: Deck,
}

/// Listing entry
#[derive(Debug, Clone, PartialEq)]
pub struct DeckSummary {
    pub name: String,
    pub updated_at: DateTime<Utc>,
    pub unique_cards: usize,
    pub total_prints: usize,
}

/// Directory of saved decks
#[derive(Debug, Clone)]
pub struct DeckStore {
    root: PathBuf,
}

impl DeckStore {
    /// Open a store, creating its directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(name)))
    }

    async fn read(&self, name: &str) -> Result<Option<StoredDeck>> {
        let path = self.path_for(name);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        let bytes = tokio::fs::read(&path).await?;
        let stored: StoredDeck = serde_json::from_slice(&bytes)?;
        Ok(Some(stored))
    }

    async fn write(&self, stored: &StoredDeck) -> Result<()> {
        let json = serde_json::to_string_pretty(stored)?;
        tokio::fs::write(self.path_for(&stored.name), json).await?;
        Ok(())
    }

    /// Create or overwrite a deck
    pub async fn save(&self, name: &str, deck: &Deck) -> Result<()> {
        let name = validate_name(name)?;
        let stored = StoredDeck {
            name: name.to_string(),
            updated_at: Utc::now(),
            deck: deck.clone(),
        };
        self.write(&stored).await?;
        log::debug!("Saved deck {:?} ({} cards)", name, deck.cards.len());
        Ok(())
    }

    pub async fn load(&self, name: &str) -> Result<Deck> {
        self.read(name)
            .await?
            .map(|stored| stored.deck)
            .ok_or_else(|| LayoutError::DeckNotFound(name.to_string()))
    }

    /// All decks, most recently updated first.
    ///
    /// Files that can't be parsed are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<DeckSummary>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut decks = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<StoredDeck>(&bytes) {
                Ok(stored) => decks.push(DeckSummary {
                    unique_cards: stored.deck.unique_cards(),
                    total_prints: stored.deck.total_prints(),
                    name: stored.name,
                    updated_at: stored.updated_at,
                }),
                Err(e) => log::warn!("Skipping unreadable deck file {}: {}", path.display(), e),
            }
        }

        decks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(decks)
    }

    /// Rename a deck, refusing to overwrite an existing one
    pub async fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        let new_name = validate_name(new_name)?;
        let mut stored = self
            .read(old_name)
            .await?
            .ok_or_else(|| LayoutError::DeckNotFound(old_name.to_string()))?;
        if old_name == new_name {
            return Ok(());
        }
        if self.read(new_name).await?.is_some() {
            return Err(LayoutError::DeckExists(new_name.to_string()));
        }

        stored.name = new_name.to_string();
        stored.updated_at = Utc::now();
        self.write(&stored).await?;

        let old_path = self.path_for(old_name);
        if old_path != self.path_for(new_name) {
            tokio::fs::remove_file(old_path).await?;
        }
        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        if !tokio::fs::try_exists(&path).await? {
            return Err(LayoutError::DeckNotFound(name.to_string()));
        }
        tokio::fs::remove_file(path).await?;
        Ok(())
    }

    /// Append the cards whose source isn't in the stored deck yet.
    ///
    /// The stored back image and settings win; the incoming back image is
    /// only used when the stored deck has none. Returns how many cards were
    /// added, and leaves the file untouched when that is zero.
    pub async fn merge(&self, name: &str, incoming: &Deck) -> Result<usize> {
        let mut stored = self
            .read(name)
            .await?
            .ok_or_else(|| LayoutError::DeckNotFound(name.to_string()))?;

        let additions = new_cards(&stored.deck.cards, &incoming.cards);
        if additions.is_empty() {
            return Ok(0);
        }
        let added = additions.len();

        stored.deck.cards.extend(additions);
        if stored.deck.back_image.is_none() {
            stored.deck.back_image = incoming.back_image.clone();
        }
        stored.updated_at = Utc::now();
        self.write(&stored).await?;

        log::debug!("Merged {} new cards into deck {:?}", added, name);
        Ok(added)
    }
}

fn new_cards(existing: &[Card], incoming: &[Card]) -> Vec<Card> {
    let mut known: HashSet<_> = existing.iter().map(|c| c.source.key()).collect();
    incoming
        .iter()
        .filter(|c| known.insert(c.source.key()))
        .cloned()
        .collect()
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LayoutError::Config("Deck name must not be empty".to_string()));
    }
    Ok(name)
}

/// File-system safe stem for a deck name
fn file_stem(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_strips_separators() {
        assert_eq!(file_stem(" my/deck:v2 "), "my_deck_v2");
        assert_eq!(file_stem("Blue Eyes"), "Blue Eyes");
    }
}

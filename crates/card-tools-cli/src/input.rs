//! Building a working deck from command-line inputs

use anyhow::{Context, Result, bail};
use card_layout::{
    Card, Deck, DeckEditor, EditCommand, ImageSource, cards_from_ydk, is_direct_image_url,
    is_image_path,
};
use std::path::{Path, PathBuf};

/// Collect cards from every input, in order.
///
/// * `.json` - deck file; the first one also supplies back image and settings
/// * `.ydk` - flat text deck
/// * directory - every image file inside, sorted by name
/// * anything else - a single image file
pub async fn load_deck(inputs: &[PathBuf], urls: &[String]) -> Result<Deck> {
    let mut editor = DeckEditor::default();
    let mut base_taken = false;

    for input in inputs {
        let extension = input
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => {
                let mut deck = Deck::load(input)
                    .await
                    .with_context(|| format!("Failed to read deck {}", input.display()))?;
                if base_taken {
                    editor.apply(EditCommand::AddCards(deck.cards))?;
                } else {
                    let mut cards = editor.cards().to_vec();
                    cards.append(&mut deck.cards);
                    deck.cards = cards;
                    editor.apply(EditCommand::Replace(deck))?;
                    base_taken = true;
                }
            }
            Some("ydk") => {
                let text = tokio::fs::read_to_string(input)
                    .await
                    .with_context(|| format!("Failed to read {}", input.display()))?;
                editor.apply(EditCommand::AddCards(cards_from_ydk(&text)))?;
            }
            _ if input.is_dir() => {
                editor.apply(EditCommand::AddCards(image_cards_in(input).await?))?;
            }
            _ if is_image_path(input) => {
                editor.apply(EditCommand::AddCards(vec![Card::new(ImageSource::Local(
                    input.clone(),
                ))]))?;
            }
            _ => bail!("Unsupported input: {}", input.display()),
        }
    }

    for url in urls {
        if !is_direct_image_url(url) {
            log::warn!("Skipping {}: not a direct image link", url);
            continue;
        }
        editor.apply(EditCommand::AddCards(vec![Card::new(ImageSource::Remote(
            url.trim().to_string(),
        ))]))?;
    }

    Ok(editor.into_deck())
}

async fn image_cards_in(dir: &Path) -> Result<Vec<Card>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_image_path(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths
        .into_iter()
        .map(|path| Card::new(ImageSource::Local(path)))
        .collect())
}

/// Parse `--back`: a URL or a path
pub fn parse_back(value: &str) -> Result<ImageSource> {
    Ok(ImageSource::parse(value)?)
}

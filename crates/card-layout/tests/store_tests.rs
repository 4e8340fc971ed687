use card_layout::*;
use std::time::Duration;
use tempfile::tempdir;

fn card(src: &str) -> Card {
    Card::new(ImageSource::parse(src).unwrap())
}

fn deck(srcs: &[&str]) -> Deck {
    Deck::new(srcs.iter().map(|s| card(s)).collect())
}

#[tokio::test]
async fn test_save_load_and_list_order() {
    let dir = tempdir().unwrap();
    let store = DeckStore::open(dir.path().join("decks")).await.unwrap();

    store.save("first", &deck(&["a.png"])).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    store.save("second", &deck(&["b.png", "c.png"])).await.unwrap();

    let loaded = store.load("second").await.unwrap();
    assert_eq!(loaded.cards.len(), 2);

    let list = store.list().await.unwrap();
    let names: Vec<&str> = list.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["second", "first"]);
    assert_eq!(list[0].unique_cards, 2);

    // Saving again moves a deck to the top
    tokio::time::sleep(Duration::from_millis(10)).await;
    store.save("first", &deck(&["a.png", "d.png"])).await.unwrap();
    let list = store.list().await.unwrap();
    assert_eq!(list[0].name, "first");
    assert_eq!(list[0].total_prints, 2);
}

#[tokio::test]
async fn test_missing_deck_errors() {
    let dir = tempdir().unwrap();
    let store = DeckStore::open(dir.path()).await.unwrap();

    assert!(matches!(
        store.load("nope").await,
        Err(LayoutError::DeckNotFound(_))
    ));
    assert!(matches!(
        store.delete("nope").await,
        Err(LayoutError::DeckNotFound(_))
    ));
    assert!(matches!(
        store.rename("nope", "other").await,
        Err(LayoutError::DeckNotFound(_))
    ));
    assert!(matches!(
        store.merge("nope", &deck(&["a.png"])).await,
        Err(LayoutError::DeckNotFound(_))
    ));
    assert!(matches!(
        store.save("  ", &deck(&[])).await,
        Err(LayoutError::Config(_))
    ));
}

#[tokio::test]
async fn test_rename_and_delete() {
    let dir = tempdir().unwrap();
    let store = DeckStore::open(dir.path()).await.unwrap();
    store.save("old", &deck(&["a.png"])).await.unwrap();
    store.save("taken", &deck(&["b.png"])).await.unwrap();

    assert!(matches!(
        store.rename("old", "taken").await,
        Err(LayoutError::DeckExists(_))
    ));

    store.rename("old", "new").await.unwrap();
    assert!(store.load("old").await.is_err());
    assert_eq!(store.load("new").await.unwrap().cards.len(), 1);

    store.delete("new").await.unwrap();
    let names: Vec<String> = store.list().await.unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["taken".to_string()]);
}

#[tokio::test]
async fn test_merge_appends_only_new_sources() {
    let dir = tempdir().unwrap();
    let store = DeckStore::open(dir.path()).await.unwrap();

    let mut stored = deck(&["a.png", "b.png"]);
    stored.settings.margin_mm = 8.0;
    store.save("main", &stored).await.unwrap();

    let mut incoming = deck(&["b.png", "c.png", "d.png", "c.png"]);
    incoming.back_image = Some(ImageSource::parse("back.png").unwrap());
    incoming.settings.margin_mm = 1.0;

    let added = store.merge("main", &incoming).await.unwrap();
    assert_eq!(added, 2);

    let merged = store.load("main").await.unwrap();
    let srcs: Vec<String> = merged.cards.iter().map(|c| c.source.to_src()).collect();
    assert_eq!(srcs, vec!["a.png", "b.png", "c.png", "d.png"]);
    // Back image taken because the stored deck had none; settings kept
    assert_eq!(merged.back_image, incoming.back_image);
    assert_eq!(merged.settings.margin_mm, 8.0);

    assert_eq!(store.merge("main", &incoming).await.unwrap(), 0);
}

#[tokio::test]
async fn test_deck_json_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("deck.json");

    let mut original = deck(&["https://example.com/1.jpg", "local/2.png"]);
    original.cards[0].quantity = 3;
    original.back_image = Some(ImageSource::inline("image/png", vec![1u8, 2, 3]));
    original.save(&path).await.unwrap();

    let loaded = Deck::load(&path).await.unwrap();
    assert_eq!(loaded, original);
}

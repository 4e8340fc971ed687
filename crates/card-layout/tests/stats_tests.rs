use card_layout::*;

fn deck_with(quantities: &[i32]) -> Deck {
    Deck::new(
        quantities
            .iter()
            .enumerate()
            .map(|(i, q)| {
                Card::new(ImageSource::parse(&format!("card{}.png", i)).unwrap()).with_quantity(*q)
            })
            .collect(),
    )
}

#[test]
fn test_stats_front_only() {
    let deck = deck_with(&[3, 3, 3, 3, 3, 3, 3]);
    let stats = calculate_statistics(&deck).unwrap();

    assert_eq!(stats.unique_cards, 7);
    assert_eq!(stats.total_prints, 21);
    assert_eq!(stats.slots_per_page, 9);
    assert_eq!(stats.front_pages, 3);
    assert_eq!(stats.back_pages, 0);
    assert_eq!(stats.empty_cells_last_page, 6);
}

#[test]
fn test_stats_front_back_needs_back_image() {
    let mut deck = deck_with(&[9, 1]);
    deck.settings.side_mode = SideMode::FrontBack;

    let stats = calculate_statistics(&deck).unwrap();
    assert_eq!(stats.front_pages, 2);
    assert_eq!(stats.back_pages, 0);

    deck.back_image = Some(ImageSource::parse("back.png").unwrap());
    let stats = calculate_statistics(&deck).unwrap();
    assert_eq!(stats.back_pages, 2);
    assert_eq!(stats.empty_cells_last_page, 8);
}

#[test]
fn test_stats_back_only() {
    let mut deck = deck_with(&[4]);
    deck.settings.side_mode = SideMode::BackOnly;
    deck.back_image = Some(ImageSource::parse("back.png").unwrap());

    let stats = calculate_statistics(&deck).unwrap();
    assert_eq!(stats.front_pages, 0);
    assert_eq!(stats.back_pages, 1);
}

#[test]
fn test_stats_empty_deck() {
    let stats = calculate_statistics(&Deck::default()).unwrap();
    assert_eq!(stats.total_prints, 0);
    assert_eq!(stats.front_pages, 0);
    assert_eq!(stats.empty_cells_last_page, 0);
}

#[test]
fn test_stats_reduced_rows_without_auto_fit() {
    let mut deck = deck_with(&[9]);
    deck.settings.orientation = Orientation::Landscape;
    deck.settings.auto_fit = false;

    let stats = calculate_statistics(&deck).unwrap();
    assert_eq!(stats.slots_per_page, 6);
    assert_eq!(stats.front_pages, 2);
    assert_eq!(stats.empty_cells_last_page, 3);
}

#[test]
fn test_stats_reject_unprintable_geometry() {
    let mut deck = deck_with(&[1]);
    deck.settings.auto_fit = false;
    deck.settings.gap_mm = 10.0;

    assert!(matches!(
        calculate_statistics(&deck),
        Err(LayoutError::Geometry(GeometryError::GridTooWide { .. }))
    ));
}

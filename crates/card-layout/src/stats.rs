use crate::deck::Deck;
use crate::types::*;

/// Calculate the counters for a deck with its own settings.
///
/// An empty deck gives all-zero page counts. Geometry that can't be printed
/// is reported as an error.
pub fn calculate_statistics(deck: &Deck) -> Result<DeckStatistics> {
    let settings = deck.settings.clone().normalized();
    settings.validate()?;

    let geometry = settings.resolve_geometry();
    geometry.check()?;

    let slots_per_page = geometry.slots_per_page();
    let total_prints = deck.total_prints();
    let pages = total_prints.div_ceil(slots_per_page);

    let front_pages = if settings.side_mode.prints_fronts() {
        pages
    } else {
        0
    };
    let back_pages = if settings.side_mode.prints_backs() && deck.back_image.is_some() {
        pages
    } else {
        0
    };

    let empty_cells_last_page = if total_prints == 0 {
        0
    } else {
        (slots_per_page - total_prints % slots_per_page) % slots_per_page
    };

    Ok(DeckStatistics {
        unique_cards: deck.unique_cards(),
        total_prints,
        slots_per_page,
        front_pages,
        back_pages,
        empty_cells_last_page,
    })
}

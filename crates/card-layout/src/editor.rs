//! Undoable editing of the working deck
//!
//! Every edit goes through [`DeckEditor::apply`], which records what is
//! needed to reverse it. [`DeckEditor::undo`] reverses the latest edit.

use crate::deck::{Card, Deck, ImageSource};
use crate::options::SheetSettings;
use crate::types::{LayoutError, Result};

/// Edits kept for undo; the oldest are dropped past this
pub const HISTORY_LIMIT: usize = 100;

/// A change to the working deck
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Append cards at the end of the list
    AddCards(Vec<Card>),
    Remove(usize),
    /// Set a quantity; values below one become one
    SetQuantity { index: usize, quantity: i32 },
    Increment(usize),
    /// Lower a quantity, never below one
    Decrement(usize),
    /// Move a card to a new position, shifting the others
    Move { from: usize, to: usize },
    SetBackImage(Option<ImageSource>),
    /// Remove every card
    Clear,
    /// Replace cards, back image and settings with an imported deck
    Replace(Deck),
}

/// How to reverse one applied command
#[derive(Debug, Clone)]
enum Inverse {
    Truncate(usize),
    Insert(usize, Card),
    Quantity(usize, i32),
    Move { from: usize, to: usize },
    BackImage(Option<ImageSource>),
    Cards(Vec<Card>),
    Deck(Box<Deck>),
}

/// The working deck with an undo stack
#[derive(Debug, Clone, Default)]
pub struct DeckEditor {
    deck: Deck,
    history: Vec<Inverse>,
}

impl DeckEditor {
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            history: Vec::new(),
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn into_deck(self) -> Deck {
        self.deck
    }

    pub fn cards(&self) -> &[Card] {
        &self.deck.cards
    }

    /// Settings are not part of the undo history
    pub fn settings_mut(&mut self) -> &mut SheetSettings {
        &mut self.deck.settings
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Apply a command and remember its inverse
    pub fn apply(&mut self, command: EditCommand) -> Result<()> {
        let inverse = self.execute(command)?;
        if let Some(inverse) = inverse {
            if self.history.len() == HISTORY_LIMIT {
                self.history.remove(0);
            }
            self.history.push(inverse);
        }
        Ok(())
    }

    /// Reverse the latest command
    pub fn undo(&mut self) -> Result<()> {
        let inverse = self.history.pop().ok_or(LayoutError::NothingToUndo)?;
        let cards = &mut self.deck.cards;
        match inverse {
            Inverse::Truncate(len) => cards.truncate(len),
            Inverse::Insert(index, card) => cards.insert(index.min(cards.len()), card),
            Inverse::Quantity(index, quantity) => {
                if let Some(card) = cards.get_mut(index) {
                    card.quantity = quantity;
                }
            }
            Inverse::Move { from, to } => {
                if from < cards.len() && to < cards.len() {
                    let card = cards.remove(from);
                    cards.insert(to, card);
                }
            }
            Inverse::BackImage(back) => self.deck.back_image = back,
            Inverse::Cards(previous) => *cards = previous,
            Inverse::Deck(previous) => self.deck = *previous,
        }
        Ok(())
    }

    /// Run a command. Returns `None` when nothing changed.
    fn execute(&mut self, command: EditCommand) -> Result<Option<Inverse>> {
        let len = self.deck.cards.len();
        let inverse = match command {
            EditCommand::AddCards(new_cards) => {
                if new_cards.is_empty() {
                    return Ok(None);
                }
                self.deck.cards.extend(new_cards);
                Inverse::Truncate(len)
            }
            EditCommand::Remove(index) => {
                self.check_index(index)?;
                let card = self.deck.cards.remove(index);
                Inverse::Insert(index, card)
            }
            EditCommand::SetQuantity { index, quantity } => {
                return self.change_quantity(index, |_| quantity.max(1));
            }
            EditCommand::Increment(index) => {
                return self.change_quantity(index, |q| q.max(1).saturating_add(1));
            }
            EditCommand::Decrement(index) => {
                return self.change_quantity(index, |q| (q - 1).max(1));
            }
            EditCommand::Move { from, to } => {
                self.check_index(from)?;
                self.check_index(to)?;
                if from == to {
                    return Ok(None);
                }
                let card = self.deck.cards.remove(from);
                self.deck.cards.insert(to, card);
                Inverse::Move { from: to, to: from }
            }
            EditCommand::SetBackImage(back) => {
                if back == self.deck.back_image {
                    return Ok(None);
                }
                Inverse::BackImage(std::mem::replace(&mut self.deck.back_image, back))
            }
            EditCommand::Clear => {
                if self.deck.cards.is_empty() {
                    return Ok(None);
                }
                Inverse::Cards(std::mem::take(&mut self.deck.cards))
            }
            EditCommand::Replace(deck) => {
                Inverse::Deck(Box::new(std::mem::replace(&mut self.deck, deck)))
            }
        };
        Ok(Some(inverse))
    }

    fn change_quantity(
        &mut self,
        index: usize,
        update: impl FnOnce(i32) -> i32,
    ) -> Result<Option<Inverse>> {
        self.check_index(index)?;
        let card = &mut self.deck.cards[index];
        let previous = card.quantity;
        let next = update(previous);
        if next == previous {
            return Ok(None);
        }
        card.quantity = next;
        Ok(Some(Inverse::Quantity(index, previous)))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.deck.cards.len() {
            Ok(())
        } else {
            Err(LayoutError::IndexOutOfRange(index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(name: &str) -> Card {
        Card::new(ImageSource::parse(&format!("{}.png", name)).unwrap())
    }

    fn names(editor: &DeckEditor) -> Vec<String> {
        editor.cards().iter().map(|c| c.name.clone()).collect()
    }

    fn editor() -> DeckEditor {
        let mut editor = DeckEditor::default();
        editor
            .apply(EditCommand::AddCards(vec![card("a"), card("b"), card("c")]))
            .unwrap();
        editor
    }

    #[test]
    fn test_add_and_undo() {
        let mut editor = editor();
        assert_eq!(names(&editor), vec!["a.png", "b.png", "c.png"]);
        editor.undo().unwrap();
        assert!(editor.cards().is_empty());
        assert!(matches!(editor.undo(), Err(LayoutError::NothingToUndo)));
    }

    #[test]
    fn test_remove_restores_position() {
        let mut editor = editor();
        editor.apply(EditCommand::Remove(1)).unwrap();
        assert_eq!(names(&editor), vec!["a.png", "c.png"]);
        editor.undo().unwrap();
        assert_eq!(names(&editor), vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_quantity_edits_are_clamped() {
        let mut editor = editor();
        editor
            .apply(EditCommand::SetQuantity {
                index: 0,
                quantity: -3,
            })
            .unwrap();
        assert_eq!(editor.cards()[0].quantity, 1);

        editor.apply(EditCommand::Decrement(0)).unwrap();
        assert_eq!(editor.cards()[0].quantity, 1);
        // No change, nothing recorded
        assert_eq!(editor.history_len(), 1);

        editor.apply(EditCommand::Increment(0)).unwrap();
        editor.apply(EditCommand::Increment(0)).unwrap();
        assert_eq!(editor.cards()[0].quantity, 3);
        editor.apply(EditCommand::Decrement(0)).unwrap();
        assert_eq!(editor.cards()[0].quantity, 2);

        editor.undo().unwrap();
        assert_eq!(editor.cards()[0].quantity, 3);
    }

    #[test]
    fn test_move_and_undo() {
        let mut editor = editor();
        editor.apply(EditCommand::Move { from: 0, to: 2 }).unwrap();
        assert_eq!(names(&editor), vec!["b.png", "c.png", "a.png"]);
        editor.undo().unwrap();
        assert_eq!(names(&editor), vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut editor = editor();
        assert!(matches!(
            editor.apply(EditCommand::Remove(7)),
            Err(LayoutError::IndexOutOfRange(7))
        ));
        assert_eq!(editor.history_len(), 1);
    }

    #[test]
    fn test_clear_back_image_and_replace() {
        let mut editor = editor();
        let back = ImageSource::parse("back.png").unwrap();
        editor
            .apply(EditCommand::SetBackImage(Some(back.clone())))
            .unwrap();
        editor.apply(EditCommand::Clear).unwrap();
        assert!(editor.cards().is_empty());

        let imported = Deck::new(vec![card("z")]);
        editor.apply(EditCommand::Replace(imported.clone())).unwrap();
        assert_eq!(editor.deck(), &imported);

        editor.undo().unwrap();
        assert_eq!(editor.deck().back_image, Some(back));
        editor.undo().unwrap();
        assert_eq!(editor.cards().len(), 3);
        editor.undo().unwrap();
        assert_eq!(editor.deck().back_image, None);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut editor = DeckEditor::default();
        for i in 0..HISTORY_LIMIT + 5 {
            editor
                .apply(EditCommand::AddCards(vec![card(&i.to_string())]))
                .unwrap();
        }
        assert_eq!(editor.history_len(), HISTORY_LIMIT);
    }
}

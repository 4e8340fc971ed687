pub mod constants;
mod deck;
mod editor;
pub mod layout;
pub mod marks;
mod options;
mod stats;
mod store;
mod types;
mod ydk;

pub use deck::*;
pub use editor::{DeckEditor, EditCommand, HISTORY_LIMIT};
pub use layout::{
    GeometryRequest, MmRect, Placement, ResolvedGeometry, SheetPlan, duplex_order, plan_sheet,
    resolve_geometry,
};
pub use options::*;
pub use stats::calculate_statistics;
pub use store::{DeckStore, DeckSummary, StoredDeck};
pub use types::*;
pub use ydk::{YdkEntry, cards_from_ydk, parse_ydk, serialize_ydk, ydk_image_url};

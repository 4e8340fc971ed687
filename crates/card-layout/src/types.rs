use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("No cards to print")]
    EmptyDeck,
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
    #[error("Card index {0} is out of range")]
    IndexOutOfRange(usize),
    #[error("Deck not found: {0}")]
    DeckNotFound(String),
    #[error("Deck already exists: {0}")]
    DeckExists(String),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Geometry that can't be placed on the page without clipping
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error(
        "card box {box_width_mm:.1}x{box_height_mm:.1} mm does not fit a \
         {page_width_mm:.1}x{page_height_mm:.1} mm page with {margin_mm:.1} mm margins"
    )]
    CardExceedsPage {
        box_width_mm: f32,
        box_height_mm: f32,
        page_width_mm: f32,
        page_height_mm: f32,
        margin_mm: f32,
    },
    #[error("{cols} columns need {needed_mm:.1} mm but the page is only {page_width_mm:.1} mm wide")]
    GridTooWide {
        cols: usize,
        needed_mm: f32,
        page_width_mm: f32,
    },
    #[error("{0} must be positive")]
    NonPositiveDimension(&'static str),
}

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Supported sheet sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Portrait dimensions in millimeters
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
        }
    }

    /// Dimensions with orientation applied
    pub fn dimensions_with_orientation(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// Which edge the sheet is turned over between the front and back pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipMode {
    /// Backs are printed in front order
    #[default]
    None,
    /// Top-to-bottom flip: each row is mirrored left-to-right
    Short,
    /// Left-to-right flip: the whole page block is reversed
    Long,
}

/// Crop mark style drawn around each printed card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMarks {
    None,
    /// Short ticks at each corner
    #[default]
    Short,
    /// Full outline of the card box
    Full,
}

impl CropMarks {
    pub fn enabled(self) -> bool {
        self != CropMarks::None
    }
}

/// Which sides of the cards are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SideMode {
    #[default]
    FrontOnly,
    BackOnly,
    FrontBack,
}

impl SideMode {
    pub fn prints_fronts(self) -> bool {
        matches!(self, SideMode::FrontOnly | SideMode::FrontBack)
    }

    pub fn prints_backs(self) -> bool {
        matches!(self, SideMode::BackOnly | SideMode::FrontBack)
    }
}

/// Physical side of the printed sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetSide {
    Front,
    Back,
}

/// Card size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardPreset {
    /// Standard trading card, 63 x 88 mm
    #[default]
    #[serde(rename = "63x88")]
    Standard,
    /// Small (Japanese) size, 59 x 86 mm
    #[serde(rename = "59x86")]
    Small,
    #[serde(rename = "custom")]
    Custom,
}

impl CardPreset {
    /// Preset size, or `None` for custom sizes
    pub fn dimensions_mm(self) -> Option<(f32, f32)> {
        match self {
            CardPreset::Standard => Some((63.0, 88.0)),
            CardPreset::Small => Some((59.0, 86.0)),
            CardPreset::Custom => None,
        }
    }
}

/// Counts shown alongside a working deck
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckStatistics {
    /// Distinct entries in the card list
    pub unique_cards: usize,
    /// Sum of all quantities
    pub total_prints: usize,
    /// Cells available per printed page
    pub slots_per_page: usize,
    /// Pages holding card fronts
    pub front_pages: usize,
    /// Pages holding card backs
    pub back_pages: usize,
    /// Unused cells on the last page of each side
    pub empty_cells_last_page: usize,
}

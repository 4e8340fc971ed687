//! Layout data types
//!
//! All coordinates are millimeters with the origin at the top-left corner
//! of the page, y growing downward. Backends convert to their own units.

use crate::deck::{PrintSlot, SourceKey};
use crate::types::{CropMarks, Orientation, PageSize, SheetSide};

/// Inputs to the geometry resolver
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRequest {
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub margin_mm: f32,
    pub gap_mm: f32,
    pub bleed_mm: f32,
    /// Nominal card width, before bleed
    pub card_width_mm: f32,
    /// Nominal card height, before bleed
    pub card_height_mm: f32,
    pub cols: usize,
    pub rows: usize,
    pub auto_fit: bool,
}

/// Page and card box dimensions after bleed and auto-fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGeometry {
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub gap_mm: f32,
    /// Card box width including bleed, after scaling
    pub card_width_mm: f32,
    /// Card box height including bleed, after scaling
    pub card_height_mm: f32,
    pub cols: usize,
    pub rows: usize,
    /// Uniform scale applied to the card box (never above 1)
    pub scale: f32,
}

/// A rectangle in millimeters (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MmRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl MmRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// One grid cell on one page
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub page_index: usize,
    pub row: usize,
    pub col: usize,
    pub x_mm: f32,
    pub y_mm: f32,
    /// The slot printed here, `None` for an empty trailing cell
    pub slot: Option<PrintSlot>,
    /// Crop marks to draw around this cell's box
    pub crop_marks: CropMarks,
}

impl Placement {
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

/// Backend-agnostic description of every page for one side of a job
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    pub side: SheetSide,
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub gap_mm: f32,
    pub card_width_mm: f32,
    pub card_height_mm: f32,
    pub cols: usize,
    /// Rows actually laid out per page
    pub rows: usize,
    pub page_count: usize,
    /// Row-major placements, page by page
    pub placements: Vec<Placement>,
}

impl SheetPlan {
    /// Box of a placement
    pub fn card_rect(&self, placement: &Placement) -> MmRect {
        MmRect::new(
            placement.x_mm,
            placement.y_mm,
            self.card_width_mm,
            self.card_height_mm,
        )
    }

    /// Placements that belong to one page
    pub fn page(&self, page_index: usize) -> impl Iterator<Item = &Placement> {
        self.placements
            .iter()
            .filter(move |p| p.page_index == page_index)
    }

    /// Number of filled cells on each page
    pub fn filled_per_page(&self) -> Vec<usize> {
        let mut counts = vec![0; self.page_count];
        for placement in self.placements.iter().filter(|p| !p.is_empty()) {
            counts[placement.page_index] += 1;
        }
        counts
    }

    /// Distinct images this plan needs, in first-use order
    pub fn manifest(&self) -> Vec<SourceKey> {
        let mut seen = std::collections::HashSet::new();
        self.placements
            .iter()
            .filter_map(|p| p.slot.as_ref())
            .filter(|slot| seen.insert(&slot.source))
            .map(|slot| slot.source.clone())
            .collect()
    }
}

//! Sheet geometry resolution
//!
//! Turns page size, margins and the requested card size into the card box
//! that actually gets printed, shrinking it uniformly when auto-fit is on.

use crate::types::GeometryError;

use super::{GeometryRequest, ResolvedGeometry};

/// Tolerance for float comparisons against page bounds (mm)
const FIT_EPSILON_MM: f32 = 1e-3;

/// Resolve page dimensions, card box and auto-fit scale.
pub fn resolve_geometry(request: &GeometryRequest) -> ResolvedGeometry {
    let (page_width_mm, page_height_mm) = request
        .page_size
        .dimensions_with_orientation(request.orientation);

    let box_width = request.card_width_mm + 2.0 * request.bleed_mm;
    let box_height = request.card_height_mm + 2.0 * request.bleed_mm;
    let cols = request.cols.max(1);
    let rows = request.rows.max(1);

    let scale = if request.auto_fit {
        fit_scale(
            page_width_mm,
            page_height_mm,
            request.margin_mm,
            request.gap_mm,
            box_width,
            box_height,
            cols,
            rows,
        )
    } else {
        1.0
    };

    ResolvedGeometry {
        page_size: request.page_size,
        orientation: request.orientation,
        page_width_mm,
        page_height_mm,
        margin_mm: request.margin_mm,
        gap_mm: request.gap_mm,
        card_width_mm: box_width * scale,
        card_height_mm: box_height * scale,
        cols,
        rows,
        scale,
    }
}

/// Largest uniform scale (capped at 1) that fits the full grid of card
/// boxes inside the page, margins and gaps kept at their nominal size.
/// Only the boxes shrink, so the scaled grid always stays on the page.
#[allow(clippy::too_many_arguments)]
fn fit_scale(
    page_width: f32,
    page_height: f32,
    margin: f32,
    gap: f32,
    box_width: f32,
    box_height: f32,
    cols: usize,
    rows: usize,
) -> f32 {
    let available_width = page_width - 2.0 * margin - (cols - 1) as f32 * gap;
    let available_height = page_height - 2.0 * margin - (rows - 1) as f32 * gap;

    let scale_w = available_width / (cols as f32 * box_width);
    let scale_h = available_height / (rows as f32 * box_height);

    scale_w.min(scale_h).min(1.0).max(0.0)
}

impl ResolvedGeometry {
    /// Cells per page for the configured grid
    pub fn capacity(&self) -> usize {
        self.cols * self.rows
    }

    /// Width taken by margins, gaps and a full row of boxes
    pub fn needed_width_mm(&self) -> f32 {
        2.0 * self.margin_mm
            + self.cols as f32 * self.card_width_mm
            + (self.cols - 1) as f32 * self.gap_mm
    }

    /// Height taken by margins, gaps and a full column of boxes
    pub fn needed_height_mm(&self) -> f32 {
        2.0 * self.margin_mm
            + self.rows as f32 * self.card_height_mm
            + (self.rows - 1) as f32 * self.gap_mm
    }

    /// True if the whole grid fits the page
    pub fn fits_page(&self) -> bool {
        self.needed_width_mm() <= self.page_width_mm + FIT_EPSILON_MM
            && self.needed_height_mm() <= self.page_height_mm + FIT_EPSILON_MM
    }

    /// Left edge of a column
    pub fn column_x(&self, col: usize) -> f32 {
        self.margin_mm + col as f32 * (self.card_width_mm + self.gap_mm)
    }

    /// Top edge of a row
    pub fn row_y(&self, row: usize) -> f32 {
        self.margin_mm + row as f32 * (self.card_height_mm + self.gap_mm)
    }

    /// True if a box starting at this row stays above the bottom margin
    pub fn row_fits(&self, row: usize) -> bool {
        self.row_y(row) + self.card_height_mm + self.margin_mm
            <= self.page_height_mm + FIT_EPSILON_MM
    }

    /// Rows that can be placed on one page (at least one)
    pub fn rows_per_page(&self) -> usize {
        (0..self.rows).take_while(|&row| self.row_fits(row)).count().max(1)
    }

    /// Cells actually used per page
    pub fn slots_per_page(&self) -> usize {
        self.cols * self.rows_per_page()
    }

    /// Reject geometry that would put a card partially off the page.
    ///
    /// Rows that overflow the page height are moved to the next page by the
    /// tiler; columns can't be, so an overly wide grid is an error.
    pub fn check(&self) -> Result<(), GeometryError> {
        if !(self.card_width_mm > 0.0) {
            return Err(GeometryError::NonPositiveDimension("card width"));
        }
        if !(self.card_height_mm > 0.0) {
            return Err(GeometryError::NonPositiveDimension("card height"));
        }

        let single_width = 2.0 * self.margin_mm + self.card_width_mm;
        let single_height = 2.0 * self.margin_mm + self.card_height_mm;
        if single_width > self.page_width_mm + FIT_EPSILON_MM
            || single_height > self.page_height_mm + FIT_EPSILON_MM
        {
            return Err(GeometryError::CardExceedsPage {
                box_width_mm: self.card_width_mm,
                box_height_mm: self.card_height_mm,
                page_width_mm: self.page_width_mm,
                page_height_mm: self.page_height_mm,
                margin_mm: self.margin_mm,
            });
        }

        let needed = self.needed_width_mm();
        if needed > self.page_width_mm + FIT_EPSILON_MM {
            return Err(GeometryError::GridTooWide {
                cols: self.cols,
                needed_mm: needed,
                page_width_mm: self.page_width_mm,
            });
        }

        Ok(())
    }
}

//! Page tiling
//!
//! Assigns each print slot to a page, row and column, row-major, and
//! computes its absolute position from the resolved geometry.

use crate::deck::PrintSlot;
use crate::types::{CropMarks, GeometryError, SheetSide};

use super::{Placement, ResolvedGeometry, SheetPlan};

/// Grid cursor while walking the sequence
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    page: usize,
    row: usize,
    col: usize,
}

impl Cursor {
    fn advance(&mut self, cols: usize) {
        self.col += 1;
        if self.col == cols {
            self.col = 0;
            self.row += 1;
        }
    }

    /// True when the cursor sits at the start of a row that doesn't belong
    /// on the current page: either the grid is full or the row would cross
    /// the bottom margin.
    fn page_is_full(&self, geometry: &ResolvedGeometry) -> bool {
        self.col == 0
            && self.row > 0
            && (self.row >= geometry.rows || !geometry.row_fits(self.row))
    }

    fn next_page(&mut self) {
        self.page += 1;
        self.row = 0;
        self.col = 0;
    }
}

/// Lay out a sequence of slots on pages.
///
/// The trailing cells of the last page are filled with empty placements so
/// every page is a complete grid. Geometry that can't hold a single card is
/// rejected before anything is placed.
pub fn plan_sheet(
    slots: &[PrintSlot],
    geometry: &ResolvedGeometry,
    crop_marks: CropMarks,
    side: SheetSide,
) -> Result<SheetPlan, GeometryError> {
    geometry.check()?;

    let mut placements = Vec::with_capacity(slots.len() + geometry.capacity());
    let mut cursor = Cursor::default();

    let place = |cursor: &Cursor, slot: Option<PrintSlot>| {
        let crop_marks = if slot.is_some() {
            crop_marks
        } else {
            CropMarks::None
        };
        Placement {
            page_index: cursor.page,
            row: cursor.row,
            col: cursor.col,
            x_mm: geometry.column_x(cursor.col),
            y_mm: geometry.row_y(cursor.row),
            slot,
            crop_marks,
        }
    };

    for slot in slots {
        if cursor.page_is_full(geometry) {
            cursor.next_page();
        }
        placements.push(place(&cursor, Some(slot.clone())));
        cursor.advance(geometry.cols);
    }

    // Pad the last page to a complete grid
    let started_page = cursor.col != 0 || cursor.row != 0;
    if started_page {
        while !cursor.page_is_full(geometry) {
            placements.push(place(&cursor, None));
            cursor.advance(geometry.cols);
        }
    }

    let page_count = if placements.is_empty() {
        0
    } else {
        cursor.page + 1
    };

    log::debug!(
        "Tiled {} slots onto {} {:?} page(s)",
        slots.len(),
        page_count,
        side
    );

    Ok(SheetPlan {
        side,
        page_size: geometry.page_size,
        orientation: geometry.orientation,
        page_width_mm: geometry.page_width_mm,
        page_height_mm: geometry.page_height_mm,
        margin_mm: geometry.margin_mm,
        gap_mm: geometry.gap_mm,
        card_width_mm: geometry.card_width_mm,
        card_height_mm: geometry.card_height_mm,
        cols: geometry.cols,
        rows: geometry.rows_per_page(),
        page_count,
        placements,
    })
}

use super::{OutputFormat, RenderInput, SheetRenderer};
use crate::types::{ExportError, Result};
use card_layout::constants::{
    CROP_MARK_GREY, CROP_MARK_STROKE_MM, MM_PER_INCH, mm_to_emu, mm_to_twips,
};
use card_layout::{CropMarks, Orientation, Placement, SheetPlan};
use docx_rs::*;
use std::io::Cursor;

/// docx-rs backend: one fixed grid table per page.
///
/// Card boxes are table cells of exactly the card size; gaps are spacer
/// columns and rows between them. Cell edges are rounded from the plan's
/// millimeter offsets and never run past the printable area.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer;

impl SheetRenderer for DocxRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }

    fn render(&self, input: &RenderInput<'_>) -> Result<Vec<u8>> {
        let Some(first) = input.plans.iter().find(|plan| plan.page_count > 0) else {
            return Err(ExportError::Docx("No pages to render".to_string()));
        };

        let margin = mm_to_twips(first.margin_mm) as i32;

        let mut docx = Docx::new()
            .page_size(
                mm_to_twips(first.page_width_mm),
                mm_to_twips(first.page_height_mm),
            )
            .page_margin(
                PageMargin::new()
                    .top(margin)
                    .bottom(margin)
                    .left(margin)
                    .right(margin)
                    .header(0)
                    .footer(0),
            );
        if first.orientation == Orientation::Landscape {
            docx = docx.page_orient(PageOrientationType::Landscape);
        }

        if input
            .plans
            .iter()
            .flat_map(|plan| &plan.placements)
            .any(|p| p.crop_marks == CropMarks::Short)
        {
            log::warn!("Corner crop marks are not drawn in DOCX output");
        }

        let mut first_page = true;
        for plan in input.plans {
            for page_index in 0..plan.page_count {
                if !first_page {
                    docx = docx.add_paragraph(
                        Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
                    );
                }
                first_page = false;
                docx = docx.add_table(page_table(plan, page_index, input));
            }
        }

        let mut buffer = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buffer)
            .map_err(|e| ExportError::Docx(e.to_string()))?;
        let bytes = buffer.into_inner();

        log::debug!(
            "Rendered {} DOCX page(s), {} bytes",
            input.page_count(),
            bytes.len()
        );
        Ok(bytes)
    }
}

/// One column or row of the table grid
#[derive(Debug, Clone, Copy, PartialEq)]
enum Track {
    Card(usize),
    Gap,
}

/// Tracks along one axis with their size in twips.
///
/// Edges are rounded from millimeter offsets so rounding never accumulates,
/// and clamped to `limit` so the table stays inside the margins.
fn tracks(count: usize, card_mm: f32, gap_mm: f32, limit: u32) -> Vec<(Track, u32)> {
    let edge = |mm: f32| mm_to_twips(mm).min(limit);
    let mut tracks = Vec::with_capacity(count * 2);
    let mut previous_end = 0;
    for index in 0..count {
        let start_mm = index as f32 * (card_mm + gap_mm);
        let start = edge(start_mm).max(previous_end);
        if start > previous_end {
            tracks.push((Track::Gap, start - previous_end));
        }
        let end = edge(start_mm + card_mm).max(start);
        tracks.push((Track::Card(index), end - start));
        previous_end = end;
    }
    tracks
}

/// Grey single-line border matching the PDF crop-mark stroke
fn crop_border(position: TableCellBorderPosition) -> TableCellBorder {
    // Border width is in eighths of a point
    let size = (CROP_MARK_STROKE_MM / MM_PER_INCH * 72.0 * 8.0).round().max(2.0) as usize;
    TableCellBorder::new(position)
        .border_type(BorderType::Single)
        .size(size)
        .color(format!(
            "{:02X}{:02X}{:02X}",
            CROP_MARK_GREY, CROP_MARK_GREY, CROP_MARK_GREY
        ))
}

fn page_table(plan: &SheetPlan, page_index: usize, input: &RenderInput<'_>) -> Table {
    let margin = mm_to_twips(plan.margin_mm);
    let printable_width = mm_to_twips(plan.page_width_mm).saturating_sub(2 * margin);
    let printable_height = mm_to_twips(plan.page_height_mm).saturating_sub(2 * margin);
    let columns = tracks(plan.cols, plan.card_width_mm, plan.gap_mm, printable_width);
    let rows = tracks(plan.rows, plan.card_height_mm, plan.gap_mm, printable_height);

    let mut grid: Vec<Vec<Option<&Placement>>> = vec![vec![None; plan.cols]; plan.rows];
    for placement in plan.page(page_index) {
        if let Some(cell) = grid
            .get_mut(placement.row)
            .and_then(|row| row.get_mut(placement.col))
        {
            *cell = Some(placement);
        }
    }

    let table_rows = rows
        .iter()
        .map(|&(row_track, height)| {
            let cells = columns
                .iter()
                .map(|&(col_track, width)| {
                    let placement = match (row_track, col_track) {
                        (Track::Card(row), Track::Card(col)) => grid[row][col],
                        _ => None,
                    };
                    card_cell(plan, placement, input).width(width as usize, WidthType::Dxa)
                })
                .collect();
            TableRow::new(cells)
                .row_height(height as f32)
                .height_rule(HeightRule::Exact)
        })
        .collect();

    Table::new(table_rows)
        .set_grid(columns.iter().map(|&(_, width)| width as usize).collect())
        .layout(TableLayoutType::Fixed)
        .margins(TableCellMargins::new().margin(0, 0, 0, 0))
        .clear_all_border()
}

fn card_cell(plan: &SheetPlan, placement: Option<&Placement>, input: &RenderInput<'_>) -> TableCell {
    let mut cell = TableCell::new().add_paragraph(cell_paragraph(plan, placement, input));

    let outlined = placement.is_some_and(|p| !p.is_empty() && p.crop_marks == CropMarks::Full);
    if outlined {
        for position in [
            TableCellBorderPosition::Top,
            TableCellBorderPosition::Left,
            TableCellBorderPosition::Bottom,
            TableCellBorderPosition::Right,
        ] {
            cell = cell.set_border(crop_border(position));
        }
    }
    cell
}

fn cell_paragraph(plan: &SheetPlan, placement: Option<&Placement>, input: &RenderInput<'_>) -> Paragraph {
    let image = placement
        .and_then(|p| p.slot.as_ref())
        .and_then(|slot| input.images.image(&slot.source));

    match image {
        Some(image) => Paragraph::new().add_run(
            Run::new().add_image(
                Pic::new(&image.jpeg)
                    .size(mm_to_emu(plan.card_width_mm), mm_to_emu(plan.card_height_mm)),
            ),
        ),
        None => Paragraph::new(),
    }
}

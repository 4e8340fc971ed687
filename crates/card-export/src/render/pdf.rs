use super::{OutputFormat, RenderInput, SheetRenderer};
use crate::normalize::CanonicalImage;
use crate::types::{ExportError, Result};
use card_layout::constants::{CROP_MARK_GREY, CROP_MARK_STROKE_MM};
use card_layout::marks::{Segment, crop_mark_segments};
use card_layout::{MmRect, SheetPlan, SourceKey};
use printpdf::*;
use std::collections::HashMap;

/// Images are placed at 72 dpi so one pixel is one point before scaling
const PLACEMENT_DPI: f32 = 72.0;

/// printpdf backend
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl SheetRenderer for PdfRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn render(&self, input: &RenderInput<'_>) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new(input.title);
        let mut xobjects: HashMap<SourceKey, Option<(XObjectId, u32, u32)>> = HashMap::new();
        let mut warnings = Vec::new();

        for plan in input.plans {
            for page_index in 0..plan.page_count {
                let mut ops = Vec::new();

                for placement in plan.page(page_index) {
                    let Some(slot) = &placement.slot else {
                        continue;
                    };
                    let rect = plan.card_rect(placement);

                    let xobject = match xobjects.get(&slot.source) {
                        Some(cached) => cached.clone(),
                        None => {
                            let added = match input.images.image(&slot.source) {
                                Some(image) => Some(add_image(&mut doc, image, &mut warnings)?),
                                None => None,
                            };
                            xobjects.insert(slot.source.clone(), added.clone());
                            added
                        }
                    };

                    if let Some((id, width_px, height_px)) = xobject {
                        ops.push(place_image(plan, rect, id, width_px, height_px));
                    }

                    let segments = crop_mark_segments(rect, placement.crop_marks);
                    if !segments.is_empty() {
                        ops.extend(stroke_segments(plan, &segments));
                    }
                }

                doc.pages.push(PdfPage::new(
                    Mm(plan.page_width_mm),
                    Mm(plan.page_height_mm),
                    ops,
                ));
            }
        }

        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        log::debug!(
            "Rendered {} PDF page(s), {} bytes",
            input.page_count(),
            bytes.len()
        );
        Ok(bytes)
    }
}

fn add_image(
    doc: &mut PdfDocument,
    image: &CanonicalImage,
    warnings: &mut Vec<PdfWarnMsg>,
) -> Result<(XObjectId, u32, u32)> {
    let raw = RawImage::decode_from_bytes(&image.jpeg, warnings).map_err(ExportError::Pdf)?;
    Ok((doc.add_image(&raw), image.width_px, image.height_px))
}

/// Scale an image to fill its card box. PDF y runs upward from the bottom.
fn place_image(plan: &SheetPlan, rect: MmRect, id: XObjectId, width_px: u32, height_px: u32) -> Op {
    let box_width = Mm(rect.width).into_pt().0;
    let box_height = Mm(rect.height).into_pt().0;

    Op::UseXobject {
        id,
        transform: XObjectTransform {
            translate_x: Some(Mm(rect.x).into_pt()),
            translate_y: Some(Mm(plan.page_height_mm - rect.bottom()).into_pt()),
            scale_x: Some(box_width / width_px.max(1) as f32),
            scale_y: Some(box_height / height_px.max(1) as f32),
            dpi: Some(PLACEMENT_DPI),
            ..Default::default()
        },
    }
}

fn stroke_segments(plan: &SheetPlan, segments: &[Segment]) -> Vec<Op> {
    let grey = CROP_MARK_GREY as f32 / 255.0;
    let point = |x: f32, y: f32| LinePoint {
        p: Point::new(Mm(x), Mm(plan.page_height_mm - y)),
        bezier: false,
    };

    let mut ops = vec![
        Op::SaveGraphicsState,
        Op::SetOutlineColor {
            col: Color::Rgb(Rgb::new(grey, grey, grey, None)),
        },
        Op::SetOutlineThickness {
            pt: Mm(CROP_MARK_STROKE_MM).into_pt(),
        },
    ];
    ops.extend(segments.iter().map(|s| Op::DrawLine {
        line: Line {
            points: vec![point(s.x1, s.y1), point(s.x2, s.y2)],
            is_closed: false,
        },
    }));
    ops.push(Op::RestoreGraphicsState);
    ops
}

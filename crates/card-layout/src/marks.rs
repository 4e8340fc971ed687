//! Crop mark geometry
//!
//! Marks are returned as line segments in page millimeters (top-left
//! origin) so each backend can stroke them in its own units.

use crate::constants::CROP_MARK_LENGTH_MM;
use crate::layout::MmRect;
use crate::types::CropMarks;

/// A straight line between two points, in mm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Segment {
    fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn length(&self) -> f32 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }
}

/// Segments to stroke around one card box
pub fn crop_mark_segments(rect: MmRect, mode: CropMarks) -> Vec<Segment> {
    match mode {
        CropMarks::None => Vec::new(),
        CropMarks::Short => corner_ticks(rect, CROP_MARK_LENGTH_MM),
        CropMarks::Full => outline(rect),
    }
}

/// Two ticks per corner, running inward along each edge
fn corner_ticks(rect: MmRect, length: f32) -> Vec<Segment> {
    let length = length.min(rect.width).min(rect.height);
    let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());

    vec![
        // top-left
        Segment::new(left, top, left + length, top),
        Segment::new(left, top, left, top + length),
        // top-right
        Segment::new(right - length, top, right, top),
        Segment::new(right, top, right, top + length),
        // bottom-left
        Segment::new(left, bottom, left + length, bottom),
        Segment::new(left, bottom - length, left, bottom),
        // bottom-right
        Segment::new(right - length, bottom, right, bottom),
        Segment::new(right, bottom - length, right, bottom),
    ]
}

fn outline(rect: MmRect) -> Vec<Segment> {
    let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
    vec![
        Segment::new(left, top, right, top),
        Segment::new(right, top, right, bottom),
        Segment::new(right, bottom, left, bottom),
        Segment::new(left, bottom, left, top),
    ]
}

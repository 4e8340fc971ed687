//! Shared constants for sheet output
//!
//! Unit conversions and mark styling used by every backend.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Millimeters per inch
pub const MM_PER_INCH: f32 = 25.4;

/// English Metric Units per inch (picture sizes in word-processor documents)
pub const EMU_PER_INCH: f32 = 914_400.0;

/// Twentieths of a point per inch (page size and margins in word-processor documents)
pub const TWIPS_PER_INCH: f32 = 1440.0;

/// Convert millimeters to EMU
#[inline]
pub fn mm_to_emu(mm: f32) -> u32 {
    (mm / MM_PER_INCH * EMU_PER_INCH).round().max(0.0) as u32
}

/// Convert millimeters to twips
#[inline]
pub fn mm_to_twips(mm: f32) -> u32 {
    (mm / MM_PER_INCH * TWIPS_PER_INCH).round().max(0.0) as u32
}

// =============================================================================
// Crop Marks
// =============================================================================

/// Length of a corner tick (mm)
pub const CROP_MARK_LENGTH_MM: f32 = 3.0;

/// Stroke width of crop marks (mm)
pub const CROP_MARK_STROKE_MM: f32 = 0.18;

/// Grey level of crop marks (0-255)
pub const CROP_MARK_GREY: u8 = 120;

// =============================================================================
// Flat Text Decks
// =============================================================================

/// Image URL prefix for cards imported by numeric id
pub const YDK_IMAGE_URL_BASE: &str = "https://images.ygoprodeck.com/images/cards/";

/// Comment line written at the top of exported decks
pub const YDK_HEADER: &str = "#created by card-tools";

//! Document backends
//!
//! Backends turn finished sheet plans and normalized images into file
//! bytes. Geometry is taken from the plans as is; backends only convert
//! millimeters to their native units.

mod docx;
mod pdf;

pub use docx::DocxRenderer;
pub use pdf::PdfRenderer;

use crate::normalize::ImageSet;
use crate::types::Result;
use card_layout::SheetPlan;

/// Output document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Page-description document
    Pdf,
    /// Table-based word-processor document
    Docx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
        }
    }
}

/// Everything a backend needs for one document
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub title: &'a str,
    /// Front plan first, then the back plan if any
    pub plans: &'a [SheetPlan],
    pub images: &'a ImageSet,
}

impl RenderInput<'_> {
    pub fn page_count(&self) -> usize {
        self.plans.iter().map(|plan| plan.page_count).sum()
    }
}

pub trait SheetRenderer {
    fn format(&self) -> OutputFormat;

    /// Emit pages in plan order, drawing every filled cell whose image is available
    fn render(&self, input: &RenderInput<'_>) -> Result<Vec<u8>>;
}

/// Render with the backend for a format
pub fn render_document(format: OutputFormat, input: &RenderInput<'_>) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Pdf => PdfRenderer.render(input),
        OutputFormat::Docx => DocxRenderer.render(input),
    }
}

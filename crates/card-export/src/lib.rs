mod job;
pub mod normalize;
pub mod render;
mod types;

pub use job::{ExportJob, ExportOutput, JobEvent, JobPlan, JobState, save_document};
pub use normalize::{
    CanonicalImage, HttpFetcher, ImageFetcher, ImageSet, NormalizeOptions, NormalizedImage,
    normalize_sources,
};
pub use render::{DocxRenderer, OutputFormat, PdfRenderer, RenderInput, SheetRenderer, render_document};
pub use types::*;

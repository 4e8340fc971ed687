use card_layout::LayoutError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("DOCX error: {0}")]
    Docx(String),
    #[error("This side mode needs a back image")]
    MissingBackImage,
    #[error("Back image could not be loaded: {0}")]
    BackImageFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ExportError>;

impl From<card_layout::GeometryError> for ExportError {
    fn from(error: card_layout::GeometryError) -> Self {
        ExportError::Layout(LayoutError::Geometry(error))
    }
}

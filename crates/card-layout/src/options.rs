use crate::layout::{GeometryRequest, ResolvedGeometry, resolve_geometry};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Default number of columns and rows on a sheet (9-up)
pub const DEFAULT_GRID: (usize, usize) = (3, 3);

/// Print settings for a deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    #[serde(rename = "cardPreset")]
    pub card_preset: CardPreset,
    /// Card width used when the preset is custom
    #[serde(rename = "cardW")]
    pub card_width_mm: f32,
    /// Card height used when the preset is custom
    #[serde(rename = "cardH")]
    pub card_height_mm: f32,

    #[serde(rename = "pageSize")]
    pub page_size: PageSize,
    pub orientation: Orientation,
    #[serde(rename = "margin")]
    pub margin_mm: f32,
    #[serde(rename = "gap")]
    pub gap_mm: f32,
    #[serde(rename = "bleed")]
    pub bleed_mm: f32,

    #[serde(rename = "cropMarks")]
    pub crop_marks: CropMarks,
    #[serde(rename = "autoFit")]
    pub auto_fit: bool,
    #[serde(rename = "frontBackMode")]
    pub side_mode: SideMode,
    #[serde(rename = "backFlipMode")]
    pub flip_mode: FlipMode,

    /// Output file name without extension
    #[serde(rename = "fileName")]
    pub file_name: String,

    pub columns: usize,
    pub rows: usize,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            card_preset: CardPreset::Standard,
            card_width_mm: 63.0,
            card_height_mm: 88.0,
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margin_mm: 5.0,
            gap_mm: 2.0,
            bleed_mm: 0.0,
            crop_marks: CropMarks::Short,
            auto_fit: true,
            side_mode: SideMode::FrontOnly,
            flip_mode: FlipMode::None,
            file_name: "cards".to_string(),
            columns: DEFAULT_GRID.0,
            rows: DEFAULT_GRID.1,
        }
    }
}

impl SheetSettings {
    /// Load settings from a JSON file; absent keys keep their defaults
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let settings = serde_json::from_slice(&bytes)
            .map_err(|e| LayoutError::Config(format!("Failed to parse settings: {}", e)))?;
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LayoutError::Config(format!("Failed to serialize settings: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Nominal card size, from the preset or the custom fields
    pub fn card_size_mm(&self) -> (f32, f32) {
        self.card_preset
            .dimensions_mm()
            .unwrap_or((self.card_width_mm, self.card_height_mm))
    }

    /// Switch the flip mode off when backs are not printed
    pub fn normalized(mut self) -> Self {
        if self.side_mode == SideMode::FrontOnly {
            self.flip_mode = FlipMode::None;
        }
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        let (card_w, card_h) = self.card_size_mm();
        if !(card_w > 0.0 && card_h > 0.0) {
            return Err(LayoutError::Config(
                "Card width and height must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("Margin", self.margin_mm),
            ("Gap", self.gap_mm),
            ("Bleed", self.bleed_mm),
        ] {
            if !(value >= 0.0) {
                return Err(LayoutError::Config(format!("{} must not be negative", name)));
            }
        }
        if self.columns == 0 || self.rows == 0 {
            return Err(LayoutError::Config(
                "Grid must have at least one row and one column".to_string(),
            ));
        }
        Ok(())
    }

    pub fn geometry_request(&self) -> GeometryRequest {
        let (card_width_mm, card_height_mm) = self.card_size_mm();
        GeometryRequest {
            page_size: self.page_size,
            orientation: self.orientation,
            margin_mm: self.margin_mm,
            gap_mm: self.gap_mm,
            bleed_mm: self.bleed_mm,
            card_width_mm,
            card_height_mm,
            cols: self.columns,
            rows: self.rows,
            auto_fit: self.auto_fit,
        }
    }

    /// Resolve the sheet geometry for these settings
    pub fn resolve_geometry(&self) -> ResolvedGeometry {
        resolve_geometry(&self.geometry_request())
    }
}

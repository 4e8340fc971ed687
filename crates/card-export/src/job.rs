//! Export pipeline
//!
//! An [`ExportJob`] is an immutable description of one export. Running it
//! walks the stages `Idle -> Expanding -> ResolvingGeometry -> Tiling ->
//! NormalizingImages -> Rendering -> Done` (or `Failed`), reporting each
//! transition on an optional channel.

use crate::normalize::{ImageFetcher, ImageSet, NormalizeOptions, normalize_sources};
use crate::render::{OutputFormat, RenderInput, render_document};
use crate::types::{ExportError, Result};
use card_layout::{
    Card, CropMarks, Deck, FlipMode, ImageSource, LayoutError, PrintSlot, ResolvedGeometry,
    SheetPlan, SheetSettings, SheetSide, SideMode, duplex_order, expand_quantities, plan_sheet,
};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Expanding,
    ResolvingGeometry,
    Tiling,
    NormalizingImages,
    Rendering,
    Done,
    Failed,
}

impl JobState {
    /// Stages only move forward one step at a time; any non-terminal stage
    /// may fail.
    pub fn can_advance_to(self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Idle, Expanding)
            | (Expanding, ResolvingGeometry)
            | (ResolvingGeometry, Tiling)
            | (Tiling, NormalizingImages)
            | (NormalizingImages, Rendering)
            | (Rendering, Done) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

/// Progress notifications sent while a job runs
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    State(JobState),
    /// One more distinct image has settled
    ImageProgress { current: usize, total: usize },
    /// Sent once after normalization when some images failed
    MissingImages { count: usize },
    Error { message: String },
}

/// Layout of a job before any image is loaded
#[derive(Debug, Clone, PartialEq)]
pub struct JobPlan {
    pub geometry: ResolvedGeometry,
    pub front: Option<SheetPlan>,
    pub back: Option<SheetPlan>,
}

impl JobPlan {
    pub fn page_count(&self) -> usize {
        self.front.iter().chain(&self.back).map(|p| p.page_count).sum()
    }
}

/// Rendered documents plus the aggregate failure count
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub documents: Vec<(OutputFormat, Vec<u8>)>,
    /// Distinct images that could not be loaded (front and back)
    pub missing: usize,
    pub front_pages: usize,
    pub back_pages: usize,
}

impl ExportOutput {
    pub fn document(&self, format: OutputFormat) -> Option<&[u8]> {
        self.documents
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// Write every document as `<dir>/<stem>.<ext>`
    pub async fn save_all(&self, dir: impl AsRef<Path>, stem: &str) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.documents.len());
        for (format, bytes) in &self.documents {
            let path = dir.as_ref().join(format!("{}.{}", stem, format.extension()));
            save_document(bytes, &path).await?;
            paths.push(path);
        }
        Ok(paths)
    }
}

/// Write document bytes to disk
pub async fn save_document(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// One export: cards, shared back, settings and output formats
#[derive(Debug, Clone)]
pub struct ExportJob {
    cards: Vec<Card>,
    back_image: Option<ImageSource>,
    settings: SheetSettings,
    formats: Vec<OutputFormat>,
}

impl ExportJob {
    /// Check preconditions. Nothing is loaded or rendered here.
    pub fn new(deck: &Deck, formats: &[OutputFormat]) -> Result<Self> {
        if deck.cards.is_empty() {
            return Err(LayoutError::EmptyDeck.into());
        }
        if formats.is_empty() {
            return Err(LayoutError::Config("No output format selected".to_string()).into());
        }
        let settings = deck.settings.clone().normalized();
        settings.validate()?;
        if settings.side_mode == SideMode::BackOnly && deck.back_image.is_none() {
            return Err(ExportError::MissingBackImage);
        }

        Ok(Self {
            cards: deck.cards.clone(),
            back_image: deck.back_image.clone(),
            settings,
            formats: formats.to_vec(),
        })
    }

    pub fn settings(&self) -> &SheetSettings {
        &self.settings
    }

    /// Run the synchronous stages: expand, resolve geometry, tile
    pub fn plan(&self) -> Result<JobPlan> {
        self.plan_with(&mut Progress::silent())
    }

    fn plan_with(&self, progress: &mut Progress) -> Result<JobPlan> {
        progress.advance(JobState::Expanding);
        let slots = expand_quantities(&self.cards);

        progress.advance(JobState::ResolvingGeometry);
        let geometry = self.settings.resolve_geometry();
        geometry.check()?;
        log::debug!(
            "Card box {:.2}x{:.2} mm at scale {:.3}",
            geometry.card_width_mm,
            geometry.card_height_mm,
            geometry.scale
        );

        progress.advance(JobState::Tiling);
        let crop_marks = self.settings.crop_marks;
        let mode = self.settings.side_mode;

        let front = if mode.prints_fronts() {
            Some(plan_sheet(&slots, &geometry, crop_marks, SheetSide::Front)?)
        } else {
            None
        };

        let back = match (&self.back_image, mode) {
            (Some(back), SideMode::BackOnly) => Some(self.back_plan(
                &slots,
                back,
                FlipMode::None,
                &geometry,
                crop_marks,
            )?),
            (Some(back), SideMode::FrontBack) => Some(self.back_plan(
                &slots,
                back,
                self.settings.flip_mode,
                &geometry,
                crop_marks,
            )?),
            _ => None,
        };

        Ok(JobPlan {
            geometry,
            front,
            back,
        })
    }

    /// Back slots follow the front slots, reordered for the flip, all showing
    /// the shared back image
    fn back_plan(
        &self,
        slots: &[PrintSlot],
        back: &ImageSource,
        flip: FlipMode,
        geometry: &ResolvedGeometry,
        crop_marks: CropMarks,
    ) -> Result<SheetPlan> {
        let key = back.key();
        let ordered = duplex_order(slots, flip, geometry.cols, geometry.rows_per_page());
        let back_slots: Vec<PrintSlot> = ordered
            .into_iter()
            .map(|slot| PrintSlot {
                source: key.clone(),
                ..slot
            })
            .collect();
        Ok(plan_sheet(&back_slots, geometry, crop_marks, SheetSide::Back)?)
    }

    /// Every distinct source the plan needs, fronts first
    fn sources(&self, plan: &JobPlan) -> Vec<ImageSource> {
        let mut sources: Vec<ImageSource> = if plan.front.is_some() {
            self.cards.iter().map(|card| card.source.clone()).collect()
        } else {
            Vec::new()
        };
        if plan.back.is_some() {
            sources.extend(self.back_image.clone());
        }
        sources
    }

    /// Run the whole pipeline.
    ///
    /// Per-image failures only raise the missing count. Errors are returned
    /// for preconditions, geometry, a failed back in back-only mode and
    /// backend failures.
    pub async fn run<F: ImageFetcher>(
        &self,
        fetcher: &F,
        options: &NormalizeOptions,
        events: Option<mpsc::UnboundedSender<JobEvent>>,
    ) -> Result<ExportOutput> {
        let mut progress = Progress::new(events);
        match self.run_stages(fetcher, options, &mut progress).await {
            Ok(output) => {
                progress.advance(JobState::Done);
                Ok(output)
            }
            Err(e) => {
                progress.send(JobEvent::Error {
                    message: e.to_string(),
                });
                progress.advance(JobState::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages<F: ImageFetcher>(
        &self,
        fetcher: &F,
        options: &NormalizeOptions,
        progress: &mut Progress,
    ) -> Result<ExportOutput> {
        let mut plan = self.plan_with(progress)?;

        progress.advance(JobState::NormalizingImages);
        let sources = self.sources(&plan);
        let images = normalize_sources(&sources, fetcher, options, |current, total| {
            progress.send(JobEvent::ImageProgress { current, total });
        })
        .await;

        let missing = images.failed_count();
        if missing > 0 {
            log::warn!("{} image(s) could not be loaded", missing);
            progress.send(JobEvent::MissingImages { count: missing });
        }

        self.check_back_image(&mut plan, &images)?;

        progress.advance(JobState::Rendering);
        let plans: Vec<SheetPlan> = plan.front.iter().chain(&plan.back).cloned().collect();
        let front_pages = plan.front.as_ref().map_or(0, |p| p.page_count);
        let back_pages = plan.back.as_ref().map_or(0, |p| p.page_count);
        let documents = render_all(self.settings.file_name.clone(), plans, images, self.formats.clone()).await?;

        Ok(ExportOutput {
            documents,
            missing,
            front_pages,
            back_pages,
        })
    }

    /// A back image that failed is fatal in back-only mode; otherwise the
    /// back pages are dropped
    fn check_back_image(&self, plan: &mut JobPlan, images: &ImageSet) -> Result<()> {
        let Some(back) = &self.back_image else {
            return Ok(());
        };
        if plan.back.is_none() || images.image(&back.key()).is_some() {
            return Ok(());
        }

        let reason = match images.get(&back.key()) {
            Some(crate::normalize::NormalizedImage::Failed(reason)) => reason.clone(),
            _ => "not loaded".to_string(),
        };
        if self.settings.side_mode == SideMode::BackOnly {
            return Err(ExportError::BackImageFailed(reason));
        }
        log::warn!("Skipping back pages: {}", reason);
        plan.back = None;
        Ok(())
    }
}

async fn render_all(
    title: String,
    plans: Vec<SheetPlan>,
    images: ImageSet,
    formats: Vec<OutputFormat>,
) -> Result<Vec<(OutputFormat, Vec<u8>)>> {
    tokio::task::spawn_blocking(move || {
        let input = RenderInput {
            title: &title,
            plans: &plans,
            images: &images,
        };
        formats
            .into_iter()
            .map(|format| render_document(format, &input).map(|bytes| (format, bytes)))
            .collect::<Result<Vec<_>>>()
    })
    .await?
}

/// Tracks the current stage and forwards events
struct Progress {
    state: JobState,
    events: Option<mpsc::UnboundedSender<JobEvent>>,
}

impl Progress {
    fn new(events: Option<mpsc::UnboundedSender<JobEvent>>) -> Self {
        Self {
            state: JobState::Idle,
            events,
        }
    }

    fn silent() -> Self {
        Self::new(None)
    }

    fn advance(&mut self, next: JobState) {
        if !self.state.can_advance_to(next) {
            log::warn!("Ignoring job transition {:?} -> {:?}", self.state, next);
            return;
        }
        log::debug!("Export job: {:?} -> {:?}", self.state, next);
        self.state = next;
        self.send(JobEvent::State(next));
    }

    fn send(&self, event: JobEvent) {
        if let Some(tx) = &self.events {
            // The receiver going away doesn't stop the job
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_moves_forward_only() {
        use JobState::*;
        let path = [
            Idle,
            Expanding,
            ResolvingGeometry,
            Tiling,
            NormalizingImages,
            Rendering,
            Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]));
            assert!(!pair[1].can_advance_to(pair[0]));
        }
        assert!(!Idle.can_advance_to(Tiling));
        assert!(Tiling.can_advance_to(Failed));
        assert!(!Done.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Expanding));
        assert!(Done.is_terminal() && Failed.is_terminal());
    }
}

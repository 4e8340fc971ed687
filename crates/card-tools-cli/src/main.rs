mod input;

use anyhow::{Context, Result, bail};
use card_export::{ExportJob, HttpFetcher, JobEvent, NormalizeOptions, OutputFormat};
use card_layout::{
    CardPreset, CropMarks, Deck, DeckStore, FlipMode, Orientation, PageSize, SheetSettings,
    SideMode, calculate_statistics, serialize_ydk,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::mpsc;
use url::Url;

const DEFAULT_RELAY_URL: &str = "http://localhost:3000/img";

#[derive(Parser)]
#[command(name = "cardt", about = "Card sheet tools CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out cards on sheets and write PDF and/or DOCX files
    Export {
        #[command(flatten)]
        deck: DeckArgs,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Output format
        #[arg(long, default_value = "pdf", value_enum)]
        format: FormatArg,

        /// Relay endpoint used when a remote image can't be fetched directly
        #[arg(long, default_value = DEFAULT_RELAY_URL)]
        relay: Url,

        /// Don't retry failed remote images through the relay
        #[arg(long)]
        no_relay: bool,

        /// Images loaded at the same time
        #[arg(long, default_value = "8")]
        max_in_flight: usize,

        /// Show statistics only, don't write files
        #[arg(long)]
        stats_only: bool,
    },

    /// Show page and card counts
    Stats {
        #[command(flatten)]
        deck: DeckArgs,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Write the cards that have an id as a flat text deck
    YdkExport {
        #[command(flatten)]
        deck: DeckArgs,

        /// Output .ydk file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Manage saved decks
    Deck {
        /// Directory holding saved decks
        #[arg(long, default_value = "decks")]
        store: PathBuf,

        #[command(subcommand)]
        action: DeckAction,
    },

    /// Run the image relay
    Relay {
        /// Address to listen on
        #[arg(long, default_value = card_relay::DEFAULT_BIND)]
        bind: SocketAddr,
    },
}

#[derive(Subcommand)]
enum DeckAction {
    /// Save (or overwrite) a deck
    Save {
        name: String,
        #[command(flatten)]
        deck: DeckArgs,
    },
    /// Write a saved deck as deck JSON
    Load {
        name: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List saved decks, most recent first
    List,
    Rename { old_name: String, new_name: String },
    Delete { name: String },
    /// Add cards that aren't in the saved deck yet
    Merge {
        name: String,
        #[command(flatten)]
        deck: DeckArgs,
    },
}

#[derive(Args)]
struct DeckArgs {
    /// Inputs: deck .json, .ydk, image files or directories of images
    #[arg(short, long, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Direct image links to add
    #[arg(long, num_args = 1..)]
    url: Vec<String>,

    /// Shared back image (path or URL)
    #[arg(long)]
    back: Option<String>,
}

#[derive(Args)]
struct SettingsArgs {
    /// Settings JSON file; flags below override it
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long, value_enum)]
    preset: Option<PresetArg>,

    /// Card width in mm (implies the custom preset)
    #[arg(long)]
    card_width: Option<f32>,

    /// Card height in mm (implies the custom preset)
    #[arg(long)]
    card_height: Option<f32>,

    #[arg(long, value_enum)]
    paper: Option<PaperArg>,

    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Page margin in mm
    #[arg(long)]
    margin: Option<f32>,

    /// Gap between cards in mm
    #[arg(long)]
    gap: Option<f32>,

    /// Bleed around each card in mm
    #[arg(long)]
    bleed: Option<f32>,

    #[arg(long, value_enum)]
    crop_marks: Option<CropArg>,

    /// Print cards at their nominal size even if the grid overflows
    #[arg(long)]
    no_auto_fit: bool,

    #[arg(long, value_enum)]
    sides: Option<SidesArg>,

    #[arg(long, value_enum)]
    flip: Option<FlipArg>,

    /// Output file name without extension
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    columns: Option<usize>,

    #[arg(long)]
    rows: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Docx,
    Both,
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    Standard,
    Small,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A4,
    Letter,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

#[derive(Clone, Copy, ValueEnum)]
enum CropArg {
    None,
    Short,
    Full,
}

#[derive(Clone, Copy, ValueEnum)]
enum SidesArg {
    FrontOnly,
    BackOnly,
    FrontBack,
}

#[derive(Clone, Copy, ValueEnum)]
enum FlipArg {
    None,
    Short,
    Long,
}

impl FormatArg {
    fn formats(self) -> Vec<OutputFormat> {
        match self {
            FormatArg::Pdf => vec![OutputFormat::Pdf],
            FormatArg::Docx => vec![OutputFormat::Docx],
            FormatArg::Both => vec![OutputFormat::Pdf, OutputFormat::Docx],
        }
    }
}

impl From<PresetArg> for CardPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Standard => Self::Standard,
            PresetArg::Small => Self::Small,
        }
    }
}

impl From<PaperArg> for PageSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A4 => Self::A4,
            PaperArg::Letter => Self::Letter,
        }
    }
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

impl From<CropArg> for CropMarks {
    fn from(arg: CropArg) -> Self {
        match arg {
            CropArg::None => Self::None,
            CropArg::Short => Self::Short,
            CropArg::Full => Self::Full,
        }
    }
}

impl From<SidesArg> for SideMode {
    fn from(arg: SidesArg) -> Self {
        match arg {
            SidesArg::FrontOnly => Self::FrontOnly,
            SidesArg::BackOnly => Self::BackOnly,
            SidesArg::FrontBack => Self::FrontBack,
        }
    }
}

impl From<FlipArg> for FlipMode {
    fn from(arg: FlipArg) -> Self {
        match arg {
            FlipArg::None => Self::None,
            FlipArg::Short => Self::Short,
            FlipArg::Long => Self::Long,
        }
    }
}

impl SettingsArgs {
    /// Settings file (or the deck's own settings) with flag overrides applied
    async fn resolve(&self, base: SheetSettings) -> Result<SheetSettings> {
        let mut settings = match &self.settings {
            Some(path) => SheetSettings::load(path)
                .await
                .with_context(|| format!("Failed to load settings {}", path.display()))?,
            None => base,
        };

        if let Some(preset) = self.preset {
            settings.card_preset = preset.into();
        }
        if let Some(width) = self.card_width {
            settings.card_preset = CardPreset::Custom;
            settings.card_width_mm = width;
        }
        if let Some(height) = self.card_height {
            settings.card_preset = CardPreset::Custom;
            settings.card_height_mm = height;
        }
        if let Some(paper) = self.paper {
            settings.page_size = paper.into();
        }
        if let Some(orientation) = self.orientation {
            settings.orientation = orientation.into();
        }
        if let Some(margin) = self.margin {
            settings.margin_mm = margin;
        }
        if let Some(gap) = self.gap {
            settings.gap_mm = gap;
        }
        if let Some(bleed) = self.bleed {
            settings.bleed_mm = bleed;
        }
        if let Some(crop) = self.crop_marks {
            settings.crop_marks = crop.into();
        }
        if self.no_auto_fit {
            settings.auto_fit = false;
        }
        if let Some(sides) = self.sides {
            settings.side_mode = sides.into();
        }
        if let Some(flip) = self.flip {
            settings.flip_mode = flip.into();
        }
        if let Some(name) = &self.name {
            settings.file_name = name.clone();
        }
        if let Some(columns) = self.columns {
            settings.columns = columns;
        }
        if let Some(rows) = self.rows {
            settings.rows = rows;
        }

        settings.validate()?;
        Ok(settings)
    }
}

impl DeckArgs {
    async fn load(&self) -> Result<Deck> {
        if self.input.is_empty() && self.url.is_empty() {
            bail!("No input given (use --input or --url)");
        }
        let mut deck = input::load_deck(&self.input, &self.url).await?;
        if let Some(back) = &self.back {
            deck.back_image = Some(input::parse_back(back)?);
        }
        Ok(deck)
    }
}

async fn load_with_settings(deck: &DeckArgs, settings: &SettingsArgs) -> Result<Deck> {
    let mut loaded = deck.load().await?;
    loaded.settings = settings.resolve(loaded.settings.clone()).await?;
    Ok(loaded)
}

fn print_statistics(deck: &Deck) -> Result<()> {
    let stats = calculate_statistics(deck)?;
    println!("Sheet Statistics:");
    println!("  Unique cards: {}", stats.unique_cards);
    println!("  Total prints: {}", stats.total_prints);
    println!("  Cards per page: {}", stats.slots_per_page);
    println!("  Front pages: {}", stats.front_pages);
    println!("  Back pages: {}", stats.back_pages);
    println!("  Empty cells on last page: {}", stats.empty_cells_last_page);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            deck,
            settings,
            output_dir,
            format,
            relay,
            no_relay,
            max_in_flight,
            stats_only,
        } => {
            let deck = load_with_settings(&deck, &settings).await?;
            print_statistics(&deck)?;
            if stats_only {
                return Ok(());
            }

            let job = ExportJob::new(&deck, &format.formats())?;
            let options = NormalizeOptions {
                relay: (!no_relay).then_some(relay),
                max_in_flight,
            };

            let (tx, mut rx) = mpsc::unbounded_channel();
            let reporter = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match event {
                        JobEvent::State(state) => log::debug!("Export stage: {:?}", state),
                        JobEvent::ImageProgress { current, total } => {
                            log::info!("Loaded images {}/{}", current, total)
                        }
                        JobEvent::MissingImages { count } => {
                            log::warn!("{} image(s) could not be loaded and were left blank", count)
                        }
                        JobEvent::Error { message } => log::error!("Export failed: {}", message),
                    }
                }
            });

            let fetcher = HttpFetcher::new()?;
            let result = job.run(&fetcher, &options, Some(tx)).await;
            reporter.await?;
            let output = result?;

            tokio::fs::create_dir_all(&output_dir).await?;
            let paths = output
                .save_all(&output_dir, &job.settings().file_name)
                .await?;
            for path in paths {
                println!("Exported → {}", path.display());
            }
            if output.missing > 0 {
                println!("  Missing images: {}", output.missing);
            }
        }

        Commands::Stats { deck, settings } => {
            let deck = load_with_settings(&deck, &settings).await?;
            print_statistics(&deck)?;
        }

        Commands::YdkExport { deck, output } => {
            let deck = deck.load().await?;
            let text = serialize_ydk(&deck.cards)?;
            tokio::fs::write(&output, text).await?;
            println!("Wrote deck → {}", output.display());
        }

        Commands::Deck { store, action } => {
            let store = DeckStore::open(store).await?;
            match action {
                DeckAction::Save { name, deck } => {
                    let deck = deck.load().await?;
                    store.save(&name, &deck).await?;
                    println!("Saved deck {:?} ({} cards)", name, deck.cards.len());
                }
                DeckAction::Load { name, output } => {
                    let deck = store.load(&name).await?;
                    deck.save(&output).await?;
                    println!("Wrote deck {:?} → {}", name, output.display());
                }
                DeckAction::List => {
                    for summary in store.list().await? {
                        println!(
                            "{}  {} cards, {} prints  (updated {})",
                            summary.name,
                            summary.unique_cards,
                            summary.total_prints,
                            summary.updated_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
                DeckAction::Rename { old_name, new_name } => {
                    store.rename(&old_name, &new_name).await?;
                    println!("Renamed {:?} → {:?}", old_name, new_name);
                }
                DeckAction::Delete { name } => {
                    store.delete(&name).await?;
                    println!("Deleted {:?}", name);
                }
                DeckAction::Merge { name, deck } => {
                    let deck = deck.load().await?;
                    let added = store.merge(&name, &deck).await?;
                    if added == 0 {
                        println!("No new cards for {:?}", name);
                    } else {
                        println!("Added {} new card(s) to {:?}", added, name);
                    }
                }
            }
        }

        Commands::Relay { bind } => {
            card_relay::run(bind).await?;
        }
    }

    Ok(())
}

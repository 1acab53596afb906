use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use clap::Parser;

use visual_tags_core::capture::domain::image_source::{ImageSource, SourceKind};
use visual_tags_core::capture::domain::tag_session::TagSession;
use visual_tags_core::capture::infrastructure::file_image_source::FileImageSource;
use visual_tags_core::capture::infrastructure::slot_image_store::SlotImageStore;
use visual_tags_core::capture::infrastructure::unavailable_image_source::UnavailableImageSource;
use visual_tags_core::config::service_config::ServiceConfig;
use visual_tags_core::pipeline::capture_use_case::{CaptureOptions, CaptureOutcome, CaptureUseCase};
use visual_tags_core::pipeline::pipeline_logger::LogPipelineLogger;
use visual_tags_core::pipeline::presentation::Presenter;
use visual_tags_core::recognition::domain::visual_recognizer::VisualRecognizer;
use visual_tags_core::recognition::infrastructure::recorded_recognizer::RecordedVisualRecognizer;
use visual_tags_core::recognition::infrastructure::watson_recognizer::WatsonVisualRecognizer;
use visual_tags_core::shared::constants::{DEFAULT_REQUEST_TIMEOUT, IMAGE_EXTENSIONS};
use visual_tags_core::shared::error::ApplicationError;
use visual_tags_core::shared::tag::Tag;

const BAR_WIDTH: f64 = 20.0;

/// Tag a photo with a visual recognition service.
#[derive(Parser)]
#[command(name = "visual-tags")]
struct Cli {
    /// Photo to classify.
    #[arg(required_unless_present = "camera")]
    image: Option<PathBuf>,

    /// Capture from the camera instead of a file.
    #[arg(long, conflicts_with = "image")]
    camera: bool,

    /// Credentials file (default: <config dir>/Visual Tags/credentials.json).
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Language for class names (sent as Accept-Language).
    #[arg(long)]
    locale: Option<String>,

    /// Give up on the service after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Skip face detection.
    #[arg(long)]
    no_faces: bool,

    /// Replay recorded responses from this directory instead of calling the service.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Show percentages instead of labels.
    #[arg(long)]
    scores: bool,
}

/// Prints alerts to stderr; tag output is rendered once the capture returns.
struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn tags_changed(&self, tags: &[Tag]) {
        log::debug!("{} tags on screen", tags.len());
    }

    fn busy_changed(&self, busy: bool) {
        if busy {
            eprintln!("Analyzing photo...");
        }
    }

    fn show_alert(&self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    match run().await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the capture failed after its alert was shown.
async fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let (recognizer, options) = build_recognizer(&cli)?;
    let store = SlotImageStore::temporary()?;
    log::debug!("Capture slot at {}", store.slot_path().display());

    let use_case = CaptureUseCase::new(
        recognizer,
        Box::new(store),
        Arc::new(ConsolePresenter),
        options,
    )
    .with_logger(Box::new(LogPipelineLogger::new()));

    let source: Box<dyn ImageSource> = if cli.camera {
        Box::new(UnavailableImageSource::new(SourceKind::Camera))
    } else {
        Box::new(FileImageSource::new(cli.image.clone()))
    };

    let result = use_case.capture(source).await;
    use_case.log_summary();

    match result {
        Ok(CaptureOutcome::Tagged(_)) => {
            let session = use_case.session();
            let mut session = session.write().unwrap_or_else(PoisonError::into_inner);
            session.show_all_scores(cli.scores);
            print_tags(&session);
            Ok(true)
        }
        Ok(CaptureOutcome::SourceCancelled) | Ok(CaptureOutcome::Cancelled) => {
            log::info!("No photo analyzed");
            Ok(true)
        }
        Err(e) => {
            log::debug!("Capture failed: {e:?}");
            Ok(false)
        }
    }
}

fn build_recognizer(
    cli: &Cli,
) -> Result<(Box<dyn VisualRecognizer>, CaptureOptions), Box<dyn std::error::Error>> {
    let timeout = cli
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

    if let Some(dir) = &cli.replay {
        log::info!("Replaying recorded responses from {}", dir.display());
        let options = CaptureOptions {
            detect_faces: !cli.no_faces,
            timeout,
        };
        return Ok((Box::new(RecordedVisualRecognizer::new(dir)), options));
    }

    let mut config = ServiceConfig::load(cli.credentials.as_deref()).map_err(|e| {
        log::error!("{e}");
        ApplicationError::from(e)
    })?;
    if let Some(locale) = &cli.locale {
        config.locale = locale.clone();
    }
    config.timeout = timeout;
    config.detect_faces = !cli.no_faces;

    let options = CaptureOptions::from(&config);
    log::info!("Using visual recognition service at {}", config.service_url);
    Ok((Box::new(WatsonVisualRecognizer::new(config)?), options))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(image) = &cli.image {
        if !image.exists() {
            return Err(format!("Input file not found: {}", image.display()).into());
        }
        if !is_image(image) {
            return Err(format!(
                "Unsupported image type: {} (expected one of {})",
                image.display(),
                IMAGE_EXTENSIONS.join(", ")
            )
            .into());
        }
    }
    if cli.timeout_secs == Some(0) {
        return Err("Timeout must be at least 1 second".into());
    }
    if let Some(dir) = &cli.replay {
        if !dir.is_dir() {
            return Err(format!("Replay directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn print_tags(session: &TagSession) {
    for (index, tag) in session.tags().iter().enumerate() {
        let text = session.displayed_text(index).unwrap_or_default();
        let bar = "#".repeat((tag.opacity() * BAR_WIDTH).round() as usize);
        println!("{text:<32} {bar}");
    }
}

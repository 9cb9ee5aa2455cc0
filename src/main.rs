use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use traffic_sign_detector::host::{self, TerminalHost};
use traffic_sign_detector::media::ffmpeg::FfmpegBackend;
use traffic_sign_detector::playback::PlaybackDriver;
use traffic_sign_detector::{Job, JobOutcome, MediaKind, Settings, VideoBackend, Worker};

#[derive(Parser)]
#[command(name = "traffic-sign-detector")]
#[command(about = "Highlight traffic signs in images and videos")]
struct Cli {
    /// Path to input image or video file
    #[arg(value_name = "MEDIA")]
    media_path: PathBuf,

    /// Treat the input as this kind instead of guessing from the extension
    #[arg(long, value_enum)]
    kind: Option<MediaKind>,

    /// Settings file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for hit snapshots (cleared before each video run)
    #[arg(long, value_name = "DIR")]
    scratch_dir: Option<PathBuf>,

    /// Directory for result files
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Do not replay the result video
    #[arg(long)]
    no_playback: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(dir) = args.scratch_dir {
        settings.scratch_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        settings.output_dir = dir;
    }
    if args.no_playback {
        settings.playback.enabled = false;
    }

    let backend: Arc<dyn VideoBackend> =
        Arc::new(FfmpegBackend::new().with_video_codec(settings.video_codec.clone()));
    let playback = settings
        .playback
        .enabled
        .then(|| Arc::new(settings.playback_driver(Arc::clone(&backend))) as Arc<dyn PlaybackDriver>);

    let worker = Worker::new(settings.pipeline_context(backend));
    let mut ui = TerminalHost::new(playback);

    let (observer, events) = host::channel();
    let job = Job::for_path(args.media_path, args.kind);
    let handle = worker.submit(job, observer);

    host::run_event_loop(events, &mut ui).await;
    let outcome = handle.await?;
    ui.wait_for_playback();

    if let JobOutcome::Video(Some(summary)) = &outcome {
        println!(
            "Processed {} frames, {} with signs ({} snapshots in {}) in {:.1}s",
            summary.frames_read,
            summary.hit_frames,
            summary.snapshots_written,
            worker.context().scratch_dir.display(),
            summary.elapsed.as_secs_f64()
        );
    }

    Ok(if outcome.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

use anyhow::{bail, Context};
use clap::Parser;
use motion_watch::{
    spawn_capture, EngineConfig, FrameGrabber, MaskImage, MotionEngine, Rect, DEFAULT_CAPTURE_FPS,
    MAX_CAPTURE_FPS,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Replays a directory of still frames through the motion engine and logs the tracked blobs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory of frames (png/jpg/bmp), processed in file name order.
    frames_dir: PathBuf,
    /// Rate at which the capture task reads frames.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_FPS, value_parser = fps_parser())]
    capture_fps: u32,
    /// Rate at which the engine ticks.
    #[arg(long, default_value_t = 60, value_parser = fps_parser())]
    tick_fps: u32,
    #[arg(long, default_value_t = 25)]
    rows: usize,
    #[arg(long, default_value_t = 25)]
    cols: usize,
    #[arg(long, default_value_t = 2)]
    num_blobs: usize,
    #[arg(long, default_value_t = 15)]
    threshold: u8,
    #[arg(long, default_value_t = 4)]
    min_blob_size: usize,
    #[arg(long, default_value_t = 80)]
    max_blob_size: usize,
    /// Furthest a track may jump between ticks, in screen pixels.
    #[arg(long, default_value_t = 200.0)]
    max_distance: f64,
    /// Milliseconds to wait after start-up before detecting.
    #[arg(long, default_value_t = 250.0)]
    warmup_ms: f64,
    /// Optional mask image; black (zero red) areas are ignored.
    #[arg(long)]
    mask: Option<PathBuf>,
    /// Screen size tracks are reported in; defaults to the frame size.
    #[arg(long, value_names = ["WIDTH", "HEIGHT"], num_args = 2)]
    screen: Option<Vec<u32>>,
}

/// Rates are capped where the tick period would round down to zero.
fn fps_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=MAX_CAPTURE_FPS as i64)
}

struct DirectoryGrabber {
    paths: std::vec::IntoIter<PathBuf>,
    size: (u32, u32),
}

impl FrameGrabber for DirectoryGrabber {
    type Frame = image::RgbaImage;

    fn grab(&mut self) -> motion_watch::Result<Option<image::RgbaImage>> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };
        let frame = image::open(&path)?.to_rgba8();
        if frame.dimensions() == self.size {
            Ok(Some(frame))
        } else {
            Ok(Some(image::imageops::resize(
                &frame,
                self.size.0,
                self.size.1,
                image::imageops::FilterType::Triangle,
            )))
        }
    }
}

fn frame_paths(dir: &PathBuf) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "bmp"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // --- 1. Frame discovery ---
    let paths = frame_paths(&cli.frames_dir)?;
    let Some(first) = paths.first() else {
        bail!("no frames found in {}", cli.frames_dir.display());
    };
    let (width, height) = image::image_dimensions(first)
        .with_context(|| format!("reading dimensions of {}", first.display()))?;

    // --- 2. Engine initialization ---
    let (screen_width, screen_height) = match cli.screen.as_deref() {
        Some([w, h]) => (*w, *h),
        _ => (width, height),
    };
    let config = EngineConfig {
        rows: cli.rows,
        cols: cli.cols,
        num_blobs: cli.num_blobs,
        threshold: cli.threshold,
        min_blob_size: cli.min_blob_size,
        max_blob_size: cli.max_blob_size,
        max_blob_distance: cli.max_distance,
        warmup_ms: cli.warmup_ms,
        window_width: width,
        window_height: height,
        screen_width,
        screen_height,
        ..Default::default()
    };
    let mut engine = MotionEngine::new(config)?;
    if let Some(mask_path) = &cli.mask {
        let mask = MaskImage::open(mask_path, width, height)?;
        engine.set_mask(Rect::new(0, 0, width as i32, height as i32), Some(&mask))?;
    }

    // --- 3. Capture ---
    info!(frames = paths.len(), width, height, "replaying frames");
    let grabber = DirectoryGrabber {
        paths: paths.into_iter(),
        size: (width, height),
    };
    let capture = spawn_capture(grabber, cli.capture_fps)?;
    let mailbox = capture.mailbox();

    // --- 4. Main loop ---
    let tick_ms = 1000.0 / cli.tick_fps as f64;
    let mut ticker = tokio::time::interval(Duration::from_micros(1_000_000 / cli.tick_fps as u64));
    loop {
        ticker.tick().await;
        let finished = capture.is_finished() && mailbox.is_empty();
        let tick = engine.ticks() + 1;
        let tracks = engine.tick(&mailbox, tick_ms)?;
        for track in tracks {
            info!(
                tick,
                id = track.id,
                cells = track.blob.size(),
                x = track.center.x,
                y = track.center.y,
                vx = track.velocity.x,
                vy = track.velocity.y,
                "track"
            );
        }
        if finished {
            break;
        }
    }

    let stats = capture.stop().await?;
    info!(
        ticks = engine.ticks(),
        captured = stats.frames_captured,
        dropped = stats.frames_dropped,
        "replay complete"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

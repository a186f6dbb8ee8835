//! Run the mixing pipeline from the terminal.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use colmix_common::config::MixerDefaults;
use colmix_compositor::{FrameSink, LatestFrameSink};
use colmix_engine::MixerControl;
use colmix_frame::{MixedFrame, PixelLayout};

pub struct MixOptions {
    pub duration: Option<f64>,
    pub snapshot: Option<PathBuf>,
    pub overlay: bool,
}

/// Keeps the newest frame for the snapshot and, with the overlay enabled,
/// prints the source dimensions whenever they change.
struct TerminalSink {
    latest: LatestFrameSink,
    overlay: bool,
    last_overlay: Mutex<String>,
}

impl FrameSink for TerminalSink {
    fn render(&self, mixed: MixedFrame) {
        if self.overlay {
            let text = mixed.metadata.overlay_text();
            let mut last = self
                .last_overlay
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if *last != text {
                println!("[overlay] {text}");
                *last = text;
            }
        }
        self.latest.render(mixed);
    }
}

pub async fn run(
    source1: PathBuf,
    source2: PathBuf,
    defaults: MixerDefaults,
    options: MixOptions,
) -> anyhow::Result<()> {
    let duration = run_duration(options.duration)?;

    println!("Mixing sources");
    println!("  1: {}", source1.display());
    println!("  2: {}", source2.display());
    println!("  Take timeout: {} ms", defaults.take_timeout_ms);
    println!("  Image FPS: {}", defaults.image_fps);
    println!();

    let sink = Arc::new(TerminalSink {
        latest: LatestFrameSink::new(),
        overlay: options.overlay,
        last_overlay: Mutex::new(String::new()),
    });
    let mut control = MixerControl::new(defaults, sink.clone());
    control.load_source1(source1);
    control.load_source2(source2);

    if !control
        .start_mixing()
        .context("Failed to start mixing")?
    {
        anyhow::bail!("Mixing did not start");
    }

    match duration {
        Some(limit) => println!(
            "Mixing for {:.1}s (Ctrl+C to stop early)...",
            limit.as_secs_f64()
        ),
        None => println!("Press Ctrl+C to stop mixing..."),
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let deadline = tokio::time::sleep(duration.unwrap_or_default());
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res?;
                println!();
                break;
            }
            _ = &mut deadline, if duration.is_some() => break,
            _ = ticker.tick() => {
                if let Some(stats) = control.stats() {
                    tracing::info!(
                        uptime_secs = stats.uptime_secs,
                        output_fps = stats.output_fps(),
                        composited = stats.compositor.cycles_composited,
                        skipped = stats.compositor.cycles_skipped,
                        source1_frames = stats.sources[0].stats.frames_emitted,
                        source2_frames = stats.sources[1].stats.frames_emitted,
                        "Mixer stats"
                    );
                }
            }
        }
    }

    let final_stats = control.stats();
    control.stop_all();

    if let Some(stats) = final_stats {
        println!("Mixed {} frames", stats.compositor.cycles_composited);
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    if let Some(path) = options.snapshot {
        let mixed = sink
            .latest
            .latest()
            .context("No mixed frame was produced; nothing to snapshot")?;
        save_png(&mixed, &path)?;
        println!("Snapshot saved to: {}", path.display());
    }

    Ok(())
}

/// Parse `--duration` seconds. Rejects values that are negative, not finite,
/// or too large for a `Duration`.
fn run_duration(secs: Option<f64>) -> anyhow::Result<Option<Duration>> {
    let Some(secs) = secs else {
        return Ok(None);
    };
    if !secs.is_finite() || secs < 0.0 {
        anyhow::bail!("--duration must be a finite, non-negative number of seconds (got {secs})");
    }
    let limit = Duration::try_from_secs_f64(secs)
        .with_context(|| format!("--duration {secs} is too large"))?;
    if limit > MAX_RUN_DURATION {
        anyhow::bail!(
            "--duration {secs} exceeds the maximum of {} seconds",
            MAX_RUN_DURATION.as_secs()
        );
    }
    Ok(Some(limit))
}

/// One year.
const MAX_RUN_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn save_png(mixed: &MixedFrame, path: &std::path::Path) -> anyhow::Result<()> {
    let frame = mixed.frame.clone().into_layout(PixelLayout::Rgb);
    let (width, height) = frame.dimensions();
    let image = image::RgbImage::from_raw(width, height, frame.into_data())
        .context("Mixed frame does not match its dimensions")?;
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

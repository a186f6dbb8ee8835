//! Report how an input path will be read.

use std::path::PathBuf;

use colmix_common::clock::effective_fps;
use colmix_common::config::MixerDefaults;
use colmix_frame::MediaKind;
use colmix_media_source::{load_image_frame, FrameReader, GstFrameReader};

pub fn run(path: PathBuf, defaults: &MixerDefaults) -> anyhow::Result<()> {
    let kind = MediaKind::classify_with(&path, &defaults.video_extensions);
    println!("Path: {}", path.display());

    match kind {
        MediaKind::Video => {
            println!("Kind: video (looping, decoded with GStreamer)");
            let mut reader = GstFrameReader::open(&path)?;
            let dimensions = match reader.dimensions() {
                Some(dims) => Some(dims),
                None => reader.read_frame().map(|f| f.dimensions()),
            };
            match dimensions {
                Some((w, h)) => println!("Dimensions: {w}x{h}"),
                None => println!("Dimensions: unknown"),
            }
            match reader.fps() {
                Some(fps) => println!("Reported FPS: {fps:.3}"),
                None => println!("Reported FPS: none"),
            }
            println!(
                "Pacing FPS: {:.3}",
                effective_fps(reader.fps(), defaults.fallback_video_fps)
            );
        }
        MediaKind::Image => {
            println!("Kind: still image (repeated)");
            let frame = load_image_frame(&path)?;
            println!("Dimensions: {}x{}", frame.width(), frame.height());
            println!("Repeat FPS: {}", defaults.image_fps);
        }
    }

    Ok(())
}

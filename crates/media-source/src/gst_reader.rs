//! GStreamer-backed video reader.
//!
//! Decodes any container GStreamer can demux into packed BGR frames pulled
//! synchronously from an `appsink`:
//!
//! ```text
//! filesrc ! decodebin ! videoconvert ! video/x-raw,format=BGR ! appsink
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use colmix_common::error::{ColmixError, ColmixResult};
use colmix_frame::{Frame, PixelLayout, CHANNELS};
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;

use crate::reader::FrameReader;

/// Elements the decoding pipeline cannot run without.
pub const REQUIRED_ELEMENTS: [&str; 4] = ["filesrc", "decodebin", "videoconvert", "appsink"];

const APPSINK_NAME: &str = "colmix_sink";

/// Longest wait for the pipeline to preroll on open.
const PREROLL_TIMEOUT_SECS: u64 = 10;

/// Longest wait for one decoded frame before it counts as a read failure.
const PULL_TIMEOUT_MS: u64 = 1000;

pub struct GstFrameReader {
    path: PathBuf,
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
    fps: Option<f64>,
    dimensions: Option<(u32, u32)>,
}

impl GstFrameReader {
    /// Open `path` and preroll the pipeline so the negotiated size and frame
    /// rate are known before the first read.
    pub fn open(path: &Path) -> ColmixResult<Self> {
        init_gstreamer()?;

        if !path.exists() {
            return Err(ColmixError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let launch = format!(
            "filesrc location=\"{}\" ! decodebin ! videoconvert ! video/x-raw,format=BGR ! appsink name={APPSINK_NAME} sync=false max-buffers=2 drop=false",
            escape_path(path)
        );
        let element = gst::parse::launch(&launch)
            .map_err(|e| ColmixError::media(format!("Failed to build decode pipeline: {e}")))?;
        let pipeline = element
            .dynamic_cast::<gst::Pipeline>()
            .map_err(|_| ColmixError::media("Launch string did not produce a pipeline"))?;
        let appsink = pipeline
            .by_name(APPSINK_NAME)
            .and_then(|elem| elem.downcast::<gst_app::AppSink>().ok())
            .ok_or_else(|| ColmixError::media("Decode pipeline has no appsink"))?;

        // From here on, Drop returns the pipeline to Null on every error path.
        let mut reader = Self {
            path: path.to_path_buf(),
            pipeline,
            appsink,
            fps: None,
            dimensions: None,
        };

        reader.set_state(gst::State::Paused)?;
        match reader
            .pipeline
            .state(gst::ClockTime::from_seconds(PREROLL_TIMEOUT_SECS))
        {
            (Ok(_), gst::State::Paused, _) => {}
            (Ok(_), state, _) => {
                tracing::warn!(
                    path = %reader.path.display(),
                    ?state,
                    "Decode pipeline did not preroll within timeout"
                );
            }
            (Err(_), _, _) => {
                return Err(ColmixError::media(format!(
                    "Failed to open {}: {}",
                    reader.path.display(),
                    reader.bus_error().unwrap_or_else(|| "state change failed".to_string())
                )));
            }
        }

        if let Some(sample) = reader
            .appsink
            .try_pull_preroll(gst::ClockTime::from_seconds(PREROLL_TIMEOUT_SECS))
        {
            if let Some(info) = sample
                .caps()
                .and_then(|caps| gst_video::VideoInfo::from_caps(caps).ok())
            {
                reader.dimensions = Some((info.width(), info.height()));
                reader.fps = fraction_to_fps(info.fps());
            }
        }

        reader.set_state(gst::State::Playing)?;

        tracing::debug!(
            path = %reader.path.display(),
            fps = ?reader.fps,
            dimensions = ?reader.dimensions,
            "Decode pipeline opened"
        );
        Ok(reader)
    }

    fn set_state(&self, state: gst::State) -> ColmixResult<()> {
        self.pipeline.set_state(state).map_err(|e| {
            ColmixError::media(format!(
                "Failed to set {} pipeline to {state:?}: {e:?}",
                self.path.display()
            ))
        })?;
        Ok(())
    }

    /// First error message waiting on the bus, if any.
    fn bus_error(&self) -> Option<String> {
        let bus = self.pipeline.bus()?;
        let msg = bus.pop_filtered(&[gst::MessageType::Error])?;
        match msg.view() {
            gst::MessageView::Error(e) => Some(e.error().to_string()),
            _ => None,
        }
    }
}

impl FrameReader for GstFrameReader {
    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    fn read_frame(&mut self) -> Option<Frame> {
        let sample = self
            .appsink
            .try_pull_sample(gst::ClockTime::from_mseconds(PULL_TIMEOUT_MS))?;
        match sample_to_frame(&sample) {
            Ok(frame) => {
                self.dimensions = Some(frame.dimensions());
                Some(frame)
            }
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Dropping unreadable sample");
                None
            }
        }
    }

    fn rewind(&mut self) -> ColmixResult<()> {
        self.pipeline
            .seek_simple(
                gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
                gst::ClockTime::ZERO,
            )
            .map_err(|e| {
                ColmixError::media(format!("Failed to rewind {}: {e}", self.path.display()))
            })
    }
}

impl Drop for GstFrameReader {
    fn drop(&mut self) {
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            tracing::warn!(path = %self.path.display(), error = ?e, "Failed to release decode pipeline");
        }
    }
}

/// Copy a BGR sample into a tightly packed frame, dropping row padding.
fn sample_to_frame(sample: &gst::Sample) -> ColmixResult<Frame> {
    let caps = sample
        .caps()
        .ok_or_else(|| ColmixError::media("Sample has no caps"))?;
    let info = gst_video::VideoInfo::from_caps(caps)
        .map_err(|e| ColmixError::media(format!("Unusable sample caps: {e}")))?;
    let buffer = sample
        .buffer()
        .ok_or_else(|| ColmixError::media("Sample has no buffer"))?;
    let map = buffer
        .map_readable()
        .map_err(|e| ColmixError::media(format!("Failed to map sample buffer: {e}")))?;

    let (width, height) = (info.width(), info.height());
    let stride = info.stride()[0] as usize;
    let offset = info.offset()[0];
    let row_bytes = width as usize * CHANNELS;
    let raw = map.as_slice();

    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = offset + row * stride;
        let line = raw
            .get(start..start + row_bytes)
            .ok_or_else(|| ColmixError::media("Sample buffer shorter than its caps"))?;
        data.extend_from_slice(line);
    }
    Frame::new(width, height, PixelLayout::Bgr, data)
}

fn fraction_to_fps(fraction: gst::Fraction) -> Option<f64> {
    if fraction.denom() == 0 || fraction.numer() <= 0 {
        return None;
    }
    Some(fraction.numer() as f64 / fraction.denom() as f64)
}

/// Initialize GStreamer once per process.
pub fn init_gstreamer() -> ColmixResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(ColmixError::media(format!(
            "Failed to initialize GStreamer: {e}"
        ))),
    }
}

/// GStreamer runtime version string.
pub fn gstreamer_version() -> ColmixResult<String> {
    init_gstreamer()?;
    Ok(gst::version_string().to_string())
}

/// Required elements that the GStreamer registry does not provide.
pub fn missing_elements() -> ColmixResult<Vec<&'static str>> {
    init_gstreamer()?;
    Ok(REQUIRED_ELEMENTS
        .iter()
        .copied()
        .filter(|name| gst::ElementFactory::find(name).is_none())
        .collect())
}

fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_path_quotes_double_quotes() {
        assert_eq!(
            escape_path(Path::new("/media/my \"clip\".mp4")),
            "/media/my \\\"clip\\\".mp4"
        );
    }

    #[test]
    fn test_fraction_to_fps_rejects_unreported_rates() {
        assert_eq!(fraction_to_fps(gst::Fraction::new(0, 1)), None);
        let fps = fraction_to_fps(gst::Fraction::new(30000, 1001)).unwrap();
        assert!((fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_open_missing_file_fails_before_touching_gstreamer_pipeline() {
        let path = std::env::temp_dir().join("colmix_missing_clip_does_not_exist.mp4");
        match GstFrameReader::open(&path) {
            Err(ColmixError::FileNotFound { path: missing }) => assert_eq!(missing, path),
            // GStreamer itself may be unavailable on the test machine.
            Err(ColmixError::Media { message }) => {
                assert!(message.contains("initialize GStreamer"))
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("missing file must not open"),
        }
    }
}

//! Session statistics snapshots.

use std::path::PathBuf;

use colmix_compositor::CompositorStats;
use colmix_frame::{ChannelStats, MediaKind};
use colmix_media_source::SourceStats;
use serde::Serialize;

/// Point-in-time counters for one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// Controller-assigned session number, starting at 1.
    pub session_id: u64,
    /// Wall-clock start time (RFC 3339).
    pub started_at: String,
    /// Seconds since the session started.
    pub uptime_secs: f64,
    pub sources: [SourceReport; 2],
    pub channels: [ChannelStats; 2],
    pub compositor: CompositorStats,
}

/// Counters for one source, with what it is reading.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub path: PathBuf,
    pub kind: MediaKind,
    #[serde(flatten)]
    pub stats: SourceStats,
}

impl SessionStats {
    /// Mixed frames delivered per second of uptime.
    pub fn output_fps(&self) -> f64 {
        if self.uptime_secs <= 0.0 {
            return 0.0;
        }
        self.compositor.cycles_composited as f64 / self.uptime_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionStats {
        let report = |name: &str| SourceReport {
            name: name.to_string(),
            path: PathBuf::from("clip.mp4"),
            kind: MediaKind::Video,
            stats: SourceStats {
                frames_emitted: 60,
                rewinds: 1,
            },
        };
        SessionStats {
            session_id: 1,
            started_at: "2026-01-01T00:00:00Z".to_string(),
            uptime_secs: 2.0,
            sources: [report("source1"), report("source2")],
            channels: [ChannelStats::default(), ChannelStats::default()],
            compositor: CompositorStats {
                cycles_composited: 50,
                cycles_skipped: 2,
            },
        }
    }

    #[test]
    fn test_output_fps_uses_uptime() {
        assert!((sample().output_fps() - 25.0).abs() < 1e-9);
        let idle = SessionStats {
            uptime_secs: 0.0,
            ..sample()
        };
        assert_eq!(idle.output_fps(), 0.0);
    }

    #[test]
    fn test_source_stats_are_flattened_in_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["sources"][0]["frames_emitted"], 60);
        assert_eq!(json["sources"][1]["name"], "source2");
        assert_eq!(json["compositor"]["cycles_composited"], 50);
    }
}

//! Stream status values

use crate::error::StreamingError;

/// Point-in-time bitrate sample taken while publishing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamMetrics {
    /// Estimated video bitrate (bits/sec)
    pub video_bitrate: u64,
    /// Estimated audio bitrate (bits/sec)
    pub audio_bitrate: u64,
}

impl StreamMetrics {
    pub fn new(video_bitrate: u64, audio_bitrate: u64) -> Self {
        Self {
            video_bitrate,
            audio_bitrate,
        }
    }

    /// Video bitrate in kbps
    pub fn video_kbps(&self) -> u64 {
        self.video_bitrate / 1000
    }

    /// Audio bitrate in kbps
    pub fn audio_kbps(&self) -> u64 {
        self.audio_bitrate / 1000
    }
}

/// Status of the streaming session
///
/// Equality is coarse: two `Live` values compare equal regardless of their
/// metrics, so a metrics refresh is never mistaken for a state change. Use
/// [`StreamStatus::metrics`] to compare samples.
#[derive(Debug, Clone, Copy, Default)]
pub enum StreamStatus {
    #[default]
    Idle,
    Connecting,
    Live(Option<StreamMetrics>),
    Stopped,
    Failed(StreamingError),
}

impl PartialEq for StreamStatus {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StreamStatus::Idle, StreamStatus::Idle)
            | (StreamStatus::Connecting, StreamStatus::Connecting)
            | (StreamStatus::Live(_), StreamStatus::Live(_))
            | (StreamStatus::Stopped, StreamStatus::Stopped) => true,
            (StreamStatus::Failed(a), StreamStatus::Failed(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for StreamStatus {}

impl StreamStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, StreamStatus::Idle)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, StreamStatus::Connecting)
    }

    pub fn is_live(&self) -> bool {
        matches!(self, StreamStatus::Live(_))
    }

    pub fn is_live_or_connecting(&self) -> bool {
        matches!(self, StreamStatus::Live(_) | StreamStatus::Connecting)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, StreamStatus::Stopped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StreamStatus::Failed(_))
    }

    /// States from which a new attempt may begin
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            StreamStatus::Idle | StreamStatus::Stopped | StreamStatus::Failed(_)
        )
    }

    /// Latest metrics sample, if live and sampled
    pub fn metrics(&self) -> Option<StreamMetrics> {
        match self {
            StreamStatus::Live(metrics) => *metrics,
            _ => None,
        }
    }

    /// Failure reason, if failed
    pub fn error(&self) -> Option<StreamingError> {
        match self {
            StreamStatus::Failed(error) => Some(*error),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error().map(|e| e.message())
    }

    /// Short label for display
    pub fn title(&self) -> &'static str {
        match self {
            StreamStatus::Idle => "Idle",
            StreamStatus::Connecting => "Connecting",
            StreamStatus::Live(_) => "LIVE",
            StreamStatus::Stopped => "Stopped",
            StreamStatus::Failed(_) => "Failed",
        }
    }
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamStatus::Failed(error) => write!(f, "Failed ({})", error),
            other => f.write_str(other.title()),
        }
    }
}

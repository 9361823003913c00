//! Error types
//!
//! Failures are never returned from the manager's operations. They travel
//! through the status feed as `StreamStatus::Failed(StreamingError)`.

use thiserror::Error;

/// Which capture permission was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    Microphone,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Camera => write!(f, "camera"),
            Permission::Microphone => write!(f, "microphone"),
        }
    }
}

/// Reason a streaming attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum StreamingError {
    #[error("Camera unavailable")]
    CameraUnavailable,

    #[error("Microphone unavailable")]
    MicrophoneUnavailable,

    #[error("Permission denied: {0}")]
    PermissionDenied(Permission),

    #[error("RTMP connection failed")]
    RtmpConnectionFailed,

    #[error("RTMP publish failed")]
    RtmpPublishFailed,

    #[error("Encoder initialization failed")]
    EncoderInitializationFailed,

    #[error("Already streaming")]
    AlreadyStreaming,

    #[error("Not streaming")]
    NotStreaming,

    #[error("Unknown streaming error")]
    Unknown,
}

impl StreamingError {
    /// User-facing explanation of the failure
    pub fn message(&self) -> &'static str {
        match self {
            StreamingError::CameraUnavailable => "No camera is available on this device",
            StreamingError::MicrophoneUnavailable => "No microphone is available on this device",
            StreamingError::PermissionDenied(Permission::Camera) => {
                "Camera access was denied"
            }
            StreamingError::PermissionDenied(Permission::Microphone) => {
                "Microphone access was denied"
            }
            StreamingError::RtmpConnectionFailed => {
                "Could not connect to the server. Check the URL and your network"
            }
            StreamingError::RtmpPublishFailed => {
                "The server rejected the stream. Check the stream key"
            }
            StreamingError::EncoderInitializationFailed => "The encoder could not be started",
            StreamingError::AlreadyStreaming => "A stream is already running",
            StreamingError::NotStreaming => "No stream is running",
            StreamingError::Unknown => "Something went wrong",
        }
    }
}

/// Error parsing a publish URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("URL is empty")]
    Empty,

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Missing host")]
    MissingHost,

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Missing application name")]
    MissingApp,

    #[error("No stream key in configuration or URL")]
    MissingStreamKey,
}

//! Camera preview surface
//!
//! The preview is owned by the UI. The session only keeps a weak handle and
//! pushes frames while the surface is still alive.

use std::sync::{Arc, Weak};

use bytes::Bytes;

/// A captured video frame for on-screen preview
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Capture timestamp in milliseconds
    pub timestamp: u32,
    pub width: u32,
    pub height: u32,
    /// Pixel data (reference counted, shared with the encoder)
    pub data: Bytes,
}

/// Receives preview frames
pub trait PreviewSink: Send + Sync {
    fn push_frame(&self, frame: VideoFrame);
}

/// Non-owning reference to a preview surface
#[derive(Clone)]
pub struct PreviewHandle {
    sink: Weak<dyn PreviewSink>,
}

impl PreviewHandle {
    pub fn new(sink: Weak<dyn PreviewSink>) -> Self {
        Self { sink }
    }

    /// Convenience for callers holding the strong reference
    pub fn from_arc(sink: &Arc<dyn PreviewSink>) -> Self {
        Self {
            sink: Arc::downgrade(sink),
        }
    }

    /// Deliver a frame. Returns false if the surface no longer exists.
    pub fn push(&self, frame: VideoFrame) -> bool {
        match self.sink.upgrade() {
            Some(sink) => {
                sink.push_frame(frame);
                true
            }
            None => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.sink.strong_count() > 0
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

//! Publishing transport seam
//!
//! The wire protocol and the encoders belong to an external SDK. The session
//! talks to it through these traits, injected at construction: the host
//! application provides the live binding, tests use [`crate::testing`].
//!
//! ```text
//!   Transport::create_session(sink)
//!        │
//!        ├──► Box<dyn Connection>     connect(url) / close()
//!        └──► Box<dyn PublishStream>  publish(key) / close() / devices / bitrates
//!
//!   SDK callbacks ──► sink.emit(TransportEvent) ──► session listener
//! ```

pub mod event;
pub mod preview;

pub use event::{TransportEvent, TransportEventSink};
pub use preview::{PreviewHandle, PreviewSink, VideoFrame};

use crate::client::config::EncoderSettings;
use crate::device::CaptureDevice;
use crate::status::StreamMetrics;

/// Factory for connection/stream pairs
pub trait Transport: Send + Sync + 'static {
    /// Create a network connection and the publish stream layered on it.
    ///
    /// Every callback for this pair must be reported through `events`.
    fn create_session(
        &self,
        events: TransportEventSink,
    ) -> (Box<dyn Connection>, Box<dyn PublishStream>);
}

/// Network connection to the ingest server
pub trait Connection: Send {
    /// Begin connecting. Completion is reported through the event sink.
    fn connect(&mut self, url: &str);

    fn close(&mut self);
}

/// Media publish stream on top of a [`Connection`]
pub trait PublishStream: Send {
    /// Apply encoder settings before anything is attached
    fn configure(&mut self, settings: &EncoderSettings);

    /// Attach a camera, or detach with `None`
    fn attach_camera(&mut self, camera: Option<&CaptureDevice>);

    /// Attach a microphone, or detach with `None`
    fn attach_microphone(&mut self, microphone: Option<&CaptureDevice>);

    fn set_video_muted(&mut self, muted: bool);

    fn set_audio_muted(&mut self, muted: bool);

    /// Route captured frames to a preview surface, or stop with `None`
    fn set_preview(&mut self, preview: Option<PreviewHandle>);

    /// Begin publishing. Completion is reported through the event sink.
    fn publish(&mut self, stream_key: &str);

    fn close(&mut self);

    /// Current estimated output bitrates
    fn bitrates(&self) -> StreamMetrics;
}

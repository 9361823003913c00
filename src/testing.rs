//! Test doubles for the transport and device seams
//!
//! [`MockTransport`] records every call the session makes and lets a test
//! play the SDK's part by emitting status events. [`MockDevices`] exposes
//! switchable device availability.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::client::config::EncoderSettings;
use crate::device::{CameraPosition, CaptureDevice, DeviceProvider};
use crate::status::StreamMetrics;
use crate::transport::{
    Connection, PreviewHandle, PublishStream, Transport, TransportEvent, TransportEventSink,
    VideoFrame,
};

/// Everything recorded for one connection/stream pair
#[derive(Debug, Clone)]
pub struct MockSession {
    pub handle_id: u64,
    pub settings: Option<EncoderSettings>,
    pub connect_urls: Vec<String>,
    pub published_keys: Vec<String>,
    pub camera: Option<CaptureDevice>,
    pub camera_attach_count: usize,
    pub microphone: Option<CaptureDevice>,
    pub video_muted: bool,
    pub audio_muted: bool,
    pub preview: Option<PreviewHandle>,
    pub stream_closed: bool,
    pub connection_closed: bool,
    /// Number of `Connection::close` calls
    pub close_count: usize,
    sink: TransportEventSink,
}

#[derive(Default)]
struct MockState {
    sessions: Vec<MockSession>,
    bitrates: StreamMetrics,
}

/// Recording transport
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connection/stream pairs created so far
    pub fn session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn session(&self, index: usize) -> Option<MockSession> {
        self.state.lock().sessions.get(index).cloned()
    }

    pub fn last_session(&self) -> Option<MockSession> {
        self.state.lock().sessions.last().cloned()
    }

    pub fn sessions(&self) -> Vec<MockSession> {
        self.state.lock().sessions.clone()
    }

    /// Total connect calls across all sessions
    pub fn connect_count(&self) -> usize {
        self.state
            .lock()
            .sessions
            .iter()
            .map(|s| s.connect_urls.len())
            .sum()
    }

    /// Bitrates reported by every stream
    pub fn set_bitrates(&self, metrics: StreamMetrics) {
        self.state.lock().bitrates = metrics;
    }

    /// Emit an event from the most recent session
    pub fn emit(&self, event: TransportEvent) -> bool {
        let sink = self.state.lock().sessions.last().map(|s| s.sink.clone());
        sink.is_some_and(|sink| sink.emit(event))
    }

    /// Emit a raw status code from the most recent session
    pub fn emit_code(&self, code: &str) -> bool {
        let sink = self.state.lock().sessions.last().map(|s| s.sink.clone());
        sink.is_some_and(|sink| sink.emit_code(code))
    }

    /// Emit an event from a specific, possibly discarded, session
    pub fn emit_from(&self, index: usize, event: TransportEvent) -> bool {
        let sink = self.state.lock().sessions.get(index).map(|s| s.sink.clone());
        sink.is_some_and(|sink| sink.emit(event))
    }

    /// Push a frame to the most recent session's preview, if any
    pub fn push_preview_frame(&self, frame: VideoFrame) -> bool {
        let preview = self
            .state
            .lock()
            .sessions
            .last()
            .and_then(|s| s.preview.clone());
        preview.is_some_and(|p| p.push(frame))
    }
}

impl Transport for MockTransport {
    fn create_session(
        &self,
        events: TransportEventSink,
    ) -> (Box<dyn Connection>, Box<dyn PublishStream>) {
        let mut state = self.state.lock();
        let index = state.sessions.len();

        state.sessions.push(MockSession {
            handle_id: events.handle_id(),
            settings: None,
            connect_urls: Vec::new(),
            published_keys: Vec::new(),
            camera: None,
            camera_attach_count: 0,
            microphone: None,
            video_muted: false,
            audio_muted: false,
            preview: None,
            stream_closed: false,
            connection_closed: false,
            close_count: 0,
            sink: events,
        });

        let connection = MockConnection {
            index,
            state: Arc::clone(&self.state),
        };
        let stream = MockPublishStream {
            index,
            state: Arc::clone(&self.state),
        };

        (Box::new(connection), Box::new(stream))
    }
}

struct MockConnection {
    index: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    fn with<R>(&self, f: impl FnOnce(&mut MockSession) -> R) -> Option<R> {
        self.state.lock().sessions.get_mut(self.index).map(f)
    }
}

impl Connection for MockConnection {
    fn connect(&mut self, url: &str) {
        self.with(|s| s.connect_urls.push(url.to_string()));
    }

    fn close(&mut self) {
        self.with(|s| {
            s.connection_closed = true;
            s.close_count += 1;
        });
    }
}

struct MockPublishStream {
    index: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockPublishStream {
    fn with<R>(&self, f: impl FnOnce(&mut MockSession) -> R) -> Option<R> {
        self.state.lock().sessions.get_mut(self.index).map(f)
    }
}

impl PublishStream for MockPublishStream {
    fn configure(&mut self, settings: &EncoderSettings) {
        self.with(|s| s.settings = Some(settings.clone()));
    }

    fn attach_camera(&mut self, camera: Option<&CaptureDevice>) {
        self.with(|s| {
            if camera.is_some() {
                s.camera_attach_count += 1;
            }
            s.camera = camera.cloned();
        });
    }

    fn attach_microphone(&mut self, microphone: Option<&CaptureDevice>) {
        self.with(|s| s.microphone = microphone.cloned());
    }

    fn set_video_muted(&mut self, muted: bool) {
        self.with(|s| s.video_muted = muted);
    }

    fn set_audio_muted(&mut self, muted: bool) {
        self.with(|s| s.audio_muted = muted);
    }

    fn set_preview(&mut self, preview: Option<PreviewHandle>) {
        self.with(|s| s.preview = preview);
    }

    fn publish(&mut self, stream_key: &str) {
        self.with(|s| s.published_keys.push(stream_key.to_string()));
    }

    fn close(&mut self) {
        self.with(|s| s.stream_closed = true);
    }

    fn bitrates(&self) -> StreamMetrics {
        self.state.lock().bitrates
    }
}

#[derive(Debug)]
struct DeviceAvailability {
    front_camera: bool,
    back_camera: bool,
    microphone: bool,
}

/// Device provider with switchable availability
#[derive(Clone)]
pub struct MockDevices {
    state: Arc<Mutex<DeviceAvailability>>,
}

impl MockDevices {
    /// Both cameras and a microphone present
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceAvailability {
                front_camera: true,
                back_camera: true,
                microphone: true,
            })),
        }
    }

    pub fn set_camera_available(&self, position: CameraPosition, available: bool) {
        let mut state = self.state.lock();
        match position {
            CameraPosition::Front => state.front_camera = available,
            CameraPosition::Back => state.back_camera = available,
        }
    }

    pub fn set_microphone_available(&self, available: bool) {
        self.state.lock().microphone = available;
    }
}

impl Default for MockDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceProvider for MockDevices {
    fn default_camera(&self, position: CameraPosition) -> Option<CaptureDevice> {
        let state = self.state.lock();
        let available = match position {
            CameraPosition::Front => state.front_camera,
            CameraPosition::Back => state.back_camera,
        };
        available.then(|| {
            CaptureDevice::camera(
                format!("camera-{}", position),
                format!("Mock {} camera", position),
                position,
            )
        })
    }

    fn default_microphone(&self) -> Option<CaptureDevice> {
        self.state
            .lock()
            .microphone
            .then(|| CaptureDevice::microphone("mic-0", "Mock microphone"))
    }
}

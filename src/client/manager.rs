//! Streaming session manager
//!
//! High-level API for publishing a live camera/microphone stream.

use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, oneshot};

use super::config::{SessionConfig, StreamConfiguration};
use crate::device::{CameraPosition, DeviceProvider, ToggleState};
use crate::session::actor::{Command, SessionActor, SessionSnapshot};
use crate::status::{StatusBroadcaster, StatusSubscription, StreamStatus};
use crate::transport::{PreviewHandle, PreviewSink, Transport};

/// Streaming session manager
///
/// Cheap to clone; every clone drives the same session. Operations return
/// once the session has updated its local state. Network outcomes arrive
/// later through [`StreamManager::statuses`]. Misuse such as starting twice
/// or stopping while idle is absorbed silently.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use rtmp_live::client::{StreamConfiguration, StreamManager};
/// use rtmp_live::testing::{MockDevices, MockTransport};
///
/// # async fn example() {
/// let manager = StreamManager::new(
///     Arc::new(MockTransport::new()),
///     Arc::new(MockDevices::new()),
/// );
///
/// let mut statuses = manager.statuses();
/// tokio::spawn(async move {
///     while let Some(status) = statuses.recv().await {
///         println!("Status: {}", status);
///     }
/// });
///
/// manager
///     .start(StreamConfiguration::new("rtmp://localhost/live", "stream_key"))
///     .await;
/// # }
/// ```
#[derive(Clone)]
pub struct StreamManager {
    commands: mpsc::Sender<Command>,
    status: Arc<StatusBroadcaster>,
}

impl StreamManager {
    /// Create a manager with default configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(transport: Arc<dyn Transport>, devices: Arc<dyn DeviceProvider>) -> Self {
        Self::with_config(transport, devices, SessionConfig::default())
    }

    /// Create a manager with custom configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_config(
        transport: Arc<dyn Transport>,
        devices: Arc<dyn DeviceProvider>,
        config: SessionConfig,
    ) -> Self {
        let status = Arc::new(StatusBroadcaster::new(StreamStatus::Idle));
        let (commands, _task) =
            SessionActor::spawn(transport, devices, Arc::clone(&status), config);

        Self { commands, status }
    }

    /// Begin a streaming attempt.
    ///
    /// Ignored unless the session is idle, stopped or failed.
    pub async fn start(&self, config: StreamConfiguration) {
        self.request(|respond_to| Command::Start { config, respond_to })
            .await;
    }

    /// End the running attempt and prepare a fresh session handle.
    ///
    /// Ignored unless an attempt is connecting or live.
    pub async fn stop(&self) {
        self.request(|respond_to| Command::Stop { respond_to }).await;
    }

    /// Switch cameras. A missing camera fails the session instead of
    /// returning an error.
    pub async fn set_camera_position(&self, position: CameraPosition) {
        self.request(|respond_to| Command::SetCameraPosition {
            position,
            respond_to,
        })
        .await;
    }

    /// Mute or unmute the microphone
    pub async fn set_microphone_enabled(&self, enabled: bool) {
        self.request(|respond_to| Command::SetMicrophoneEnabled {
            enabled,
            respond_to,
        })
        .await;
    }

    /// Turn the camera on or off
    pub async fn set_camera_enabled(&self, enabled: bool) {
        self.request(|respond_to| Command::SetCameraEnabled {
            enabled,
            respond_to,
        })
        .await;
    }

    /// Route preview frames to a surface the caller owns
    pub async fn attach_preview(&self, preview: Weak<dyn PreviewSink>) {
        let preview = Some(PreviewHandle::new(preview));
        self.request(|respond_to| Command::SetPreview {
            preview,
            respond_to,
        })
        .await;
    }

    /// Stop routing preview frames
    pub async fn detach_preview(&self) {
        self.request(|respond_to| Command::SetPreview {
            preview: None,
            respond_to,
        })
        .await;
    }

    /// Subscribe to status updates.
    ///
    /// The first value is the status at the time of the call.
    pub fn statuses(&self) -> StatusSubscription {
        self.status.subscribe()
    }

    /// Most recently published status
    pub fn status(&self) -> StreamStatus {
        self.status.current()
    }

    /// Number of live status subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.status.subscriber_count()
    }

    /// Current input configuration
    pub async fn toggles(&self) -> Option<ToggleState> {
        self.snapshot().await.map(|s| s.toggles)
    }

    /// Identity of the current session handle
    pub async fn handle_id(&self) -> Option<u64> {
        self.snapshot().await.map(|s| s.handle_id)
    }

    /// Consistent view of status, toggles and handle
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.request(|respond_to| Command::GetSnapshot { respond_to })
            .await
    }

    /// Stop sampling, close the session handle and end all subscriptions
    pub async fn shutdown(&self) {
        self.request(|respond_to| Command::Shutdown { respond_to })
            .await;
    }

    /// Check whether the session actor is still running
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (tx, rx) = oneshot::channel();

        if self.commands.send(make(tx)).await.is_err() {
            tracing::debug!("Session actor is gone");
            return None;
        }

        rx.await.ok()
    }
}

impl std::fmt::Debug for StreamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamManager")
            .field("status", &self.status.current())
            .field("running", &self.is_running())
            .finish()
    }
}

//! Session handle
//!
//! One connection plus the publish stream layered on it. Created together,
//! closed together, replaced as a unit after every attempt so protocol
//! state never carries over.

use secrecy::ExposeSecret;

use crate::client::config::{EncoderSettings, PublishTarget};
use crate::device::binder::Bindings;
use crate::device::{DeviceBinder, DeviceError, DeviceKind, ToggleState};
use crate::status::StreamMetrics;
use crate::transport::{Connection, PreviewHandle, PublishStream, Transport, TransportEventSink};

pub(crate) struct SessionHandle {
    id: u64,
    connection: Box<dyn Connection>,
    stream: Box<dyn PublishStream>,
    bindings: Bindings,
    connected: bool,
    closed: bool,
}

impl SessionHandle {
    /// Create the connection/stream pair and apply encoder settings
    pub(crate) fn open(
        transport: &dyn Transport,
        sink: TransportEventSink,
        encoder: &EncoderSettings,
        preview: Option<PreviewHandle>,
    ) -> Self {
        let id = sink.handle_id();
        let (connection, mut stream) = transport.create_session(sink);

        stream.configure(encoder);
        stream.set_preview(preview);

        tracing::debug!(handle_id = id, "Session handle opened");

        Self {
            id,
            connection,
            stream,
            bindings: Bindings::default(),
            connected: false,
            closed: false,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Whether `connect` has been issued on this handle
    pub(crate) fn is_connected(&self) -> bool {
        self.connected
    }

    #[cfg(test)]
    pub(crate) fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Attach devices according to `toggles`
    pub(crate) fn bind_devices(
        &mut self,
        binder: &DeviceBinder,
        toggles: &ToggleState,
    ) -> Result<(), DeviceError> {
        binder.bind(self.stream.as_mut(), &mut self.bindings, toggles)
    }

    pub(crate) fn sync_camera(
        &mut self,
        binder: &DeviceBinder,
        toggles: &ToggleState,
    ) -> Result<(), DeviceError> {
        binder.sync_camera(self.stream.as_mut(), &mut self.bindings.camera, toggles)
    }

    pub(crate) fn sync_microphone(
        &mut self,
        binder: &DeviceBinder,
        toggles: &ToggleState,
    ) -> Result<(), DeviceError> {
        binder.sync_microphone(self.stream.as_mut(), &mut self.bindings.microphone, toggles)
    }

    /// Forget a device that went away so the next bind resolves it again
    pub(crate) fn release(&mut self, kind: DeviceKind) {
        match kind {
            DeviceKind::Camera => {
                if self.bindings.camera.take().is_some() {
                    self.stream.attach_camera(None);
                }
            }
            DeviceKind::Microphone => {
                if self.bindings.microphone.take().is_some() {
                    self.stream.attach_microphone(None);
                }
            }
        }
        tracing::debug!(handle_id = self.id, device = ?kind, "Device binding released");
    }

    pub(crate) fn set_preview(&mut self, preview: Option<PreviewHandle>) {
        self.stream.set_preview(preview);
    }

    /// Issue connect and publish. Results arrive as transport events.
    pub(crate) fn connect(&mut self, target: &PublishTarget) {
        tracing::info!(
            handle_id = self.id,
            url = %target.connect_url,
            "Connecting"
        );

        self.connection.connect(&target.connect_url);
        self.stream.publish(target.stream_key.expose_secret());
        self.connected = true;
    }

    /// Current estimated bitrates
    pub(crate) fn metrics(&self) -> StreamMetrics {
        self.stream.bitrates()
    }

    /// Close the stream, then the connection
    pub(crate) fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.stream.set_preview(None);
        self.stream.close();
        self.connection.close();

        tracing::debug!(handle_id = self.id, "Session handle closed");
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! Device binding
//!
//! Brings a publish stream's attached devices in line with the current
//! [`ToggleState`]. Resolution failures come back as [`DeviceError`], which
//! the session folds into its state machine as an unavailable event.

use std::sync::Arc;

use thiserror::Error;

use super::{CameraPosition, CaptureDevice, DeviceProvider, ToggleState};
use crate::client::config::CameraOffPolicy;
use crate::transport::PublishStream;

/// A capture device could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("No {0} camera available")]
    CameraUnavailable(CameraPosition),

    #[error("No microphone available")]
    MicrophoneUnavailable,
}

/// Devices currently attached to one publish stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    pub camera: Option<CaptureDevice>,
    pub microphone: Option<CaptureDevice>,
}

/// Resolves devices and attaches them to publish streams
#[derive(Clone)]
pub struct DeviceBinder {
    provider: Arc<dyn DeviceProvider>,
    camera_off: CameraOffPolicy,
}

impl DeviceBinder {
    pub fn new(provider: Arc<dyn DeviceProvider>, camera_off: CameraOffPolicy) -> Self {
        Self {
            provider,
            camera_off,
        }
    }

    pub fn camera_off_policy(&self) -> CameraOffPolicy {
        self.camera_off
    }

    /// Bind both devices. The camera is resolved first; a missing camera
    /// stops binding before the microphone is touched.
    pub fn bind(
        &self,
        stream: &mut dyn PublishStream,
        bindings: &mut Bindings,
        toggles: &ToggleState,
    ) -> Result<(), DeviceError> {
        self.sync_camera(stream, &mut bindings.camera, toggles)?;
        self.sync_microphone(stream, &mut bindings.microphone, toggles)
    }

    /// Attach, move or detach the camera to match `toggles`
    pub fn sync_camera(
        &self,
        stream: &mut dyn PublishStream,
        current: &mut Option<CaptureDevice>,
        toggles: &ToggleState,
    ) -> Result<(), DeviceError> {
        let wants_device =
            toggles.is_camera_enabled || self.camera_off == CameraOffPolicy::Mute;

        if !wants_device {
            if current.take().is_some() {
                stream.attach_camera(None);
                tracing::debug!("Camera detached");
            }
            return Ok(());
        }

        let position = toggles.camera_position();
        let bound_position = current.as_ref().and_then(|d| d.position);

        if bound_position != Some(position) {
            let camera = self
                .provider
                .default_camera(position)
                .ok_or(DeviceError::CameraUnavailable(position))?;

            stream.attach_camera(Some(&camera));
            tracing::debug!(camera = %camera.name, position = %position, "Camera attached");
            *current = Some(camera);
        }

        stream.set_video_muted(!toggles.is_camera_enabled);
        Ok(())
    }

    /// Attach the microphone if needed and apply the mute flag
    pub fn sync_microphone(
        &self,
        stream: &mut dyn PublishStream,
        current: &mut Option<CaptureDevice>,
        toggles: &ToggleState,
    ) -> Result<(), DeviceError> {
        if current.is_none() && toggles.is_microphone_enabled {
            let microphone = self
                .provider
                .default_microphone()
                .ok_or(DeviceError::MicrophoneUnavailable)?;

            stream.attach_microphone(Some(&microphone));
            tracing::debug!(microphone = %microphone.name, "Microphone attached");
            *current = Some(microphone);
        }

        stream.set_audio_muted(!toggles.is_microphone_enabled);
        Ok(())
    }
}

impl std::fmt::Debug for DeviceBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBinder")
            .field("camera_off", &self.camera_off)
            .finish_non_exhaustive()
    }
}

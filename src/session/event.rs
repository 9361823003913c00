//! State machine input vocabulary

use crate::device::{DeviceError, DeviceKind};
use crate::error::Permission;
use crate::transport::TransportEvent;

/// Event fed into the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ConnectionEstablished,
    ConnectionFailed,
    ConnectionClosed,
    PublishStarted,
    PublishRejected,
    PublishStopped,
    CameraUnavailable,
    MicrophoneUnavailable,
    PermissionDenied(Permission),
}

impl SessionEvent {
    /// The device this event reports as gone, if any
    pub fn lost_device(&self) -> Option<DeviceKind> {
        match self {
            SessionEvent::CameraUnavailable => Some(DeviceKind::Camera),
            SessionEvent::MicrophoneUnavailable => Some(DeviceKind::Microphone),
            _ => None,
        }
    }
}

impl From<TransportEvent> for SessionEvent {
    fn from(event: TransportEvent) -> Self {
        match event {
            TransportEvent::ConnectSuccess => SessionEvent::ConnectionEstablished,
            TransportEvent::ConnectFailed
            | TransportEvent::ConnectRejected
            | TransportEvent::ConnectInvalidApp => SessionEvent::ConnectionFailed,
            TransportEvent::ConnectClosed | TransportEvent::ConnectIdleTimeout => {
                SessionEvent::ConnectionClosed
            }
            TransportEvent::PublishStart => SessionEvent::PublishStarted,
            TransportEvent::PublishBadName => SessionEvent::PublishRejected,
            TransportEvent::PublishIdle => SessionEvent::PublishStopped,
            TransportEvent::CaptureLost(DeviceKind::Camera) => SessionEvent::CameraUnavailable,
            TransportEvent::CaptureLost(DeviceKind::Microphone) => {
                SessionEvent::MicrophoneUnavailable
            }
            TransportEvent::PermissionDenied(permission) => {
                SessionEvent::PermissionDenied(permission)
            }
        }
    }
}

impl From<DeviceError> for SessionEvent {
    fn from(error: DeviceError) -> Self {
        match error {
            DeviceError::CameraUnavailable(_) => SessionEvent::CameraUnavailable,
            DeviceError::MicrophoneUnavailable => SessionEvent::MicrophoneUnavailable,
        }
    }
}

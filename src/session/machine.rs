//! Session state machine
//!
//! Pure transition function. Side effects (broadcast, sampler lifecycle,
//! handle teardown) are applied by the session actor based on the result.
//!
//! | From       | Event                 | To                          |
//! |------------|-----------------------|-----------------------------|
//! | Idle       | ConnectionEstablished | Connecting                  |
//! | Connecting | PublishStarted        | Live(None)                  |
//! | Live       | ConnectionClosed      | Stopped                     |
//! | Connecting | ConnectionFailed      | Failed(RtmpConnectionFailed)|
//! | Connecting | PublishRejected       | Failed(RtmpPublishFailed)   |
//! | any        | CameraUnavailable     | Failed(CameraUnavailable)   |
//! | any        | MicrophoneUnavailable | Failed(MicrophoneUnavailable)|
//!
//! Every other pair is a no-op.

use super::event::SessionEvent;
use crate::error::StreamingError;
use crate::status::StreamStatus;

/// Compute the next status, or `None` if the event does not apply.
///
/// A result equal to `current` (e.g. a repeated device failure) is also
/// reported as `None`, so callers never broadcast a non-change.
pub fn transition(current: &StreamStatus, event: &SessionEvent) -> Option<StreamStatus> {
    let next = match (current, event) {
        (StreamStatus::Idle, SessionEvent::ConnectionEstablished) => StreamStatus::Connecting,
        (StreamStatus::Connecting, SessionEvent::PublishStarted) => StreamStatus::Live(None),
        (StreamStatus::Live(_), SessionEvent::ConnectionClosed) => StreamStatus::Stopped,
        (StreamStatus::Connecting, SessionEvent::ConnectionFailed) => {
            StreamStatus::Failed(StreamingError::RtmpConnectionFailed)
        }
        (StreamStatus::Connecting, SessionEvent::PublishRejected) => {
            StreamStatus::Failed(StreamingError::RtmpPublishFailed)
        }
        (_, SessionEvent::CameraUnavailable) => {
            StreamStatus::Failed(StreamingError::CameraUnavailable)
        }
        (_, SessionEvent::MicrophoneUnavailable) => {
            StreamStatus::Failed(StreamingError::MicrophoneUnavailable)
        }
        _ => return None,
    };

    if next == *current {
        None
    } else {
        Some(next)
    }
}

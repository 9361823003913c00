//! Transport callbacks
//!
//! The publishing SDK reports progress as RTMP status codes delivered on
//! whatever thread it owns. A [`TransportEventSink`] is handed to each
//! connection at creation; it never blocks and may be called from any thread.

use tokio::sync::mpsc;

use crate::device::DeviceKind;
use crate::error::Permission;

pub const CONNECT_SUCCESS: &str = "NetConnection.Connect.Success";
pub const CONNECT_FAILED: &str = "NetConnection.Connect.Failed";
pub const CONNECT_REJECTED: &str = "NetConnection.Connect.Rejected";
pub const CONNECT_INVALID_APP: &str = "NetConnection.Connect.InvalidApp";
pub const CONNECT_CLOSED: &str = "NetConnection.Connect.Closed";
pub const CONNECT_IDLE_TIMEOUT: &str = "NetConnection.Connect.IdleTimeOut";
pub const PUBLISH_START: &str = "NetStream.Publish.Start";
pub const PUBLISH_BAD_NAME: &str = "NetStream.Publish.BadName";
pub const PUBLISH_IDLE: &str = "NetStream.Publish.Idle";

/// Raw event reported by the transport or its capture pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    ConnectSuccess,
    ConnectFailed,
    ConnectRejected,
    ConnectInvalidApp,
    ConnectClosed,
    ConnectIdleTimeout,
    PublishStart,
    PublishBadName,
    PublishIdle,
    /// A capture device disappeared while attached
    CaptureLost(DeviceKind),
    /// The platform refused access to a capture device
    PermissionDenied(Permission),
}

impl TransportEvent {
    /// Parse an RTMP `onStatus` code
    ///
    /// Codes the session does not react to return `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        let event = match code {
            CONNECT_SUCCESS => TransportEvent::ConnectSuccess,
            CONNECT_FAILED => TransportEvent::ConnectFailed,
            CONNECT_REJECTED => TransportEvent::ConnectRejected,
            CONNECT_INVALID_APP => TransportEvent::ConnectInvalidApp,
            CONNECT_CLOSED => TransportEvent::ConnectClosed,
            CONNECT_IDLE_TIMEOUT => TransportEvent::ConnectIdleTimeout,
            PUBLISH_START => TransportEvent::PublishStart,
            PUBLISH_BAD_NAME => TransportEvent::PublishBadName,
            PUBLISH_IDLE => TransportEvent::PublishIdle,
            _ => return None,
        };
        Some(event)
    }

    /// The RTMP status code, for events that have one
    pub fn code(&self) -> Option<&'static str> {
        match self {
            TransportEvent::ConnectSuccess => Some(CONNECT_SUCCESS),
            TransportEvent::ConnectFailed => Some(CONNECT_FAILED),
            TransportEvent::ConnectRejected => Some(CONNECT_REJECTED),
            TransportEvent::ConnectInvalidApp => Some(CONNECT_INVALID_APP),
            TransportEvent::ConnectClosed => Some(CONNECT_CLOSED),
            TransportEvent::ConnectIdleTimeout => Some(CONNECT_IDLE_TIMEOUT),
            TransportEvent::PublishStart => Some(PUBLISH_START),
            TransportEvent::PublishBadName => Some(PUBLISH_BAD_NAME),
            TransportEvent::PublishIdle => Some(PUBLISH_IDLE),
            TransportEvent::CaptureLost(_) | TransportEvent::PermissionDenied(_) => None,
        }
    }
}

/// Transport event stamped with the session handle that produced it
#[derive(Debug, Clone, Copy)]
pub(crate) struct TaggedEvent {
    pub handle_id: u64,
    pub event: TransportEvent,
}

/// Callback entry point given to a transport connection
#[derive(Debug, Clone)]
pub struct TransportEventSink {
    handle_id: u64,
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl TransportEventSink {
    pub(crate) fn new(handle_id: u64, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self { handle_id, tx }
    }

    /// Report an event. Returns false once the session manager is gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.tx
            .send(TaggedEvent {
                handle_id: self.handle_id,
                event,
            })
            .is_ok()
    }

    /// Report a raw RTMP status code; unrecognized codes are ignored
    pub fn emit_code(&self, code: &str) -> bool {
        match TransportEvent::from_code(code) {
            Some(event) => self.emit(event),
            None => {
                tracing::trace!(handle_id = self.handle_id, code = code, "Ignoring status code");
                false
            }
        }
    }

    /// Id of the session handle this sink belongs to
    pub fn handle_id(&self) -> u64 {
        self.handle_id
    }
}

//! Live RTMP publishing session manager
//!
//! Drives one camera/microphone publishing session against an ingest
//! server: a status state machine, a connection/stream handle replaced
//! after every attempt, device binding from user toggles, periodic bitrate
//! sampling while live and an ordered status feed for any number of
//! observers.
//!
//! The wire protocol and encoders are provided by the host through the
//! [`transport::Transport`] and [`device::DeviceProvider`] traits.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use rtmp_live::{StreamConfiguration, StreamManager, StreamStatus};
//! use rtmp_live::testing::{MockDevices, MockTransport};
//!
//! # async fn example() {
//! let transport = MockTransport::new();
//! let manager = StreamManager::new(Arc::new(transport.clone()), Arc::new(MockDevices::new()));
//!
//! let mut statuses = manager.statuses();
//! assert_eq!(statuses.recv().await, Some(StreamStatus::Idle));
//!
//! manager
//!     .start(StreamConfiguration::new("rtmp://localhost/live", "key"))
//!     .await;
//! assert_eq!(statuses.recv().await, Some(StreamStatus::Connecting));
//! # }
//! ```

pub mod client;
pub mod device;
pub mod error;
pub mod session;
pub mod status;
pub mod testing;
pub mod transport;

pub use client::{SessionConfig, StreamConfiguration, StreamManager};
pub use device::{CameraPosition, ToggleState};
pub use error::StreamingError;
pub use status::{StatusSubscription, StreamMetrics, StreamStatus};

//! Session status and its broadcast feed

pub(crate) mod broadcaster;
pub mod value;

pub(crate) use broadcaster::StatusBroadcaster;
pub use broadcaster::StatusSubscription;
pub use value::{StreamMetrics, StreamStatus};

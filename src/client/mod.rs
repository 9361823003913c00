//! Publishing client
//!
//! [`StreamManager`] is the public entry point: start and stop streaming
//! attempts, flip input toggles and observe status.

pub mod config;
pub mod manager;

pub use config::{CameraOffPolicy, EncoderSettings, SessionConfig, StreamConfiguration};
pub use manager::StreamManager;

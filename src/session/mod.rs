//! Streaming session core
//!
//! - [`machine`] - pure status transition table
//! - [`event`] - state machine input vocabulary
//! - `handle` - connection/stream pair for one attempt
//! - `sampler` - live metrics ticker
//! - `actor` - the single owner of session state

pub(crate) mod actor;
pub mod event;
pub(crate) mod handle;
pub mod machine;
pub(crate) mod sampler;

pub use actor::SessionSnapshot;
pub use event::SessionEvent;
pub use machine::transition;

//! Progress events for driver generation runs
//!
//! This crate provides the event type pushed to operators while the external
//! CLI runs, and the per-run channel that carries it.

mod channel;
mod types;

pub use channel::{progress_channel, progress_channel_with_capacity, ProgressReceiver, ProgressSender};
pub use types::*;

//! Fixtures shared by the unit tests: store trees, endpoint documents and a
//! watcher that replays a fixed script of events.
mod common;
mod scripted_watcher;

pub use common::*;
pub use scripted_watcher::*;

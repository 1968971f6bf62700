//! Tether Reactor - Deferred delivery on a single logical thread
//!
//! This crate implements the reactor:
//! - FIFO queue of call tasks, safe for concurrent producers
//! - Process pass that drains one batch on the calling thread
//! - Per-task panic isolation
//! - Deadline-tracked callbacks swept during each pass
//! - Repeating tasks

mod deadline;
mod repeat;
pub mod reactor;
pub mod task;

pub use deadline::TrackedCallback;
pub use reactor::*;
pub use task::*;

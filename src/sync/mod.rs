//! Synchronization primitives for the pipeline core.
//!
//! [`gate::Gate`] is a manual-reset event; [`channel::Channel`] is the
//! bounded FIFO built on top of three gates. Both are designed around one
//! rule: a structural mutex is never held across a gate wait.

pub mod channel;
pub mod gate;

pub use channel::{Channel, ChannelError};
pub use gate::Gate;

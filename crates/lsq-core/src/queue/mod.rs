//! Queue module: the per-item dispatch unit and its outcome channel.
//!
//! The queue that owns ordering and concurrency lives outside this crate; it
//! hands each inbound message to a `DispatchUnit` and awaits the paired
//! `OutcomeFuture`.

mod channel;
mod item;
mod state;

pub use channel::{OutcomeChannel, OutcomeFuture, outcome_channel};
pub use item::DispatchUnit;
pub use state::DispatchState;

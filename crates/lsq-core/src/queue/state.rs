//! Dispatch state machine for one unit.

use serde::{Deserialize, Serialize};

/// Progress of a dispatch unit.
///
/// State transitions:
/// - NotStarted -> ContextMissing
/// - NotStarted -> HandlerMissing
/// - NotStarted -> Dispatched -> Completed | Canceled | Failed
/// - NotStarted -> Canceled | Failed (before anything was dispatched)
///
/// The state tracks what the unit did. The value callers see lives in the
/// outcome channel; a cancellation that lands first can make the two disagree
/// (e.g. `Dispatched` with a `Canceled` outcome while the handler winds down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispatchState {
    NotStarted,

    /// No context could be built; resolved per missing-context policy.
    ContextMissing,

    /// `execute` ran without a handler (usage-ordering violation).
    HandlerMissing,

    /// The handler has been invoked.
    Dispatched,

    Completed,
    Canceled,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, DispatchState::NotStarted | DispatchState::Dispatched)
    }
}

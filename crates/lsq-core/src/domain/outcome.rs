//! Outcome model: the terminal state of one dispatch unit.
//!
//! This module does not know about queues or transports. It only defines the
//! shape of what a caller awaiting a request eventually observes.

use serde::{Deserialize, Serialize};

use super::cancel::CancelReason;
use super::errors::DispatchError;

/// Classification of a terminal outcome.
///
/// Serialized as SCREAMING_SNAKE_CASE: COMPLETED / CANCELED / FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Completed,
    Canceled,
    Failed,
}

/// The value a completed unit produced.
///
/// Notifications never produce a response payload, they complete with `NoValue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Response {
    Value(serde_json::Value),
    NoValue,
}

impl Response {
    pub fn into_value(self) -> Option<serde_json::Value> {
        match self {
            Response::Value(v) => Some(v),
            Response::NoValue => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed(Response),
    Canceled(CancelReason),
    Failed(DispatchError),
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Completed(_) => OutcomeKind::Completed,
            Outcome::Canceled(_) => OutcomeKind::Canceled,
            Outcome::Failed(_) => OutcomeKind::Failed,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Outcome::Canceled(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Turn the outcome back into a `Result` so the caller can re-raise it in
    /// its own context.
    pub fn into_result(self) -> Result<Response, DispatchError> {
        match self {
            Outcome::Completed(response) => Ok(response),
            Outcome::Canceled(reason) => Err(DispatchError::Canceled(reason)),
            Outcome::Failed(err) => Err(err),
        }
    }
}

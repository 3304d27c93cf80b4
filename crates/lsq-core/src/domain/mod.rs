//! Domain model (outcomes, errors, cancellation, request identity).

pub mod cancel;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod request;

pub use self::cancel::{CancelReason, CancelSignal};
pub use self::errors::{ContextError, DispatchError, ErrorKind, HandlerError, codes};
pub use self::ids::UnitId;
pub use self::outcome::{Outcome, OutcomeKind, Response};
pub use self::request::{DEFAULT_LANGUAGE, MissingContextPolicy, RequestMetadata};

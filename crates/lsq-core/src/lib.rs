//! lsq-core
//!
//! Per-item dispatch for a language server's request queue.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（outcome, errors, cancel, request metadata, ids）
//! - **ports**: 抽象化レイヤー（ServiceLocator, ContextFactory, RequestLogger, TelemetryService）
//! - **queue**: DispatchUnit と outcome channel
//! - **typed**: 型付き Handler API（4 つの shape, HandlerKind, HandlerRegistry）
//! - **impls**: 実装（ServiceRegistry, TracingLogger, InMemoryTelemetry）
//! - **app**: アプリケーション層（RuntimeBuilder, Runtime, DispatchConfig）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;
pub mod typed;

#[cfg(test)]
mod testing;

pub use app::{BuildError, ConfigError, DispatchConfig, Runtime, RuntimeBuilder, Submission};
pub use domain::{
    CancelReason, CancelSignal, ContextError, DispatchError, ErrorKind, HandlerError,
    MissingContextPolicy, Outcome, OutcomeKind, RequestMetadata, Response, UnitId,
};
pub use queue::{DispatchState, DispatchUnit, OutcomeChannel, OutcomeFuture};
pub use typed::{
    HandlerKind, HandlerShape, NotificationHandler, ParameterlessNotificationHandler,
    ParameterlessRequestHandler, RequestHandler,
};

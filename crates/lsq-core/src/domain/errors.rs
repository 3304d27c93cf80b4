//! Errors - エラー型と分類
//!
//! `DispatchError` はディスパッチユニットの外へ出るすべての失敗を表します。
//! 呼び出し側には raise されず、必ず Outcome Channel 上の終端状態として届きます。

use thiserror::Error;

use super::cancel::CancelReason;

/// LSP (JSON-RPC) error codes used when an outcome is turned into a response.
pub mod codes {
    pub const INVALID_PARAMS: i64 = -32602;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const REQUEST_CANCELLED: i64 = -32800;
    pub const CONTENT_MODIFIED: i64 = -32801;
    pub const REQUEST_FAILED: i64 = -32803;
}

/// ErrorKind は失敗の運用分類
///
/// - Cancellation: 協調的キャンセル（エラーとしてはログしない）
/// - UnresolvableContext: 対象が解決できなかった（warning 扱い）
/// - Configuration: 配線ミス（factory 未登録、shape 不一致、呼び出し順序違反）
/// - Handler: handler 自身が返した / panic した失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Cancellation,
    UnresolvableContext,
    Configuration,
    Handler,
}

/// Failure raised by a handler implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The handler noticed the cancel signal and stopped.
    #[error("handler observed cancellation")]
    Canceled,

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }
}

/// Failure raised by a context factory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context construction observed cancellation")]
    Canceled,

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("request was canceled: {0}")]
    Canceled(CancelReason),

    #[error("could not resolve a request context for {method}")]
    ContextMissing { method: String },

    #[error("no context factory is registered; {method} cannot build a request context")]
    NoContextFactory { method: String },

    #[error("context factory failed for {method}: {message}")]
    ContextFactory { method: String, message: String },

    #[error("handler for {method} has shape {shape}, which does not fit this request")]
    UnrecognizedHandler { method: String, shape: String },

    #[error("execute was called for {method} before a handler was resolved")]
    HandlerMissing { method: String },

    #[error("no handler is registered for {method}")]
    MethodNotFound { method: String },

    #[error("handler for {method} failed: {source}")]
    Handler {
        method: String,
        #[source]
        source: HandlerError,
    },

    #[error("handler for {method} panicked: {message}")]
    Panicked { method: String, message: String },

    #[error("request {method} was dropped before it completed")]
    Abandoned { method: String },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Canceled(_) => ErrorKind::Cancellation,
            DispatchError::ContextMissing { .. } => ErrorKind::UnresolvableContext,
            DispatchError::NoContextFactory { .. }
            | DispatchError::UnrecognizedHandler { .. }
            | DispatchError::HandlerMissing { .. }
            | DispatchError::MethodNotFound { .. } => ErrorKind::Configuration,
            DispatchError::ContextFactory { .. }
            | DispatchError::Handler { .. }
            | DispatchError::Panicked { .. }
            | DispatchError::Abandoned { .. } => ErrorKind::Handler,
        }
    }

    /// JSON-RPC error code a transport layer would answer with.
    pub fn lsp_code(&self) -> i64 {
        match self {
            DispatchError::Canceled(reason) => reason.lsp_code(),
            DispatchError::ContextMissing { .. } => codes::REQUEST_FAILED,
            DispatchError::MethodNotFound { .. } => codes::METHOD_NOT_FOUND,
            DispatchError::Handler {
                source: HandlerError::InvalidParams(_),
                ..
            } => codes::INVALID_PARAMS,
            _ => codes::INTERNAL_ERROR,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.kind() == ErrorKind::Cancellation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::canceled(DispatchError::Canceled(CancelReason::RequestCancelled), ErrorKind::Cancellation)]
    #[case::missing(DispatchError::ContextMissing { method: "m".into() }, ErrorKind::UnresolvableContext)]
    #[case::no_factory(DispatchError::NoContextFactory { method: "m".into() }, ErrorKind::Configuration)]
    #[case::out_of_order(DispatchError::HandlerMissing { method: "m".into() }, ErrorKind::Configuration)]
    #[case::handler(
        DispatchError::Handler { method: "m".into(), source: HandlerError::failed("boom") },
        ErrorKind::Handler
    )]
    fn errors_are_classified(#[case] err: DispatchError, #[case] expected: ErrorKind) {
        assert_eq!(err.kind(), expected);
    }

    #[test]
    fn invalid_params_maps_to_its_own_code() {
        let err = DispatchError::Handler {
            method: "textDocument/hover".into(),
            source: HandlerError::InvalidParams("missing field `position`".into()),
        };
        assert_eq!(err.lsp_code(), codes::INVALID_PARAMS);
    }

    #[test]
    fn content_modified_keeps_its_code() {
        let err = DispatchError::Canceled(CancelReason::ContentModified);
        assert_eq!(err.lsp_code(), codes::CONTENT_MODIFIED);
        assert!(err.is_cancellation());
    }

    #[test]
    fn context_missing_names_the_method() {
        let err = DispatchError::ContextMissing {
            method: "textDocument/definition".into(),
        };
        assert!(err.to_string().contains("textDocument/definition"));
    }
}

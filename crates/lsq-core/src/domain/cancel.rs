//! Cooperative cancellation with a reason.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::errors::codes;

/// Why a request was asked to stop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum CancelReason {
    /// The client sent `$/cancelRequest`.
    RequestCancelled,
    /// The document changed underneath the request.
    ContentModified,
    ServerShutdown,
    Other(String),
}

impl CancelReason {
    pub fn lsp_code(&self) -> i64 {
        match self {
            CancelReason::ContentModified => codes::CONTENT_MODIFIED,
            _ => codes::REQUEST_CANCELLED,
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::RequestCancelled => f.write_str("request cancelled by client"),
            CancelReason::ContentModified => f.write_str("content modified"),
            CancelReason::ServerShutdown => f.write_str("server shutting down"),
            CancelReason::Other(detail) => f.write_str(detail),
        }
    }
}

/// CancelSignal は CancellationToken に「最初に与えられた理由」を添えたもの
///
/// - clone は同じ signal を共有する
/// - 理由は最初の `cancel_with` が勝つ（後続は無視）
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a token owned by someone else (e.g. the queue's shutdown token).
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            reason: Arc::new(OnceLock::new()),
        }
    }

    pub fn cancel(&self) {
        self.cancel_with(CancelReason::RequestCancelled);
    }

    pub fn cancel_with(&self, reason: CancelReason) {
        // 理由を先に書いてから fire する（watcher が理由を読めるように）
        // token が直接 cancel 済みなら理由は RequestCancelled で確定
        let reason = if self.token.is_cancelled() {
            CancelReason::RequestCancelled
        } else {
            reason
        };
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// The reason given when the signal fired. A token cancelled directly
    /// (without a reason) reports `RequestCancelled`.
    pub fn reason(&self) -> CancelReason {
        self.reason
            .get()
            .cloned()
            .unwrap_or(CancelReason::RequestCancelled)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

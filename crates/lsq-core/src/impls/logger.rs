//! TracingLogger - RequestLogger を tracing イベントに流す既定実装

use crate::domain::DispatchError;
use crate::ports::RequestLogger;

#[derive(Debug, Clone)]
pub struct TracingLogger {
    server: String,
}

impl TracingLogger {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
        }
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("lsq")
    }
}

impl RequestLogger for TracingLogger {
    fn log_start(&self, method: &str) {
        tracing::debug!(target: "lsq::request", server = %self.server, method, "request context started");
    }

    fn log_end(&self, method: &str) {
        tracing::debug!(target: "lsq::request", server = %self.server, method, "request context ended");
    }

    fn log_info(&self, message: &str) {
        tracing::info!(target: "lsq::request", server = %self.server, "{message}");
    }

    fn log_warning(&self, message: &str) {
        tracing::warn!(target: "lsq::request", server = %self.server, "{message}");
    }

    fn log_exception(&self, error: &DispatchError) {
        tracing::error!(
            target: "lsq::request",
            server = %self.server,
            code = error.lsp_code(),
            kind = ?error.kind(),
            "{error}"
        );
    }
}

//! Telemetry port - 実行スコープの計測
//!
//! scope は dispatch unit ごとに最大 1 つ。drop が「スコープの解放」です。

use crate::domain::DispatchError;

pub trait TelemetryService: Send + Sync {
    fn begin_scope(&self, method: &str, language: &str) -> Box<dyn TelemetryScope>;
}

/// Records what happened to one request. Implementations must not block.
pub trait TelemetryScope: Send + Sync {
    fn record_execution_start(&self);
    fn record_warning(&self, message: &str);
    fn record_cancellation(&self);
    fn record_exception(&self, error: &DispatchError);
}

//! ServiceLocator port - 外部サービスの解決
//!
//! 共有・読み取り専用。複数の dispatch unit から同時に参照されます。

use std::sync::Arc;

use super::context_factory::ContextProvider;
use super::telemetry::TelemetryService;

pub trait ServiceLocator<C>: Send + Sync {
    /// Optional: `None` just means no telemetry is collected.
    fn telemetry(&self) -> Option<Arc<dyn TelemetryService>>;

    /// Every registered context provider, preferred generation first.
    fn context_providers(&self) -> &[ContextProvider<C>];
}

//! Ports - 外部コラボレーターへのインターフェース
//!
//! dispatch unit はキュー、サービスロケーター、context 構築、ログ/テレメトリの
//! 実装を知りません。ここに並ぶ trait 越しにだけ触ります。

pub mod context_factory;
pub mod logger;
pub mod service_locator;
pub mod telemetry;

pub use self::context_factory::{ContextFactory, ContextProvider, LegacyContextFactory};
pub use self::logger::RequestLogger;
pub use self::service_locator::ServiceLocator;
pub use self::telemetry::{TelemetryScope, TelemetryService};

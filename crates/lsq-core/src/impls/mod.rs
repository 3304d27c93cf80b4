//! Impls - ports の実装（既定・開発用）
//!
//! # 含まれる実装
//! - **ServiceRegistry**: 起動時に組み立てる ServiceLocator
//! - **TracingLogger**: tracing に流す RequestLogger
//! - **InMemoryTelemetry**: イベントをメモリに貯める TelemetryService

pub mod logger;
pub mod services;
pub mod telemetry;

pub use self::logger::TracingLogger;
pub use self::services::{ServiceRegistry, ServiceRegistryBuilder};
pub use self::telemetry::{InMemoryTelemetry, TelemetryEvent, TelemetryRecord};

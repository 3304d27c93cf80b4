//! RuntimeBuilder - Runtime の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - expect_methods() / config の expected_methods で期待される method を登録
//! - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 不足があれば BuildError を返す

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::impls::{ServiceRegistry, TracingLogger};
use crate::ports::{RequestLogger, ServiceLocator};
use crate::typed::{HandlerKind, HandlerRegistry, RegistryError};

use super::config::DispatchConfig;
use super::runtime::Runtime;

/// # 使用例
/// ```ignore
/// let runtime = RuntimeBuilder::new()
///     .register("textDocument/hover", HandlerKind::request(Hover))?
///     .services(services)
///     .expect_methods(&["textDocument/hover"])
///     .build()?;
/// ```
pub struct RuntimeBuilder<C> {
    registry: HandlerRegistry<C>,
    services: Option<Arc<dyn ServiceLocator<C>>>,
    logger: Option<Arc<dyn RequestLogger>>,
    config: DispatchConfig,
    expected_methods: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing handlers: {0:?}. These methods were expected but not registered.")]
    MissingMethods(Vec<String>),
}

impl<C: Send + Sync + 'static> RuntimeBuilder<C> {
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            services: None,
            logger: None,
            config: DispatchConfig::default(),
            expected_methods: Vec::new(),
        }
    }

    pub fn register(
        mut self,
        method: impl Into<String>,
        handler: HandlerKind<C>,
    ) -> Result<Self, RegistryError> {
        self.registry.register(method, handler)?;
        Ok(self)
    }

    /// Defaults to an empty registry (no telemetry, no context factory).
    pub fn services(mut self, services: impl ServiceLocator<C> + 'static) -> Self {
        self.services = Some(Arc::new(services));
        self
    }

    /// Defaults to `TracingLogger`.
    pub fn logger(mut self, logger: impl RequestLogger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn expect_methods(mut self, methods: &[&str]) -> Self {
        self.expected_methods
            .extend(methods.iter().map(|m| m.to_string()));
        self
    }

    pub fn build(self) -> Result<Runtime<C>, BuildError> {
        let registered = self.registry.registered_methods();
        let missing: BTreeSet<String> = self
            .expected_methods
            .iter()
            .chain(&self.config.expected_methods)
            .filter(|m| !registered.contains(m))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(BuildError::MissingMethods(missing.into_iter().collect()));
        }

        let services = self
            .services
            .unwrap_or_else(|| Arc::new(ServiceRegistry::<C>::empty()));
        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger::default()));
        tracing::debug!(methods = registered.len(), "runtime built");

        Ok(Runtime::new(self.registry, services, logger, self.config))
    }
}

impl<C: Send + Sync + 'static> Default for RuntimeBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

//! ServiceRegistry - 起動時に一度だけ組み立てる ServiceLocator 実装
//!
//! context provider の並び順（現行世代が先）は build() で確定します。
//! 実行時に「新しい方を試して、だめなら古い方」というフォールバックはしません。

use std::sync::Arc;

use crate::ports::{
    ContextFactory, ContextProvider, LegacyContextFactory, ServiceLocator, TelemetryService,
};

pub struct ServiceRegistry<C> {
    telemetry: Option<Arc<dyn TelemetryService>>,
    providers: Vec<ContextProvider<C>>,
}

impl<C> ServiceRegistry<C> {
    pub fn builder() -> ServiceRegistryBuilder<C> {
        ServiceRegistryBuilder::new()
    }

    /// No telemetry, no context factory.
    pub fn empty() -> Self {
        Self {
            telemetry: None,
            providers: Vec::new(),
        }
    }
}

impl<C> ServiceLocator<C> for ServiceRegistry<C> {
    fn telemetry(&self) -> Option<Arc<dyn TelemetryService>> {
        self.telemetry.clone()
    }

    fn context_providers(&self) -> &[ContextProvider<C>] {
        &self.providers
    }
}

pub struct ServiceRegistryBuilder<C> {
    telemetry: Option<Arc<dyn TelemetryService>>,
    providers: Vec<ContextProvider<C>>,
}

impl<C> ServiceRegistryBuilder<C> {
    pub fn new() -> Self {
        Self {
            telemetry: None,
            providers: Vec::new(),
        }
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetryService>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn context_factory(mut self, factory: impl ContextFactory<C> + 'static) -> Self {
        self.providers
            .push(ContextProvider::Current(Arc::new(factory)));
        self
    }

    pub fn legacy_context_factory(mut self, factory: impl LegacyContextFactory<C> + 'static) -> Self {
        self.providers
            .push(ContextProvider::Legacy(Arc::new(factory)));
        self
    }

    pub fn build(mut self) -> ServiceRegistry<C> {
        // stable: registration order is kept within a generation
        self.providers.sort_by_key(ContextProvider::generation_rank);
        ServiceRegistry {
            telemetry: self.telemetry,
            providers: self.providers,
        }
    }
}

impl<C> Default for ServiceRegistryBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

//! HandlerRegistry - method 名と HandlerKind の対応
//!
//! - 初期化時に構築（mutable）
//! - 実行時は読み取り専用（Arc で共有）

use std::collections::HashMap;

use super::handler::HandlerKind;

/// Registry of handlers (method -> handler).
pub struct HandlerRegistry<C> {
    handlers: HashMap<String, HandlerKind<C>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("handler for method '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl<C> HandlerRegistry<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        method: impl Into<String>,
        handler: HandlerKind<C>,
    ) -> Result<(), RegistryError> {
        let method = method.into();
        if self.handlers.contains_key(&method) {
            return Err(RegistryError::AlreadyRegistered(method));
        }
        self.handlers.insert(method, handler);
        Ok(())
    }

    pub fn get(&self, method: &str) -> Option<HandlerKind<C>> {
        self.handlers.get(method).cloned()
    }

    pub fn registered_methods(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

impl<C> Default for HandlerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

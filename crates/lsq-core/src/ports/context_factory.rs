//! ContextFactory port - request context の構築
//!
//! 2 世代の factory をサポートします。
//! - **ContextFactory**（現行）: handler も受け取る
//! - **LegacyContextFactory**（旧）: request と params だけを受け取る
//!
//! どちらを使うかは `ServiceLocator::context_providers()` の並び順で決まり、
//! 先頭（現行世代が優先）が使われます。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{CancelSignal, ContextError, RequestMetadata};
use crate::typed::HandlerKind;

/// Builds the per-request context a handler runs against.
///
/// Returning `Ok(None)` means the request target could not be resolved (for
/// example the document was closed); that is not an error.
#[async_trait]
pub trait ContextFactory<C>: Send + Sync {
    async fn create_context(
        &self,
        request: &RequestMetadata,
        handler: &HandlerKind<C>,
        params: Option<&serde_json::Value>,
        cancel: &CancelSignal,
    ) -> Result<Option<C>, ContextError>;
}

/// Older factory generation that does not look at the handler.
#[async_trait]
pub trait LegacyContextFactory<C>: Send + Sync {
    async fn create_context(
        &self,
        request: &RequestMetadata,
        params: Option<&serde_json::Value>,
        cancel: &CancelSignal,
    ) -> Result<Option<C>, ContextError>;
}

/// One registered factory, tagged with its generation.
pub enum ContextProvider<C> {
    Current(Arc<dyn ContextFactory<C>>),
    Legacy(Arc<dyn LegacyContextFactory<C>>),
}

impl<C> ContextProvider<C> {
    /// Lower sorts first.
    pub fn generation_rank(&self) -> u8 {
        match self {
            ContextProvider::Current(_) => 0,
            ContextProvider::Legacy(_) => 1,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, ContextProvider::Legacy(_))
    }

    pub(crate) async fn create_context(
        &self,
        request: &RequestMetadata,
        handler: &HandlerKind<C>,
        params: Option<&serde_json::Value>,
        cancel: &CancelSignal,
    ) -> Result<Option<C>, ContextError> {
        match self {
            ContextProvider::Current(factory) => {
                factory.create_context(request, handler, params, cancel).await
            }
            ContextProvider::Legacy(factory) => factory.create_context(request, params, cancel).await,
        }
    }
}

impl<C> Clone for ContextProvider<C> {
    fn clone(&self) -> Self {
        match self {
            ContextProvider::Current(f) => ContextProvider::Current(Arc::clone(f)),
            ContextProvider::Legacy(f) => ContextProvider::Legacy(Arc::clone(f)),
        }
    }
}

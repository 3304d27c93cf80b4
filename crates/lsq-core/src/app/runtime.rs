//! Runtime - method 名から dispatch unit を組み立てる表面
//!
//! # 責務
//! - HandlerRegistry から handler を引く（無ければ MethodNotFound）
//! - handler の shape から RequestMetadata を作る
//! - params を shape に合わせて正規化する
//! - method ごとの missing-context policy を適用する

use std::sync::Arc;

use crate::domain::{CancelSignal, DispatchError, Outcome, RequestMetadata};
use crate::ports::{RequestLogger, ServiceLocator};
use crate::queue::{DispatchUnit, OutcomeFuture};
use crate::typed::{HandlerKind, HandlerRegistry};

use super::config::DispatchConfig;

pub struct Runtime<C> {
    registry: Arc<HandlerRegistry<C>>,
    services: Arc<dyn ServiceLocator<C>>,
    logger: Arc<dyn RequestLogger>,
    config: DispatchConfig,
}

/// A unit ready to be queued, together with its handler and outcome reader.
pub struct Submission<C> {
    pub unit: DispatchUnit<C>,
    pub handler: HandlerKind<C>,
    pub outcome: OutcomeFuture,
}

impl<C: Send + Sync + 'static> Submission<C> {
    pub async fn run(&self) -> Outcome {
        self.unit.run(&self.handler).await
    }
}

impl<C: Send + Sync + 'static> Runtime<C> {
    pub(crate) fn new(
        registry: HandlerRegistry<C>,
        services: Arc<dyn ServiceLocator<C>>,
        logger: Arc<dyn RequestLogger>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            services,
            logger,
            config,
        }
    }

    /// Build the dispatch unit for one inbound message.
    ///
    /// `language` falls back to the configured default.
    pub fn submit(
        &self,
        method: &str,
        language: Option<&str>,
        params: Option<serde_json::Value>,
        cancel: CancelSignal,
    ) -> Result<Submission<C>, DispatchError> {
        let Some(handler) = self.registry.get(method) else {
            tracing::warn!(method, "no handler registered");
            return Err(DispatchError::MethodNotFound {
                method: method.to_string(),
            });
        };

        let language = language.unwrap_or(&self.config.default_language);
        let mut metadata = RequestMetadata::new(method, language);
        if let Some(kind) = handler.params_kind() {
            metadata = metadata.with_params_kind(kind);
        }
        if let Some(kind) = handler.response_kind() {
            metadata = metadata.with_response_kind(kind);
        }

        let params = normalize_params(&handler, params);
        let (unit, outcome) = DispatchUnit::new(
            metadata,
            params,
            Arc::clone(&self.services),
            Arc::clone(&self.logger),
            cancel,
        );
        let unit = unit.with_missing_context_policy(self.config.missing_context_policy(method));

        Ok(Submission {
            unit,
            handler,
            outcome,
        })
    }

    /// `submit` and run to completion. Unknown methods resolve as failures.
    pub async fn dispatch(
        &self,
        method: &str,
        language: Option<&str>,
        params: Option<serde_json::Value>,
        cancel: CancelSignal,
    ) -> Outcome {
        match self.submit(method, language, params, cancel) {
            Ok(submission) => submission.run().await,
            Err(err) => Outcome::Failed(err),
        }
    }
}

impl<C> Runtime<C> {
    pub fn handles(&self, method: &str) -> bool {
        self.registry.get(method).is_some()
    }

    pub fn registered_methods(&self) -> Vec<String> {
        self.registry.registered_methods()
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

// JSON-RPC lets `params` be omitted or null; shapes without params treat null
// as absent, shapes with params see an explicit null.
fn normalize_params<C>(
    handler: &HandlerKind<C>,
    params: Option<serde_json::Value>,
) -> Option<serde_json::Value> {
    if handler.shape().takes_params() {
        Some(params.unwrap_or(serde_json::Value::Null))
    } else {
        params.filter(|p| !p.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RuntimeBuilder;
    use crate::domain::{HandlerError, MissingContextPolicy, Response};
    use crate::impls::ServiceRegistry;
    use crate::testing::{Doc, EchoHover, FixedContext, Initialized, RecordOpen, Shutdown};
    use serde_json::json;

    fn runtime(doc: Option<Doc>, config: DispatchConfig) -> Runtime<Doc> {
        RuntimeBuilder::new()
            .register("textDocument/hover", HandlerKind::request(EchoHover))
            .unwrap()
            .register(
                "textDocument/didOpen",
                HandlerKind::notification(RecordOpen::default()),
            )
            .unwrap()
            .register("shutdown", HandlerKind::parameterless_request(Shutdown::default()))
            .unwrap()
            .register(
                "initialized",
                HandlerKind::parameterless_notification(Initialized::default()),
            )
            .unwrap()
            .services(
                ServiceRegistry::builder()
                    .context_factory(FixedContext::new(doc))
                    .build(),
            )
            .config(config)
            .build()
            .unwrap()
    }

    fn doc() -> Option<Doc> {
        Some(Doc::new("file:///lib.rs", ""))
    }

    #[tokio::test]
    async fn dispatch_hover() {
        let runtime = runtime(doc(), DispatchConfig::default());

        let outcome = runtime
            .dispatch(
                "textDocument/hover",
                Some("rust"),
                Some(json!({ "line": 1, "character": 0 })),
                CancelSignal::new(),
            )
            .await;

        assert_eq!(
            outcome.into_result().unwrap(),
            Response::Value(json!({ "contents": "file:///lib.rs@1:0" }))
        );
    }

    #[tokio::test]
    async fn unknown_method_is_not_found() {
        let runtime = runtime(doc(), DispatchConfig::default());

        let submission = runtime.submit("workspace/symbol", None, None, CancelSignal::new());
        assert!(matches!(
            submission,
            Err(DispatchError::MethodNotFound { ref method }) if method == "workspace/symbol"
        ));

        let outcome = runtime
            .dispatch("workspace/symbol", None, None, CancelSignal::new())
            .await;
        assert!(outcome.is_failed());
    }

    #[tokio::test]
    async fn null_params_count_as_absent_for_parameterless_shapes() {
        let runtime = runtime(doc(), DispatchConfig::default());

        let shutdown = runtime
            .dispatch("shutdown", None, Some(serde_json::Value::Null), CancelSignal::new())
            .await;
        let initialized = runtime
            .dispatch("initialized", None, None, CancelSignal::new())
            .await;

        assert_eq!(shutdown, Outcome::Completed(Response::Value(serde_json::Value::Null)));
        assert_eq!(initialized, Outcome::Completed(Response::NoValue));
    }

    #[tokio::test]
    async fn absent_params_for_payload_shape_are_invalid() {
        let runtime = runtime(doc(), DispatchConfig::default());

        let outcome = runtime
            .dispatch("textDocument/didOpen", None, None, CancelSignal::new())
            .await;

        assert!(matches!(
            outcome,
            Outcome::Failed(DispatchError::Handler {
                source: HandlerError::InvalidParams(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn submission_carries_metadata_and_policy() {
        let mut config = DispatchConfig::default();
        config.default_language = "rust".into();
        config
            .missing_context_overrides
            .insert("textDocument/hover".into(), MissingContextPolicy::NullResponse);
        let runtime = runtime(None, config);

        let submission = runtime
            .submit("textDocument/hover", None, Some(json!({})), CancelSignal::new())
            .unwrap();

        assert_eq!(submission.unit.language(), "rust");
        assert!(submission.unit.metadata().expects_response());
        assert_eq!(
            submission.unit.missing_context_policy(),
            MissingContextPolicy::NullResponse
        );

        let outcome = submission.run().await;
        assert_eq!(outcome, Outcome::Completed(Response::Value(serde_json::Value::Null)));
        assert_eq!(submission.outcome.await, outcome);
    }

    #[tokio::test]
    async fn missing_document_fails_by_default() {
        let runtime = runtime(None, DispatchConfig::default());

        let outcome = runtime
            .dispatch(
                "textDocument/hover",
                None,
                Some(json!({ "line": 0, "character": 0 })),
                CancelSignal::new(),
            )
            .await;

        assert_eq!(
            outcome,
            Outcome::Failed(DispatchError::ContextMissing {
                method: "textDocument/hover".into()
            })
        );
    }
}

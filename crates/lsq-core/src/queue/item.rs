//! DispatchUnit: one inbound request/notification on its way to an outcome.
//!
//! The owning queue drives a unit in two steps:
//! 1. `acquire_context(handler)` - build the request context
//! 2. `execute(context, handler)` - dispatch on the handler's shape
//!
//! Whatever happens in between (cancellation, missing context, handler error,
//! panic), the outcome channel ends up resolved exactly once and nothing is
//! raised past `execute`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::Instrument;

use super::channel::{OutcomeChannel, OutcomeFuture, outcome_channel};
use super::state::DispatchState;
use crate::domain::{
    CancelSignal, ContextError, DispatchError, HandlerError, MissingContextPolicy, Outcome,
    RequestMetadata, Response, UnitId,
};
use crate::ports::{RequestLogger, ServiceLocator, TelemetryScope};
use crate::typed::HandlerKind;

pub struct DispatchUnit<C> {
    id: UnitId,
    metadata: RequestMetadata,
    params: Option<serde_json::Value>,
    services: Arc<dyn ServiceLocator<C>>,
    logger: Arc<dyn RequestLogger>,
    cancel: CancelSignal,
    missing_context: MissingContextPolicy,
    outcome: OutcomeChannel,
    scope: Mutex<Option<Box<dyn TelemetryScope>>>,
    state: Mutex<DispatchState>,
    executed: AtomicBool,
    finished: AtomicBool,
}

impl<C: Send + Sync + 'static> DispatchUnit<C> {
    /// Create a unit and the future its caller awaits.
    ///
    /// When called inside a tokio runtime, a watcher is spawned so that the
    /// cancel signal settles the outcome even while the unit is still queued.
    pub fn new(
        metadata: RequestMetadata,
        params: Option<serde_json::Value>,
        services: Arc<dyn ServiceLocator<C>>,
        logger: Arc<dyn RequestLogger>,
        cancel: CancelSignal,
    ) -> (Self, OutcomeFuture) {
        let id = UnitId::generate();
        let (outcome, future) = outcome_channel();
        watch_cancellation(id, &cancel, &outcome);

        let scope = services.telemetry().and_then(|telemetry| {
            best_effort("begin_scope", || {
                telemetry.begin_scope(metadata.method(), metadata.language())
            })
        });

        tracing::trace!(unit = %id, request = %metadata, "dispatch unit created");

        let unit = Self {
            id,
            metadata,
            params,
            services,
            logger,
            cancel,
            missing_context: MissingContextPolicy::default(),
            outcome,
            scope: Mutex::new(scope),
            state: Mutex::new(DispatchState::NotStarted),
            executed: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        };
        (unit, future)
    }

    pub fn with_missing_context_policy(mut self, policy: MissingContextPolicy) -> Self {
        self.missing_context = policy;
        self
    }

    /// Build the request context for `handler`.
    ///
    /// `Ok(None)` means the target could not be resolved; `execute` turns that
    /// into the missing-context outcome. Any `Err` has already been settled on
    /// the outcome channel and the unit closed by the time it is returned; a
    /// later `execute` only observes.
    pub async fn acquire_context(
        &self,
        handler: &HandlerKind<C>,
    ) -> Result<Option<C>, DispatchError> {
        let span = tracing::debug_span!("acquire_context", unit = %self.id, method = %self.metadata.method());
        let result = AssertUnwindSafe(self.acquire(handler).instrument(span))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(self.panicked(&*panic)));

        if let Err(err) = &result {
            self.executed.store(true, Ordering::Release);
            self.settle_error(err.clone());
            self.finish();
        }
        result
    }

    /// Dispatch to `handler` and return the observed terminal outcome.
    ///
    /// Never fails: every error becomes a resolved outcome. Calling it twice
    /// does not invoke the handler again.
    pub async fn execute(&self, context: Option<C>, handler: Option<&HandlerKind<C>>) -> Outcome {
        let span = tracing::debug_span!("execute", unit = %self.id, method = %self.metadata.method());
        async {
            if self.executed.swap(true, Ordering::AcqRel) {
                tracing::debug!("execute called again; observing the existing outcome");
                return self.outcome.observe().await;
            }

            let result = AssertUnwindSafe(self.dispatch(context, handler))
                .catch_unwind()
                .await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => self.settle_error(err),
                Err(panic) => self.settle_error(self.panicked(&*panic)),
            }

            self.finish();
            self.outcome.observe().await
        }
        .instrument(span)
        .await
    }

    /// `acquire_context` followed by `execute`, for callers that don't need to
    /// hold the context in between.
    pub async fn run(&self, handler: &HandlerKind<C>) -> Outcome {
        match self.acquire_context(handler).await {
            Ok(context) => self.execute(context, Some(handler)).await,
            Err(_) => self.outcome.observe().await,
        }
    }

    async fn acquire(&self, handler: &HandlerKind<C>) -> Result<Option<C>, DispatchError> {
        if self.cancel.is_cancelled() {
            return Err(DispatchError::Canceled(self.cancel.reason()));
        }

        self.with_scope("record_execution_start", |scope| scope.record_execution_start());
        self.log("log_start", |logger| logger.log_start(self.metadata.method()));

        let provider = self
            .services
            .context_providers()
            .first()
            .ok_or_else(|| DispatchError::NoContextFactory {
                method: self.metadata.method().to_string(),
            })?;
        if provider.is_legacy() {
            tracing::debug!("using legacy context factory");
        }

        let created = tokio::select! {
            biased;
            created = provider.create_context(&self.metadata, handler, self.params.as_ref(), &self.cancel) => created,
            _ = self.cancel.cancelled() => return Err(DispatchError::Canceled(self.cancel.reason())),
        };

        created.map_err(|err| match err {
            ContextError::Canceled => DispatchError::Canceled(self.cancel.reason()),
            ContextError::Failed(message) => DispatchError::ContextFactory {
                method: self.metadata.method().to_string(),
                message,
            },
        })
    }

    async fn dispatch(
        &self,
        context: Option<C>,
        handler: Option<&HandlerKind<C>>,
    ) -> Result<(), DispatchError> {
        if self.cancel.is_cancelled() {
            return Err(DispatchError::Canceled(self.cancel.reason()));
        }
        if self.outcome.is_resolved() {
            // acquire_context already settled a failure
            tracing::debug!("outcome already settled; skipping dispatch");
            return Ok(());
        }

        let Some(context) = context else {
            self.context_missing();
            return Ok(());
        };

        let Some(handler) = handler else {
            self.settle_state(DispatchState::HandlerMissing);
            return Err(DispatchError::HandlerMissing {
                method: self.metadata.method().to_string(),
            });
        };

        self.settle_state(DispatchState::Dispatched);
        tracing::debug!(shape = %handler.shape(), "dispatching");

        let response = tokio::select! {
            biased;
            invoked = self.invoke(handler, &context) => invoked?,
            _ = self.cancel.cancelled() => return Err(DispatchError::Canceled(self.cancel.reason())),
        };

        self.settle_state(DispatchState::Completed);
        self.outcome.resolve(Outcome::Completed(response));
        Ok(())
    }

    /// Invoke the first shape that fits this request, in priority order:
    /// request-with-payload, request-without-payload, notification-with-payload,
    /// notification-without-payload.
    async fn invoke(&self, handler: &HandlerKind<C>, context: &C) -> Result<Response, DispatchError> {
        let cancel = &self.cancel;
        let invoked = match (handler, self.params.as_ref(), self.metadata.expects_response()) {
            (HandlerKind::Request(h), Some(params), true) => h
                .handle_dyn(params, context, cancel)
                .await
                .map(Response::Value),
            (HandlerKind::ParameterlessRequest(h), None, true) => {
                h.handle_dyn(context, cancel).await.map(Response::Value)
            }
            (HandlerKind::Notification(h), Some(params), false) => h
                .handle_dyn(params, context, cancel)
                .await
                .map(|()| Response::NoValue),
            (HandlerKind::ParameterlessNotification(h), None, false) => h
                .handle_dyn(context, cancel)
                .await
                .map(|()| Response::NoValue),
            (other, _, _) => {
                return Err(DispatchError::UnrecognizedHandler {
                    method: self.metadata.method().to_string(),
                    shape: other.shape().to_string(),
                });
            }
        };

        invoked.map_err(|err| match err {
            HandlerError::Canceled => DispatchError::Canceled(cancel.reason()),
            source => DispatchError::Handler {
                method: self.metadata.method().to_string(),
                source,
            },
        })
    }

    fn context_missing(&self) {
        self.settle_state(DispatchState::ContextMissing);

        let err = DispatchError::ContextMissing {
            method: self.metadata.method().to_string(),
        };
        let message = err.to_string();
        self.log("log_warning", |logger| logger.log_warning(&message));
        self.with_scope("record_warning", |scope| scope.record_warning(&message));

        let outcome = match self.missing_context {
            MissingContextPolicy::Fail => Outcome::Failed(err),
            MissingContextPolicy::NullResponse if self.metadata.expects_response() => {
                Outcome::Completed(Response::Value(serde_json::Value::Null))
            }
            MissingContextPolicy::NullResponse => Outcome::Completed(Response::NoValue),
        };
        self.outcome.resolve(outcome);
    }
}

impl<C> DispatchUnit<C> {
    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn metadata(&self) -> &RequestMetadata {
        &self.metadata
    }

    pub fn method(&self) -> &str {
        self.metadata.method()
    }

    pub fn language(&self) -> &str {
        self.metadata.language()
    }

    pub fn params_kind(&self) -> Option<&'static str> {
        self.metadata.params_kind()
    }

    pub fn response_kind(&self) -> Option<&'static str> {
        self.metadata.response_kind()
    }

    pub fn params(&self) -> Option<&serde_json::Value> {
        self.params.as_ref()
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }

    pub fn missing_context_policy(&self) -> MissingContextPolicy {
        self.missing_context
    }

    pub fn state(&self) -> DispatchState {
        *self.state.lock()
    }

    /// Another reader of this unit's outcome.
    pub fn outcome(&self) -> OutcomeFuture {
        self.outcome.future()
    }

    /// Resolve cancellation or failure. Instrumentation in here is best-effort
    /// so this never unwinds.
    fn settle_error(&self, err: DispatchError) {
        if let DispatchError::Canceled(reason) = &err {
            self.settle_state(DispatchState::Canceled);
            let message = format!("{} - canceled: {reason}", self.metadata.method());
            self.log("log_info", |logger| logger.log_info(&message));
            self.with_scope("record_cancellation", |scope| scope.record_cancellation());
            self.outcome.resolve(Outcome::Canceled(reason.clone()));
            return;
        }

        self.settle_state(DispatchState::Failed);
        self.log("log_exception", |logger| logger.log_exception(&err));
        self.with_scope("record_exception", |scope| scope.record_exception(&err));
        self.outcome.resolve(Outcome::Failed(err));
    }

    /// Close the telemetry scope and emit the end-of-context line. Runs once.
    fn finish(&self) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        let scope = self.scope.lock().take();
        if let Some(scope) = scope {
            best_effort("release_scope", move || drop(scope));
        }
        self.log("log_end", |logger| logger.log_end(self.metadata.method()));
    }

    // ContextMissing / HandlerMissing are kept once reached.
    fn settle_state(&self, next: DispatchState) {
        let mut state = self.state.lock();
        if !state.is_terminal() {
            *state = next;
        }
    }

    fn panicked(&self, panic: &(dyn Any + Send)) -> DispatchError {
        DispatchError::Panicked {
            method: self.metadata.method().to_string(),
            message: panic_message(panic),
        }
    }

    fn log(&self, hook: &'static str, f: impl FnOnce(&dyn RequestLogger)) {
        best_effort(hook, || f(self.logger.as_ref()));
    }

    fn with_scope(&self, hook: &'static str, f: impl FnOnce(&dyn TelemetryScope)) {
        let scope = self.scope.lock();
        if let Some(scope) = scope.as_deref() {
            best_effort(hook, || f(scope));
        }
    }
}

impl<C> Drop for DispatchUnit<C> {
    fn drop(&mut self) {
        let abandoned = DispatchError::Abandoned {
            method: self.metadata.method().to_string(),
        };
        if self.outcome.resolve(Outcome::Failed(abandoned.clone())) {
            tracing::warn!(unit = %self.id, method = %self.metadata.method(), "dispatch unit dropped before its outcome was resolved");
            self.log("log_exception", |logger| logger.log_exception(&abandoned));
            self.with_scope("record_exception", |scope| scope.record_exception(&abandoned));
        } else if !self.finished.load(Ordering::Acquire) {
            // settled by the cancellation watcher while nobody was driving the unit
            if let Some(Outcome::Canceled(reason)) = self.outcome.future().try_get() {
                let message = format!("{} - canceled: {reason}", self.metadata.method());
                self.log("log_info", |logger| logger.log_info(&message));
                self.with_scope("record_cancellation", |scope| scope.record_cancellation());
            }
        }
        self.finish();
    }
}

fn watch_cancellation(id: UnitId, cancel: &CancelSignal, outcome: &OutcomeChannel) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::debug!(unit = %id, "no tokio runtime; cancellation is only observed at dispatch checkpoints");
        return;
    };

    let cancel = cancel.clone();
    let outcome = outcome.clone();
    runtime.spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                if outcome.resolve(Outcome::Canceled(cancel.reason())) {
                    tracing::debug!(unit = %id, "cancel signal settled the outcome");
                }
            }
            _ = outcome.observe() => {}
        }
    });
}

/// Run an instrumentation hook, swallowing a panic from it.
fn best_effort<T>(hook: &'static str, f: impl FnOnce() -> T) -> Option<T> {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(hook, "instrumentation hook panicked; ignoring");
            None
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

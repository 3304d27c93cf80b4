//! Test doubles shared by the unit tests in this crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::domain::{CancelSignal, ContextError, DispatchError, HandlerError, RequestMetadata};
use crate::ports::{ContextFactory, LegacyContextFactory, RequestLogger};
use crate::typed::{
    HandlerKind, NotificationHandler, ParameterlessNotificationHandler,
    ParameterlessRequestHandler, RequestHandler,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doc {
    pub uri: String,
    pub text: String,
}

impl Doc {
    pub fn new(uri: &str, text: &str) -> Self {
        Self {
            uri: uri.to_string(),
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoverParams {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hover {
    pub contents: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidOpenParams {
    pub uri: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct EchoHover;

#[async_trait]
impl RequestHandler<Doc> for EchoHover {
    type Params = HoverParams;
    type Result = Hover;

    async fn handle(
        &self,
        params: HoverParams,
        context: &Doc,
        _cancel: &CancelSignal,
    ) -> Result<Hover, HandlerError> {
        Ok(Hover {
            contents: format!("{}@{}:{}", context.uri, params.line, params.character),
        })
    }
}

/// `EchoHover` that counts its invocations.
#[derive(Debug, Clone, Default)]
pub struct CountingHover {
    calls: Arc<AtomicUsize>,
}

impl CountingHover {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestHandler<Doc> for CountingHover {
    type Params = HoverParams;
    type Result = Hover;

    async fn handle(
        &self,
        params: HoverParams,
        context: &Doc,
        cancel: &CancelSignal,
    ) -> Result<Hover, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        EchoHover.handle(params, context, cancel).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordOpen {
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordOpen {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl NotificationHandler<Doc> for RecordOpen {
    type Params = DidOpenParams;

    async fn handle(
        &self,
        params: DidOpenParams,
        _context: &Doc,
        _cancel: &CancelSignal,
    ) -> Result<(), HandlerError> {
        self.opened.lock().push(params.uri);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    calls: Arc<AtomicUsize>,
}

impl Shutdown {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParameterlessRequestHandler<Doc> for Shutdown {
    type Result = ();

    async fn handle(&self, _context: &Doc, _cancel: &CancelSignal) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Initialized {
    calls: Arc<AtomicUsize>,
}

impl Initialized {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParameterlessNotificationHandler<Doc> for Initialized {
    async fn handle(&self, _context: &Doc, _cancel: &CancelSignal) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct Failing;

#[async_trait]
impl RequestHandler<Doc> for Failing {
    type Params = serde_json::Value;
    type Result = ();

    async fn handle(
        &self,
        _params: serde_json::Value,
        _context: &Doc,
        _cancel: &CancelSignal,
    ) -> Result<(), HandlerError> {
        Err(HandlerError::failed("index not ready"))
    }
}

pub struct Panicking;

#[async_trait]
impl RequestHandler<Doc> for Panicking {
    type Params = serde_json::Value;
    type Result = ();

    async fn handle(
        &self,
        _params: serde_json::Value,
        _context: &Doc,
        _cancel: &CancelSignal,
    ) -> Result<(), HandlerError> {
        panic!("handler exploded");
    }
}

/// Gives up as soon as it sees the cancel signal.
pub struct Cooperative;

#[async_trait]
impl RequestHandler<Doc> for Cooperative {
    type Params = serde_json::Value;
    type Result = ();

    async fn handle(
        &self,
        _params: serde_json::Value,
        _context: &Doc,
        _cancel: &CancelSignal,
    ) -> Result<(), HandlerError> {
        Err(HandlerError::Canceled)
    }
}

/// Signals `started` and then never finishes on its own.
#[derive(Clone, Default)]
pub struct Stalling {
    pub started: Arc<Notify>,
}

#[async_trait]
impl RequestHandler<Doc> for Stalling {
    type Params = serde_json::Value;
    type Result = ();

    async fn handle(
        &self,
        _params: serde_json::Value,
        _context: &Doc,
        _cancel: &CancelSignal,
    ) -> Result<(), HandlerError> {
        self.started.notify_one();
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Current-generation factory returning a fixed document.
#[derive(Clone)]
pub struct FixedContext {
    doc: Option<Doc>,
    calls: Arc<AtomicUsize>,
}

impl FixedContext {
    pub fn new(doc: Option<Doc>) -> Self {
        Self {
            doc,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContextFactory<Doc> for FixedContext {
    async fn create_context(
        &self,
        _request: &RequestMetadata,
        _handler: &HandlerKind<Doc>,
        _params: Option<&serde_json::Value>,
        _cancel: &CancelSignal,
    ) -> Result<Option<Doc>, ContextError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.doc.clone())
    }
}

#[derive(Clone)]
pub struct LegacyFixedContext {
    doc: Option<Doc>,
    calls: Arc<AtomicUsize>,
}

impl LegacyFixedContext {
    pub fn new(doc: Option<Doc>) -> Self {
        Self {
            doc,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LegacyContextFactory<Doc> for LegacyFixedContext {
    async fn create_context(
        &self,
        _request: &RequestMetadata,
        _params: Option<&serde_json::Value>,
        _cancel: &CancelSignal,
    ) -> Result<Option<Doc>, ContextError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.doc.clone())
    }
}

pub struct BrokenContext;

#[async_trait]
impl ContextFactory<Doc> for BrokenContext {
    async fn create_context(
        &self,
        _request: &RequestMetadata,
        _handler: &HandlerKind<Doc>,
        _params: Option<&serde_json::Value>,
        _cancel: &CancelSignal,
    ) -> Result<Option<Doc>, ContextError> {
        Err(ContextError::Failed("workspace not loaded".into()))
    }
}

/// Never produces a context.
#[derive(Clone, Default)]
pub struct StallingContext {
    pub started: Arc<Notify>,
}

#[async_trait]
impl ContextFactory<Doc> for StallingContext {
    async fn create_context(
        &self,
        _request: &RequestMetadata,
        _handler: &HandlerKind<Doc>,
        _params: Option<&serde_json::Value>,
        _cancel: &CancelSignal,
    ) -> Result<Option<Doc>, ContextError> {
        self.started.notify_one();
        std::future::pending::<()>().await;
        Ok(None)
    }
}

/// Records every call as `"<hook>:<text>"`.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn has(&self, prefix: &str) -> bool {
        self.lines.lock().iter().any(|l| l.starts_with(prefix))
    }

    fn push(&self, hook: &str, text: impl std::fmt::Display) {
        self.lines.lock().push(format!("{hook}:{text}"));
    }
}

impl RequestLogger for RecordingLogger {
    fn log_start(&self, method: &str) {
        self.push("start", method);
    }

    fn log_end(&self, method: &str) {
        self.push("end", method);
    }

    fn log_info(&self, message: &str) {
        self.push("info", message);
    }

    fn log_warning(&self, message: &str) {
        self.push("warning", message);
    }

    fn log_exception(&self, error: &DispatchError) {
        self.push("exception", error);
    }
}

pub struct PanickingLogger;

impl RequestLogger for PanickingLogger {
    fn log_start(&self, _method: &str) {
        panic!("logger broke");
    }

    fn log_end(&self, _method: &str) {
        panic!("logger broke");
    }

    fn log_info(&self, _message: &str) {
        panic!("logger broke");
    }

    fn log_warning(&self, _message: &str) {
        panic!("logger broke");
    }

    fn log_exception(&self, _error: &DispatchError) {
        panic!("logger broke");
    }
}

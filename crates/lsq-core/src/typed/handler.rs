//! Handler traits - 4 つの capability shape
//!
//! # 二層構造
//! - **表層（Typed）**: `RequestHandler` など。`Params` / `Result` を関連型で持つ
//! - **内部（Dyn）**: `DynRequestHandler` など。JSON (`serde_json::Value`) で型消去
//!
//! `HandlerKind` は shape を明示的に持つ tagged union。実行時の型推測はしない。

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{CancelSignal, HandlerError};

/// Request with params, answered with a value.
///
/// ```ignore
/// struct Hover;
///
/// #[async_trait]
/// impl RequestHandler<Snapshot> for Hover {
///     type Params = HoverParams;
///     type Result = Option<HoverResult>;
///
///     async fn handle(&self, params: HoverParams, ctx: &Snapshot, _cancel: &CancelSignal)
///         -> Result<Self::Result, HandlerError> { ... }
/// }
/// ```
#[async_trait]
pub trait RequestHandler<C: Send + Sync + 'static>: Send + Sync + 'static {
    type Params: DeserializeOwned + Send;
    type Result: Serialize + Send;

    async fn handle(
        &self,
        params: Self::Params,
        context: &C,
        cancel: &CancelSignal,
    ) -> Result<Self::Result, HandlerError>;
}

/// Request without params (e.g. `shutdown`), answered with a value.
#[async_trait]
pub trait ParameterlessRequestHandler<C: Send + Sync + 'static>: Send + Sync + 'static {
    type Result: Serialize + Send;

    async fn handle(&self, context: &C, cancel: &CancelSignal)
    -> Result<Self::Result, HandlerError>;
}

/// Notification with params. Never produces a response.
#[async_trait]
pub trait NotificationHandler<C: Send + Sync + 'static>: Send + Sync + 'static {
    type Params: DeserializeOwned + Send;

    async fn handle(
        &self,
        params: Self::Params,
        context: &C,
        cancel: &CancelSignal,
    ) -> Result<(), HandlerError>;
}

/// Notification without params (e.g. `initialized`, `exit`).
#[async_trait]
pub trait ParameterlessNotificationHandler<C: Send + Sync + 'static>:
    Send + Sync + 'static
{
    async fn handle(&self, context: &C, cancel: &CancelSignal) -> Result<(), HandlerError>;
}

// ---------------------------------------------------------------------------
// Dyn layer
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DynRequestHandler<C>: Send + Sync {
    async fn handle_dyn(
        &self,
        params: &serde_json::Value,
        context: &C,
        cancel: &CancelSignal,
    ) -> Result<serde_json::Value, HandlerError>;

    fn params_kind(&self) -> &'static str;
    fn result_kind(&self) -> &'static str;
}

#[async_trait]
pub trait DynParameterlessRequestHandler<C>: Send + Sync {
    async fn handle_dyn(
        &self,
        context: &C,
        cancel: &CancelSignal,
    ) -> Result<serde_json::Value, HandlerError>;

    fn result_kind(&self) -> &'static str;
}

#[async_trait]
pub trait DynNotificationHandler<C>: Send + Sync {
    async fn handle_dyn(
        &self,
        params: &serde_json::Value,
        context: &C,
        cancel: &CancelSignal,
    ) -> Result<(), HandlerError>;

    fn params_kind(&self) -> &'static str;
}

#[async_trait]
pub trait DynParameterlessNotificationHandler<C>: Send + Sync {
    async fn handle_dyn(&self, context: &C, cancel: &CancelSignal) -> Result<(), HandlerError>;
}

fn decode<P: DeserializeOwned>(params: &serde_json::Value) -> Result<P, HandlerError> {
    P::deserialize(params).map_err(|e| HandlerError::InvalidParams(e.to_string()))
}

fn encode<R: Serialize>(result: R) -> Result<serde_json::Value, HandlerError> {
    serde_json::to_value(result).map_err(|e| HandlerError::Failed(format!("json encode: {e}")))
}

struct RequestAdapter<H>(H);
struct ParameterlessRequestAdapter<H>(H);
struct NotificationAdapter<H>(H);
struct ParameterlessNotificationAdapter<H>(H);

#[async_trait]
impl<C, H> DynRequestHandler<C> for RequestAdapter<H>
where
    C: Send + Sync + 'static,
    H: RequestHandler<C>,
{
    async fn handle_dyn(
        &self,
        params: &serde_json::Value,
        context: &C,
        cancel: &CancelSignal,
    ) -> Result<serde_json::Value, HandlerError> {
        let params: H::Params = decode(params)?;
        let result = self.0.handle(params, context, cancel).await?;
        encode(result)
    }

    fn params_kind(&self) -> &'static str {
        std::any::type_name::<H::Params>()
    }

    fn result_kind(&self) -> &'static str {
        std::any::type_name::<H::Result>()
    }
}

#[async_trait]
impl<C, H> DynParameterlessRequestHandler<C> for ParameterlessRequestAdapter<H>
where
    C: Send + Sync + 'static,
    H: ParameterlessRequestHandler<C>,
{
    async fn handle_dyn(
        &self,
        context: &C,
        cancel: &CancelSignal,
    ) -> Result<serde_json::Value, HandlerError> {
        let result = self.0.handle(context, cancel).await?;
        encode(result)
    }

    fn result_kind(&self) -> &'static str {
        std::any::type_name::<H::Result>()
    }
}

#[async_trait]
impl<C, H> DynNotificationHandler<C> for NotificationAdapter<H>
where
    C: Send + Sync + 'static,
    H: NotificationHandler<C>,
{
    async fn handle_dyn(
        &self,
        params: &serde_json::Value,
        context: &C,
        cancel: &CancelSignal,
    ) -> Result<(), HandlerError> {
        let params: H::Params = decode(params)?;
        self.0.handle(params, context, cancel).await
    }

    fn params_kind(&self) -> &'static str {
        std::any::type_name::<H::Params>()
    }
}

#[async_trait]
impl<C, H> DynParameterlessNotificationHandler<C> for ParameterlessNotificationAdapter<H>
where
    C: Send + Sync + 'static,
    H: ParameterlessNotificationHandler<C>,
{
    async fn handle_dyn(&self, context: &C, cancel: &CancelSignal) -> Result<(), HandlerError> {
        self.0.handle(context, cancel).await
    }
}

/// The four capability shapes, without the handler attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerShape {
    RequestWithPayload,
    RequestOnly,
    NotificationWithPayload,
    NotificationOnly,
}

impl HandlerShape {
    pub fn takes_params(self) -> bool {
        matches!(
            self,
            HandlerShape::RequestWithPayload | HandlerShape::NotificationWithPayload
        )
    }

    pub fn returns_value(self) -> bool {
        matches!(
            self,
            HandlerShape::RequestWithPayload | HandlerShape::RequestOnly
        )
    }
}

impl fmt::Display for HandlerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HandlerShape::RequestWithPayload => "request-with-payload",
            HandlerShape::RequestOnly => "request-without-payload",
            HandlerShape::NotificationWithPayload => "notification-with-payload",
            HandlerShape::NotificationOnly => "notification-without-payload",
        };
        f.write_str(s)
    }
}

/// A type-erased handler that carries its capability shape explicitly.
pub enum HandlerKind<C> {
    Request(Arc<dyn DynRequestHandler<C>>),
    ParameterlessRequest(Arc<dyn DynParameterlessRequestHandler<C>>),
    Notification(Arc<dyn DynNotificationHandler<C>>),
    ParameterlessNotification(Arc<dyn DynParameterlessNotificationHandler<C>>),
}

impl<C> Clone for HandlerKind<C> {
    fn clone(&self) -> Self {
        match self {
            HandlerKind::Request(h) => HandlerKind::Request(Arc::clone(h)),
            HandlerKind::ParameterlessRequest(h) => HandlerKind::ParameterlessRequest(Arc::clone(h)),
            HandlerKind::Notification(h) => HandlerKind::Notification(Arc::clone(h)),
            HandlerKind::ParameterlessNotification(h) => {
                HandlerKind::ParameterlessNotification(Arc::clone(h))
            }
        }
    }
}

impl<C> fmt::Debug for HandlerKind<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerKind")
            .field("shape", &self.shape())
            .field("params_kind", &self.params_kind())
            .field("response_kind", &self.response_kind())
            .finish()
    }
}

impl<C: Send + Sync + 'static> HandlerKind<C> {
    pub fn request<H: RequestHandler<C>>(handler: H) -> Self {
        HandlerKind::Request(Arc::new(RequestAdapter(handler)))
    }

    pub fn parameterless_request<H: ParameterlessRequestHandler<C>>(handler: H) -> Self {
        HandlerKind::ParameterlessRequest(Arc::new(ParameterlessRequestAdapter(handler)))
    }

    pub fn notification<H: NotificationHandler<C>>(handler: H) -> Self {
        HandlerKind::Notification(Arc::new(NotificationAdapter(handler)))
    }

    pub fn parameterless_notification<H: ParameterlessNotificationHandler<C>>(handler: H) -> Self {
        HandlerKind::ParameterlessNotification(Arc::new(ParameterlessNotificationAdapter(handler)))
    }
}

impl<C> HandlerKind<C> {
    pub fn shape(&self) -> HandlerShape {
        match self {
            HandlerKind::Request(_) => HandlerShape::RequestWithPayload,
            HandlerKind::ParameterlessRequest(_) => HandlerShape::RequestOnly,
            HandlerKind::Notification(_) => HandlerShape::NotificationWithPayload,
            HandlerKind::ParameterlessNotification(_) => HandlerShape::NotificationOnly,
        }
    }

    pub fn params_kind(&self) -> Option<&'static str> {
        match self {
            HandlerKind::Request(h) => Some(h.params_kind()),
            HandlerKind::Notification(h) => Some(h.params_kind()),
            HandlerKind::ParameterlessRequest(_) | HandlerKind::ParameterlessNotification(_) => {
                None
            }
        }
    }

    pub fn response_kind(&self) -> Option<&'static str> {
        match self {
            HandlerKind::Request(h) => Some(h.result_kind()),
            HandlerKind::ParameterlessRequest(h) => Some(h.result_kind()),
            HandlerKind::Notification(_) | HandlerKind::ParameterlessNotification(_) => None,
        }
    }
}

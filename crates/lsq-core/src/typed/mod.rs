//! Typed - 型付き Handler API
//!
//! Handler は 4 つの capability shape のどれか 1 つだけを実装し、
//! `HandlerKind` に包まれた時点で shape が確定します。
//!
//! # 二層構造
//! - **表層（Typed）**: `RequestHandler` など - Params / Result が型安全
//! - **内部（Dyn）**: `DynRequestHandler` など - object-safe, JSON で type erasure

pub mod handler;
pub mod registry;

pub use self::handler::{
    DynNotificationHandler, DynParameterlessNotificationHandler, DynParameterlessRequestHandler,
    DynRequestHandler, HandlerKind, HandlerShape, NotificationHandler,
    ParameterlessNotificationHandler, ParameterlessRequestHandler, RequestHandler,
};
pub use self::registry::{HandlerRegistry, RegistryError};

//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **RuntimeBuilder**: handler 登録と起動時検証
//! - **Runtime**: method 名から dispatch unit を組み立てる
//! - **DispatchConfig**: missing-context policy などの設定

pub mod builder;
pub mod config;
pub mod runtime;

pub use self::builder::{BuildError, RuntimeBuilder};
pub use self::config::{ConfigError, DispatchConfig};
pub use self::runtime::{Runtime, Submission};

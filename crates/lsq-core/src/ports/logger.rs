//! RequestLogger port - リクエスト単位のログ
//!
//! すべて fire-and-forget。await しない、失敗を呼び出し側に返さない。

use crate::domain::DispatchError;

pub trait RequestLogger: Send + Sync {
    fn log_start(&self, method: &str);
    fn log_end(&self, method: &str);
    fn log_info(&self, message: &str);
    fn log_warning(&self, message: &str);
    fn log_exception(&self, error: &DispatchError);
}

//! Dispatch unit identifiers.
//!
//! ULID ベース: 生成順にソートでき、調整なしで生成できる。
//! ログの相関（start/end 行の突き合わせ）にだけ使う。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(Ulid);

impl UnitId {
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

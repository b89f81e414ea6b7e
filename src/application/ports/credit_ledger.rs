//! Credit Ledger Port - 积分扣减抽象
//!
//! 每章生成前扣减一次。余额不足属于正常结果（success = false），不是错误。

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::script::UserId;

/// 积分服务错误
#[derive(Debug, Error)]
pub enum CreditError {
    #[error("Credit service unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown feature: {0}")]
    UnknownFeature(String),
}

/// 扣减结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeductOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeductOutcome {
    pub fn approved(balance: i64) -> Self {
        Self {
            success: true,
            balance: Some(balance),
            error: None,
        }
    }

    pub fn refused(balance: Option<i64>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            balance,
            error: Some(error.into()),
        }
    }
}

/// Credit Ledger Port
#[async_trait]
pub trait CreditLedgerPort: Send + Sync {
    async fn deduct(
        &self,
        user_id: &UserId,
        feature_key: &str,
        note: &str,
    ) -> Result<DeductOutcome, CreditError>;
}

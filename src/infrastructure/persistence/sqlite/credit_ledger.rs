//! SQLite Credit Ledger
//!
//! 账户余额、功能单价与流水记录。扣减为单条条件更新，与流水写入同一事务。

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{CreditError, CreditLedgerPort, DeductOutcome};
use crate::domain::script::UserId;

/// SQLite Credit Ledger
pub struct SqliteCreditLedger {
    pool: DbPool,
}

impl SqliteCreditLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 登记或更新功能单价
    pub async fn ensure_feature(&self, feature_key: &str, cost: i64) -> Result<(), CreditError> {
        sqlx::query(
            r#"
            INSERT INTO credit_features (feature_key, cost) VALUES (?, ?)
            ON CONFLICT(feature_key) DO UPDATE SET cost = excluded.cost
            "#,
        )
        .bind(feature_key)
        .bind(cost)
        .execute(&self.pool)
        .await
        .map_err(|e| CreditError::Unavailable(e.to_string()))?;

        Ok(())
    }

    /// 设置账户余额（不存在则创建）
    pub async fn set_balance(&self, user_id: &UserId, balance: i64) -> Result<(), CreditError> {
        sqlx::query(
            r#"
            INSERT INTO credit_accounts (user_id, balance, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                balance = excluded.balance,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id.as_str())
        .bind(balance)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| CreditError::Unavailable(e.to_string()))?;

        Ok(())
    }

    pub async fn balance(&self, user_id: &UserId) -> Result<Option<i64>, CreditError> {
        sqlx::query_scalar("SELECT balance FROM credit_accounts WHERE user_id = ?")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CreditError::Unavailable(e.to_string()))
    }

    /// 用户流水条数
    pub async fn transaction_count(&self, user_id: &UserId) -> Result<i64, CreditError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM credit_transactions WHERE user_id = ?")
            .bind(user_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CreditError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl CreditLedgerPort for SqliteCreditLedger {
    async fn deduct(
        &self,
        user_id: &UserId,
        feature_key: &str,
        note: &str,
    ) -> Result<DeductOutcome, CreditError> {
        let cost: i64 = sqlx::query_scalar("SELECT cost FROM credit_features WHERE feature_key = ?")
            .bind(feature_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CreditError::Unavailable(e.to_string()))?
            .ok_or_else(|| CreditError::UnknownFeature(feature_key.to_string()))?;

        let now = Utc::now().to_rfc3339();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CreditError::Unavailable(e.to_string()))?;

        // 条件扣减是事务内第一条语句，直接取得写锁
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE credit_accounts
            SET balance = balance - ?, updated_at = ?
            WHERE user_id = ? AND balance >= ?
            RETURNING balance
            "#,
        )
        .bind(cost)
        .bind(&now)
        .bind(user_id.as_str())
        .bind(cost)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| CreditError::Unavailable(e.to_string()))?;

        let Some(remaining) = remaining else {
            tx.rollback()
                .await
                .map_err(|e| CreditError::Unavailable(e.to_string()))?;

            return match self.balance(user_id).await? {
                None => Ok(DeductOutcome::refused(None, "Credit account not found")),
                Some(balance) => {
                    tracing::debug!(
                        user_id = %user_id,
                        balance = balance,
                        cost = cost,
                        "Credit deduction refused"
                    );
                    Ok(DeductOutcome::refused(
                        Some(balance),
                        format!("Insufficient credit: balance {}, required {}", balance, cost),
                    ))
                }
            };
        };

        sqlx::query(
            r#"
            INSERT INTO credit_transactions (id, user_id, feature_key, amount, balance_after, note, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.as_str())
        .bind(feature_key)
        .bind(-cost)
        .bind(remaining)
        .bind(note)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| CreditError::Unavailable(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CreditError::Unavailable(e.to_string()))?;

        Ok(DeductOutcome::approved(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};
    use std::sync::Arc;

    async fn ledger() -> SqliteCreditLedger {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let ledger = SqliteCreditLedger::new(pool);
        ledger.ensure_feature("script_generation", 3).await.unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_deduct_until_insufficient() {
        let ledger = ledger().await;
        let user = UserId::new("reader").unwrap();
        ledger.set_balance(&user, 7).await.unwrap();

        let first = ledger.deduct(&user, "script_generation", "第 1 章").await.unwrap();
        assert_eq!(first, DeductOutcome::approved(4));

        let second = ledger.deduct(&user, "script_generation", "第 2 章").await.unwrap();
        assert_eq!(second, DeductOutcome::approved(1));

        let third = ledger.deduct(&user, "script_generation", "第 3 章").await.unwrap();
        assert!(!third.success);
        assert_eq!(third.balance, Some(1));

        assert_eq!(ledger.balance(&user).await.unwrap(), Some(1));
        assert_eq!(ledger.transaction_count(&user).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_account_is_refused() {
        let ledger = ledger().await;
        let user = UserId::new("ghost").unwrap();

        let outcome = ledger.deduct(&user, "script_generation", "n").await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.balance, None);
    }

    #[tokio::test]
    async fn test_unknown_feature_is_error() {
        let ledger = ledger().await;
        let user = UserId::new("reader").unwrap();
        ledger.set_balance(&user, 10).await.unwrap();

        let result = ledger.deduct(&user, "storyboard", "n").await;
        assert!(matches!(result, Err(CreditError::UnknownFeature(_))));
        assert_eq!(ledger.balance(&user).await.unwrap(), Some(10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deductions_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::new(dir.path().join("credit.db")).with_max_connections(8);
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let ledger = Arc::new(SqliteCreditLedger::new(pool));
        ledger.ensure_feature("script_generation", 1).await.unwrap();
        let user = UserId::new("reader").unwrap();
        ledger.set_balance(&user, 1000).await.unwrap();

        let tasks: Vec<_> = (0..40)
            .map(|i| {
                let ledger = ledger.clone();
                let user = user.clone();
                tokio::spawn(async move {
                    ledger
                        .deduct(&user, "script_generation", &format!("第 {} 章", i))
                        .await
                })
            })
            .collect();

        for task in tasks {
            let outcome = task.await.unwrap().unwrap();
            assert!(outcome.success, "{:?}", outcome);
        }

        assert_eq!(ledger.balance(&user).await.unwrap(), Some(960));
        assert_eq!(ledger.transaction_count(&user).await.unwrap(), 40);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deductions_never_overdraw() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::new(dir.path().join("credit.db")).with_max_connections(8);
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let ledger = Arc::new(SqliteCreditLedger::new(pool));
        ledger.ensure_feature("script_generation", 3).await.unwrap();
        let user = UserId::new("reader").unwrap();
        ledger.set_balance(&user, 10).await.unwrap();

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let ledger = ledger.clone();
                let user = user.clone();
                tokio::spawn(async move { ledger.deduct(&user, "script_generation", "n").await })
            })
            .collect();

        let mut approved = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().success {
                approved += 1;
            }
        }

        assert_eq!(approved, 3);
        assert_eq!(ledger.balance(&user).await.unwrap(), Some(1));
    }
}

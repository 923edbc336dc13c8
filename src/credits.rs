// src/credits.rs
//
// Credit ledger: per-user balance plus append-only logs. Every balance
// mutation and its log appends run in one transaction, so the invariant
// sum(credit_transactions.amount) == user_credits.balance holds as long as
// every write goes through this module.

use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::models::{CreditBalance, LedgerEntry, LedgerKind, UsageEntry};

/// One credit buys one generation run.
pub const GENERATION_COST: i64 = 1;

/// Signup grant applied at onboarding.
pub const ONBOARDING_GRANT: i64 = 1;

/// A user without a balance row has simply never been granted credits;
/// that reads as zero, not as an error.
pub async fn get_balance(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT balance FROM user_credits WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.get::<i64, _>("balance")).unwrap_or(0))
}

pub async fn get_balance_detail(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<CreditBalance>, sqlx::Error> {
    sqlx::query_as::<_, CreditBalance>(
        r#"SELECT user_id, balance, updated_at, last_purchase_at
           FROM user_credits
           WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn has_sufficient_credit(
    pool: &PgPool,
    user_id: Uuid,
    required: i64,
) -> Result<bool, sqlx::Error> {
    Ok(get_balance(pool, user_id).await? >= required)
}

/// Debits `amount` credits. The decrement is conditional on the current
/// balance, so concurrent charges against the same user cannot overdraw.
pub async fn charge(pool: &PgPool, user_id: Uuid, amount: i64) -> Result<(), WorkflowError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"UPDATE user_credits
           SET balance = balance - $2, updated_at = NOW()
           WHERE user_id = $1 AND balance >= $2"#,
    )
    .bind(user_id)
    .bind(amount)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        drop(tx);
        let balance = get_balance(pool, user_id).await?;
        return Err(WorkflowError::InsufficientCredit { balance });
    }

    let description = "Credit used for product image generation";
    append_entry(&mut tx, user_id, -amount, LedgerKind::Usage, description, None).await?;
    append_usage_log(&mut tx, user_id, -amount, description).await?;

    tx.commit().await?;
    Ok(())
}

/// Compensation path: runs while another error is already being handled,
/// so it must never fail loudly. Failures are logged and swallowed.
pub async fn refund(pool: &PgPool, user_id: Uuid, amount: i64) {
    if let Err(e) = try_refund(pool, user_id, amount).await {
        log::error!("credit refund failed user_id={user_id} amount={amount}: {e}");
    }
}

async fn try_refund(pool: &PgPool, user_id: Uuid, amount: i64) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"UPDATE user_credits
           SET balance = balance + $2, updated_at = NOW()
           WHERE user_id = $1"#,
    )
    .bind(user_id)
    .bind(amount)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        // Refund only ever follows a successful charge, so the row should
        // exist; if it doesn't, there is nothing to put the credit back on.
        log::warn!("refund found no balance row user_id={user_id}");
        return Ok(());
    }

    let description = "Refund for failed generation";
    append_entry(&mut tx, user_id, amount, LedgerKind::Refund, description, None).await?;
    append_usage_log(&mut tx, user_id, amount, description).await?;

    tx.commit().await?;
    Ok(())
}

/// Runs inside the capture transaction: only a payment row that actually
/// transitioned to completed may reach this.
pub async fn credit_purchase(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    credits: i64,
    payment_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO user_credits (user_id, balance, last_purchase_at)
           VALUES ($1, $2, NOW())
           ON CONFLICT (user_id) DO UPDATE SET
               balance = user_credits.balance + EXCLUDED.balance,
               updated_at = NOW(),
               last_purchase_at = NOW()"#,
    )
    .bind(user_id)
    .bind(credits)
    .execute(&mut **tx)
    .await?;

    let description = format!("Purchased {credits} credits");
    append_entry(tx, user_id, credits, LedgerKind::Purchase, &description, Some(payment_id)).await?;

    Ok(())
}

/// Signup grant. Idempotent: re-running onboarding must not stack free
/// credits, so an existing balance row makes this a no-op.
pub async fn grant_onboarding_credit(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"INSERT INTO user_credits (user_id, balance)
           VALUES ($1, $2)
           ON CONFLICT (user_id) DO NOTHING"#,
    )
    .bind(user_id)
    .bind(ONBOARDING_GRANT)
    .execute(&mut *tx)
    .await?;

    if inserted.rows_affected() == 0 {
        return Ok(());
    }

    append_entry(
        &mut tx,
        user_id,
        ONBOARDING_GRANT,
        LedgerKind::Adjustment,
        "Onboarding signup grant",
        None,
    )
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn usage_history(pool: &PgPool, user_id: Uuid) -> Result<Vec<UsageEntry>, sqlx::Error> {
    sqlx::query_as::<_, UsageEntry>(
        r#"SELECT id, user_id, amount, description, created_at
           FROM credit_usages
           WHERE user_id = $1
           ORDER BY created_at DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn ledger_history(pool: &PgPool, user_id: Uuid) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        r#"SELECT id, user_id, amount, kind, description, related_payment_id, created_at
           FROM credit_transactions
           WHERE user_id = $1
           ORDER BY created_at DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

async fn append_entry(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
    kind: LedgerKind,
    description: &str,
    related_payment_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO credit_transactions
               (user_id, amount, kind, description, related_payment_id)
           VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(kind.as_str())
    .bind(description)
    .bind(related_payment_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn append_usage_log(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
    description: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO credit_usages (user_id, amount, description)
           VALUES ($1, $2, $3)"#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(description)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

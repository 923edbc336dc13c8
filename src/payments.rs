// src/payments.rs
//
// Payment workflow: PayPal order creation and capture reconciliation.
// State machine: none -> pending -> completed. Nothing transitions
// backward, and provider failures before the row insert leave no row.

use sqlx::PgPool;
use uuid::Uuid;

use crate::api::paypal_client::PayPalClient;
use crate::credits;
use crate::db;
use crate::error::WorkflowError;
use crate::models::OrderMetadata;

pub struct CreatedOrder {
    pub order_id: String,
    pub payment_id: i64,
}

pub struct CaptureOutcome {
    /// Provider-side order status, e.g. `COMPLETED`.
    pub status: String,
    pub credits: i64,
}

pub async fn create_order(
    pool: &PgPool,
    paypal: &PayPalClient,
    package_id: &str,
    user_id: Uuid,
) -> Result<CreatedOrder, WorkflowError> {
    if package_id.trim().is_empty() {
        return Err(WorkflowError::validation(
            "Package ID and User ID are required.",
        ));
    }

    let package = db::get_package_by_id(pool, package_id)
        .await?
        .ok_or(WorkflowError::NotFound("package"))?;

    if !db::user_exists(pool, user_id).await? {
        return Err(WorkflowError::NotFound("user"));
    }

    // The metadata blob rides on the order so capture can attribute the
    // credits without a separate lookup.
    let metadata = OrderMetadata {
        user_id,
        package_id: package.id.clone(),
        credits: i64::from(package.credits),
    };
    let custom_id = serde_json::to_string(&metadata)
        .map_err(|e| WorkflowError::Parse(format!("order metadata: {e}")))?;
    let description = format!("{} - {} Credits", package.name, package.credits);

    let order = paypal
        .create_order(&package.price, "USD", &description, &custom_id)
        .await
        .map_err(|e| e.into_workflow("paypal"))?;

    // The provider order exists from here on. If the row insert fails the
    // orphaned order is accepted; without a payments row it can never be
    // captured into credits.
    let payment_id =
        match db::create_payment(pool, user_id, &package.id, &package.price, "USD", &order.id)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                log::warn!(
                    "payment row insert failed, orphaned paypal order {}: {e}",
                    order.id
                );
                return Err(WorkflowError::Persistence(e));
            }
        };

    Ok(CreatedOrder {
        order_id: order.id,
        payment_id,
    })
}

pub async fn capture_order(
    pool: &PgPool,
    paypal: &PayPalClient,
    order_id: &str,
) -> Result<CaptureOutcome, WorkflowError> {
    let mut order = paypal
        .get_order(order_id)
        .await
        .map_err(|e| e.into_workflow("paypal"))?;

    if !order.is_completed() {
        let captured = paypal
            .capture_order(order_id)
            .await
            .map_err(|e| e.into_workflow("paypal"))?;
        // Metadata stays with the fetched order; only the status moves.
        order.status = captured.status;
    }

    // Without the metadata blob there is nothing safe to credit; fatal for
    // the request.
    let custom_id = order
        .custom_id()
        .ok_or_else(|| WorkflowError::Parse("order carries no metadata blob".to_string()))?;
    let metadata: OrderMetadata = serde_json::from_str(custom_id)
        .map_err(|e| WorkflowError::Parse(format!("order metadata: {e}")))?;

    let payment = db::get_payment_by_order(pool, order_id)
        .await?
        .ok_or(WorkflowError::NotFound("payment"))?;
    let payment_id = payment.id;

    let mut tx = pool.begin().await?;

    if order.is_completed() {
        // Only the pending -> completed transition grants credits; a replayed
        // capture of the same order updates nothing and credits nothing.
        let transitioned = sqlx::query(
            r#"UPDATE payments
               SET status = 'completed', updated_at = NOW()
               WHERE id = $1 AND status <> 'completed'"#,
        )
        .bind(payment_id)
        .execute(&mut *tx)
        .await?;

        if transitioned.rows_affected() > 0 {
            credits::credit_purchase(&mut tx, metadata.user_id, metadata.credits, payment_id)
                .await?;
        } else {
            log::info!("capture replay for already-completed payment id={payment_id}");
        }
    } else {
        // Not settled yet; the row stays pending and the client may retry.
        sqlx::query("UPDATE payments SET updated_at = NOW() WHERE id = $1")
            .bind(payment_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(CaptureOutcome {
        status: order.status,
        credits: metadata.credits,
    })
}

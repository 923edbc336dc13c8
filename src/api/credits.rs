// src/api/credits.rs

use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

use crate::{credits, AppState};

/// Balance plus both histories, the same three reads the profile page makes.
#[utoipa::path(
    get,
    path = "/api/credits/{user_id}",
    tag = "credits",
    params(
        ("user_id" = Uuid, Path, description = "User id from the auth provider")
    ),
    responses(
        (status = 200, description = "Balance, usage log and ledger entries")
    )
)]
#[get("/credits/{user_id}")]
pub async fn credit_summary(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let user_id = path.into_inner();

    // No balance row simply means no credits yet.
    let detail = match credits::get_balance_detail(&state.pool, user_id).await {
        Ok(d) => d,
        Err(e) => {
            log::error!("credit_summary balance error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };
    let balance = detail.as_ref().map(|d| d.balance).unwrap_or(0);
    let last_purchase_at = detail.and_then(|d| d.last_purchase_at);

    let usages = match credits::usage_history(&state.pool, user_id).await {
        Ok(u) => u,
        Err(e) => {
            log::error!("credit_summary usage history error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let transactions = match credits::ledger_history(&state.pool, user_id).await {
        Ok(t) => t,
        Err(e) => {
            log::error!("credit_summary ledger history error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok().json(json!({
        "balance": balance,
        "lastPurchaseAt": last_purchase_at,
        "usages": usages,
        "transactions": transactions,
    }))
}

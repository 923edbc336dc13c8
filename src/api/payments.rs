// src/api/payments.rs

use actix_web::{post, put, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error_response;
use crate::{payments, AppState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapturePaymentRequest {
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Opens a provider order for the package and records the pending payment.
/// Returns the ids the client-side checkout needs for its callbacks.
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Order created"),
        (status = 400, description = "Missing package or user id"),
        (status = 404, description = "Unknown package or user"),
        (status = 502, description = "Provider order creation failed")
    )
)]
#[post("/payments")]
pub async fn create_payment(
    state: web::Data<AppState>,
    payload: web::Json<CreatePaymentRequest>,
) -> impl Responder {
    let (Some(package_id), Some(user_id)) = (payload.package_id.as_deref(), payload.user_id)
    else {
        return HttpResponse::BadRequest().json(json!({
            "error": "Package ID and User ID are required."
        }));
    };

    match payments::create_order(&state.pool, &state.paypal, package_id, user_id).await {
        Ok(created) => HttpResponse::Ok().json(json!({
            "orderId": created.order_id,
            "paymentId": created.payment_id,
        })),
        Err(e) => error_response("create_payment", "Failed to create payment", &e),
    }
}

/// Finalizes a provider order and, on confirmed capture, credits the ledger.
/// Safe to call repeatedly for the same order.
#[utoipa::path(
    put,
    path = "/api/payments",
    tag = "payments",
    request_body = CapturePaymentRequest,
    responses(
        (status = 200, description = "Capture processed"),
        (status = 400, description = "Missing order id"),
        (status = 404, description = "No payment recorded for the order"),
        (status = 502, description = "Provider capture failed")
    )
)]
#[put("/payments")]
pub async fn capture_payment(
    state: web::Data<AppState>,
    payload: web::Json<CapturePaymentRequest>,
) -> impl Responder {
    let Some(order_id) = payload.order_id.as_deref() else {
        return HttpResponse::BadRequest().json(json!({
            "error": "Order ID is required."
        }));
    };

    match payments::capture_order(&state.pool, &state.paypal, order_id).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({
            "success": true,
            "status": outcome.status,
            "credits": outcome.credits,
        })),
        Err(e) => error_response("capture_payment", "Failed to complete payment", &e),
    }
}

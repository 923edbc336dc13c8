// src/api/products.rs

use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;

use super::error_response;
use crate::generation::{self, SubmitRequest};
use crate::{db, AppState};

/// Runs the whole generation workflow within the request: credit check and
/// debit, session bookkeeping, the two-stage AI chain, compensation on
/// failure.
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Generation finished, image URLs returned"),
        (status = 400, description = "Missing or invalid fields"),
        (status = 402, description = "Insufficient credits"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Generation failed; the charged credit was refunded")
    )
)]
#[post("/products")]
pub async fn submit_product(
    state: web::Data<AppState>,
    payload: web::Json<SubmitRequest>,
) -> impl Responder {
    let request = payload.into_inner();

    match generation::submit(state.get_ref(), &request).await {
        Ok(urls) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Product created successfully",
            "data": { "imageUrls": urls },
        })),
        Err(e) => error_response("submit_product", "Failed to create product", &e),
    }
}

#[utoipa::path(
    get,
    path = "/api/packages",
    tag = "payments",
    responses(
        (status = 200, description = "Active catalog, price ascending", body = [crate::models::CreditPackage])
    )
)]
#[get("/packages")]
pub async fn list_packages(state: web::Data<AppState>) -> impl Responder {
    match db::list_active_packages(&state.pool).await {
        Ok(packages) => HttpResponse::Ok().json(packages),
        Err(e) => {
            log::error!("list_packages db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

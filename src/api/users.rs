// src/api/users.rs

use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

use crate::models::UserProfile;
use crate::{credits, db, AppState};

/// Onboarding: upserts the profile captured by the signup form and applies
/// the one-credit signup grant. Re-running is safe; the grant is idempotent.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = UserProfile,
    responses(
        (status = 200, description = "Profile saved, signup grant applied"),
        (status = 500, description = "Persistence failure")
    )
)]
#[post("/users")]
pub async fn onboard_user(
    state: web::Data<AppState>,
    payload: web::Json<UserProfile>,
) -> impl Responder {
    let profile = payload.into_inner();

    if let Err(e) = db::upsert_user(&state.pool, &profile).await {
        log::error!("onboard_user upsert error: {e}");
        return HttpResponse::InternalServerError().finish();
    }

    if let Err(e) = credits::grant_onboarding_credit(&state.pool, profile.id).await {
        log::error!("onboard_user grant error: {e}");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok().json(json!({ "success": true }))
}

/// Generation history for the activity page, newest first.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/sessions",
    tag = "users",
    params(
        ("user_id" = Uuid, Path, description = "User id from the auth provider")
    ),
    responses(
        (status = 200, description = "Generation sessions, newest first", body = [crate::models::GenerationSession])
    )
)]
#[get("/users/{user_id}/sessions")]
pub async fn list_user_sessions(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    match db::list_user_sessions(&state.pool, path.into_inner()).await {
        Ok(sessions) => HttpResponse::Ok().json(sessions),
        Err(e) => {
            log::error!("list_user_sessions db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

// src/generation.rs
//
// Generation workflow: one credit buys one end-to-end run of the two-stage
// AI chain. Compensation order on failure is fixed: refund first, then the
// session status flip, and neither may mask the original error.

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::openai_client::{PlanningRequest, MAX_SOURCE_IMAGES};
use crate::credits::{self, GENERATION_COST};
use crate::db;
use crate::error::WorkflowError;
use crate::models::ImagePrompt;
use crate::s3_utils;
use crate::AppState;

/// How many synthesis calls may be in flight at once. Items are independent;
/// output order stays index-aligned with the plan.
const SYNTHESIS_CONCURRENCY: usize = 4;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_style: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug)]
pub struct ValidSubmit<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price: &'a str,
    pub category: &'a str,
    pub image_urls: &'a [String],
    pub user_id: Uuid,
}

/// Field names in the missing-fields list match the wire format, since the
/// list goes back to the client verbatim.
pub fn validate(request: &SubmitRequest) -> Result<ValidSubmit<'_>, WorkflowError> {
    let mut missing = Vec::new();

    if request.name.as_deref().unwrap_or("").is_empty() {
        missing.push("name".to_string());
    }
    if request.description.as_deref().unwrap_or("").is_empty() {
        missing.push("description".to_string());
    }
    if request.price.as_deref().unwrap_or("").is_empty() {
        missing.push("price".to_string());
    }
    if request.category.as_deref().unwrap_or("").is_empty() {
        missing.push("category".to_string());
    }
    if request.image_style.as_deref().unwrap_or("").is_empty() {
        missing.push("imageStyle".to_string());
    }
    if request.image_urls.is_empty() {
        missing.push("imageUrls".to_string());
    }
    if request.user_id.is_none() {
        missing.push("userId".to_string());
    }

    if !missing.is_empty() {
        return Err(WorkflowError::missing_fields(missing));
    }

    if request.image_urls.len() > MAX_SOURCE_IMAGES {
        return Err(WorkflowError::validation(format!(
            "At most {MAX_SOURCE_IMAGES} source images are supported"
        )));
    }

    // The unwraps above were all checked; rebuild as borrowed fields.
    Ok(ValidSubmit {
        name: request.name.as_deref().unwrap_or(""),
        description: request.description.as_deref().unwrap_or(""),
        price: request.price.as_deref().unwrap_or(""),
        category: request.category.as_deref().unwrap_or(""),
        image_urls: &request.image_urls,
        user_id: request.user_id.unwrap_or_else(Uuid::nil),
    })
}

pub async fn submit(state: &AppState, request: &SubmitRequest) -> Result<Vec<String>, WorkflowError> {
    let valid = validate(request)?;

    if !credits::has_sufficient_credit(&state.pool, valid.user_id, GENERATION_COST).await? {
        let balance = credits::get_balance(&state.pool, valid.user_id).await?;
        return Err(WorkflowError::InsufficientCredit { balance });
    }

    credits::charge(&state.pool, valid.user_id, GENERATION_COST).await?;

    let session_id = Uuid::new_v4();
    if let Err(e) = db::create_session(
        &state.pool,
        session_id,
        valid.user_id,
        valid.name,
        valid.description,
        valid.price,
        valid.category,
        valid.image_urls,
    )
    .await
    {
        credits::refund(&state.pool, valid.user_id, GENERATION_COST).await;
        return Err(if is_fk_violation(&e) {
            WorkflowError::NotFound("user")
        } else {
            WorkflowError::Persistence(e)
        });
    }

    match run_chain(state, session_id, &valid).await {
        Ok(urls) => {
            if let Err(e) = db::complete_session(&state.pool, session_id, &urls).await {
                log::error!("failed to finalize session {session_id}: {e}");
            }
            Ok(urls)
        }
        Err(e) => {
            // Refund before anything else; its own failures are logged
            // inside and never replace `e`.
            credits::refund(&state.pool, valid.user_id, GENERATION_COST).await;
            if let Err(mark_err) = db::set_session_status(&state.pool, session_id, "error").await {
                log::error!("failed to mark session {session_id} as error: {mark_err}");
            }
            Err(e)
        }
    }
}

async fn run_chain(
    state: &AppState,
    session_id: Uuid,
    valid: &ValidSubmit<'_>,
) -> Result<Vec<String>, WorkflowError> {
    if let Err(e) = db::set_session_status(&state.pool, session_id, "processing").await {
        log::error!("failed to mark session {session_id} as processing: {e}");
    }

    let plan = state
        .openai
        .plan_product_images(&PlanningRequest {
            product_name: valid.name,
            product_description: valid.description,
            product_category: valid.category,
            product_price: valid.price,
            image_urls: valid.image_urls,
        })
        .await
        .map_err(|e| e.into_workflow("openai"))?;

    if let Err(e) = db::set_session_queries(&state.pool, session_id, &plan).await {
        log::error!("failed to store plan for session {session_id}: {e}");
    }

    synthesize_images(state, session_id, &plan, valid.image_urls).await
}

async fn synthesize_images(
    state: &AppState,
    session_id: Uuid,
    plan: &[ImagePrompt],
    source_urls: &[String],
) -> Result<Vec<String>, WorkflowError> {
    let results: Vec<Result<String, WorkflowError>> = stream::iter(plan.iter().enumerate())
        .map(|(index, item)| synthesize_one(state, session_id, index, item, source_urls))
        .buffered(SYNTHESIS_CONCURRENCY)
        .collect()
        .await;

    results.into_iter().collect()
}

async fn synthesize_one(
    state: &AppState,
    session_id: Uuid,
    index: usize,
    item: &ImagePrompt,
    source_urls: &[String],
) -> Result<String, WorkflowError> {
    // Index bounds were checked by the planning parser.
    let source_url = &source_urls[item.image_index_to_use];
    let source_bytes = fetch_image(&state.http, source_url).await?;

    let generated = state
        .gemini
        .edit_image(&item.prompt, &source_bytes)
        .await
        .map_err(|e| e.into_workflow("gemini"))?;

    let Some(bytes) = generated else {
        // Per-item degradation: the batch keeps going with a placeholder.
        log::warn!(
            "no image data in synthesis response session={session_id} item={index}, substituting placeholder"
        );
        return Ok(state.placeholder_image_url.clone());
    };

    let key = format!("products/{}.jpg", Uuid::new_v4());
    s3_utils::upload_product_image(
        &state.s3_client,
        &state.s3_bucket,
        &state.s3_public_base_url,
        &key,
        bytes,
    )
    .await
}

async fn fetch_image(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, WorkflowError> {
    let resp = http.get(url).send().await.map_err(|e| WorkflowError::Provider {
        provider: "image-fetch",
        detail: e.to_string(),
    })?;

    if !resp.status().is_success() {
        return Err(WorkflowError::Provider {
            provider: "image-fetch",
            detail: format!("status {} for {url}", resp.status()),
        });
    }

    let bytes = resp.bytes().await.map_err(|e| WorkflowError::Provider {
        provider: "image-fetch",
        detail: e.to_string(),
    })?;

    Ok(bytes.to_vec())
}

fn is_fk_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

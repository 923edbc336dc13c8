pub mod api;
pub mod credits;
pub mod db;
pub mod docs;
pub mod error;
pub mod generation;
pub mod models;
pub mod payments;
pub mod s3_utils;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::api::gemini_client::GeminiClient;
use crate::api::openai_client::OpenAiClient;
use crate::api::paypal_client::PayPalClient;

/// Process-wide state: the pool and the provider clients are built once at
/// startup and injected into the workflows through here.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub http: reqwest::Client,
    pub s3_client: S3Client,
    pub s3_bucket: String,
    pub s3_public_base_url: String,
    pub paypal: PayPalClient,
    pub openai: OpenAiClient,
    pub gemini: GeminiClient,
    pub placeholder_image_url: String,
}

// src/main.rs
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client as S3Client;
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use std::time::Duration;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use producto_backend::api::gemini_client::GeminiClient;
use producto_backend::api::openai_client::OpenAiClient;
use producto_backend::api::paypal_client::PayPalClient;
use producto_backend::{api, docs, AppState};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let paypal_client_id = env::var("PAYPAL_CLIENT_ID").expect("PAYPAL_CLIENT_ID required");
    let paypal_client_secret =
        env::var("PAYPAL_CLIENT_SECRET").expect("PAYPAL_CLIENT_SECRET required");
    let openai_api_key = env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY required");
    let gemini_api_key = env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY required");

    let s3_bucket = env::var("S3_BUCKET").expect("S3_BUCKET required");
    let s3_endpoint = env::var("S3_ENDPOINT").ok();
    let s3_public_base_url = env::var("S3_PUBLIC_BASE_URL")
        .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", s3_bucket));
    let placeholder_image_url = env::var("PLACEHOLDER_IMAGE_URL").unwrap_or_else(|_| {
        "https://placehold.co/1024x1024/jpg?text=Image+unavailable".to_string()
    });

    let request_timeout_secs = env::var("AI_REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(120);

    let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);

    // Allow custom S3-compatible endpoints (e.g., MinIO)
    if let Some(endpoint) = s3_endpoint {
        s3_config_builder = s3_config_builder
            .endpoint_url(endpoint)
            .force_path_style(true);
    }

    let s3_client = S3Client::from_conf(s3_config_builder.build());

    // One HTTP client for everything outbound; the timeout doubles as the
    // AI-chain timeout, after which the refund/error path takes over.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(request_timeout_secs))
        .build()
        .expect("failed to build http client");

    let state = web::Data::new(AppState {
        pool,
        http: http.clone(),
        s3_client,
        s3_bucket,
        s3_public_base_url,
        paypal: PayPalClient::new(http.clone(), paypal_client_id, paypal_client_secret),
        openai: OpenAiClient::new(http.clone(), openai_api_key),
        gemini: GeminiClient::new(http, gemini_api_key),
        placeholder_image_url,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            .service(
                web::scope("/api")
                    .service(api::payments::create_payment)
                    .service(api::payments::capture_payment)
                    .service(api::products::submit_product)
                    .service(api::products::list_packages)
                    .service(api::credits::credit_summary)
                    .service(api::users::onboard_user)
                    .service(api::users::list_user_sessions),
            )
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::payments::create_payment,
        crate::api::payments::capture_payment,
        crate::api::products::submit_product,
        crate::api::products::list_packages,
        crate::api::credits::credit_summary,
        crate::api::users::onboard_user,
        crate::api::users::list_user_sessions
    ),
    components(
        schemas(
            crate::api::payments::CreatePaymentRequest,
            crate::api::payments::CapturePaymentRequest,
            crate::generation::SubmitRequest,
            crate::models::CreditPackage,
            crate::models::GenerationSession,
            crate::models::LedgerEntry,
            crate::models::UsageEntry,
            crate::models::UserProfile
        )
    ),
    tags(
        (name = "payments", description = "PayPal orders, capture and the package catalog"),
        (name = "products", description = "AI product image generation"),
        (name = "credits", description = "Credit balance and history"),
        (name = "users", description = "Onboarding")
    )
)]
pub struct ApiDoc;

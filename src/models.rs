// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct CreditPackage {
    pub id: String,
    pub name: String,
    /// Numeric in the database, read as text so the wire format is exact.
    pub price: String,
    pub credits: i32,
    pub discount_percentage: i32,
    pub features: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct CreditBalance {
    pub user_id: Uuid,
    pub balance: i64,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_purchase_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
    Purchase,
    Usage,
    Refund,
    Adjustment,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Purchase => "purchase",
            LedgerKind::Usage => "usage",
            LedgerKind::Refund => "refund",
            LedgerKind::Adjustment => "adjustment",
        }
    }
}

/// Append-only ledger row. Positive amount = credits added, negative =
/// credits consumed.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub amount: i64,
    pub kind: String,
    pub description: String,
    pub related_payment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Row in the narrow usage log, same sign convention as the ledger.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct UsageEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: i64,
    pub user_id: Uuid,
    pub package_id: String,
    pub amount: String,
    pub currency: String,
    pub status: String, // pending | completed
    pub payment_method: String,
    pub provider_order_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Attribution blob embedded in the provider order's `custom_id` so capture
/// can credit the right user without a separate lookup.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetadata {
    pub user_id: Uuid,
    pub package_id: String,
    pub credits: i64,
}

/// One planned edit: which source image to start from and how to change it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePrompt {
    pub image_index_to_use: usize,
    pub prompt: String,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct GenerationSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String, // pending | processing | completed | error
    pub sample_image_urls: Vec<String>,
    pub product_name: String,
    pub product_description: String,
    pub product_price: String,
    pub product_category: String,
    pub generated_image_urls: Vec<String>,
    pub queries: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
}

/// Onboarding payload; `id` comes from the external auth provider.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub shop_category: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub come_path: Option<String>,
}

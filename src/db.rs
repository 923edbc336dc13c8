// src/db.rs

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{CreditPackage, GenerationSession, ImagePrompt, Payment, UserProfile};

pub async fn list_active_packages(pool: &PgPool) -> Result<Vec<CreditPackage>, sqlx::Error> {
    sqlx::query_as::<_, CreditPackage>(
        r#"SELECT id, name, price::text AS price, credits, discount_percentage, features, is_active
           FROM credit_packages
           WHERE is_active = true
           ORDER BY price ASC"#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_package_by_id(
    pool: &PgPool,
    package_id: &str,
) -> Result<Option<CreditPackage>, sqlx::Error> {
    sqlx::query_as::<_, CreditPackage>(
        r#"SELECT id, name, price::text AS price, credits, discount_percentage, features, is_active
           FROM credit_packages
           WHERE id = $1 AND is_active = true"#,
    )
    .bind(package_id)
    .fetch_optional(pool)
    .await
}

pub async fn user_exists(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn upsert_user(pool: &PgPool, profile: &UserProfile) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO users
               (id, email, display_name, photo_url, shop_name, shop_category, role, come_path)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
           ON CONFLICT (id) DO UPDATE SET
               email = EXCLUDED.email,
               display_name = EXCLUDED.display_name,
               photo_url = EXCLUDED.photo_url,
               shop_name = EXCLUDED.shop_name,
               shop_category = EXCLUDED.shop_category,
               role = EXCLUDED.role,
               come_path = EXCLUDED.come_path"#,
    )
    .bind(profile.id)
    .bind(&profile.email)
    .bind(profile.display_name.as_deref())
    .bind(profile.photo_url.as_deref())
    .bind(profile.shop_name.as_deref())
    .bind(profile.shop_category.as_deref())
    .bind(profile.role.as_deref())
    .bind(profile.come_path.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_payment(
    pool: &PgPool,
    user_id: Uuid,
    package_id: &str,
    amount: &str,
    currency: &str,
    provider_order_id: &str,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO payments
               (user_id, package_id, amount, currency, status, payment_method, provider_order_id)
           VALUES ($1, $2, $3::numeric, $4, 'pending', 'paypal', $5)
           RETURNING id"#,
    )
    .bind(user_id)
    .bind(package_id)
    .bind(amount)
    .bind(currency)
    .bind(provider_order_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get("id"))
}

pub async fn get_payment_by_order(
    pool: &PgPool,
    provider_order_id: &str,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        r#"SELECT id, user_id, package_id, amount::text AS amount, currency, status,
                  payment_method, provider_order_id, created_at, updated_at
           FROM payments
           WHERE provider_order_id = $1"#,
    )
    .bind(provider_order_id)
    .fetch_optional(pool)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn create_session(
    pool: &PgPool,
    session_id: Uuid,
    user_id: Uuid,
    product_name: &str,
    product_description: &str,
    product_price: &str,
    product_category: &str,
    sample_image_urls: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO generate_session
               (id, user_id, status, sample_image_urls,
                product_name, product_description, product_price, product_category)
           VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7)"#,
    )
    .bind(session_id)
    .bind(user_id)
    .bind(sample_image_urls)
    .bind(product_name)
    .bind(product_description)
    .bind(product_price)
    .bind(product_category)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_session_status(
    pool: &PgPool,
    session_id: Uuid,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE generate_session SET status = $2 WHERE id = $1")
        .bind(session_id)
        .bind(status)
        .execute(pool)
        .await?;

    Ok(())
}

/// Stores the validated plan on the session for correlation with the
/// generated URLs.
pub async fn set_session_queries(
    pool: &PgPool,
    session_id: Uuid,
    prompts: &[ImagePrompt],
) -> Result<(), sqlx::Error> {
    let queries = serde_json::to_value(prompts).unwrap_or_else(|e| {
        log::warn!("failed to serialize plan for session {session_id}: {e}");
        serde_json::Value::Array(Vec::new())
    });

    sqlx::query("UPDATE generate_session SET queries = $2 WHERE id = $1")
        .bind(session_id)
        .bind(queries)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn list_user_sessions(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<GenerationSession>, sqlx::Error> {
    sqlx::query_as::<_, GenerationSession>(
        r#"SELECT id, user_id, status, sample_image_urls,
                  product_name, product_description, product_price, product_category,
                  generated_image_urls, queries, created_at
           FROM generate_session
           WHERE user_id = $1
           ORDER BY created_at DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn complete_session(
    pool: &PgPool,
    session_id: Uuid,
    generated_image_urls: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE generate_session
           SET status = 'completed', generated_image_urls = $2
           WHERE id = $1"#,
    )
    .bind(session_id)
    .bind(generated_image_urls)
    .execute(pool)
    .await?;

    Ok(())
}

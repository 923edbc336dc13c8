// src/api/paypal_client.rs
//
// Minimal client for the PayPal Orders v2 API.
// Auth: client-credentials OAuth, a fresh token per call.

use serde::{Deserialize, Serialize};

use super::ApiClientError;

const PAYPAL_LIVE_BASE: &str = "https://api-m.paypal.com";
const PAYPAL_SANDBOX_BASE: &str = "https://api-m.sandbox.paypal.com";

#[derive(Clone)]
pub struct PayPalClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct OrderAmount<'a> {
    currency_code: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct PurchaseUnitRequest<'a> {
    amount: OrderAmount<'a>,
    description: &'a str,
    custom_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    intent: &'a str,
    purchase_units: Vec<PurchaseUnitRequest<'a>>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseUnit {
    #[serde(default)]
    pub custom_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
}

impl Order {
    pub fn is_completed(&self) -> bool {
        self.status == "COMPLETED"
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.purchase_units
            .first()
            .and_then(|unit| unit.custom_id.as_deref())
    }
}

impl PayPalClient {
    /// `PAYPAL_ENV=production` selects the live endpoint, anything else the
    /// sandbox; `PAYPAL_API_BASE_URL` overrides both (used by the tests).
    pub fn new(http: reqwest::Client, client_id: String, client_secret: String) -> Self {
        let env_name = std::env::var("PAYPAL_ENV").unwrap_or_else(|_| "sandbox".to_string());
        let default_base = if env_name == "production" {
            PAYPAL_LIVE_BASE
        } else {
            PAYPAL_SANDBOX_BASE
        };
        let base_url = std::env::var("PAYPAL_API_BASE_URL")
            .unwrap_or_else(|_| default_base.to_string());

        Self {
            http,
            base_url,
            client_id,
            client_secret,
        }
    }

    // Tokens are not cached across calls; every operation re-authenticates.
    async fn access_token(&self) -> Result<String, ApiClientError> {
        let resp = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ApiClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ApiClientError::InvalidResponse(format!("{e}; body={body}")))?;
        Ok(token.access_token)
    }

    pub async fn create_order(
        &self,
        value: &str,
        currency: &str,
        description: &str,
        custom_id: &str,
    ) -> Result<Order, ApiClientError> {
        let token = self.access_token().await?;

        let request = CreateOrderRequest {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnitRequest {
                amount: OrderAmount {
                    currency_code: currency,
                    value,
                },
                description,
                custom_id,
            }],
        };

        let resp = self
            .http
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?;

        read_order(resp).await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order, ApiClientError> {
        let token = self.access_token().await?;

        let resp = self
            .http
            .get(format!("{}/v2/checkout/orders/{order_id}", self.base_url))
            .bearer_auth(&token)
            .send()
            .await?;

        read_order(resp).await
    }

    pub async fn capture_order(&self, order_id: &str) -> Result<Order, ApiClientError> {
        let token = self.access_token().await?;

        let resp = self
            .http
            .post(format!(
                "{}/v2/checkout/orders/{order_id}/capture",
                self.base_url
            ))
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        read_order(resp).await
    }
}

async fn read_order(resp: reqwest::Response) -> Result<Order, ApiClientError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(ApiClientError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<Order>(&body)
        .map_err(|e| ApiClientError::InvalidResponse(format!("{e}; body={body}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_exposes_status_and_metadata() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": "5O190127TN364715T",
                "status": "COMPLETED",
                "purchase_units": [
                    {
                        "reference_id": "default",
                        "custom_id": "{\"userId\":\"11111111-2222-3333-4444-555555555555\",\"packageId\":\"basic\",\"credits\":21}"
                    }
                ]
            }"#,
        )
        .expect("order json");

        assert!(order.is_completed());
        assert!(order.custom_id().unwrap().contains("basic"));
    }

    #[test]
    fn order_without_units_has_no_metadata() {
        let order: Order = serde_json::from_str(r#"{"id": "X", "status": "CREATED"}"#)
            .expect("order json");

        assert!(!order.is_completed());
        assert!(order.custom_id().is_none());
    }
}

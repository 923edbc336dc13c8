// src/api/openai_client.rs
//
// Planning step of the generation chain: one multi-modal chat completion
// that must come back as a JSON object with exactly PLANNED_IMAGE_COUNT
// prompts. No partial results; anything off-contract fails the chain.

use serde::Deserialize;
use serde_json::json;

use super::ApiClientError;
use crate::models::ImagePrompt;

const OPENAI_DEFAULT_BASE: &str = "https://api.openai.com";

/// Every plan produces exactly this many image prompts.
pub const PLANNED_IMAGE_COUNT: usize = 16;

/// The planning contract accepts at most this many source images.
pub const MAX_SOURCE_IMAGES: usize = 5;

const SYSTEM_PROMPT: &str = r#"You are a professional product photography expert.
The user will provide between 1 to 5 product images along with the product's name,
description, category, and price. Based on these provided images and information,
you will create detailed image-to-image prompts to generate 16 new product images.
Each newly generated image must be based on exactly one of the user's provided images.
Answer in JSON format with the following structure:
{
    "prompts": [
        {
        "imageIndexToUse": index of the provided image to be used (starting from 0),
        "prompt": detailed prompt for generating the new image
        }
    ]
}
Important guidelines:
- Exactly 16 image prompts must be generated.
- Each prompt must clearly describe how to artistically enhance or modify the chosen original image to make it visually appealing, professional, and relevant to the provided product details.
- Ensure variety in style, composition, lighting, background settings, and product presentation across all 16 images.
- Clearly reference the original provided image index (imageIndexToUse) for each prompt.
- If the product type is fashion, at least 8 images include human model wearing the product.
- Never include any text in the images.
Proceed when the user provides the required product images and information."#;

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

pub struct PlanningRequest<'a> {
    pub product_name: &'a str,
    pub product_description: &'a str,
    pub product_category: &'a str,
    pub product_price: &'a str,
    pub image_urls: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlanningResponse {
    prompts: Vec<ImagePrompt>,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        let base_url = std::env::var("OPENAI_API_BASE_URL")
            .unwrap_or_else(|_| OPENAI_DEFAULT_BASE.to_string());
        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    pub async fn plan_product_images(
        &self,
        request: &PlanningRequest<'_>,
    ) -> Result<Vec<ImagePrompt>, ApiClientError> {
        let user_prompt = format!(
            "Product name: {}\nProduct description: {}\nProduct category: {}\nProduct price: {}",
            request.product_name,
            request.product_description,
            request.product_category,
            request.product_price,
        );

        let mut content = vec![json!({ "type": "text", "text": user_prompt })];
        content.extend(request.image_urls.iter().map(|url| {
            json!({ "type": "image_url", "image_url": { "url": url } })
        }));

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": content },
            ],
            "response_format": { "type": "json_object" },
        });

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;
        if !status.is_success() {
            return Err(ApiClientError::Api {
                status: status.as_u16(),
                body: raw,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&raw)
            .map_err(|e| ApiClientError::InvalidResponse(format!("{e}; body={raw}")))?;
        let content = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| ApiClientError::InvalidResponse("no content in completion".to_string()))?;

        parse_planning_response(content, request.image_urls.len())
    }
}

/// Strict schema check: exactly [`PLANNED_IMAGE_COUNT`] prompts, every index
/// pointing at a provided source image.
pub fn parse_planning_response(
    content: &str,
    source_count: usize,
) -> Result<Vec<ImagePrompt>, ApiClientError> {
    let parsed: PlanningResponse = serde_json::from_str(content).map_err(|e| {
        ApiClientError::InvalidResponse(format!("planning response is not valid JSON: {e}"))
    })?;

    if parsed.prompts.len() != PLANNED_IMAGE_COUNT {
        return Err(ApiClientError::InvalidResponse(format!(
            "expected {PLANNED_IMAGE_COUNT} prompts, got {}",
            parsed.prompts.len()
        )));
    }

    if let Some(bad) = parsed
        .prompts
        .iter()
        .find(|p| p.image_index_to_use >= source_count)
    {
        return Err(ApiClientError::InvalidResponse(format!(
            "prompt references source image {} but only {source_count} were provided",
            bad.image_index_to_use
        )));
    }

    Ok(parsed.prompts)
}

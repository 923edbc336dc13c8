// src/api/gemini_client.rs
//
// Synthesis step of the generation chain: image-to-image edits through the
// generateContent endpoint, inline base64 in both directions.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

use super::ApiClientError;

const GEMINI_DEFAULT_BASE: &str = "https://generativelanguage.googleapis.com";
const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash-exp-image-generation";

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        let base_url = std::env::var("GEMINI_API_BASE_URL")
            .unwrap_or_else(|_| GEMINI_DEFAULT_BASE.to_string());
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| GEMINI_DEFAULT_MODEL.to_string());

        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    /// Returns the edited image bytes, or `None` when the model answered
    /// without an image part (the caller decides how to degrade).
    pub async fn edit_image(
        &self,
        prompt: &str,
        source_jpeg: &[u8],
    ) -> Result<Option<Vec<u8>>, ApiClientError> {
        let body = json!({
            "contents": [{
                "parts": [
                    {
                        "text": format!(
                            "Edit this image according to the following description: {prompt} For online shop product image."
                        )
                    },
                    {
                        "inline_data": {
                            "mime_type": "image/jpeg",
                            "data": BASE64.encode(source_jpeg),
                        }
                    }
                ]
            }],
            "generationConfig": { "responseModalities": ["Text", "Image"] },
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let resp = self.http.post(url).json(&body).send().await?;

        let status = resp.status();
        let raw = resp.text().await?;
        if !status.is_success() {
            return Err(ApiClientError::Api {
                status: status.as_u16(),
                body: raw,
            });
        }

        let response: Value = serde_json::from_str(&raw)
            .map_err(|e| ApiClientError::InvalidResponse(format!("{e}; body={raw}")))?;

        let Some(data) = extract_inline_image(&response) else {
            return Ok(None);
        };

        let bytes = BASE64.decode(data).map_err(|e| {
            ApiClientError::InvalidResponse(format!("inline image is not valid base64: {e}"))
        })?;
        Ok(Some(bytes))
    }
}

/// First image part of the first candidate, if any. The REST response uses
/// camelCase part names; the snake_case spelling is accepted as well since
/// the request side writes it that way.
pub fn extract_inline_image(response: &Value) -> Option<&str> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?
        .iter()
        .find_map(|part| {
            let inline = part.get("inlineData").or_else(|| part.get("inline_data"))?;
            let mime = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))?
                .as_str()?;
            if mime.starts_with("image/") {
                inline.get("data")?.as_str()
            } else {
                None
            }
        })
}

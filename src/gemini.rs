//! Gemini API client
//!
//! Implements [`LanguageModel`] over `generateContent`.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::composer::{ChatMessage, LanguageModel, Role};
use crate::error::OrchestrationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: format!("{}/{}:generateContent", GEMINI_BASE_URL, model),
            temperature: 0.2,
        })
    }

    fn build_request(&self, messages: &[ChatMessage]) -> GeminiRequest {
        let system_text = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let contents = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GeminiRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: (!system_text.is_empty()).then(|| SystemInstruction {
                parts: vec![Part { text: system_text }],
            }),
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(OrchestrationError::GenerationUnavailable(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}?key={}", self.base_url, self.api_key);
        let request = self.build_request(messages);

        debug!("Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() { "timed out" } else { "request failed" };
                error!("Gemini API {}: {}", reason, e.without_url());
                OrchestrationError::GenerationUnavailable(format!("Gemini API {}", reason))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response ({}): {}", status, error_text);
            return Err(OrchestrationError::GenerationUnavailable(format!(
                "Gemini API returned {}",
                status
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e.without_url());
            OrchestrationError::GenerationUnavailable("Gemini response malformed".to_string())
        })?;

        extract_text(gemini_response)
    }
}

fn extract_text(response: GeminiResponse) -> crate::Result<String> {
    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        OrchestrationError::GenerationUnavailable("No response from Gemini API".to_string())
    })?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        debug!(finish_reason = reason, "Gemini candidate finished");
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(OrchestrationError::GenerationUnavailable(
            "Empty response from Gemini".to_string(),
        ));
    }

    Ok(text)
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    fn client(api_key: &str) -> GeminiClient {
        GeminiClient::new(api_key.to_string(), DEFAULT_GEMINI_MODEL, Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![
            ChatMessage::system("You are a company data assistant."),
            ChatMessage::user("Context:\nNo data found\n\nQuestion: hi"),
        ];

        let json = serde_json::to_value(client("k").build_request(&messages)).unwrap();
        assert_eq!(
            json["system_instruction"]["parts"][0]["text"],
            "You are a company data assistant."
        );
        assert_eq!(json["contents"].as_array().unwrap().len(), 1);
        assert_eq!(json["contents"][0]["role"], "user");
        assert!(json["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Question: hi"));
        let temperature = json["generation_config"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_response_text_joined_across_parts() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Your balance "}, {"text": "is 100."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10}
        });

        let response: GeminiResponse = serde_json::from_value(body).unwrap();
        assert_eq!(extract_text(response).unwrap(), "Your balance is 100.");
    }

    #[test]
    fn test_empty_candidates_is_generation_unavailable() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(matches!(err, OrchestrationError::GenerationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let err = assert_err!(client("").complete(&[ChatMessage::user("hi")]).await);
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}

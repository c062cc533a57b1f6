use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::traits::Model;
use super::types::GenerationRequest;
use crate::app::ModelSettings;
use crate::utils::SiteError;

/// generateContent request
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Forces a JSON answer shaped by `response_schema`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

/// generateContent response
#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Google Gemini backend
pub struct GeminiModel {
    client: Client,
    endpoint: String,
    model_name: String,
    api_key: String,
}

impl GeminiModel {
    /// Create a new Gemini model. The key is assumed to be validated by the factory.
    pub fn new(settings: &ModelSettings, api_key: &str) -> Result<Self, SiteError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()?,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model_name: settings.name.clone(),
            api_key: api_key.to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model_name
        )
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, SiteError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.schema,
            },
        };

        info!(model = %self.model_name, prompt_bytes = request.prompt.len(), "requesting generation");

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&body)?)
            .send()
            .await
            .map_err(|e| SiteError::Model(format!("Failed to connect to Gemini: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SiteError::Model(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SiteError::Model(format!("Failed to parse Gemini response: {}", e)))?;

        // Structured output may arrive split across several parts
        let text: String = result
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.as_ref())
            .map(|parts| parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(SiteError::Model("No response from Gemini".to_string()));
        }

        debug!(response_bytes = text.len(), "generation finished");
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn model(server: &MockServer) -> GeminiModel {
        let settings = ModelSettings {
            endpoint: server.base_url(),
            ..ModelSettings::default()
        };
        GeminiModel::new(&settings, "AIzaTestKey").unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest::change_set("Add an about page".to_string())
    }

    #[tokio::test]
    async fn test_sends_schema_and_joins_parts() {
        let server = MockServer::start_async().await;
        let call = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash:generateContent")
                    .header("x-goog-api-key", "AIzaTestKey")
                    .json_body(json!({
                        "contents": [{"parts": [{"text": "Add an about page"}]}],
                        "generationConfig": {
                            "responseMimeType": "application/json",
                            "responseSchema": crate::models::change_set_schema()
                        }
                    }));
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": {"parts": [
                            {"text": "{\"files\": "},
                            {"text": "[]}"}
                        ]}
                    }]
                }));
            })
            .await;

        let text = model(&server).generate(&request()).await.unwrap();
        call.assert_async().await;
        assert_eq!(text, "{\"files\": []}");
    }

    #[tokio::test]
    async fn test_api_error_is_model_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(400).body("API key not valid");
            })
            .await;

        let err = model(&server).generate(&request()).await.unwrap_err();
        match err {
            SiteError::Model(msg) => {
                assert!(msg.starts_with("Gemini API error (400"));
                assert!(msg.contains("API key not valid"));
            }
            other => panic!("expected model error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({"candidates": []}));
            })
            .await;

        let err = model(&server).generate(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "Model error: No response from Gemini");
    }

    #[test]
    fn test_name() {
        let settings = ModelSettings::default();
        let model = GeminiModel::new(&settings, "k").unwrap();
        assert_eq!(model.name(), "gemini-2.5-flash");
    }
}

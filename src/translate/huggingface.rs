use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, KaptionError};
use super::{MultilingualTranslator, PairTranslator};

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<TagParameters<'a>>,
}

#[derive(Debug, Serialize)]
struct TagParameters<'a> {
    src_lang: &'a str,
    tgt_lang: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationText {
    pub translation_text: String,
}

/// One result per input; some pipelines wrap each result in a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TranslationItem {
    Single(TranslationText),
    Nested(Vec<TranslationText>),
}

impl TranslationItem {
    fn into_text(self) -> Result<String> {
        match self {
            Self::Single(t) => Ok(t.translation_text),
            Self::Nested(mut list) if !list.is_empty() => Ok(list.swap_remove(0).translation_text),
            Self::Nested(_) => Err(KaptionError::Translation("Empty translation entry".to_string())),
        }
    }
}

/// Decode an inference response body into one text per input
pub fn parse_translation_response(body: &str) -> Result<Vec<String>> {
    let items: Vec<TranslationItem> = serde_json::from_str(body)
        .map_err(|e| KaptionError::Translation(format!("Failed to parse response: {}", e)))?;

    items.into_iter().map(TranslationItem::into_text).collect()
}

/// Shared HTTP client for a Hugging Face style inference endpoint
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl InferenceClient {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.endpoint, model)
    }

    async fn post(&self, model: &str, request: &InferenceRequest<'_>) -> Result<Vec<String>> {
        let url = self.model_url(model);
        debug!("Sending {} texts to {}", request.inputs.len(), url);

        let mut builder = self.client.post(&url).json(request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| KaptionError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(KaptionError::Translation(format!(
                "Inference API error {}: {}", status, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| KaptionError::Translation(format!("Failed to read response: {}", e)))?;

        parse_translation_response(&body)
    }
}

/// Single language pair model (e.g. Helsinki-NLP/opus-mt-en-fr)
pub struct HfPairEngine {
    client: InferenceClient,
    model: String,
}

impl HfPairEngine {
    pub fn new(client: InferenceClient, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }
}

#[async_trait]
impl PairTranslator for HfPairEngine {
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<String>> {
        let request = InferenceRequest { inputs: texts, parameters: None };
        self.client.post(&self.model, &request).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Many-to-many model (e.g. facebook/mbart-large-50-many-to-many-mmt)
pub struct HfMultilingualEngine {
    client: InferenceClient,
    model: String,
}

impl HfMultilingualEngine {
    pub fn new(client: InferenceClient, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }
}

#[async_trait]
impl MultilingualTranslator for HfMultilingualEngine {
    async fn translate_batch(
        &self,
        texts: &[String],
        source_tag: &str,
        target_tag: &str,
    ) -> Result<Vec<String>> {
        let request = InferenceRequest {
            inputs: texts,
            parameters: Some(TagParameters { src_lang: source_tag, tgt_lang: target_tag }),
        };
        self.client.post(&self.model, &request).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_and_nested_responses() {
        let flat = r#"[{"translation_text": "Bonjour"}, {"translation_text": "Merci"}]"#;
        assert_eq!(parse_translation_response(flat).unwrap(), vec!["Bonjour", "Merci"]);

        let nested = r#"[[{"translation_text": "سلام"}], [{"translation_text": "شکریہ"}]]"#;
        assert_eq!(parse_translation_response(nested).unwrap(), vec!["سلام", "شکریہ"]);
    }

    #[test]
    fn test_parse_rejects_error_payload() {
        let err = parse_translation_response(r#"{"error": "Model is loading"}"#).unwrap_err();
        assert!(matches!(err, KaptionError::Translation(_)));
        assert!(parse_translation_response("[[]]").is_err());
    }

    #[test]
    fn test_request_shapes() {
        let texts = vec!["Hello".to_string()];
        let pair = serde_json::to_value(InferenceRequest { inputs: &texts, parameters: None }).unwrap();
        assert_eq!(pair, serde_json::json!({"inputs": ["Hello"]}));

        let tagged = serde_json::to_value(InferenceRequest {
            inputs: &texts,
            parameters: Some(TagParameters { src_lang: "en_XX", tgt_lang: "ur_PK" }),
        })
        .unwrap();
        assert_eq!(
            tagged,
            serde_json::json!({"inputs": ["Hello"], "parameters": {"src_lang": "en_XX", "tgt_lang": "ur_PK"}})
        );
    }

    #[test]
    fn test_model_url_joins_endpoint() {
        let mut config = crate::config::Config::default().translate;
        config.endpoint = "http://localhost:8080/models/".to_string();
        let client = InferenceClient::new(&config).unwrap();
        assert_eq!(
            client.model_url("Helsinki-NLP/opus-mt-en-de"),
            "http://localhost:8080/models/Helsinki-NLP/opus-mt-en-de"
        );
    }
}

//! Client for the hosted generative model that performs the compliance
//! analysis. The model sits behind the [`ComplianceModel`] trait so the
//! worker can be driven by a stub in tests.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::error::ProviderError;
use crate::models::{AnalysisResult, AnalyzeRequest};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[async_trait]
pub trait ComplianceModel: Send + Sync {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, ProviderError>;
}

pub struct GeminiModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiModel {
    pub fn new(client: reqwest::Client, base_url: &str, model: &str, api_key: &str) -> Self {
        // add https:// if not present
        let base_url = if base_url.starts_with("http") {
            base_url.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", base_url.trim_end_matches('/'))
        };
        Self {
            client,
            base_url,
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    // key goes in a header so it never shows up in a URL
    fn request(&self, body: &serde_json::Value) -> reqwest::RequestBuilder {
        self.client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(Duration::from_secs(60))
            .json(body)
    }
}

#[async_trait]
impl ComplianceModel for GeminiModel {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, ProviderError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(request) }] }],
            "generationConfig": { "temperature": 0.1 }
        });

        let res = self.request(&body).send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateContentResponse = res.json().await?;
        let text = reply.first_text().ok_or(ProviderError::EmptyResponse)?;
        parse_result(text)
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.text.as_deref())
    }
}

pub fn build_prompt(request: &AnalyzeRequest) -> String {
    let mut prompt = String::from(
        "You are a regulatory compliance reviewer. Identify every compliance \
         violation in the document below. Respond with JSON only, shaped as \
         {\"score\": 0-100, \"summary\": string, \"violations\": [{\"rule\": string, \
         \"description\": string, \"severity\": \"low\"|\"medium\"|\"high\"|\"critical\", \
         \"excerpt\": string, \"suggestion\": string}]}.\n",
    );

    if request.marketing {
        prompt.push_str(
            "This is marketing material: also check advertising claims, disclosures and \
             misleading statements.\n",
        );
    }
    if let Some(context) = request.context.as_deref().filter(|c| !c.is_empty()) {
        prompt.push_str("Additional context:\n");
        prompt.push_str(context);
        prompt.push('\n');
    }

    match (request.text.as_deref(), request.document_id.as_deref()) {
        (Some(text), _) if !text.trim().is_empty() => {
            prompt.push_str("Document:\n");
            prompt.push_str(text);
        }
        (_, Some(id)) => {
            prompt.push_str("Document reference: ");
            prompt.push_str(id);
        }
        _ => {}
    }
    prompt
}

// Models like to wrap JSON in markdown fences
pub fn parse_result(text: &str) -> Result<AnalysisResult, ProviderError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);
    Ok(serde_json::from_str(body.trim())?)
}

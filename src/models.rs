use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::cache::AnalysisOptions;
use crate::error::ProviderError;

// Analysis API request format
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<String>,
    // Stored document, used as the fingerprint when no text is sent
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub marketing: bool,
    #[serde(default)]
    pub context: Option<String>,
}

impl AnalyzeRequest {
    // Text takes precedence over the id when both are present
    pub fn fingerprint_source(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.document_id.as_deref().filter(|id| !id.is_empty()))
    }

    pub fn options(&self) -> AnalysisOptions {
        AnalysisOptions {
            marketing: self.marketing,
            context: self.context.clone(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule: String,
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

// What the model is asked to return
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub score: u8,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub violations: Vec<Violation>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub cache_key: String,
    pub cached: bool,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

// Queued analysis - holds the request, its key and the response channel
pub struct AnalysisJob {
    pub request: AnalyzeRequest,
    pub cache_key: String,
    pub response_tx: oneshot::Sender<Result<AnalyzeResponse, ProviderError>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_wins_over_document_id() {
        let req = AnalyzeRequest {
            text: Some("body".into()),
            document_id: Some("doc-1".into()),
            ..Default::default()
        };
        assert_eq!(req.fingerprint_source(), Some("body"));

        let by_id = AnalyzeRequest {
            text: Some("   ".into()),
            document_id: Some("doc-1".into()),
            ..Default::default()
        };
        assert_eq!(by_id.fingerprint_source(), Some("doc-1"));

        assert_eq!(AnalyzeRequest::default().fingerprint_source(), None);
    }

    #[test]
    fn result_tolerates_missing_optional_fields() {
        let result: AnalysisResult = serde_json::from_str(r#"{"score": 72}"#).unwrap();
        assert_eq!(result.score, 72);
        assert!(result.violations.is_empty());
    }
}

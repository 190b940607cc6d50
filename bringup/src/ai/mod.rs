//! Plan providers.
//!
//! Remote models can propose an [`crate::planner::AnalysisPlan`] from a
//! [`crate::summary::SchematicSummary`]. The [`router::PlanRouter`]
//! tries providers in order and falls back to the heuristic planner, so
//! analysis always completes even with no API keys configured.

pub mod gemini;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod router;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gemini::GeminiPlanner;
pub use openai::OpenAiPlanner;
pub use provider::{ModelInfo, PlanProvider};
pub use router::PlanRouter;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("API request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
    #[error("missing API key")]
    MissingApiKey,
    #[error("failed to parse provider response: {0}")]
    ParseError(String),
    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}

/// Where the executed plan came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Heuristic,
    Provider(String),
}

impl PlanSource {
    pub fn as_str(&self) -> &str {
        match self {
            PlanSource::Heuristic => "heuristic",
            PlanSource::Provider(name) => name,
        }
    }
}

/// Pull a JSON object out of a model reply that may wrap it in prose
/// or a fenced code block.
pub(crate) fn extract_json_from_text(text: &str) -> String {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        if let Some(end) = text.rfind("```") {
            if end > start + 7 {
                return text[start + 7..end].trim().to_string();
            }
        }
    }

    if let Some(start) = text.find("```") {
        if let Some(end) = text.rfind("```") {
            let content = &text[start + 3..end];
            if content.trim().starts_with('{') {
                return content.trim().to_string();
            }
        }
    }

    if let Some(start) = text.find('{') {
        if let Some(end) = text.rfind('}') {
            return text[start..=end].to_string();
        }
    }

    text.to_string()
}

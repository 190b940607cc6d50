//! Gemini plan provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::ai::provider::{ModelInfo, PlanProvider};
use crate::ai::{extract_json_from_text, prompts, AiError};
use crate::planner::AnalysisPlan;
use crate::summary::SchematicSummary;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-pro";
const TEMPERATURE: f64 = 0.1;
const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 1000;

pub struct GeminiPlanner {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiPlanner {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Read the key from `GEMINI_API_KEY`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_API_BASE}/{}:generateContent", self.model)
    }

    async fn send_request(&self, prompt: &str) -> Result<String, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::MissingApiKey);
        }

        // Gemini has no separate system role on this endpoint, so the
        // instructions are prepended to the user prompt.
        let full_prompt = format!(
            "{}\n\n{}\n\nRespond with valid JSON only.",
            prompts::SYSTEM_PROMPT,
            prompt
        );
        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: full_prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let mut retry_count = 0;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;

        loop {
            let response = self
                .client
                .post(self.endpoint())
                .query(&[("key", self.api_key.as_str())])
                .json(&request_body)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let gen: GenerateResponse = resp.json().await.map_err(|e| {
                            AiError::ParseError(format!("failed to parse JSON: {e}"))
                        })?;
                        return gen
                            .candidates
                            .into_iter()
                            .next()
                            .and_then(|c| c.content.parts.into_iter().next())
                            .map(|p| p.text)
                            .ok_or_else(|| {
                                AiError::InvalidResponse("empty candidates array".to_string())
                            });
                    } else if status.as_u16() == 429 {
                        let retry_after = delay_ms / 1000;
                        if retry_count < MAX_RETRIES {
                            retry_count += 1;
                            tracing::warn!(
                                retry_after,
                                attempt = retry_count,
                                "gemini rate limited, retrying"
                            );
                            sleep(Duration::from_millis(delay_ms)).await;
                            delay_ms *= 2;
                            continue;
                        }
                        return Err(AiError::RateLimited { retry_after });
                    } else {
                        let message = resp
                            .text()
                            .await
                            .unwrap_or_else(|_| "unknown error".to_string());
                        return Err(AiError::ApiError {
                            status: status.as_u16(),
                            message,
                        });
                    }
                }
                Err(e) => {
                    if retry_count < MAX_RETRIES {
                        retry_count += 1;
                        tracing::warn!(
                            error = %e,
                            delay_ms,
                            attempt = retry_count,
                            "gemini request failed, retrying"
                        );
                        sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms *= 2;
                        continue;
                    }
                    return Err(AiError::RequestFailed(e));
                }
            }
        }
    }
}

#[async_trait]
impl PlanProvider for GeminiPlanner {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "gemini".to_string(),
            model_name: self.model.clone(),
            supports_json: true,
        }
    }

    async fn generate_plan(&self, summary: &SchematicSummary) -> Result<AnalysisPlan, AiError> {
        let prompt = prompts::build_plan_prompt(summary);
        let text = self.send_request(&prompt).await?;
        let json = extract_json_from_text(&text);
        serde_json::from_str(&json)
            .map_err(|e| AiError::ParseError(format!("failed to parse plan: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

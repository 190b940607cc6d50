//! OpenAI chat-completions plan provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::ai::provider::{ModelInfo, PlanProvider};
use crate::ai::{extract_json_from_text, prompts, AiError};
use crate::planner::AnalysisPlan;
use crate::summary::SchematicSummary;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";
const TEMPERATURE: f64 = 0.1;
const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 1000;

pub struct OpenAiPlanner {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiPlanner {
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

    /// Read the key from `OPENAI_API_KEY`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }

    async fn send_request(&self, prompt: &str) -> Result<String, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::MissingApiKey);
        }

        let request_body = ChatRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompts::SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
        };

        let mut retry_count = 0;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;

        loop {
            let response = self
                .client
                .post(OPENAI_API_URL)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let chat: ChatResponse = resp.json().await.map_err(|e| {
                            AiError::ParseError(format!("failed to parse JSON: {e}"))
                        })?;
                        return chat
                            .choices
                            .into_iter()
                            .next()
                            .map(|c| c.message.content)
                            .ok_or_else(|| {
                                AiError::InvalidResponse("empty choices array".to_string())
                            });
                    } else if status.as_u16() == 429 {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|h| h.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(delay_ms / 1000);

                        if retry_count < MAX_RETRIES {
                            retry_count += 1;
                            tracing::warn!(
                                retry_after,
                                attempt = retry_count,
                                "openai rate limited, retrying"
                            );
                            sleep(Duration::from_secs(retry_after)).await;
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
                            "openai request failed, retrying"
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
impl PlanProvider for OpenAiPlanner {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "openai".to_string(),
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
struct ChatRequest {
    model: String,
    temperature: f64,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

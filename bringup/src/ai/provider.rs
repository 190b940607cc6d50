//! Common interface for plan providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::AiError;
use crate::planner::AnalysisPlan;
use crate::summary::SchematicSummary;

/// Information about a provider's model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub provider: String,
    pub model_name: String,
    /// Whether the model reliably outputs JSON.
    pub supports_json: bool,
}

/// A service that can turn a schematic summary into an analysis plan.
#[async_trait]
pub trait PlanProvider: Send + Sync {
    /// Provider name used in logs and reports.
    fn name(&self) -> &str;

    /// Whether the provider is configured and worth calling.
    fn is_available(&self) -> bool;

    fn model_info(&self) -> ModelInfo;

    async fn generate_plan(&self, summary: &SchematicSummary) -> Result<AnalysisPlan, AiError>;
}

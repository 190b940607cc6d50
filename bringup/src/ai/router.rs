//! Provider routing with heuristic fallback.

use std::sync::Arc;

use crate::ai::provider::{ModelInfo, PlanProvider};
use crate::ai::PlanSource;
use crate::planner::AnalysisPlan;
use crate::summary::SchematicSummary;

/// Tries the primary provider, then the secondary, then gives back the
/// supplied heuristic plan. Provider failures are logged and swallowed,
/// so planning never fails.
#[derive(Default)]
pub struct PlanRouter {
    primary: Option<Arc<dyn PlanProvider>>,
    secondary: Option<Arc<dyn PlanProvider>>,
}

impl PlanRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure from `OPENAI_API_KEY` and `GEMINI_API_KEY`.
    pub fn from_env() -> Self {
        let mut router = Self::new();
        if let Some(openai) = crate::ai::OpenAiPlanner::from_env() {
            router.primary = Some(Arc::new(openai));
        }
        if let Some(gemini) = crate::ai::GeminiPlanner::from_env() {
            router.secondary = Some(Arc::new(gemini));
        }
        router
    }

    pub fn with_primary(mut self, provider: Arc<dyn PlanProvider>) -> Self {
        self.primary = Some(provider);
        self
    }

    pub fn with_secondary(mut self, provider: Arc<dyn PlanProvider>) -> Self {
        self.secondary = Some(provider);
        self
    }

    pub fn has_provider(&self) -> bool {
        self.available_providers().next().is_some()
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        self.available_providers().next().map(|p| p.model_info())
    }

    fn available_providers(&self) -> impl Iterator<Item = &Arc<dyn PlanProvider>> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .filter(|p| p.is_available())
    }

    /// Produce a plan, recording where it came from.
    pub async fn plan(
        &self,
        summary: &SchematicSummary,
        fallback: AnalysisPlan,
    ) -> (AnalysisPlan, PlanSource) {
        for provider in self.available_providers() {
            tracing::info!(provider = provider.name(), "requesting analysis plan");
            match provider.generate_plan(summary).await {
                Ok(plan) => {
                    return (plan, PlanSource::Provider(provider.name().to_string()));
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "plan provider failed, trying next"
                    );
                }
            }
        }
        tracing::info!("no plan provider succeeded, using heuristic plan");
        (fallback, PlanSource::Heuristic)
    }
}

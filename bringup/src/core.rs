//! End-to-end analysis pipeline shared by the library API and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::{PlanRouter, PlanSource};
use crate::analysis::{AnalysisRegistry, AnalysisResult, CheckContext};
use crate::checklist::{generate_checklist, ChecklistStep};
use crate::detect::{classify, Detected};
use crate::findings::{analyze_findings, Finding};
use crate::netlist::{build_nets, NetBuildResult};
use crate::planner::{heuristic_plan, AnalysisPlan};
use crate::risk::{aggregate, OverallRisk, RiskConfig};
use crate::schema::SchematicDocument;
use crate::summary::SchematicSummary;
use crate::topology::{CircuitTopology, DECOUPLING_RADIUS};

#[derive(Debug, thiserror::Error)]
pub enum BringupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Options for an analysis run.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Chebyshev distance within which a label attaches to a net node.
    pub label_tolerance: i64,
    /// Euclidean radius for decoupling-capacitor proximity.
    pub decoupling_radius: f64,
    pub risk: RiskConfig,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            label_tolerance: 2,
            decoupling_radius: DECOUPLING_RADIUS,
            risk: RiskConfig::default(),
        }
    }
}

/// Full output of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BringupReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub circuit_type: String,
    pub plan_source: PlanSource,
    pub plan_confidence: f64,
    pub main_component: Option<String>,
    pub detected: Detected,
    pub net_summary: SchematicSummary,
    pub findings: Vec<Finding>,
    pub analysis_results: Vec<AnalysisResult>,
    pub checklist: Vec<ChecklistStep>,
    pub overall_risk: OverallRisk,
}

impl BringupReport {
    pub fn blocker_count(&self) -> usize {
        self.overall_risk.blocker_count
    }

    pub fn can_attempt_bringup(&self) -> bool {
        self.overall_risk.can_attempt_bringup
    }
}

/// Core analysis API.
pub struct BringupCore;

impl BringupCore {
    /// Run the full pipeline with the heuristic planner.
    pub fn analyze(
        doc: &SchematicDocument,
        options: &AnalyzeOptions,
    ) -> Result<BringupReport, BringupError> {
        let prepared = Prepared::build(doc, options);
        let plan = heuristic_plan(doc, &prepared.nets, &prepared.detected);
        Ok(prepared.finish(doc, options, plan, PlanSource::Heuristic))
    }

    /// Run the full pipeline, asking the router's providers for a plan
    /// first and falling back to the heuristic planner.
    pub async fn analyze_with_router(
        doc: &SchematicDocument,
        options: &AnalyzeOptions,
        router: &PlanRouter,
    ) -> Result<BringupReport, BringupError> {
        let prepared = Prepared::build(doc, options);
        let fallback = heuristic_plan(doc, &prepared.nets, &prepared.detected);
        let summary = SchematicSummary::build(doc, &prepared.nets);
        let (plan, source) = router.plan(&summary, fallback).await;
        Ok(prepared.finish(doc, options, plan, source))
    }
}

/// Shared front half of the pipeline: nets, indicators, topology.
struct Prepared {
    nets: NetBuildResult,
    detected: Detected,
    topology: CircuitTopology,
}

impl Prepared {
    fn build(doc: &SchematicDocument, options: &AnalyzeOptions) -> Self {
        let nets = build_nets(doc, options.label_tolerance);
        let detected = classify(doc, &nets);
        let topology = CircuitTopology::build(doc, options.decoupling_radius);
        tracing::info!(
            nets = nets.nets.len(),
            power_nets = detected.power_nets.len(),
            mcus = detected.mcu_symbols.len(),
            "schematic prepared"
        );
        Self {
            nets,
            detected,
            topology,
        }
    }

    fn finish(
        self,
        doc: &SchematicDocument,
        options: &AnalyzeOptions,
        plan: AnalysisPlan,
        plan_source: PlanSource,
    ) -> BringupReport {
        let findings = analyze_findings(doc, &self.nets, &self.detected.power_nets);

        let ctx = CheckContext {
            doc,
            nets: &self.nets,
            detected: &self.detected,
            topology: &self.topology,
        };
        let registry = AnalysisRegistry::with_default_checks();
        let analysis_results = registry.run_pipeline(&plan, &ctx);

        let checklist = generate_checklist(doc, &self.detected);
        let overall_risk = aggregate(&checklist, &findings, &options.risk);

        tracing::info!(
            findings = findings.len(),
            checks = analysis_results.len(),
            risk_score = overall_risk.score,
            risk_level = ?overall_risk.level,
            "analysis complete"
        );

        BringupReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            circuit_type: plan.circuit_type.clone(),
            plan_source,
            plan_confidence: plan.confidence,
            main_component: plan.main_component.clone(),
            detected: self.detected,
            net_summary: SchematicSummary::build(doc, &self.nets),
            findings,
            analysis_results,
            checklist,
            overall_risk,
        }
    }
}

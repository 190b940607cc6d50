//! Bringup - circuit-schematic bring-up analysis library
//!
//! Turns a schematic document into a bring-up report: electrical nets,
//! detected circuit indicators, design findings, an executed analysis
//! plan, a bench checklist and an overall risk score.
//!
//! # Quick Start
//!
//! ```no_run
//! use bringup::{AnalyzeOptions, BringupCore, SchematicDocument};
//!
//! let json = std::fs::read_to_string("board.json").unwrap();
//! let doc: SchematicDocument = serde_json::from_str(&json).unwrap();
//!
//! let report = BringupCore::analyze(&doc, &AnalyzeOptions::default()).unwrap();
//! for finding in &report.findings {
//!     println!("{:?}: {}", finding.severity, finding.summary);
//! }
//! println!("risk {}/100 ({:?})", report.overall_risk.score, report.overall_risk.level);
//! ```
//!
//! # Features
//!
//! - **Net building**: wire-graph connectivity with label attachment
//! - **Heuristic classification**: power rails, MCUs, clocks, debug ports
//! - **Analysis checks**: power, timing, signal and MCU checks with
//!   per-step failure isolation
//! - **Risk scoring**: weighted findings and checklist aggregation
//! - **Optional AI planning**: OpenAI/Gemini plan providers with
//!   heuristic fallback

pub mod ai;
pub mod analysis;
pub mod checklist;
pub mod core;
pub mod detect;
pub mod findings;
pub mod netlist;
pub mod planner;
pub mod risk;
pub mod schema;
pub mod summary;
pub mod topology;

// Re-export main types
pub use crate::core::{AnalyzeOptions, BringupCore, BringupError, BringupReport};
pub use ai::{PlanRouter, PlanSource};
pub use analysis::{AnalysisRegistry, AnalysisResult, CheckStatus, Severity};
pub use checklist::ChecklistStep;
pub use detect::{classify, Detected};
pub use findings::Finding;
pub use netlist::{build_nets, Net, NetBuildResult};
pub use planner::{heuristic_plan, AnalysisPlan};
pub use risk::{aggregate, OverallRisk, RiskConfig, RiskLevel};
pub use schema::{Point, SchematicDocument};
pub use summary::SchematicSummary;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AnalysisPlan, AnalysisResult, AnalyzeOptions, BringupCore, BringupError, BringupReport,
        Detected, Finding, OverallRisk, RiskLevel, SchematicDocument, Severity,
    };
}

//! Analysis checks and the registry that executes them.
//!
//! Checks are looked up by name from a plan and run one at a time. A
//! misbehaving check (unknown name, an `Err`, or a panic) produces an
//! `Error`-status result and never takes the rest of the pipeline down.

pub mod mcu;
pub mod power;
pub mod signal;
pub mod timing;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::detect::Detected;
use crate::netlist::NetBuildResult;
use crate::planner::AnalysisPlan;
use crate::schema::SchematicDocument;
use crate::topology::CircuitTopology;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
    Info,
    Error,
}

/// Outcome of one analysis check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub check: String,
    pub status: CheckStatus,
    pub summary: String,
    #[serde(default)]
    pub details: Map<String, Value>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub severity: Severity,
    pub prevents_bringup: bool,
}

impl AnalysisResult {
    pub fn new(check: &str, status: CheckStatus, summary: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            status,
            summary: summary.into(),
            details: Map::new(),
            issues: Vec::new(),
            recommendations: Vec::new(),
            severity: Severity::Low,
            prevents_bringup: false,
        }
    }

    pub fn pass(check: &str, summary: impl Into<String>) -> Self {
        Self::new(check, CheckStatus::Pass, summary)
    }

    pub fn fail(check: &str, summary: impl Into<String>, severity: Severity) -> Self {
        let mut r = Self::new(check, CheckStatus::Fail, summary);
        r.severity = severity;
        r
    }

    pub fn warning(check: &str, summary: impl Into<String>) -> Self {
        let mut r = Self::new(check, CheckStatus::Warning, summary);
        r.severity = Severity::Medium;
        r
    }

    pub fn info(check: &str, summary: impl Into<String>) -> Self {
        Self::new(check, CheckStatus::Info, summary)
    }

    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self
    }

    pub fn with_recommendation(mut self, rec: impl Into<String>) -> Self {
        self.recommendations.push(rec.into());
        self
    }

    pub fn blocking(mut self) -> Self {
        self.prevents_bringup = true;
        self
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, CheckStatus::Fail)
    }
}

/// Read-only inputs shared by every check.
pub struct CheckContext<'a> {
    pub doc: &'a SchematicDocument,
    pub nets: &'a NetBuildResult,
    pub detected: &'a Detected,
    pub topology: &'a CircuitTopology,
}

/// One named, plan-addressable analysis check.
pub trait AnalysisCheck: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult>;
}

pub struct AnalysisRegistry {
    checks: BTreeMap<String, Arc<dyn AnalysisCheck>>,
    aliases: BTreeMap<String, String>,
}

impl AnalysisRegistry {
    pub fn new() -> Self {
        Self {
            checks: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }

    pub fn with_default_checks() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(power::VerifyPowerConnectivity));
        registry.register(Arc::new(power::CheckPowerRailRouting));
        registry.register(Arc::new(power::AnalyzeDecouplingCapacitors));
        registry.register(Arc::new(power::VerifyVoltageRegulator));
        registry.register(Arc::new(power::CheckPowerSequencing));
        registry.register(Arc::new(power::DetectMultiVoltageSystem));
        registry.register(Arc::new(timing::AnalyzeRcTimingNetwork));
        registry.register(Arc::new(timing::VerifyCrystalCircuit));
        registry.register(Arc::new(timing::CheckClockDistribution));
        registry.register(Arc::new(signal::CheckFloatingPins));
        registry.register(Arc::new(signal::CheckSingleNodeNets));
        registry.register(Arc::new(signal::TraceSignalPath));
        registry.register(Arc::new(signal::VerifyGroundConnectivity));
        registry.register(Arc::new(signal::VerifyPullUpPullDown));
        registry.register(Arc::new(signal::CheckDifferentialPairs));
        registry.register(Arc::new(signal::AnalyzeSignalTermination));
        registry.register(Arc::new(signal::VerifyI2cBus));
        registry.register(Arc::new(mcu::AnalyzeResetCircuit));
        registry.register(Arc::new(mcu::CheckBootPins));
        registry.register(Arc::new(mcu::CheckDebugInterface));
        registry.register(Arc::new(mcu::CheckMcuPowerPins));
        // Alternate names providers are known to emit for existing checks.
        registry.register_alias("check_decoupling_caps", "analyze_decoupling_capacitors");
        registry.register_alias("check_mcu_boot_pins", "check_boot_pins");
        registry.register_alias("verify_mcu_boot_configuration", "check_boot_pins");
        registry.register_alias("verify_ground_plane", "verify_ground_connectivity");
        registry.register_alias("verify_programming_interface", "check_debug_interface");
        registry
    }

    pub fn register(&mut self, check: Arc<dyn AnalysisCheck>) {
        self.checks.insert(check.name().to_string(), check);
    }

    /// Make `alias` resolve to the check registered as `target`. The
    /// result of an aliased run carries the target's name.
    pub fn register_alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(alias.to_string(), target.to_string());
    }

    pub fn names(&self) -> Vec<&str> {
        self.checks.keys().map(|k| k.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn AnalysisCheck>> {
        let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.checks.get(name)
    }

    /// Run one check by name. Never returns an error: unknown names,
    /// check errors, and check panics all become `Error`-status results.
    pub fn execute(&self, name: &str, ctx: &CheckContext<'_>, params: &Value) -> AnalysisResult {
        let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        let Some(check) = self.checks.get(name) else {
            tracing::warn!(check = name, "unknown analysis check requested");
            return AnalysisResult::new(
                name,
                CheckStatus::Error,
                format!("unknown analysis check '{name}'"),
            )
            .with_detail("requested_params", params.clone());
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| check.run(ctx, params)));
        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::error!(check = name, error = %err, "analysis check failed");
                AnalysisResult::new(name, CheckStatus::Error, format!("check failed: {err}"))
                    .with_detail("params", params.clone())
            }
            Err(panic) => {
                let msg = panic_message(&panic);
                tracing::error!(check = name, panic = %msg, "analysis check panicked");
                AnalysisResult::new(name, CheckStatus::Error, format!("check panicked: {msg}"))
                    .with_detail("params", params.clone())
            }
        }
    }

    /// Execute a plan's steps in order; every step yields exactly one
    /// result, failures included.
    pub fn run_pipeline(&self, plan: &AnalysisPlan, ctx: &CheckContext<'_>) -> Vec<AnalysisResult> {
        let mut results = Vec::with_capacity(plan.steps.len());
        for (i, step) in plan.steps.iter().enumerate() {
            tracing::info!(step = i + 1, total = plan.steps.len(), check = %step.check, "running analysis step");
            results.push(self.execute(&step.check, ctx, &step.params));
        }
        results
    }
}

impl Default for AnalysisRegistry {
    fn default() -> Self {
        Self::with_default_checks()
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Pull a string parameter out of a plan step's params object.
pub(crate) fn param_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

/// Pull a numeric parameter out of a plan step's params object.
pub(crate) fn param_f64(params: &Value, key: &str) -> Option<f64> {
    params.get(key).and_then(Value::as_f64)
}

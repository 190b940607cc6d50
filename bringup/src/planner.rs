//! Analysis plans and the heuristic planner.
//!
//! A plan is just an ordered list of registry check names with
//! parameters. Plans can come from an AI provider as JSON or from
//! [`heuristic_plan`], which builds one from the detected indicators.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::detect::Detected;
use crate::netlist::NetBuildResult;
use crate::schema::SchematicDocument;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// Registry name of the check to run.
    #[serde(alias = "function")]
    pub check: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default, alias = "reason")]
    pub rationale: String,
}

fn default_priority() -> Priority {
    Priority::Medium
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPlan {
    pub circuit_type: String,
    pub confidence: f64,
    #[serde(default, alias = "main_ic")]
    pub main_component: Option<String>,
    #[serde(default, alias = "analysis")]
    pub steps: Vec<PlanStep>,
}

impl AnalysisPlan {
    pub fn check_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.check.as_str()).collect()
    }
}

fn step(check: &str, params: Value, priority: Priority, rationale: &str) -> PlanStep {
    PlanStep {
        check: check.to_string(),
        params,
        priority,
        rationale: rationale.to_string(),
    }
}

/// Build an analysis plan without any AI provider.
///
/// Circuit type is guessed from the main IC: a 555 gets RC timing and
/// reset-pin checks, an MCU gets crystal/reset/debug checks, everything
/// gets power and connectivity coverage. Confidence is fixed low since
/// this path judges from names alone.
pub fn heuristic_plan(
    doc: &SchematicDocument,
    nets: &NetBuildResult,
    detected: &Detected,
) -> AnalysisPlan {
    let mut circuit_type = "unknown".to_string();
    let mut main_ic: Option<String> = None;

    for sym in doc.annotated_symbols() {
        if !sym.reference.to_uppercase().starts_with('U') {
            continue;
        }
        main_ic.get_or_insert_with(|| sym.reference.clone());
        let lib = sym.lib_id.to_lowercase();
        if lib.contains("555") || sym.value.to_lowercase().contains("555") {
            circuit_type = "555_timer_astable".into();
            main_ic = Some(sym.reference.clone());
        } else if ["stm32", "esp32", "atmega"].iter().any(|k| lib.contains(k))
            || detected.mcu_symbols.contains(&sym.reference)
        {
            circuit_type = "microcontroller_basic".into();
            main_ic = Some(sym.reference.clone());
        }
    }

    let mut steps: Vec<PlanStep> = Vec::new();

    if !detected.power_nets.is_empty() {
        steps.push(step(
            "verify_power_connectivity",
            json!({"power_nets": detected.power_nets, "ic_ref": main_ic}),
            Priority::Critical,
            "power must be connected for any circuit to function",
        ));
    }

    match circuit_type.as_str() {
        "555_timer_astable" => {
            let find_ref = |prefix: &str| {
                doc.annotated_symbols()
                    .find(|s| s.reference == prefix)
                    .map(|s| s.reference.clone())
            };
            if let (Some(r1), Some(r2), Some(c1)) =
                (find_ref("R1"), find_ref("R2"), find_ref("C1"))
            {
                steps.push(step(
                    "analyze_rc_timing_network",
                    json!({"ic_ref": main_ic, "r1": r1, "r2": r2, "c1": c1}),
                    Priority::High,
                    "the RC network determines output frequency",
                ));
            }
            steps.push(step(
                "check_floating_pins",
                json!({"ic_ref": main_ic, "critical_pins": ["4"], "expected_state": "HIGH"}),
                Priority::Critical,
                "the reset pin must be high for the timer to run",
            ));
        }
        "microcontroller_basic" => {
            if let Some(crystal) = detected.clock_sources.first() {
                steps.push(step(
                    "verify_crystal_circuit",
                    json!({"crystal_ref": crystal, "mcu_ref": main_ic, "load_caps": ["C1", "C2"]}),
                    Priority::Critical,
                    "an external crystal is required for the MCU clock",
                ));
            }
            if !detected.reset_nets.is_empty() {
                steps.push(step(
                    "analyze_reset_circuit",
                    json!({"mcu_ref": main_ic, "pullup_required": true}),
                    Priority::High,
                    "the reset circuit is needed for programming and operation",
                ));
            }
            steps.push(step(
                "check_debug_interface",
                json!({"mcu_ref": main_ic}),
                Priority::High,
                "without a debug interface the MCU cannot be programmed",
            ));
        }
        _ => {}
    }

    if let Some(ic) = &main_ic {
        steps.push(step(
            "analyze_decoupling_capacitors",
            json!({"ic_refs": [ic], "proximity_threshold": 50}),
            Priority::Medium,
            "decoupling caps reduce power noise",
        ));
    }

    // Connectivity coverage regardless of circuit type.
    if !nets.single_node_nets().is_empty() {
        steps.push(step(
            "check_single_node_nets",
            json!({}),
            Priority::High,
            "single-node nets indicate broken connections",
        ));
    }
    if detected.power_nets.iter().any(|n| n == "GND") {
        steps.push(step(
            "verify_ground_connectivity",
            json!({"ground_nets": ["GND"]}),
            Priority::High,
            "everything returns through ground",
        ));
    }

    tracing::info!(
        circuit_type = %circuit_type,
        steps = steps.len(),
        "heuristic plan built"
    );

    AnalysisPlan {
        circuit_type,
        confidence: 0.6,
        main_component: main_ic,
        steps,
    }
}

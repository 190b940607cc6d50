//! Prompt construction for plan providers.

use crate::summary::SchematicSummary;

/// System instructions shared by every provider. Constrains the model to
/// the registry's check names and to real component references.
pub const SYSTEM_PROMPT: &str = r#"You are an expert PCB bring-up engineer. Analyze circuit schematics and propose an ordered analysis plan.

CRITICAL RULES:
1. ALWAYS use actual component references from the schematic (e.g. "U1", "Y1", "R1")
2. ALWAYS use exact check names from the available checks list
3. Focus on real hardware issues that prevent the circuit from operating

OUTPUT STRUCTURE (strict JSON):
{
  "circuit_type": "microcontroller_basic|555_timer_astable|unknown",
  "confidence": 0.0-1.0,
  "main_component": "U1",
  "steps": [
    {
      "check": "verify_power_connectivity",
      "params": {"power_nets": ["3V3", "GND"], "ic_ref": "U1"},
      "priority": "critical|high|medium|low",
      "rationale": "why this check matters here"
    }
  ]
}

AVAILABLE CHECKS (use exact names):
- verify_power_connectivity
- check_power_rail_routing
- analyze_decoupling_capacitors
- verify_voltage_regulator_circuit
- check_power_sequencing
- detect_multi_voltage_system
- analyze_rc_timing_network
- verify_crystal_circuit
- check_clock_distribution
- check_floating_pins
- check_single_node_nets
- trace_signal_path
- verify_ground_connectivity
- verify_pull_up_pull_down
- check_differential_pairs
- analyze_signal_termination
- verify_i2c_bus
- analyze_reset_circuit
- check_boot_pins
- check_debug_interface
- check_mcu_power_pins

COMMON ISSUES TO COVER:
1. Missing reset pull-up resistor (critical)
2. Floating BOOT pins (warning)
3. Missing crystal load capacitors (high)
4. Missing decoupling capacitors (medium)
5. Unconnected power pins (critical)

Return ONLY valid JSON, no additional text."#;

/// Build the per-schematic prompt body from a summary.
pub fn build_plan_prompt(summary: &SchematicSummary) -> String {
    let refs: Vec<&str> = summary
        .components
        .iter()
        .map(|c| c.reference.as_str())
        .collect();
    let mcus: Vec<&str> = summary
        .components
        .iter()
        .filter(|c| c.kind == "microcontroller")
        .map(|c| c.reference.as_str())
        .collect();
    let crystals: Vec<&str> = summary
        .components
        .iter()
        .filter(|c| c.kind == "crystal_oscillator")
        .map(|c| c.reference.as_str())
        .collect();

    let components = serde_json::to_string_pretty(&summary.components).unwrap_or_default();
    let nets = serde_json::to_string_pretty(&summary.nets.iter().take(20).collect::<Vec<_>>())
        .unwrap_or_default();
    let labels = serde_json::to_string_pretty(&summary.labels).unwrap_or_default();
    let issues = serde_json::to_string_pretty(&summary.connectivity_issues).unwrap_or_default();
    let stats = serde_json::to_string_pretty(&summary.statistics).unwrap_or_default();

    format!(
        r#"Analyze this schematic and propose a bring-up analysis plan.

CRITICAL: use ACTUAL component references from this list:
Component references: {refs:?}
MCUs: {mcus:?}
Crystals: {crystals:?}

STATISTICS:
{stats}

COMPONENTS:
{components}

NETS (first 20):
{nets}

LABELS:
{labels}

CONNECTIVITY ISSUES:
{issues}
"#
    )
}

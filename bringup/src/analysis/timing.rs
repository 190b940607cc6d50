//! Timing and clock checks: RC timing networks, crystal circuits and
//! clock distribution.

use serde_json::{json, Value};

use super::{param_f64, param_str, AnalysisCheck, AnalysisResult, CheckContext, CheckStatus, Severity};
use crate::topology::{parse_capacitance, parse_resistance};

fn resistance_of(ctx: &CheckContext<'_>, reference: &str) -> Option<f64> {
    ctx.doc.symbol(reference).and_then(|s| parse_resistance(&s.value))
}

fn capacitance_of(ctx: &CheckContext<'_>, reference: &str) -> Option<f64> {
    ctx.doc.symbol(reference).and_then(|s| parse_capacitance(&s.value))
}

/// RC timing math for 555-style circuits.
///
/// With two resistors the network is astable:
/// `f = 1.44 / ((R1 + 2*R2) * C)`, `duty = (R1 + R2) / (R1 + 2*R2) * 100`.
/// With one resistor it is monostable: `t = 1.1 * R * C`.
pub struct AnalyzeRcTimingNetwork;

impl AnalysisCheck for AnalyzeRcTimingNetwork {
    fn name(&self) -> &str {
        "analyze_rc_timing_network"
    }

    fn description(&self) -> &str {
        "Compute frequency/duty or pulse width of an RC timing network"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let ic_ref = param_str(params, "ic_ref").unwrap_or("U?");
        let r1_ref = param_str(params, "r1");
        let r2_ref = param_str(params, "r2");
        let c1_ref = param_str(params, "c1");

        let r1 = r1_ref.and_then(|r| resistance_of(ctx, r));
        let r2 = r2_ref.and_then(|r| resistance_of(ctx, r));
        let c1 = c1_ref.and_then(|r| capacitance_of(ctx, r));

        let mut result = AnalysisResult::pass(self.name(), format!("RC timing analysis for {ic_ref}"));
        result = result.with_detail(
            "component_values",
            json!({
                "r1": {"ref": r1_ref, "ohms": r1},
                "r2": {"ref": r2_ref, "ohms": r2},
                "c1": {"ref": c1_ref, "farads": c1},
            }),
        );

        match (r1, c1) {
            (Some(r1), Some(c1)) => {
                if let Some(r2) = r2 {
                    let frequency = 1.44 / ((r1 + 2.0 * r2) * c1);
                    let duty = (r1 + r2) / (r1 + 2.0 * r2) * 100.0;
                    let period = 1.0 / frequency;
                    result = result.with_detail(
                        "calculated_timing",
                        json!({
                            "mode": "astable",
                            "frequency_hz": frequency,
                            "period_ms": period * 1000.0,
                            "duty_cycle_percent": duty,
                        }),
                    );
                    if frequency > 500_000.0 {
                        result = result
                            .with_issue(format!(
                                "frequency {frequency:.0} Hz may be too high for a 555 timer"
                            ))
                            .with_recommendation("check if component values are correct");
                    } else if frequency < 0.01 {
                        result = result.with_issue(format!(
                            "frequency {frequency:.4} Hz is very low, verify component values"
                        ));
                    }
                    if !(50.0..=95.0).contains(&duty) {
                        result = result.with_recommendation(format!(
                            "duty cycle {duty:.1}%: adjust R1/R2 ratio if needed"
                        ));
                    }
                } else {
                    let pulse = 1.1 * r1 * c1;
                    result = result.with_detail(
                        "calculated_timing",
                        json!({"mode": "monostable", "pulse_width_ms": pulse * 1000.0}),
                    );
                }
            }
            _ => {
                let mut missing: Vec<&str> = Vec::new();
                if r1.is_none() {
                    missing.push(r1_ref.unwrap_or("r1"));
                }
                if r2_ref.is_some() && r2.is_none() {
                    missing.push(r2_ref.unwrap_or("r2"));
                }
                if c1.is_none() {
                    missing.push(c1_ref.unwrap_or("c1"));
                }
                result = result
                    .with_issue(format!("could not extract values for: {}", missing.join(", ")))
                    .with_recommendation("verify component values are specified in the schematic");
            }
        }

        if !result.issues.is_empty() {
            result.status = CheckStatus::Fail;
            result.severity = Severity::Medium;
        }
        Ok(result)
    }
}

/// A crystal needs its two load caps, with sane values.
pub struct VerifyCrystalCircuit;

impl AnalysisCheck for VerifyCrystalCircuit {
    fn name(&self) -> &str {
        "verify_crystal_circuit"
    }

    fn description(&self) -> &str {
        "Verify the crystal and its load capacitors"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let crystal_ref = param_str(params, "crystal_ref")
            .map(str::to_string)
            .or_else(|| ctx.detected.clock_sources.first().cloned())
            .unwrap_or_else(|| "Y?".to_string());
        let mcu_ref = param_str(params, "mcu_ref").unwrap_or("MCU");
        let load_caps: Vec<&str> = params
            .get("load_caps")
            .and_then(Value::as_array)
            .map(|l| l.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut result =
            AnalysisResult::pass(self.name(), format!("crystal oscillator circuit for {mcu_ref}"));

        let Some(crystal) = ctx.doc.symbol(&crystal_ref) else {
            result.status = CheckStatus::Fail;
            result.severity = Severity::Critical;
            result.prevents_bringup = true;
            return Ok(result.with_issue(format!("crystal {crystal_ref} not found")));
        };
        result = result.with_detail(
            "crystal",
            json!({"ref": crystal_ref, "value": crystal.value, "found": true}),
        );

        let found: Vec<(&str, Option<f64>)> = load_caps
            .iter()
            .filter(|r| ctx.doc.symbol(r).is_some())
            .map(|r| (*r, capacitance_of(ctx, r)))
            .collect();
        result = result.with_detail(
            "load_capacitors",
            json!(found
                .iter()
                .map(|(r, v)| json!({"ref": r, "farads": v}))
                .collect::<Vec<_>>()),
        );

        if found.len() < 2 {
            result.status = CheckStatus::Fail;
            result.severity = Severity::High;
            result.prevents_bringup = true;
            result = result
                .with_issue(format!("expected 2 load capacitors, found {}", found.len()))
                .with_recommendation("add load capacitors (typically 12-22pF) per MCU datasheet");
        } else {
            for (cap_ref, value) in &found {
                if value.is_some_and(|v| v > 50e-12) {
                    result = result.with_recommendation(format!(
                        "{cap_ref} value seems high for a crystal load cap"
                    ));
                }
            }
        }
        Ok(result)
    }
}

/// Fan-out sanity for clock nets.
pub struct CheckClockDistribution;

impl AnalysisCheck for CheckClockDistribution {
    fn name(&self) -> &str {
        "check_clock_distribution"
    }

    fn description(&self) -> &str {
        "Check clock-net fanout"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let clock_nets: Vec<String> = match params.get("clock_nets").and_then(Value::as_array) {
            Some(list) => list
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => ctx.detected.clock_nets.clone(),
        };
        let max_fanout = param_f64(params, "max_fanout").unwrap_or(10.0) as usize;

        let mut result = AnalysisResult::pass(self.name(), "");
        for name in &clock_nets {
            let Some(net) = ctx.nets.net_named(name) else {
                continue;
            };
            let fanout = net.nodes.len();
            result = result.with_detail(
                name,
                json!({"fanout": fanout, "exceeds_max": fanout > max_fanout}),
            );
            if fanout > max_fanout {
                result = result
                    .with_issue(format!("clock net {name} has high fanout ({fanout})"))
                    .with_recommendation("consider a clock buffer for high fanout");
            } else if fanout == 1 {
                result = result.with_recommendation(format!(
                    "clock net {name} has only one connection, verify routing"
                ));
            }
        }

        if !result.issues.is_empty() {
            result.status = CheckStatus::Warning;
            result.severity = Severity::Medium;
        }
        result.summary = format!("clock distribution: {} nets analyzed", clock_nets.len());
        Ok(result)
    }
}

//! Power-delivery checks: rail connectivity, routing, decoupling and
//! regulator presence.

use serde_json::{json, Value};

use super::{param_f64, param_str, AnalysisCheck, AnalysisResult, CheckContext, CheckStatus, Severity};
use crate::topology::capacitors_near;

fn param_power_nets(ctx: &CheckContext<'_>, params: &Value) -> Vec<String> {
    match params.get("power_nets").and_then(Value::as_array) {
        Some(list) => list
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => ctx.detected.power_nets.clone(),
    }
}

/// Fall back to the first detected MCU when the plan names no IC.
fn param_ic_ref(ctx: &CheckContext<'_>, params: &Value) -> Option<String> {
    param_str(params, "ic_ref")
        .map(str::to_string)
        .or_else(|| ctx.detected.mcu_symbols.first().cloned())
}

/// Power labels must land on wires, and the target IC should have a
/// decoupling cap nearby.
pub struct VerifyPowerConnectivity;

impl AnalysisCheck for VerifyPowerConnectivity {
    fn name(&self) -> &str {
        "verify_power_connectivity"
    }

    fn description(&self) -> &str {
        "Verify power-net labels are wired and reach the target IC"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let power_nets = param_power_nets(ctx, params);
        let ic_ref = param_ic_ref(ctx, params);

        let mut result = AnalysisResult::pass(self.name(), "");
        let mut unconnected: Vec<String> = Vec::new();
        for label in &ctx.doc.labels {
            if power_nets.contains(&label.text)
                && !ctx.nets.label_attached.contains_key(&label.position)
            {
                unconnected.push(label.text.clone());
                result = result.with_issue(format!(
                    "power net '{}' label not connected to any wire at ({}, {})",
                    label.text, label.position.x, label.position.y
                ));
            }
        }
        result = result.with_detail("unconnected_power_labels", json!(unconnected));

        let ic = ic_ref.as_deref().and_then(|r| ctx.doc.symbol(r));
        match (&ic_ref, ic) {
            (Some(r), None) => {
                result.status = CheckStatus::Fail;
                result.severity = Severity::Critical;
                result = result.with_issue(format!("IC {r} not found in schematic"));
            }
            _ if !unconnected.is_empty() => {
                result.status = CheckStatus::Fail;
                result.severity = Severity::Critical;
                result = result.with_recommendation(format!(
                    "connect {} labels to wires",
                    unconnected.join(", ")
                ));
                if let Some(r) = &ic_ref {
                    result =
                        result.with_recommendation(format!("verify continuity from power source to {r}"));
                }
            }
            _ => {
                result = result.with_detail("power_nets_connected", json!(power_nets));
            }
        }

        if let Some(ic) = ic {
            let caps = capacitors_near(ctx.doc, &ic.position, 50.0);
            let refs: Vec<&str> = caps.iter().map(|c| c.reference.as_str()).collect();
            result = result.with_detail("nearby_decoupling_caps", json!(refs));
            if caps.is_empty() {
                result = result.with_recommendation(format!(
                    "add decoupling capacitor near {} power pins",
                    ic.reference
                ));
                if result.status == CheckStatus::Pass {
                    result.status = CheckStatus::Warning;
                    result.severity = Severity::Medium;
                }
            }
        }

        result.prevents_bringup = result.status == CheckStatus::Fail;
        let target = ic_ref.as_deref().unwrap_or("(no IC)");
        result.summary = format!(
            "power connectivity check for {target}: {} issue(s)",
            result.issues.len()
        );
        Ok(result)
    }
}

/// A live power rail should span at least a couple of wire nodes.
pub struct CheckPowerRailRouting;

impl AnalysisCheck for CheckPowerRailRouting {
    fn name(&self) -> &str {
        "check_power_rail_routing"
    }

    fn description(&self) -> &str {
        "Check that each power rail net exists and spans enough nodes"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let power_nets = param_power_nets(ctx, params);
        let min_nodes = param_f64(params, "min_node_count").unwrap_or(2.0) as usize;

        let mut result = AnalysisResult::pass(self.name(), "");
        for name in &power_nets {
            match ctx.nets.net_named(name) {
                None => {
                    result = result.with_issue(format!("power net '{name}' not found in netlist"));
                }
                Some(net) => {
                    let count = net.nodes.len();
                    result = result.with_detail(
                        name,
                        json!({"node_count": count, "is_valid": count >= min_nodes}),
                    );
                    if count < min_nodes {
                        result = result
                            .with_issue(format!(
                                "power net '{name}' has only {count} node(s), may be disconnected"
                            ))
                            .with_recommendation(format!(
                                "verify {name} connects to power source and all consumers"
                            ));
                    }
                }
            }
        }

        if !result.issues.is_empty() {
            result.status = CheckStatus::Fail;
            result.severity = Severity::Critical;
            result.prevents_bringup = true;
        }
        result.summary = format!(
            "power rail routing: {} nets analyzed, {} issues",
            power_nets.len(),
            result.issues.len()
        );
        Ok(result)
    }
}

/// Sheet-proximity decoupling audit for the named ICs.
pub struct AnalyzeDecouplingCapacitors;

impl AnalysisCheck for AnalyzeDecouplingCapacitors {
    fn name(&self) -> &str {
        "analyze_decoupling_capacitors"
    }

    fn description(&self) -> &str {
        "Find decoupling capacitors near each IC"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let ic_refs: Vec<String> = match params.get("ic_refs").and_then(Value::as_array) {
            Some(list) => list
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => ctx
                .doc
                .annotated_symbols()
                .filter(|s| s.reference.to_uppercase().starts_with('U'))
                .map(|s| s.reference.clone())
                .collect(),
        };
        let threshold = param_f64(params, "proximity_threshold").unwrap_or(50.0);

        let mut result = AnalysisResult::pass(self.name(), "");
        for ic_ref in &ic_refs {
            let Some(ic) = ctx.doc.symbol(ic_ref) else {
                continue;
            };
            let caps = capacitors_near(ctx.doc, &ic.position, threshold);
            let listed: Vec<Value> = caps
                .iter()
                .map(|c| {
                    json!({
                        "ref": c.reference,
                        "value": c.value,
                        "distance": (c.position.euclidean(&ic.position) * 10.0).round() / 10.0,
                    })
                })
                .collect();
            result = result.with_detail(
                ic_ref,
                json!({"nearby_caps": listed, "cap_count": caps.len()}),
            );

            if caps.is_empty() {
                result = result
                    .with_issue(format!("no decoupling capacitor found near {ic_ref}"))
                    .with_recommendation(format!(
                        "add 0.1uF ceramic cap close to {ic_ref} power pins"
                    ));
            } else if caps.len() == 1 {
                result = result.with_recommendation(format!(
                    "consider adding a bulk capacitor (10uF) in addition to {}",
                    caps[0].reference
                ));
            }
        }

        if !result.issues.is_empty() {
            result.status = CheckStatus::Warning;
            result.severity = Severity::Medium;
        }
        result.summary = format!("decoupling capacitor check: {} ICs analyzed", ic_refs.len());
        Ok(result)
    }
}

/// Regulator presence plus an input/output capacitor reminder.
pub struct VerifyVoltageRegulator;

impl AnalysisCheck for VerifyVoltageRegulator {
    fn name(&self) -> &str {
        "verify_voltage_regulator_circuit"
    }

    fn description(&self) -> &str {
        "Verify the voltage regulator and its capacitor requirements"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let reg_ref = param_str(params, "regulator_ref").unwrap_or("U?");
        let need_caps = params
            .get("input_cap_required")
            .and_then(Value::as_bool)
            .unwrap_or(true)
            || params
                .get("output_cap_required")
                .and_then(Value::as_bool)
                .unwrap_or(true);

        let mut result = AnalysisResult::pass(self.name(), "");
        match ctx.doc.symbol(reg_ref) {
            None => {
                result.status = CheckStatus::Fail;
                result.severity = Severity::Critical;
                result.prevents_bringup = true;
                result = result.with_issue(format!("regulator {reg_ref} not found"));
            }
            Some(reg) => {
                result = result.with_detail("regulator_found", json!(true));
                let caps = capacitors_near(ctx.doc, &reg.position, 50.0);
                result = result.with_detail(
                    "nearby_caps",
                    json!(caps.iter().map(|c| c.reference.as_str()).collect::<Vec<_>>()),
                );
                if need_caps {
                    result = result.with_recommendation(format!(
                        "verify input/output capacitors per {reg_ref} datasheet"
                    ));
                }
            }
        }
        result.summary = format!("voltage regulator {reg_ref} circuit check");
        Ok(result)
    }
}

/// Multi-rail boards may need a defined power-on order; this check only
/// reminds, it cannot prove sequencing from a schematic.
pub struct CheckPowerSequencing;

impl AnalysisCheck for CheckPowerSequencing {
    fn name(&self) -> &str {
        "check_power_sequencing"
    }

    fn description(&self) -> &str {
        "Check whether multi-rail power sequencing needs attention"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let rails: Vec<String> = match params.get("power_rails").and_then(Value::as_array) {
            Some(list) => list
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => non_ground_rails(ctx),
        };
        let required = params
            .get("sequencing_required")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut result = AnalysisResult::info(
            self.name(),
            format!("power sequencing check: {} rails", rails.len()),
        );
        result = result.with_detail("power_rails", json!(rails));
        result = result.with_detail("sequencing_required", json!(required));
        if required && rails.len() > 1 {
            result = result
                .with_recommendation("verify the power-on sequence matches IC requirements")
                .with_recommendation("consider enable signals or a sequencing circuit");
        }
        Ok(result)
    }
}

/// List the distinct voltage domains on the sheet.
pub struct DetectMultiVoltageSystem;

impl AnalysisCheck for DetectMultiVoltageSystem {
    fn name(&self) -> &str {
        "detect_multi_voltage_system"
    }

    fn description(&self) -> &str {
        "Detect whether the design carries more than one voltage rail"
    }

    fn run(&self, ctx: &CheckContext<'_>, _params: &Value) -> anyhow::Result<AnalysisResult> {
        let rails = non_ground_rails(ctx);

        let mut result = AnalysisResult::pass(self.name(), "");
        result = result.with_detail("voltage_rails", json!(rails));
        result = result.with_detail("rail_count", json!(rails.len()));
        match rails.len() {
            0 => {
                result.status = CheckStatus::Warning;
                result.severity = Severity::Medium;
                result = result
                    .with_issue("no power rails detected")
                    .with_recommendation("label the supply nets so rails can be identified");
                result.summary = "multi-voltage detection: no rails found".to_string();
            }
            1 => {
                result.summary = format!("single voltage rail: {}", rails[0]);
            }
            n => {
                result.status = CheckStatus::Info;
                result = result
                    .with_recommendation(format!(
                        "verify level shifting between the {} domains",
                        rails.join(", ")
                    ))
                    .with_recommendation("check regulator enable/sequencing between rails");
                result.summary = format!("multi-voltage system: {n} rails");
            }
        }
        Ok(result)
    }
}

fn non_ground_rails(ctx: &CheckContext<'_>) -> Vec<String> {
    ctx.detected
        .power_nets
        .iter()
        .filter(|n| {
            !matches!(
                n.to_uppercase().as_str(),
                "GND" | "AGND" | "DGND" | "VSS"
            )
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::Fixture;
    use crate::schema::{Label, LabelKind, Point, SchematicDocument, Symbol, Wire};
    use std::collections::HashMap;

    fn sym_at(reference: &str, value: &str, lib_id: &str, x: i64, y: i64) -> Symbol {
        Symbol {
            reference: reference.into(),
            value: value.into(),
            lib_id: lib_id.into(),
            position: Point::new(x, y),
            pins: vec![],
            properties: HashMap::new(),
        }
    }

    fn wire(points: &[(i64, i64)]) -> Wire {
        Wire {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    #[test]
    fn disconnected_power_label_fails_the_check() {
        let doc = SchematicDocument {
            symbols: vec![
                sym_at("U1", "STM32F103", "MCU_ST:STM32F103", 0, 0),
                sym_at("C1", "100nF", "Device:C", 10, 10),
            ],
            wires: vec![wire(&[(0, 0), (20, 0)])],
            labels: vec![Label {
                text: "VDD".into(),
                kind: LabelKind::Global,
                position: Point::new(500, 500), // far from any wire
            }],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = VerifyPowerConnectivity
            .run(&fixture.ctx(), &json!({"power_nets": ["VDD"], "ic_ref": "U1"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.severity, Severity::Critical);
        assert!(result.prevents_bringup);
    }

    #[test]
    fn connected_rail_with_decoupling_passes() {
        let doc = SchematicDocument {
            symbols: vec![
                sym_at("U1", "STM32F103", "MCU_ST:STM32F103", 0, 0),
                sym_at("C1", "100nF", "Device:C", 10, 10),
            ],
            wires: vec![wire(&[(0, 0), (20, 0)])],
            labels: vec![Label {
                text: "VDD".into(),
                kind: LabelKind::Global,
                position: Point::new(0, 0),
            }],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = VerifyPowerConnectivity
            .run(&fixture.ctx(), &json!({"power_nets": ["VDD"], "ic_ref": "U1"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[test]
    fn missing_ic_is_critical() {
        let fixture = Fixture::new(SchematicDocument::default());
        let result = VerifyPowerConnectivity
            .run(&fixture.ctx(), &json!({"ic_ref": "U9"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.issues[0].contains("U9"));
    }

    #[test]
    fn absent_power_net_fails_rail_routing() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (20, 0)])],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = CheckPowerRailRouting
            .run(&fixture.ctx(), &json!({"power_nets": ["VCC"]}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.prevents_bringup);
    }

    #[test]
    fn lonely_ic_gets_decoupling_warning() {
        let doc = SchematicDocument {
            symbols: vec![sym_at("U1", "MCU", "MCU:Any", 0, 0)],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = AnalyzeDecouplingCapacitors
            .run(&fixture.ctx(), &json!({"ic_refs": ["U1"]}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.issues[0].contains("U1"));
    }

    #[test]
    fn required_sequencing_over_two_rails_gets_recommendations() {
        let fixture = Fixture::new(SchematicDocument::default());
        let result = CheckPowerSequencing
            .run(
                &fixture.ctx(),
                &json!({"power_rails": ["3V3", "1V8"], "sequencing_required": true}),
            )
            .unwrap();
        assert_eq!(result.status, CheckStatus::Info);
        assert!(!result.prevents_bringup);
        assert!(result.recommendations[0].contains("power-on sequence"));
    }

    #[test]
    fn single_rail_needs_no_sequencing_advice() {
        let fixture = Fixture::new(SchematicDocument::default());
        let result = CheckPowerSequencing
            .run(
                &fixture.ctx(),
                &json!({"power_rails": ["3V3"], "sequencing_required": true}),
            )
            .unwrap();
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn two_supply_labels_form_a_multi_voltage_system() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)]), wire(&[(0, 50), (10, 50)])],
            labels: vec![
                Label {
                    text: "3V3".into(),
                    kind: LabelKind::Global,
                    position: Point::new(0, 0),
                },
                Label {
                    text: "5V".into(),
                    kind: LabelKind::Global,
                    position: Point::new(0, 50),
                },
            ],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = DetectMultiVoltageSystem
            .run(&fixture.ctx(), &Value::Null)
            .unwrap();
        assert_eq!(result.status, CheckStatus::Info);
        assert_eq!(result.details["rail_count"], 2);
        assert!(result.recommendations[0].contains("level shifting"));
    }

    #[test]
    fn ground_only_design_warns_on_multi_voltage_detection() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![Label {
                text: "GND".into(),
                kind: LabelKind::Global,
                position: Point::new(0, 0),
            }],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = DetectMultiVoltageSystem
            .run(&fixture.ctx(), &Value::Null)
            .unwrap();
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.issues[0].contains("no power rails"));
    }

    #[test]
    fn missing_regulator_is_critical() {
        let fixture = Fixture::new(SchematicDocument::default());
        let result = VerifyVoltageRegulator
            .run(&fixture.ctx(), &json!({"regulator_ref": "U5"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.prevents_bringup);
    }
}

//! MCU bring-up checks: reset circuit, boot straps, debug interface and
//! power pins.

use serde_json::{json, Value};

use super::{param_str, AnalysisCheck, AnalysisResult, CheckContext, CheckStatus, Severity};
use crate::detect::is_reset_net_name;
use crate::schema::{PinKind, Symbol};
use crate::topology::resistors_near;

/// Sheet radius within which a resistor counts as sitting on a net.
const PULL_RESISTOR_RADIUS: f64 = 50.0;

fn param_mcu_ref(ctx: &CheckContext<'_>, params: &Value) -> String {
    param_str(params, "mcu_ref")
        .map(str::to_string)
        .or_else(|| ctx.detected.mcu_symbols.first().cloned())
        .unwrap_or_else(|| "U?".to_string())
}

/// Find a resistor whose anchor sits near any node of the named net.
fn resistor_on_net<'a>(ctx: &'a CheckContext<'_>, net_name: &str) -> Option<&'a Symbol> {
    let net = ctx.nets.net_named(net_name)?;
    for node in &net.nodes {
        if let Some(r) = resistors_near(ctx.doc, node, PULL_RESISTOR_RADIUS).first() {
            return Some(*r);
        }
    }
    None
}

/// A floating NRST pin makes bring-up a coin toss; a pull resistor near
/// the reset net is required.
pub struct AnalyzeResetCircuit;

impl AnalysisCheck for AnalyzeResetCircuit {
    fn name(&self) -> &str {
        "analyze_reset_circuit"
    }

    fn description(&self) -> &str {
        "Verify the MCU reset net has a pull resistor"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let mcu_ref = param_mcu_ref(ctx, params);
        let reset_pin = param_str(params, "reset_pin").unwrap_or("7");
        let needs_pullup = params
            .get("pullup_required")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let mut result = AnalysisResult::pass(self.name(), "");
        result = result.with_detail("reset_pin", json!(reset_pin));
        result = result.with_detail("pullup_required", json!(needs_pullup));

        if ctx.doc.symbol(&mcu_ref).is_none() {
            result.status = CheckStatus::Fail;
            result.severity = Severity::Critical;
            result.prevents_bringup = true;
            result.summary = format!("reset circuit for {mcu_ref}: MCU not found");
            return Ok(result
                .with_issue(format!("MCU {mcu_ref} not found"))
                .with_recommendation("verify the MCU component reference"));
        }

        let reset_net = ctx
            .nets
            .nets
            .iter()
            .find(|n| is_reset_net_name(&n.name))
            .map(|n| n.name.clone());

        let pullup = reset_net
            .as_deref()
            .and_then(|net| resistor_on_net(ctx, net));
        if let Some(net) = &reset_net {
            result = result.with_detail("reset_net", json!(net));
        }

        match pullup {
            Some(resistor) => {
                result = result
                    .with_detail("pullup_resistor", json!(resistor.reference))
                    .with_recommendation(format!("reset pull-up found: {}", resistor.reference));
            }
            None if needs_pullup => {
                result.status = CheckStatus::Fail;
                result.severity = Severity::Critical;
                result.prevents_bringup = true;
                result = result
                    .with_issue(format!(
                        "missing reset pull-up resistor on {mcu_ref} pin {reset_pin} (NRST)"
                    ))
                    .with_recommendation(format!(
                        "add a 10k pull-up resistor from {mcu_ref} NRST (pin {reset_pin}) to VDD"
                    ))
                    .with_recommendation(
                        "a floating NRST pin makes reset behavior unreliable",
                    );
            }
            None => {
                result.status = CheckStatus::Warning;
                result.severity = Severity::Medium;
                result =
                    result.with_recommendation(format!("verify reset pull-up on pin {reset_pin}"));
            }
        }

        result.summary = format!("reset circuit for {mcu_ref}: {:?}", result.status);
        Ok(result)
    }
}

/// Boot/strap pins left floating pick their mode at random.
pub struct CheckBootPins;

impl AnalysisCheck for CheckBootPins {
    fn name(&self) -> &str {
        "check_boot_pins"
    }

    fn description(&self) -> &str {
        "Check that boot-strap pins are tied, not floating"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let mcu_ref = param_mcu_ref(ctx, params);
        let boot_pins: Vec<&str> = params
            .get("boot_pins")
            .and_then(Value::as_array)
            .map(|l| l.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let expected_state = param_str(params, "expected_state").unwrap_or("LOW");

        let mut result =
            AnalysisResult::pass(self.name(), format!("boot pin check for {mcu_ref}"));
        result = result.with_detail("boot_pins", json!(boot_pins));
        result = result.with_detail("expected_state", json!(expected_state));

        if ctx.doc.symbol(&mcu_ref).is_none() {
            result.status = CheckStatus::Fail;
            result.severity = Severity::Critical;
            result.prevents_bringup = true;
            return Ok(result.with_issue(format!("MCU {mcu_ref} not found")));
        }

        let boot_net = ctx
            .nets
            .nets
            .iter()
            .find(|n| n.name.to_uppercase().contains("BOOT"));
        for pin in &boot_pins {
            let tied = match boot_net {
                Some(net) => {
                    if let Some(r) = resistor_on_net(ctx, &net.name) {
                        result = result.with_detail(
                            &format!("boot_resistor_pin{pin}"),
                            json!(r.reference),
                        );
                        true
                    } else {
                        false
                    }
                }
                None => false,
            };
            if !tied && expected_state == "LOW" {
                result = result
                    .with_issue(format!("BOOT pin {pin} appears floating (should be pulled LOW)"))
                    .with_recommendation(format!(
                        "add a 10k pull-down resistor on {mcu_ref} BOOT0 (pin {pin}) to GND"
                    ));
            }
        }

        if !result.issues.is_empty() {
            result.status = CheckStatus::Warning;
            result.severity = Severity::Medium;
        }
        Ok(result)
    }
}

/// The detected or required debug signals must exist as nets.
pub struct CheckDebugInterface;

impl AnalysisCheck for CheckDebugInterface {
    fn name(&self) -> &str {
        "check_debug_interface"
    }

    fn description(&self) -> &str {
        "Check debug/programming signals exist as nets"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let mcu_ref = param_mcu_ref(ctx, params);
        let interface = param_str(params, "interface_type")
            .map(str::to_string)
            .or_else(|| ctx.detected.debug_interfaces.first().cloned())
            .unwrap_or_else(|| "SWD".to_string());
        let required: Vec<&str> = params
            .get("required_nets")
            .and_then(Value::as_array)
            .map(|l| l.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut result = AnalysisResult::pass(
            self.name(),
            format!("{interface} debug interface for {mcu_ref}"),
        );
        result = result.with_detail("interface", json!(interface));
        result = result.with_detail("required_signals", json!(required));

        let missing: Vec<&str> = required
            .iter()
            .filter(|n| ctx.nets.net_named(n).is_none())
            .copied()
            .collect();
        if !missing.is_empty() {
            result.status = CheckStatus::Fail;
            result.severity = Severity::Critical;
            result.prevents_bringup = true;
            result = result
                .with_issue(format!("missing {interface} signals: {}", missing.join(", ")))
                .with_recommendation(format!(
                    "add a {interface} connector with signals: {}",
                    required.join(", ")
                ));
        } else if ctx.detected.debug_interfaces.is_empty() && required.is_empty() {
            result.status = CheckStatus::Warning;
            result.severity = Severity::Medium;
            result = result
                .with_issue("no debug interface detected in the schematic".to_string())
                .with_recommendation("expose SWD or UART for programming and debug");
        } else {
            result.severity = Severity::Medium;
            result = result.with_recommendation(format!(
                "verify the {interface} connector pinout matches the programmer"
            ));
        }
        Ok(result)
    }
}

/// Power-role pins of the MCU must land on nets.
pub struct CheckMcuPowerPins;

impl AnalysisCheck for CheckMcuPowerPins {
    fn name(&self) -> &str {
        "check_mcu_power_pins"
    }

    fn description(&self) -> &str {
        "Check every MCU power pin is connected"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let mcu_ref = param_mcu_ref(ctx, params);

        let mut result =
            AnalysisResult::pass(self.name(), format!("MCU power pin check for {mcu_ref}"));

        let Some(mcu) = ctx.doc.symbol(&mcu_ref) else {
            result.status = CheckStatus::Fail;
            result.severity = Severity::Critical;
            result.prevents_bringup = true;
            return Ok(result.with_issue(format!("MCU {mcu_ref} not found")));
        };

        let power_pins: Vec<_> = mcu
            .pins
            .iter()
            .filter(|p| {
                matches!(p.kind, PinKind::PowerIn | PinKind::PowerOut) || {
                    let upper = p.name.to_uppercase();
                    upper.starts_with("VDD")
                        || upper.starts_with("VSS")
                        || upper == "VCC"
                        || upper == "GND"
                }
            })
            .collect();
        result = result.with_detail("power_pin_count", json!(power_pins.len()));

        let mut unconnected: Vec<String> = Vec::new();
        for pin in &power_pins {
            let abs = mcu.pin_position(pin);
            if ctx.nets.net_containing(&abs).is_none() {
                unconnected.push(format!("{}({})", pin.number, pin.name));
            }
        }

        if !unconnected.is_empty() {
            result.status = CheckStatus::Fail;
            result.severity = Severity::Critical;
            result.prevents_bringup = true;
            result = result
                .with_issue(format!(
                    "power pins not connected: {}",
                    unconnected.join(", ")
                ))
                .with_recommendation(format!(
                    "connect every VDD/VSS pin of {mcu_ref} to its rail"
                ));
        } else if power_pins.is_empty() {
            result.status = CheckStatus::Warning;
            result.severity = Severity::Medium;
            result = result.with_recommendation(format!(
                "no power-role pins declared on {mcu_ref}; verify pin data"
            ));
        }
        result = result.with_detail("unconnected_power_pins", json!(unconnected));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::Fixture;
    use crate::schema::{Label, LabelKind, Pin, Point, SchematicDocument, Symbol, Wire};
    use std::collections::HashMap;

    fn wire(points: &[(i64, i64)]) -> Wire {
        Wire {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

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

    fn reset_doc(with_pullup: bool) -> SchematicDocument {
        let mut symbols = vec![sym_at("U1", "STM32F103", "MCU_ST:STM32F103", 200, 200)];
        if with_pullup {
            symbols.push(sym_at("R1", "10k", "Device:R", 5, 5));
        }
        SchematicDocument {
            symbols,
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![Label {
                text: "NRST".into(),
                kind: LabelKind::Global,
                position: Point::new(0, 0),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn missing_reset_pullup_is_a_blocker() {
        let fixture = Fixture::new(reset_doc(false));
        let result = AnalyzeResetCircuit
            .run(&fixture.ctx(), &json!({"mcu_ref": "U1"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.severity, Severity::Critical);
        assert!(result.prevents_bringup);
        assert!(result.issues[0].contains("pull-up"));
    }

    #[test]
    fn present_reset_pullup_passes() {
        let fixture = Fixture::new(reset_doc(true));
        let result = AnalyzeResetCircuit
            .run(&fixture.ctx(), &json!({"mcu_ref": "U1"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.details["pullup_resistor"], "R1");
    }

    #[test]
    fn missing_mcu_fails_reset_check() {
        let fixture = Fixture::new(SchematicDocument::default());
        let result = AnalyzeResetCircuit
            .run(&fixture.ctx(), &json!({"mcu_ref": "U1"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.prevents_bringup);
    }

    #[test]
    fn untied_boot_pin_warns() {
        let doc = SchematicDocument {
            symbols: vec![sym_at("U1", "STM32", "MCU_ST:STM32", 0, 0)],
            wires: vec![wire(&[(0, 0), (10, 0)])],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = CheckBootPins
            .run(&fixture.ctx(), &json!({"mcu_ref": "U1", "boot_pins": ["44"]}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.issues[0].contains("44"));
    }

    #[test]
    fn missing_debug_signals_fail() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = CheckDebugInterface
            .run(
                &fixture.ctx(),
                &json!({"mcu_ref": "U1", "interface_type": "SWD", "required_nets": ["SWDIO", "SWCLK"]}),
            )
            .unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.issues[0].contains("SWDIO"));
    }

    #[test]
    fn unconnected_power_pin_is_critical() {
        let mcu = Symbol {
            reference: "U1".into(),
            value: "STM32".into(),
            lib_id: "MCU_ST:STM32".into(),
            position: Point::new(0, 0),
            pins: vec![
                Pin {
                    number: "1".into(),
                    name: "VDD".into(),
                    kind: crate::schema::PinKind::PowerIn,
                    position: Point::new(0, 0),
                },
                Pin {
                    number: "2".into(),
                    name: "VSS".into(),
                    kind: crate::schema::PinKind::PowerIn,
                    position: Point::new(400, 400),
                },
            ],
            properties: HashMap::new(),
        };
        let doc = SchematicDocument {
            symbols: vec![mcu],
            wires: vec![wire(&[(0, 0), (10, 0)])],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = CheckMcuPowerPins
            .run(&fixture.ctx(), &json!({"mcu_ref": "U1"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.issues[0].contains("2(VSS)"));
    }
}

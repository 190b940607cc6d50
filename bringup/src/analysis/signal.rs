//! Signal connectivity checks: floating pins, broken nets, pull
//! resistors, bus wiring and ground coverage.

use serde_json::{json, Value};

use super::{param_f64, param_str, AnalysisCheck, AnalysisResult, CheckContext, CheckStatus, Severity};
use crate::netlist::NetBuildResult;
use crate::schema::Point;
use crate::topology::resistors_near;

/// Chebyshev slack when matching a pin's absolute position to a net node.
const PIN_CONNECT_TOLERANCE: i64 = 3;

fn is_point_connected(at: &Point, nets: &NetBuildResult) -> bool {
    nets.nets
        .iter()
        .any(|net| net.nodes.iter().any(|n| n.chebyshev(at) <= PIN_CONNECT_TOLERANCE))
}

/// Pins of the target IC that sit on no net at all.
pub struct CheckFloatingPins;

impl AnalysisCheck for CheckFloatingPins {
    fn name(&self) -> &str {
        "check_floating_pins"
    }

    fn description(&self) -> &str {
        "Find IC pins not connected to any net"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let ic_ref = param_str(params, "ic_ref")
            .map(str::to_string)
            .or_else(|| ctx.detected.mcu_symbols.first().cloned())
            .unwrap_or_else(|| "U?".to_string());
        let exclude: Vec<&str> = params
            .get("exclude_pins")
            .and_then(Value::as_array)
            .map(|l| l.iter().filter_map(Value::as_str).collect())
            .unwrap_or_else(|| vec!["NC", "NB"]);
        let critical: Vec<&str> = params
            .get("critical_pins")
            .and_then(Value::as_array)
            .map(|l| l.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut result =
            AnalysisResult::pass(self.name(), format!("floating pin check for {ic_ref}"));

        let Some(ic) = ctx.doc.symbol(&ic_ref) else {
            result.status = CheckStatus::Fail;
            result.severity = Severity::Critical;
            result.prevents_bringup = true;
            return Ok(result.with_issue(format!("IC {ic_ref} not found")));
        };

        let mut floating: Vec<String> = Vec::new();
        for pin in &ic.pins {
            if exclude.contains(&pin.name.as_str()) || exclude.contains(&pin.number.as_str()) {
                continue;
            }
            if !critical.is_empty() && !critical.contains(&pin.number.as_str()) {
                continue;
            }
            let abs = ic.pin_position(pin);
            if !is_point_connected(&abs, ctx.nets) {
                floating.push(format!("{}({})", pin.number, pin.name));
            }
        }

        result = result.with_detail("ic", json!(ic_ref));
        result = result.with_detail("floating_pins", json!(floating));
        if !floating.is_empty() {
            result.status = CheckStatus::Warning;
            result.severity = Severity::Medium;
            result = result
                .with_issue(format!("pins floating: {}", floating.join(", ")))
                .with_recommendation(format!(
                    "verify {ic_ref} pins {} are connected",
                    floating.join(", ")
                ));
        }
        Ok(result)
    }
}

/// Single-node nets are kept by the net builder precisely so this check
/// can flag them: one point means nothing actually connects.
pub struct CheckSingleNodeNets;

impl AnalysisCheck for CheckSingleNodeNets {
    fn name(&self) -> &str {
        "check_single_node_nets"
    }

    fn description(&self) -> &str {
        "Flag nets that consist of a single point"
    }

    fn run(&self, ctx: &CheckContext<'_>, _params: &Value) -> anyhow::Result<AnalysisResult> {
        let lonely: Vec<String> = ctx
            .nets
            .single_node_nets()
            .iter()
            .map(|n| n.name.clone())
            .collect();

        let mut result = AnalysisResult::pass(
            self.name(),
            format!("{} single-node net(s) found", lonely.len()),
        );
        result = result.with_detail("single_node_nets", json!(lonely));
        if !lonely.is_empty() {
            result.status = CheckStatus::Fail;
            result.severity = Severity::Medium;
            result = result
                .with_issue(format!("nets with a single connection: {}", lonely.join(", ")))
                .with_recommendation("each net needs at least two connected points to carry a signal");
        }
        Ok(result)
    }
}

/// Existence and plausibility of one named signal path.
pub struct TraceSignalPath;

impl AnalysisCheck for TraceSignalPath {
    fn name(&self) -> &str {
        "trace_signal_path"
    }

    fn description(&self) -> &str {
        "Trace a named net from source to destinations"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let net_name = param_str(params, "net_name").unwrap_or("");
        let source = param_str(params, "expected_source").unwrap_or("source");

        let mut result =
            AnalysisResult::pass(self.name(), format!("signal path trace for {net_name}"));
        match ctx.nets.net_named(net_name) {
            None => {
                result.status = CheckStatus::Fail;
                result.severity = Severity::High;
                result.prevents_bringup = true;
                result = result.with_issue(format!("net {net_name} not found in netlist"));
            }
            Some(net) => {
                result = result.with_detail("node_count", json!(net.nodes.len()));
                if net.is_single_node() {
                    result.status = CheckStatus::Fail;
                    result.severity = Severity::High;
                    result.prevents_bringup = true;
                    result = result
                        .with_issue(format!("net {net_name} has only one connection, likely broken"))
                        .with_recommendation(format!(
                            "verify {net_name} connects from {source} to its destination(s)"
                        ));
                } else {
                    result = result.with_detail("path_valid", json!(true));
                }
            }
        }
        Ok(result)
    }
}

/// Every ground net should collect a minimum number of connection points.
pub struct VerifyGroundConnectivity;

impl AnalysisCheck for VerifyGroundConnectivity {
    fn name(&self) -> &str {
        "verify_ground_connectivity"
    }

    fn description(&self) -> &str {
        "Check ground nets exist and have enough connection points"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let ground_nets: Vec<String> = match params.get("ground_nets").and_then(Value::as_array) {
            Some(list) => list
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => vec!["GND".to_string()],
        };
        let min_conn = param_f64(params, "min_connections").unwrap_or(3.0) as usize;

        let mut result = AnalysisResult::pass(self.name(), "");
        for name in &ground_nets {
            match ctx.nets.net_named(name) {
                None => {
                    result = result.with_issue(format!("ground net {name} not found"));
                }
                Some(net) => {
                    let count = net.nodes.len();
                    result = result.with_detail(
                        name,
                        json!({"connections": count, "sufficient": count >= min_conn}),
                    );
                    if count < min_conn {
                        result = result
                            .with_issue(format!("ground net {name} has only {count} connections"))
                            .with_recommendation(format!("verify all ground pins connect to {name}"));
                    }
                }
            }
        }

        if !result.issues.is_empty() {
            result.status = CheckStatus::Fail;
            result.severity = Severity::High;
            result.prevents_bringup = true;
        }
        result.summary = format!(
            "ground connectivity: {} nets checked, {} issues",
            ground_nets.len(),
            result.issues.len()
        );
        Ok(result)
    }
}

/// Find a resistor whose anchor sits near any node of the named net.
fn resistor_near_net<'a>(ctx: &'a CheckContext<'_>, net_name: &str) -> Option<String> {
    let net = ctx.nets.net_named(net_name)?;
    for node in &net.nodes {
        if let Some(r) = resistors_near(ctx.doc, node, PIN_CONNECT_TOLERANCE as f64).first() {
            return Some(r.reference.clone());
        }
    }
    None
}

/// Pull resistor audit for the named nets.
pub struct VerifyPullUpPullDown;

impl AnalysisCheck for VerifyPullUpPullDown {
    fn name(&self) -> &str {
        "verify_pull_up_pull_down"
    }

    fn description(&self) -> &str {
        "Verify pull-up/pull-down resistors on the named nets"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let nets: Vec<String> = params
            .get("nets")
            .and_then(Value::as_array)
            .map(|l| l.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let pull_type = param_str(params, "pull_type").unwrap_or("up");
        let range = params
            .get("resistor_range")
            .and_then(Value::as_array)
            .and_then(|r| Some((r.first()?.as_f64()?, r.get(1)?.as_f64()?)))
            .unwrap_or((1_000.0, 100_000.0));

        let mut result = AnalysisResult::info(
            self.name(),
            format!("pull-{pull_type} verification: {} nets", nets.len()),
        );
        for net in &nets {
            match resistor_near_net(ctx, net) {
                Some(resistor) => {
                    result = result.with_detail(
                        net,
                        json!({"pull_type_required": pull_type, "resistor": resistor}),
                    );
                }
                None => {
                    result = result
                        .with_detail(
                            net,
                            json!({
                                "pull_type_required": pull_type,
                                "resistance_range": [range.0, range.1],
                            }),
                        )
                        .with_recommendation(format!(
                            "verify {net} has a {:.1}k-{:.0}k pull-{pull_type} resistor",
                            range.0 / 1000.0,
                            range.1 / 1000.0
                        ));
                }
            }
        }
        Ok(result)
    }
}

/// Differential pairs can only be sanity-checked for existence at the
/// schematic level; length matching is a layout concern, so the rest is
/// advisory.
pub struct CheckDifferentialPairs;

impl AnalysisCheck for CheckDifferentialPairs {
    fn name(&self) -> &str {
        "check_differential_pairs"
    }

    fn description(&self) -> &str {
        "Check differential pair nets exist and note routing requirements"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let pairs: Vec<(String, String)> = params
            .get("pair_nets")
            .and_then(Value::as_array)
            .map(|l| {
                l.iter()
                    .filter_map(|p| {
                        let p = p.as_array()?;
                        Some((p.first()?.as_str()?.to_string(), p.get(1)?.as_str()?.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        let tolerance = param_f64(params, "tolerance").unwrap_or(0.5);

        let mut result = AnalysisResult::info(
            self.name(),
            format!("differential pair check: {} pairs", pairs.len()),
        );
        for (pos, neg) in &pairs {
            let missing: Vec<&str> = [pos.as_str(), neg.as_str()]
                .into_iter()
                .filter(|n| ctx.nets.net_named(n).is_none())
                .collect();
            result = result.with_detail(
                &format!("{pos}_{neg}"),
                json!({"pair": [pos, neg], "tolerance_mm": tolerance}),
            );
            if !missing.is_empty() {
                result.status = CheckStatus::Warning;
                result.severity = Severity::Medium;
                result = result.with_issue(format!(
                    "differential pair nets missing: {}",
                    missing.join(", ")
                ));
            }
            result = result
                .with_recommendation(format!(
                    "match {pos}/{neg} lengths within {tolerance}mm"
                ))
                .with_recommendation(format!("keep {pos}/{neg} traces parallel"));
        }
        Ok(result)
    }
}

/// Termination reminders for high-speed nets.
pub struct AnalyzeSignalTermination;

impl AnalysisCheck for AnalyzeSignalTermination {
    fn name(&self) -> &str {
        "analyze_signal_termination"
    }

    fn description(&self) -> &str {
        "Note termination requirements for high-speed signal nets"
    }

    fn run(&self, _ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let signals: Vec<&str> = params
            .get("signal_nets")
            .and_then(Value::as_array)
            .map(|l| l.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let term_type = param_str(params, "termination_type").unwrap_or("none");

        let mut result = AnalysisResult::info(
            self.name(),
            format!(
                "signal termination: {} nets, type={term_type}",
                signals.len()
            ),
        );
        result = result.with_detail("termination_type", json!(term_type));
        if term_type != "none" {
            for net in &signals {
                result = result.with_recommendation(format!(
                    "verify {net} has a {term_type} termination resistor"
                ));
            }
        }
        Ok(result)
    }
}

/// I2C needs pull-ups on both bus lines; floating SDA/SCL pins mean no
/// bus at all.
pub struct VerifyI2cBus;

impl AnalysisCheck for VerifyI2cBus {
    fn name(&self) -> &str {
        "verify_i2c_bus"
    }

    fn description(&self) -> &str {
        "Check I2C bus wiring and pull-up resistors"
    }

    fn run(&self, ctx: &CheckContext<'_>, _params: &Value) -> anyhow::Result<AnalysisResult> {
        let i2c_nets: Vec<String> = ctx
            .nets
            .nets
            .iter()
            .filter(|n| {
                let upper = n.name.to_uppercase();
                upper.contains("SDA") || upper.contains("SCL")
            })
            .map(|n| n.name.clone())
            .collect();

        let mut result = AnalysisResult::pass(self.name(), "no I2C bus detected");
        result = result.with_detail("i2c_nets", json!(i2c_nets));

        if !i2c_nets.is_empty() {
            result.summary = format!("I2C bus detected: {}", i2c_nets.join(", "));
            for net in &i2c_nets {
                if resistor_near_net(ctx, net).is_none() {
                    result.status = CheckStatus::Warning;
                    result.severity = Severity::Medium;
                    result = result
                        .with_issue(format!("no pull-up resistor detected on I2C net {net}"))
                        .with_recommendation(format!("add a 2.2k-10k pull-up resistor on {net}"));
                }
            }
            return Ok(result);
        }

        // No named bus; fall back to looking at SDA/SCL pins directly.
        let mut floating: Vec<String> = Vec::new();
        let mut found_pins = false;
        for sym in ctx.doc.annotated_symbols() {
            for pin in &sym.pins {
                let upper = pin.name.to_uppercase();
                if !upper.contains("SDA") && !upper.contains("SCL") {
                    continue;
                }
                found_pins = true;
                if !is_point_connected(&sym.pin_position(pin), ctx.nets) {
                    floating.push(format!("{}.{}", sym.reference, pin.name));
                }
            }
        }

        if found_pins {
            if floating.is_empty() {
                result.status = CheckStatus::Info;
                result.summary = "I2C pins detected but no bus formed (nets unnamed)".to_string();
                result = result
                    .with_recommendation("verify I2C nets are connected and named properly");
            } else {
                result.status = CheckStatus::Fail;
                result.severity = Severity::High;
                result.summary = "I2C pins detected but no bus formed".to_string();
                result = result
                    .with_issue(format!("I2C pins found floating: {}", floating.join(", ")))
                    .with_recommendation("connect I2C pins to the bus and add pull-up resistors");
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::Fixture;
    use crate::schema::{Label, LabelKind, Pin, PinKind, SchematicDocument, Symbol, Wire};
    use std::collections::HashMap;

    fn wire(points: &[(i64, i64)]) -> Wire {
        Wire {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    fn ic_with_pins(reference: &str, pins: &[(&str, &str, i64, i64)]) -> Symbol {
        Symbol {
            reference: reference.into(),
            value: "MCU".into(),
            lib_id: "MCU:Generic".into(),
            position: Point::new(0, 0),
            pins: pins
                .iter()
                .map(|&(num, name, x, y)| Pin {
                    number: num.into(),
                    name: name.into(),
                    kind: PinKind::Unspecified,
                    position: Point::new(x, y),
                })
                .collect(),
            properties: HashMap::new(),
        }
    }

    #[test]
    fn connected_pins_pass_floating_check() {
        let doc = SchematicDocument {
            symbols: vec![ic_with_pins("U1", &[("1", "VDD", 0, 0), ("2", "GND", 10, 0)])],
            wires: vec![wire(&[(0, 0), (10, 0)])],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = CheckFloatingPins
            .run(&fixture.ctx(), &json!({"ic_ref": "U1"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[test]
    fn floating_pin_is_reported_with_number_and_name() {
        let doc = SchematicDocument {
            symbols: vec![ic_with_pins("U1", &[("1", "VDD", 0, 0), ("7", "EN", 200, 200)])],
            wires: vec![wire(&[(0, 0), (10, 0)])],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = CheckFloatingPins
            .run(&fixture.ctx(), &json!({"ic_ref": "U1"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.issues[0].contains("7(EN)"));
    }

    #[test]
    fn nc_pins_are_excluded() {
        let doc = SchematicDocument {
            symbols: vec![ic_with_pins("U1", &[("8", "NC", 300, 300)])],
            wires: vec![wire(&[(0, 0), (10, 0)])],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = CheckFloatingPins
            .run(&fixture.ctx(), &json!({"ic_ref": "U1"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[test]
    fn single_node_net_fails() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(5, 5), (5, 5)]), wire(&[(0, 0), (10, 0)])],
            labels: vec![Label {
                text: "OUT".into(),
                kind: LabelKind::Local,
                position: Point::new(5, 5),
            }],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = CheckSingleNodeNets.run(&fixture.ctx(), &Value::Null).unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.severity, Severity::Medium);
        assert!(result.issues[0].contains("OUT"));
    }

    #[test]
    fn trace_fails_on_missing_and_single_node_nets() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![Label {
                text: "SIG".into(),
                kind: LabelKind::Local,
                position: Point::new(0, 0),
            }],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let missing = TraceSignalPath
            .run(&fixture.ctx(), &json!({"net_name": "NOPE"}))
            .unwrap();
        assert_eq!(missing.status, CheckStatus::Fail);
        assert_eq!(missing.severity, Severity::High);

        let ok = TraceSignalPath
            .run(&fixture.ctx(), &json!({"net_name": "SIG"}))
            .unwrap();
        assert_eq!(ok.status, CheckStatus::Pass);
    }

    fn sym_at(reference: &str, value: &str, x: i64, y: i64) -> Symbol {
        Symbol {
            reference: reference.into(),
            value: value.into(),
            lib_id: "Device:R".into(),
            position: Point::new(x, y),
            pins: vec![],
            properties: HashMap::new(),
        }
    }

    #[test]
    fn pull_resistor_on_net_is_recorded() {
        let doc = SchematicDocument {
            symbols: vec![sym_at("R1", "10k", 10, 0)],
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![Label {
                text: "NRST".into(),
                kind: LabelKind::Global,
                position: Point::new(0, 0),
            }],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = VerifyPullUpPullDown
            .run(&fixture.ctx(), &json!({"nets": ["NRST"], "pull_type": "up"}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Info);
        assert_eq!(result.details["NRST"]["resistor"], "R1");
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn missing_pull_resistor_gets_a_recommendation() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![Label {
                text: "BOOT0".into(),
                kind: LabelKind::Global,
                position: Point::new(0, 0),
            }],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = VerifyPullUpPullDown
            .run(&fixture.ctx(), &json!({"nets": ["BOOT0"], "pull_type": "down"}))
            .unwrap();
        assert!(result.recommendations[0].contains("pull-down"));
    }

    #[test]
    fn missing_differential_net_warns() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![Label {
                text: "USB_DP".into(),
                kind: LabelKind::Global,
                position: Point::new(0, 0),
            }],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = CheckDifferentialPairs
            .run(&fixture.ctx(), &json!({"pair_nets": [["USB_DP", "USB_DM"]]}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.issues[0].contains("USB_DM"));
        assert!(!result.issues[0].contains("USB_DP,"));
    }

    #[test]
    fn termination_advice_is_per_net() {
        let fixture = Fixture::new(SchematicDocument::default());
        let result = AnalyzeSignalTermination
            .run(
                &fixture.ctx(),
                &json!({"signal_nets": ["CLK_OUT"], "termination_type": "series"}),
            )
            .unwrap();
        assert_eq!(result.status, CheckStatus::Info);
        assert!(result.recommendations[0].contains("series"));

        let none = AnalyzeSignalTermination
            .run(
                &fixture.ctx(),
                &json!({"signal_nets": ["CLK_OUT"], "termination_type": "none"}),
            )
            .unwrap();
        assert!(none.recommendations.is_empty());
    }

    #[test]
    fn i2c_bus_without_pullups_warns() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)]), wire(&[(0, 50), (10, 50)])],
            labels: vec![
                Label {
                    text: "SDA".into(),
                    kind: LabelKind::Global,
                    position: Point::new(0, 0),
                },
                Label {
                    text: "SCL".into(),
                    kind: LabelKind::Global,
                    position: Point::new(0, 50),
                },
            ],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = VerifyI2cBus.run(&fixture.ctx(), &Value::Null).unwrap();
        assert_eq!(result.status, CheckStatus::Warning);
        assert_eq!(result.issues.len(), 2);
        assert!(result.summary.contains("I2C bus detected"));
    }

    #[test]
    fn i2c_bus_with_pullups_passes() {
        let doc = SchematicDocument {
            symbols: vec![sym_at("R1", "4.7k", 10, 0), sym_at("R2", "4.7k", 10, 50)],
            wires: vec![wire(&[(0, 0), (10, 0)]), wire(&[(0, 50), (10, 50)])],
            labels: vec![
                Label {
                    text: "SDA".into(),
                    kind: LabelKind::Global,
                    position: Point::new(0, 0),
                },
                Label {
                    text: "SCL".into(),
                    kind: LabelKind::Global,
                    position: Point::new(0, 50),
                },
            ],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = VerifyI2cBus.run(&fixture.ctx(), &Value::Null).unwrap();
        assert_eq!(result.status, CheckStatus::Pass);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn floating_i2c_pins_fail_without_a_bus() {
        let doc = SchematicDocument {
            symbols: vec![ic_with_pins(
                "U1",
                &[("10", "SDA", 200, 200), ("11", "SCL", 210, 200)],
            )],
            wires: vec![wire(&[(0, 0), (10, 0)])],
            ..Default::default()
        };
        let fixture = Fixture::new(doc);
        let result = VerifyI2cBus.run(&fixture.ctx(), &Value::Null).unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.severity, Severity::High);
        assert!(result.issues[0].contains("U1.SDA"));
    }

    #[test]
    fn thin_ground_net_fails() {
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
        let result = VerifyGroundConnectivity
            .run(&fixture.ctx(), &json!({"min_connections": 3}))
            .unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.issues[0].contains("GND"));
    }
}

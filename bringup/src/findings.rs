//! Structural findings: connectivity defects visible straight from the
//! net build, before any plan-driven check runs.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analysis::Severity;
use crate::netlist::NetBuildResult;
use crate::schema::SchematicDocument;
use crate::topology::symbols_near;

/// Unnamed-net count at which the schematic counts as under-labeled.
const UNNAMED_NET_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub severity: Severity,
    pub summary: String,
    pub why: String,
    pub evidence: serde_json::Value,
    pub fix_suggestion: Option<String>,
    pub prevents_bringup: bool,
    pub location: Option<String>,
}

impl Finding {
    fn new(id: &str, severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            severity,
            summary: summary.into(),
            why: String::new(),
            evidence: serde_json::Value::Null,
            fix_suggestion: None,
            prevents_bringup: false,
            location: None,
        }
    }

    pub fn is_blocker(&self) -> bool {
        self.prevents_bringup || self.severity == Severity::Critical
    }
}

/// Run all structural analyses over the net build.
///
/// `power_nets` comes from the indicator detector and upgrades unattached
/// power labels to critical blockers.
pub fn analyze_findings(
    doc: &SchematicDocument,
    nets: &NetBuildResult,
    power_nets: &[String],
) -> Vec<Finding> {
    let mut findings = Vec::new();

    unattached_labels(nets, power_nets, &mut findings);
    many_unnamed_nets(nets, &mut findings);
    disconnected_power_labels(doc, nets, power_nets, &mut findings);
    ics_without_power(doc, power_nets, &mut findings);
    floating_outputs(doc, nets, &mut findings);
    single_node_nets(nets, &mut findings);

    tracing::info!(count = findings.len(), "structural findings collected");
    findings
}

fn unattached_labels(nets: &NetBuildResult, power_nets: &[String], out: &mut Vec<Finding>) {
    for (text, pos) in &nets.label_unattached {
        let is_power = power_nets.contains(text);
        let upper = text.to_uppercase();
        let severity = if is_power { Severity::Critical } else { Severity::High };
        let mut fix = format!("ensure the \"{text}\" label touches a wire or junction point");
        if is_power {
            fix = format!("power net \"{text}\" must be connected; {fix}");
        } else if upper.contains("OUT") || upper.contains("CLK") {
            fix = format!("important signal \"{text}\" should be connected; {fix}");
        }

        let mut f = Finding::new(
            "label_unattached",
            severity,
            format!("label \"{text}\" is not connected to any wire node"),
        );
        f.why = "a label must physically touch a wire or junction; floating labels break or \
                 misname the net so the signal never propagates"
            .to_string();
        f.evidence = json!({"label": text, "position": [pos.x, pos.y]});
        f.fix_suggestion = Some(fix);
        f.prevents_bringup = is_power;
        f.location = Some(format!("position ({}, {})", pos.x, pos.y));
        out.push(f);
    }
}

fn many_unnamed_nets(nets: &NetBuildResult, out: &mut Vec<Finding>) {
    let unnamed: Vec<&str> = nets
        .nets
        .iter()
        .filter(|n| n.is_synthetic_name)
        .map(|n| n.name.as_str())
        .collect();
    if unnamed.len() < UNNAMED_NET_THRESHOLD {
        return;
    }
    let mut f = Finding::new(
        "many_unnamed_nets",
        Severity::Medium,
        format!("{} unnamed nets found", unnamed.len()),
    );
    f.why = "usually indicates missing labels or fragmented wiring; unnamed nets cannot be \
             identified during debugging"
        .to_string();
    f.evidence = json!({
        "count": unnamed.len(),
        "examples": unnamed.iter().take(5).collect::<Vec<_>>(),
    });
    f.fix_suggestion =
        Some("add descriptive labels to signal nets; use global labels for nets that cross sheets".into());
    out.push(f);
}

fn disconnected_power_labels(
    doc: &SchematicDocument,
    nets: &NetBuildResult,
    power_nets: &[String],
    out: &mut Vec<Finding>,
) {
    for label in &doc.labels {
        if !power_nets.contains(&label.text) || nets.label_attached.contains_key(&label.position) {
            continue;
        }
        let nearby: Vec<String> = symbols_near(doc, &label.position, 50.0)
            .iter()
            .map(|s| s.reference.clone())
            .collect();
        let location = if nearby.is_empty() {
            format!("position ({}, {})", label.position.x, label.position.y)
        } else {
            format!("near components: {}", nearby[..nearby.len().min(3)].join(", "))
        };

        let mut f = Finding::new(
            "power_net_disconnected",
            Severity::Critical,
            format!("power net \"{}\" label is not connected to the circuit", label.text),
        );
        f.why = format!(
            "the {} label does not connect to any wire, so power cannot reach components \
             expecting this net",
            label.text
        );
        f.evidence = json!({
            "label": label.text,
            "position": [label.position.x, label.position.y],
            "nearby_components": nearby,
        });
        f.fix_suggestion = Some(format!(
            "draw a wire from the {} label to the intended power source or IC pin",
            label.text
        ));
        f.prevents_bringup = true;
        f.location = Some(location);
        out.push(f);
    }
}

fn ics_without_power(doc: &SchematicDocument, power_nets: &[String], out: &mut Vec<Finding>) {
    for ic in doc
        .annotated_symbols()
        .filter(|s| s.reference.to_uppercase().starts_with('U'))
    {
        let has_power_label_nearby = doc.labels.iter().any(|l| {
            power_nets.contains(&l.text)
                && (l.position.x - ic.position.x).abs() < 100
                && (l.position.y - ic.position.y).abs() < 100
        });
        if has_power_label_nearby {
            continue;
        }
        let mut f = Finding::new(
            "ic_missing_power_connection",
            Severity::High,
            format!("no visible power connection to {} ({})", ic.reference, ic.value),
        );
        f.why = format!(
            "IC {} has no power net labels nearby, which may indicate missing VDD/GND connections",
            ic.reference
        );
        f.evidence = json!({
            "component": ic.reference,
            "value": ic.value,
            "expected_nets": power_nets,
        });
        f.fix_suggestion = Some(format!(
            "connect {} power pins to the appropriate rails per its datasheet",
            ic.reference
        ));
        f.prevents_bringup = true;
        f.location = Some(format!(
            "{} at ({}, {})",
            ic.reference, ic.position.x, ic.position.y
        ));
        out.push(f);
    }
}

fn floating_outputs(doc: &SchematicDocument, nets: &NetBuildResult, out: &mut Vec<Finding>) {
    for label in &doc.labels {
        if !label.text.to_uppercase().contains("OUT")
            || nets.label_attached.contains_key(&label.position)
        {
            continue;
        }
        let mut f = Finding::new(
            "output_signal_floating",
            Severity::High,
            format!("output signal \"{}\" is not connected", label.text),
        );
        f.why = "this output label connects to no wire, so the signal cannot be measured or used"
            .to_string();
        f.evidence = json!({"label": label.text, "position": [label.position.x, label.position.y]});
        f.fix_suggestion = Some(format!(
            "connect {} to the output pin of the driving component",
            label.text
        ));
        f.location = Some(format!(
            "position ({}, {})",
            label.position.x, label.position.y
        ));
        out.push(f);
    }
}

fn single_node_nets(nets: &NetBuildResult, out: &mut Vec<Finding>) {
    for net in &nets.nets {
        if !net.is_single_node() || net.is_synthetic_name {
            continue;
        }
        let node = net.nodes.iter().next();
        let mut f = Finding::new(
            "single_node_net",
            Severity::Medium,
            format!("net \"{}\" has only one connection point", net.name),
        );
        f.why = "a net with one node is incomplete; a signal needs at least a source and a \
                 destination"
            .to_string();
        f.evidence = json!({
            "net": net.name,
            "node_count": net.nodes.len(),
            "position": node.map(|p| [p.x, p.y]),
        });
        f.fix_suggestion = Some(format!(
            "verify {} connects to both its source and destination",
            net.name
        ));
        out.push(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::build_nets;
    use crate::schema::{Label, LabelKind, Point, Symbol, Wire};
    use std::collections::HashMap;

    fn wire(points: &[(i64, i64)]) -> Wire {
        Wire {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    fn label(text: &str, x: i64, y: i64) -> Label {
        Label {
            text: text.into(),
            kind: LabelKind::Global,
            position: Point::new(x, y),
        }
    }

    fn find<'a>(findings: &'a [Finding], id: &str) -> Vec<&'a Finding> {
        findings.iter().filter(|f| f.id == id).collect()
    }

    #[test]
    fn unattached_power_label_is_a_critical_blocker() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![label("VCC", 500, 500)],
            ..Default::default()
        };
        let nets = build_nets(&doc, 2);
        let findings = analyze_findings(&doc, &nets, &["VCC".to_string()]);
        let hits = find(&findings, "label_unattached");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].severity, Severity::Critical);
        assert!(hits[0].prevents_bringup);
        assert!(hits[0].is_blocker());
        // The targeted power analysis reports it too.
        assert_eq!(find(&findings, "power_net_disconnected").len(), 1);
    }

    #[test]
    fn unattached_signal_label_is_high_but_not_blocking() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![label("SENSOR", 500, 500)],
            ..Default::default()
        };
        let nets = build_nets(&doc, 2);
        let findings = analyze_findings(&doc, &nets, &[]);
        let hits = find(&findings, "label_unattached");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].severity, Severity::High);
        assert!(!hits[0].prevents_bringup);
    }

    #[test]
    fn unnamed_net_flood_triggers_at_threshold() {
        // Five disjoint unlabeled wires.
        let wires = (0..5i64)
            .map(|i| wire(&[(i * 100, 0), (i * 100 + 10, 0)]))
            .collect();
        let doc = SchematicDocument {
            wires,
            ..Default::default()
        };
        let nets = build_nets(&doc, 0);
        let findings = analyze_findings(&doc, &nets, &[]);
        assert_eq!(find(&findings, "many_unnamed_nets").len(), 1);
    }

    #[test]
    fn four_unnamed_nets_do_not_trigger() {
        let wires = (0..4i64)
            .map(|i| wire(&[(i * 100, 0), (i * 100 + 10, 0)]))
            .collect();
        let doc = SchematicDocument {
            wires,
            ..Default::default()
        };
        let nets = build_nets(&doc, 0);
        let findings = analyze_findings(&doc, &nets, &[]);
        assert!(find(&findings, "many_unnamed_nets").is_empty());
    }

    #[test]
    fn ic_far_from_power_labels_is_flagged() {
        let doc = SchematicDocument {
            symbols: vec![Symbol {
                reference: "U1".into(),
                value: "NE555".into(),
                lib_id: "Timer:NE555".into(),
                position: Point::new(1000, 1000),
                pins: vec![],
                properties: HashMap::new(),
            }],
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![label("VCC", 0, 0)],
            ..Default::default()
        };
        let nets = build_nets(&doc, 2);
        let findings = analyze_findings(&doc, &nets, &["VCC".to_string()]);
        let hits = find(&findings, "ic_missing_power_connection");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].summary.contains("U1"));
    }

    #[test]
    fn named_single_node_net_is_reported() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(5, 5), (5, 5)])],
            labels: vec![label("OUT1", 5, 5)],
            ..Default::default()
        };
        let nets = build_nets(&doc, 0);
        let findings = analyze_findings(&doc, &nets, &[]);
        let hits = find(&findings, "single_node_net");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].severity, Severity::Medium);
    }
}

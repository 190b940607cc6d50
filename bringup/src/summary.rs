//! Condensed schematic summaries.
//!
//! [`SchematicSummary`] packs everything a plan provider needs to reason
//! about a design into a single serializable structure: the component
//! inventory, net connectivity, label attachment status and a proximity
//! map. Sheet-editor identifiers and redundant geometry are dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::netlist::NetBuildResult;
use crate::schema::{Point, SchematicDocument};

/// Components closer than this (Euclidean units) count as neighbours.
const PROXIMITY_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSummary {
    pub reference: String,
    pub value: String,
    pub lib_id: String,
    pub kind: String,
    pub position: Point,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetSummary {
    pub name: String,
    pub node_count: usize,
    pub is_unnamed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<NetExtent>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetExtent {
    pub x_range: (i64, i64),
    pub y_range: (i64, i64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSummary {
    pub text: String,
    pub kind: String,
    pub connected: bool,
    pub position: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSummary {
    pub start: Point,
    pub end: Point,
    pub segment_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectivityIssues {
    pub unattached_labels: Vec<UnattachedLabel>,
    pub unnamed_net_count: usize,
    pub single_node_nets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnattachedLabel {
    pub label: String,
    pub position: Point,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_components: usize,
    pub total_nets: usize,
    pub total_labels: usize,
    pub total_wires: usize,
    pub total_junctions: usize,
    pub component_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchematicSummary {
    pub components: Vec<ComponentSummary>,
    pub nets: Vec<NetSummary>,
    pub labels: Vec<LabelSummary>,
    pub wires: Vec<WireSummary>,
    pub junctions: Vec<Point>,
    pub proximity_map: BTreeMap<String, Vec<String>>,
    pub connectivity_issues: ConnectivityIssues,
    pub statistics: SummaryStatistics,
}

impl SchematicSummary {
    pub fn build(doc: &SchematicDocument, nets: &NetBuildResult) -> Self {
        let components: Vec<ComponentSummary> = doc
            .annotated_symbols()
            .map(|sym| ComponentSummary {
                reference: sym.reference.clone(),
                value: sym.value.clone(),
                lib_id: sym.lib_id.clone(),
                kind: classify_component(&sym.reference, &sym.lib_id).to_string(),
                position: sym.position,
            })
            .collect();

        let net_summaries: Vec<NetSummary> = nets
            .nets
            .iter()
            .map(|net| NetSummary {
                name: net.name.clone(),
                node_count: net.nodes.len(),
                is_unnamed: net.is_synthetic_name,
                extent: net_extent(net.nodes.iter()),
            })
            .collect();

        let labels: Vec<LabelSummary> = doc
            .labels
            .iter()
            .map(|label| {
                let net_name = nets.label_attached.get(&label.position).cloned();
                LabelSummary {
                    text: label.text.clone(),
                    kind: format!("{:?}", label.kind).to_lowercase(),
                    connected: net_name.is_some(),
                    position: label.position,
                    net_name,
                }
            })
            .collect();

        let wires: Vec<WireSummary> = doc
            .wires
            .iter()
            .filter(|w| w.points.len() >= 2)
            .map(|w| WireSummary {
                start: w.points[0],
                end: w.points[w.points.len() - 1],
                segment_count: w.points.len() - 1,
            })
            .collect();

        let junctions: Vec<Point> = doc.junctions.iter().map(|j| j.position).collect();

        let connectivity_issues = ConnectivityIssues {
            unattached_labels: nets
                .label_unattached
                .iter()
                .map(|(text, pos)| UnattachedLabel {
                    label: text.clone(),
                    position: *pos,
                })
                .collect(),
            unnamed_net_count: nets.unnamed_net_count(),
            single_node_nets: nets
                .single_node_nets()
                .iter()
                .map(|n| n.name.clone())
                .collect(),
        };

        let mut component_breakdown = BTreeMap::new();
        for comp in &components {
            *component_breakdown.entry(comp.kind.clone()).or_insert(0) += 1;
        }
        let statistics = SummaryStatistics {
            total_components: components.len(),
            total_nets: net_summaries.len(),
            total_labels: labels.len(),
            total_wires: wires.len(),
            total_junctions: junctions.len(),
            component_breakdown,
        };

        let proximity_map = build_proximity_map(&components);

        SchematicSummary {
            components,
            nets: net_summaries,
            labels,
            wires,
            junctions,
            proximity_map,
            connectivity_issues,
            statistics,
        }
    }
}

fn net_extent<'a>(nodes: impl Iterator<Item = &'a Point>) -> Option<NetExtent> {
    let mut extent: Option<NetExtent> = None;
    for node in nodes {
        let e = extent.get_or_insert(NetExtent {
            x_range: (node.x, node.x),
            y_range: (node.y, node.y),
        });
        e.x_range.0 = e.x_range.0.min(node.x);
        e.x_range.1 = e.x_range.1.max(node.x);
        e.y_range.0 = e.y_range.0.min(node.y);
        e.y_range.1 = e.y_range.1.max(node.y);
    }
    extent
}

fn classify_component(reference: &str, lib_id: &str) -> &'static str {
    let r = reference.to_uppercase();
    let lib = lib_id.to_lowercase();
    if r.starts_with('U') {
        if ["555", "timer"].iter().any(|k| lib.contains(k)) {
            "timer_ic"
        } else if ["stm32", "esp32", "atmega", "pic", "mcu"]
            .iter()
            .any(|k| lib.contains(k))
        {
            "microcontroller"
        } else if ["regulator", "ldo"].iter().any(|k| lib.contains(k)) {
            "voltage_regulator"
        } else if ["opamp", "amplifier"].iter().any(|k| lib.contains(k)) {
            "opamp"
        } else {
            "ic"
        }
    } else if r.starts_with("SW") {
        "switch"
    } else if r.starts_with("LED") {
        "led"
    } else if r.starts_with("TP") {
        "test_point"
    } else if r.starts_with('R') {
        "resistor"
    } else if r.starts_with('C') {
        "capacitor"
    } else if r.starts_with('L') {
        "inductor"
    } else if r.starts_with('D') {
        "diode"
    } else if r.starts_with('Q') {
        "transistor"
    } else if r.starts_with('Y') || r.starts_with('X') {
        "crystal_oscillator"
    } else if r.starts_with('J') {
        "connector"
    } else {
        "unknown"
    }
}

fn build_proximity_map(components: &[ComponentSummary]) -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    for comp in components {
        let mut nearby: Vec<String> = components
            .iter()
            .filter(|other| other.reference != comp.reference)
            .filter(|other| comp.position.euclidean(&other.position) < PROXIMITY_THRESHOLD)
            .map(|other| other.reference.clone())
            .collect();
        if !nearby.is_empty() {
            nearby.sort();
            map.insert(comp.reference.clone(), nearby);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::build_nets;
    use crate::schema::{Label, LabelKind, Symbol, Wire};
    use std::collections::HashMap;

    fn sym_at(reference: &str, lib_id: &str, x: i64, y: i64) -> Symbol {
        Symbol {
            reference: reference.into(),
            value: String::new(),
            lib_id: lib_id.into(),
            position: Point::new(x, y),
            pins: vec![],
            properties: HashMap::new(),
        }
    }

    fn fixture() -> SchematicDocument {
        SchematicDocument {
            symbols: vec![
                sym_at("U1", "MCU_ST:STM32F103", 0, 0),
                sym_at("C1", "Device:C", 20, 0),
                sym_at("R1", "Device:R", 500, 500),
                sym_at("R?", "Device:R", 600, 600),
            ],
            wires: vec![Wire {
                points: vec![Point::new(0, 0), Point::new(100, 0)],
            }],
            labels: vec![
                Label {
                    text: "VDD".into(),
                    kind: LabelKind::Global,
                    position: Point::new(0, 0),
                },
                Label {
                    text: "FLOAT".into(),
                    kind: LabelKind::Local,
                    position: Point::new(900, 900),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn inventory_skips_unannotated_and_classifies_kinds() {
        let doc = fixture();
        let nets = build_nets(&doc, 2);
        let summary = SchematicSummary::build(&doc, &nets);
        assert_eq!(summary.components.len(), 3);
        assert_eq!(summary.components[0].kind, "microcontroller");
        assert_eq!(summary.statistics.component_breakdown["capacitor"], 1);
    }

    #[test]
    fn labels_report_attachment_and_net_name() {
        let doc = fixture();
        let nets = build_nets(&doc, 2);
        let summary = SchematicSummary::build(&doc, &nets);
        let vdd = summary.labels.iter().find(|l| l.text == "VDD").unwrap();
        assert!(vdd.connected);
        assert_eq!(vdd.net_name.as_deref(), Some("VDD"));
        let float = summary.labels.iter().find(|l| l.text == "FLOAT").unwrap();
        assert!(!float.connected);
        assert_eq!(
            summary.connectivity_issues.unattached_labels.len(),
            1
        );
    }

    #[test]
    fn proximity_map_pairs_close_components_only() {
        let doc = fixture();
        let nets = build_nets(&doc, 2);
        let summary = SchematicSummary::build(&doc, &nets);
        assert_eq!(summary.proximity_map["U1"], vec!["C1".to_string()]);
        assert!(!summary.proximity_map.contains_key("R1"));
    }

    #[test]
    fn net_extent_covers_all_nodes() {
        let doc = fixture();
        let nets = build_nets(&doc, 2);
        let summary = SchematicSummary::build(&doc, &nets);
        let net = summary.nets.iter().find(|n| n.name == "VDD").unwrap();
        let extent = net.extent.unwrap();
        assert_eq!(extent.x_range, (0, 100));
        assert_eq!(extent.y_range, (0, 0));
    }
}

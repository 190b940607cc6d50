//! Connectivity-graph construction.
//!
//! Wires become an undirected graph over grid points; connected components
//! become [`Net`]s. Labels attach to nearby graph nodes and drive net
//! naming, with a pin-name inference fallback for unlabeled components.

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{Point, SchematicDocument};

/// Maximum Chebyshev distance between an unlabeled component's node and a
/// pin's absolute position for pin-name inference. One grid unit of slack
/// absorbs off-grid pin coordinates.
const PIN_TO_NODE_TOLERANCE: i64 = 2;

/// Pin-name fragments significant enough to name a net after.
const SIGNIFICANT_PIN_SIGNALS: &[&str] = &[
    "SDA", "SCL", "RST", "NRST", "BOOT", "SWD", "CLK", "RX", "TX",
];

/// A single electrical net: every wire point reachable from any other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    pub name: String,
    pub nodes: BTreeSet<Point>,
    /// True when no label or pin name applied and a `NET_UNNAMED_{n}` name
    /// was generated.
    pub is_synthetic_name: bool,
}

impl Net {
    pub fn contains(&self, point: &Point) -> bool {
        self.nodes.contains(point)
    }

    pub fn is_single_node(&self) -> bool {
        self.nodes.len() == 1
    }
}

/// Output of [`build_nets`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetBuildResult {
    /// Nets in deterministic order (by smallest contained point).
    pub nets: Vec<Net>,
    /// Label position -> name of the net the label landed on.
    pub label_attached: BTreeMap<Point, String>,
    /// Labels that found no wire node within tolerance: (text, position).
    pub label_unattached: Vec<(String, Point)>,
    /// Human-readable notes about degenerate input (e.g. one-point wires).
    pub diagnostics: Vec<String>,
}

impl NetBuildResult {
    pub fn net_named(&self, name: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.name == name)
    }

    pub fn net_containing(&self, point: &Point) -> Option<&Net> {
        self.nets.iter().find(|n| n.contains(point))
    }

    pub fn unnamed_net_count(&self) -> usize {
        self.nets.iter().filter(|n| n.is_synthetic_name).count()
    }

    pub fn single_node_nets(&self) -> Vec<&Net> {
        self.nets.iter().filter(|n| n.is_single_node()).collect()
    }
}

/// Build electrical nets from the document's wires and labels.
///
/// `label_tolerance` is the maximum Chebyshev distance (both axis deltas at
/// most the tolerance) at which a label still attaches to a wire node; a
/// label exactly at the tolerance boundary attaches. Labels that attach
/// nowhere are reported in `label_unattached` rather than dropped.
///
/// Net naming, per connected component:
/// 1. the shortest (then lexicographically smallest) attached label text,
///    where per node Global labels outrank Hierarchical outrank Local and
///    equal-precedence conflicts keep the first label seen;
/// 2. else a name inferred from component pins sitting on the net, with
///    signal-bearing pin names ([`SIGNIFICANT_PIN_SIGNALS`]) preferred;
/// 3. else a synthetic `NET_UNNAMED_{n}` name, skipping any value that
///    collides with an existing label text.
pub fn build_nets(doc: &SchematicDocument, label_tolerance: i64) -> NetBuildResult {
    let mut result = NetBuildResult::default();

    let mut graph: UnGraph<Point, ()> = UnGraph::new_undirected();
    let mut node_ids: BTreeMap<Point, NodeIndex> = BTreeMap::new();

    for (i, wire) in doc.wires.iter().enumerate() {
        if wire.points.len() < 2 {
            let note = format!(
                "wire {} has {} point(s) and carries no connectivity; skipped",
                i,
                wire.points.len()
            );
            tracing::warn!(wire = i, points = wire.points.len(), "degenerate wire skipped");
            result.diagnostics.push(note);
            continue;
        }
        for pair in wire.points.windows(2) {
            let a = *node_ids
                .entry(pair[0])
                .or_insert_with(|| graph.add_node(pair[0]));
            let b = *node_ids
                .entry(pair[1])
                .or_insert_with(|| graph.add_node(pair[1]));
            graph.update_edge(a, b, ());
        }
    }

    // Label attachment. Per node the winning name follows label-kind
    // precedence; among equals the first attached label stays.
    let mut node_names: BTreeMap<Point, (String, u8)> = BTreeMap::new();
    let mut attached_to_node: Vec<(Point, Point)> = Vec::new(); // (label pos, node)
    let mut label_texts: BTreeSet<String> = BTreeSet::new();

    for label in &doc.labels {
        label_texts.insert(label.text.clone());
        match nearest_node(&label.position, &node_ids, label_tolerance) {
            Some(node) => {
                let rank = label.kind.precedence();
                match node_names.get(&node) {
                    Some((_, existing)) if *existing >= rank => {}
                    _ => {
                        node_names.insert(node, (label.text.clone(), rank));
                    }
                }
                attached_to_node.push((label.position, node));
            }
            None => {
                result
                    .label_unattached
                    .push((label.text.clone(), label.position));
                tracing::debug!(label = %label.text, "label attached to no wire node");
            }
        }
    }

    // Flood fill over the sorted node set.
    let mut visited: BTreeSet<Point> = BTreeSet::new();
    let mut point_to_net: BTreeMap<Point, usize> = BTreeMap::new();
    let mut unnamed_count = 0usize;

    for (&start, &start_idx) in &node_ids {
        if visited.contains(&start) {
            continue;
        }
        let mut comp: BTreeSet<Point> = BTreeSet::new();
        let mut names: BTreeSet<String> = BTreeSet::new();
        let mut stack = vec![start_idx];
        while let Some(idx) = stack.pop() {
            let p = graph[idx];
            if !visited.insert(p) {
                continue;
            }
            comp.insert(p);
            if let Some((name, _)) = node_names.get(&p) {
                names.insert(name.clone());
            }
            for nb in graph.neighbors(idx) {
                if !visited.contains(&graph[nb]) {
                    stack.push(nb);
                }
            }
        }

        let (name, synthetic) = if let Some(best) = names
            .iter()
            .min_by_key(|n| (n.len(), n.as_str()))
        {
            (best.clone(), false)
        } else if let Some(inferred) = infer_name_from_pins(doc, &comp) {
            (inferred, false)
        } else {
            loop {
                unnamed_count += 1;
                let candidate = format!("NET_UNNAMED_{unnamed_count}");
                if !label_texts.contains(&candidate) {
                    break (candidate, true);
                }
            }
        };

        let net_index = result.nets.len();
        for p in &comp {
            point_to_net.insert(*p, net_index);
        }
        result.nets.push(Net {
            name,
            nodes: comp,
            is_synthetic_name: synthetic,
        });
    }

    // Resolve attached labels to the final net names.
    for (label_pos, node) in attached_to_node {
        if let Some(net_index) = point_to_net.get(&node) {
            result
                .label_attached
                .insert(label_pos, result.nets[*net_index].name.clone());
        }
    }

    tracing::info!(
        nets = result.nets.len(),
        unattached_labels = result.label_unattached.len(),
        unnamed = result.unnamed_net_count(),
        "net build complete"
    );
    result
}

/// Find the graph node closest to `point` within Chebyshev `tol`.
/// Ties break toward the smaller distance, then the smaller point.
fn nearest_node(
    point: &Point,
    nodes: &BTreeMap<Point, NodeIndex>,
    tol: i64,
) -> Option<Point> {
    let mut best: Option<(i64, Point)> = None;
    for candidate in nodes.keys() {
        let d = point.chebyshev(candidate);
        if d > tol {
            continue;
        }
        match best {
            Some((bd, _)) if bd <= d => {}
            _ => best = Some((d, *candidate)),
        }
    }
    best.map(|(_, p)| p)
}

/// Name an unlabeled component from pins that land on its nodes.
fn infer_name_from_pins(doc: &SchematicDocument, comp: &BTreeSet<Point>) -> Option<String> {
    let mut pin_names: Vec<String> = Vec::new();
    for sym in doc.annotated_symbols() {
        for pin in &sym.pins {
            if pin.name.is_empty() {
                continue;
            }
            let abs = sym.pin_position(pin);
            let on_net = comp.contains(&abs)
                || comp
                    .iter()
                    .any(|p| p.chebyshev(&abs) <= PIN_TO_NODE_TOLERANCE);
            if on_net {
                pin_names.push(pin.name.clone());
            }
        }
    }

    let mut significant: Vec<&String> = pin_names
        .iter()
        .filter(|n| {
            let upper = n.to_uppercase();
            SIGNIFICANT_PIN_SIGNALS.iter().any(|s| upper.contains(s))
        })
        .collect();
    if !significant.is_empty() {
        significant.sort();
        return Some(significant[0].clone());
    }
    pin_names.first().map(|n| format!("Net-{n}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Label, LabelKind, Pin, PinKind, Symbol, Wire};
    use std::collections::HashMap;

    fn wire(points: &[(i64, i64)]) -> Wire {
        Wire {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    fn label(text: &str, kind: LabelKind, x: i64, y: i64) -> Label {
        Label {
            text: text.into(),
            kind,
            position: Point::new(x, y),
        }
    }

    #[test]
    fn connected_wires_merge_into_one_net() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)]), wire(&[(10, 0), (10, 10)])],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert_eq!(result.nets.len(), 1);
        assert_eq!(result.nets[0].nodes.len(), 3);
    }

    #[test]
    fn disjoint_wires_stay_separate() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)]), wire(&[(100, 100), (110, 100)])],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert_eq!(result.nets.len(), 2);
        // Each node appears in exactly one net.
        let total: usize = result.nets.iter().map(|n| n.nodes.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn label_names_its_net() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![label("VCC", LabelKind::Global, 0, 0)],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert_eq!(result.nets[0].name, "VCC");
        assert!(!result.nets[0].is_synthetic_name);
        assert_eq!(result.label_attached.get(&Point::new(0, 0)).unwrap(), "VCC");
    }

    #[test]
    fn global_label_outranks_local_on_same_node() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![
                label("local_name", LabelKind::Local, 0, 0),
                label("G", LabelKind::Global, 0, 0),
            ],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert_eq!(result.nets[0].name, "G");
    }

    #[test]
    fn equal_precedence_keeps_first_label() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![
                label("AA", LabelKind::Global, 0, 0),
                label("BB", LabelKind::Global, 0, 0),
            ],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert_eq!(result.nets[0].name, "AA");
    }

    #[test]
    fn shortest_then_lexicographic_among_attached_labels() {
        // Two labels on different nodes of the same net.
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![
                label("LONGNAME", LabelKind::Global, 0, 0),
                label("ZZ", LabelKind::Global, 10, 0),
            ],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert_eq!(result.nets[0].name, "ZZ");
    }

    #[test]
    fn label_attaches_exactly_at_tolerance_boundary() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![label("SIG", LabelKind::Local, 2, 2)],
            ..Default::default()
        };
        let result = build_nets(&doc, 2);
        assert!(result.label_unattached.is_empty());
        assert_eq!(result.nets[0].name, "SIG");
    }

    #[test]
    fn label_beyond_tolerance_is_reported_unattached() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![label("SIG", LabelKind::Local, 3, 0)],
            ..Default::default()
        };
        let result = build_nets(&doc, 2);
        assert_eq!(
            result.label_unattached,
            vec![("SIG".to_string(), Point::new(3, 0))]
        );
        assert!(result.nets[0].is_synthetic_name);
    }

    #[test]
    fn degenerate_wire_is_skipped_with_diagnostic() {
        let doc = SchematicDocument {
            wires: vec![wire(&[(5, 5)]), wire(&[(0, 0), (10, 0)])],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert_eq!(result.nets.len(), 1);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].contains("wire 0"));
    }

    #[test]
    fn single_node_net_is_preserved() {
        // A zero-length segment still registers its point as a net.
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (0, 0)])],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert_eq!(result.nets.len(), 1);
        assert!(result.nets[0].is_single_node());
    }

    #[test]
    fn synthetic_names_skip_colliding_label_text() {
        // An unattached label already owns "NET_UNNAMED_1"; the generator
        // must not reuse it.
        let doc = SchematicDocument {
            wires: vec![wire(&[(0, 0), (10, 0)])],
            labels: vec![label("NET_UNNAMED_1", LabelKind::Local, 500, 500)],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert_eq!(result.nets[0].name, "NET_UNNAMED_2");
    }

    #[test]
    fn pin_name_inference_prefers_significant_signals() {
        let sym = Symbol {
            reference: "U1".into(),
            value: "MCU".into(),
            lib_id: "MCU:Generic".into(),
            position: Point::new(0, 0),
            pins: vec![
                Pin {
                    number: "1".into(),
                    name: "GPIO7".into(),
                    kind: PinKind::Bidirectional,
                    position: Point::new(0, 0),
                },
                Pin {
                    number: "2".into(),
                    name: "SDA".into(),
                    kind: PinKind::Bidirectional,
                    position: Point::new(10, 0),
                },
            ],
            properties: HashMap::new(),
        };
        let doc = SchematicDocument {
            symbols: vec![sym],
            wires: vec![wire(&[(0, 0), (10, 0)])],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert_eq!(result.nets[0].name, "SDA");
    }

    #[test]
    fn unannotated_symbols_do_not_name_nets() {
        let sym = Symbol {
            reference: "U?".into(),
            value: "MCU".into(),
            lib_id: "MCU:Generic".into(),
            position: Point::new(0, 0),
            pins: vec![Pin {
                number: "1".into(),
                name: "SDA".into(),
                kind: PinKind::Bidirectional,
                position: Point::new(0, 0),
            }],
            properties: HashMap::new(),
        };
        let doc = SchematicDocument {
            symbols: vec![sym],
            wires: vec![wire(&[(0, 0), (10, 0)])],
            ..Default::default()
        };
        let result = build_nets(&doc, 0);
        assert!(result.nets[0].is_synthetic_name);
    }

    #[test]
    fn build_is_deterministic() {
        let doc = SchematicDocument {
            wires: vec![
                wire(&[(20, 20), (30, 20)]),
                wire(&[(0, 0), (10, 0)]),
                wire(&[(50, 50), (60, 50)]),
            ],
            ..Default::default()
        };
        let a = build_nets(&doc, 0);
        let b = build_nets(&doc, 0);
        let names_a: Vec<_> = a.nets.iter().map(|n| n.name.clone()).collect();
        let names_b: Vec<_> = b.nets.iter().map(|n| n.name.clone()).collect();
        assert_eq!(names_a, names_b);
        // Ordered by smallest contained point.
        assert!(a.nets[0].contains(&Point::new(0, 0)));
        assert!(a.nets[1].contains(&Point::new(20, 20)));
    }
}

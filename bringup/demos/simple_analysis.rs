//! Analyze a small MCU schematic and print the report.
//!
//! Run with: cargo run --example simple_analysis

use std::collections::HashMap;

use bringup::prelude::*;
use bringup::schema::{Label, LabelKind, Point, Symbol, Wire};

fn main() {
    let doc = SchematicDocument {
        symbols: vec![
            Symbol {
                reference: "U1".into(),
                value: "STM32F103".into(),
                lib_id: "MCU_ST:STM32F103C8Tx".into(),
                position: Point::new(0, 0),
                pins: vec![],
                properties: HashMap::new(),
            },
            Symbol {
                reference: "C1".into(),
                value: "100nF".into(),
                lib_id: "Device:C".into(),
                position: Point::new(20, 0),
                pins: vec![],
                properties: HashMap::new(),
            },
        ],
        wires: vec![
            Wire {
                points: vec![Point::new(0, 0), Point::new(100, 0)],
            },
            Wire {
                points: vec![Point::new(0, 50), Point::new(50, 50), Point::new(100, 50)],
            },
        ],
        labels: vec![
            Label {
                text: "VDD".into(),
                kind: LabelKind::Global,
                position: Point::new(0, 0),
            },
            Label {
                text: "GND".into(),
                kind: LabelKind::Global,
                position: Point::new(0, 50),
            },
        ],
        ..Default::default()
    };

    let report = BringupCore::analyze(&doc, &AnalyzeOptions::default()).expect("analysis failed");

    println!("Circuit type: {}", report.circuit_type);
    println!("Detected power nets: {:?}", report.detected.power_nets);

    println!("\nFindings:");
    for finding in &report.findings {
        println!("  [{:?}] {}", finding.severity, finding.summary);
    }

    println!("\nChecks:");
    for result in &report.analysis_results {
        println!("  {:?}: {} - {}", result.status, result.check, result.summary);
    }

    println!("\nBench checklist:");
    for step in &report.checklist {
        println!("  {}. {}", step.sequence, step.title);
    }

    let risk = &report.overall_risk;
    println!(
        "\nRisk: {}/100 ({:?}), blockers: {}",
        risk.score, risk.level, risk.blocker_count
    );
}

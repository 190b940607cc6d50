use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;

use bringup::prelude::*;
use bringup::schema::{Label, LabelKind, Point, Symbol, Wire};
use bringup::{build_nets, classify};

/// Synthetic board: one MCU plus a grid of passives and labelled rails.
fn synthetic_board(rows: i64) -> SchematicDocument {
    let mut symbols = vec![Symbol {
        reference: "U1".into(),
        value: "STM32F103".into(),
        lib_id: "MCU_ST:STM32F103C8Tx".into(),
        position: Point::new(0, 0),
        pins: vec![],
        properties: HashMap::new(),
    }];
    let mut wires = Vec::new();
    let mut labels = Vec::new();

    for row in 0..rows {
        let y = row * 100;
        wires.push(Wire {
            points: vec![Point::new(0, y), Point::new(500, y), Point::new(1000, y)],
        });
        symbols.push(Symbol {
            reference: format!("R{}", row + 1),
            value: "10k".into(),
            lib_id: "Device:R".into(),
            position: Point::new(200, y),
            pins: vec![],
            properties: HashMap::new(),
        });
        symbols.push(Symbol {
            reference: format!("C{}", row + 1),
            value: "100nF".into(),
            lib_id: "Device:C".into(),
            position: Point::new(20, y),
            pins: vec![],
            properties: HashMap::new(),
        });
        let (text, kind) = match row % 3 {
            0 => ("VDD".to_string(), LabelKind::Global),
            1 => ("GND".to_string(), LabelKind::Global),
            _ => (format!("SIG_{row}"), LabelKind::Local),
        };
        labels.push(Label {
            text,
            kind,
            position: Point::new(0, y),
        });
    }

    SchematicDocument {
        symbols,
        wires,
        labels,
        ..Default::default()
    }
}

fn bench_build_nets(c: &mut Criterion) {
    let doc = synthetic_board(100);
    c.bench_function("build_nets_100_rows", |b| {
        b.iter(|| build_nets(black_box(&doc), black_box(2)));
    });
}

fn bench_classify(c: &mut Criterion) {
    let doc = synthetic_board(100);
    let nets = build_nets(&doc, 2);
    c.bench_function("classify_100_rows", |b| {
        b.iter(|| classify(black_box(&doc), black_box(&nets)));
    });
}

fn bench_full_analysis(c: &mut Criterion) {
    let doc = synthetic_board(50);
    let options = AnalyzeOptions::default();
    c.bench_function("analyze_50_rows", |b| {
        b.iter(|| BringupCore::analyze(black_box(&doc), black_box(&options)));
    });
}

criterion_group!(
    benches,
    bench_build_nets,
    bench_classify,
    bench_full_analysis
);
criterion_main!(benches);

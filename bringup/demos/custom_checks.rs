//! Register a custom analysis check and run it through the pipeline.
//!
//! Run with: cargo run --example custom_checks

use std::collections::HashMap;
use std::sync::Arc;

use bringup::analysis::{
    AnalysisCheck, AnalysisRegistry, AnalysisResult, CheckContext,
};
use bringup::planner::{AnalysisPlan, PlanStep, Priority};
use bringup::schema::{Point, SchematicDocument, Symbol, Wire};
use bringup::topology::CircuitTopology;
use bringup::{build_nets, classify};
use serde_json::{json, Value};

/// Flags boards that carry more than a given number of connectors.
struct ConnectorBudget;

impl AnalysisCheck for ConnectorBudget {
    fn name(&self) -> &str {
        "connector_budget"
    }

    fn description(&self) -> &str {
        "Warn when the connector count exceeds a budget"
    }

    fn run(&self, ctx: &CheckContext<'_>, params: &Value) -> anyhow::Result<AnalysisResult> {
        let budget = params
            .get("max_connectors")
            .and_then(Value::as_u64)
            .unwrap_or(4) as usize;
        let count = ctx
            .doc
            .annotated_symbols()
            .filter(|s| s.reference.to_uppercase().starts_with('J'))
            .count();

        let mut result = AnalysisResult::pass(
            self.name(),
            format!("{count} connectors (budget {budget})"),
        );
        if count > budget {
            result = result
                .with_issue(format!("{count} connectors exceed the budget of {budget}"))
                .with_recommendation("combine headers or move signals to a single connector");
        }
        Ok(result)
    }
}

fn main() {
    let doc = SchematicDocument {
        symbols: (1..=6)
            .map(|i| Symbol {
                reference: format!("J{i}"),
                value: "Conn_01x04".into(),
                lib_id: "Connector:Conn_01x04".into(),
                position: Point::new(i * 100, 0),
                pins: vec![],
                properties: HashMap::new(),
            })
            .collect(),
        wires: vec![Wire {
            points: vec![Point::new(0, 0), Point::new(600, 0)],
        }],
        ..Default::default()
    };

    let nets = build_nets(&doc, 2);
    let detected = classify(&doc, &nets);
    let topology = CircuitTopology::build(&doc, 50.0);
    let ctx = CheckContext {
        doc: &doc,
        nets: &nets,
        detected: &detected,
        topology: &topology,
    };

    let mut registry = AnalysisRegistry::with_default_checks();
    registry.register(Arc::new(ConnectorBudget));

    let plan = AnalysisPlan {
        circuit_type: "connector_panel".into(),
        confidence: 1.0,
        main_component: None,
        steps: vec![PlanStep {
            check: "connector_budget".into(),
            params: json!({"max_connectors": 4}),
            priority: Priority::Medium,
            rationale: "hand-built plan for the demo".into(),
        }],
    };

    for result in registry.run_pipeline(&plan, &ctx) {
        println!("{:?}: {}", result.status, result.summary);
        for issue in &result.issues {
            println!("  issue: {issue}");
        }
        for rec in &result.recommendations {
            println!("  recommendation: {rec}");
        }
    }
}

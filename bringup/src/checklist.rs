//! Ordered bring-up checklist generation.
//!
//! Steps follow the bench workflow: power first, then reset, clock,
//! programming access, and finally functional spot checks.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::detect::Detected;
use crate::schema::SchematicDocument;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepCategory {
    Power,
    Reset,
    Clock,
    Programming,
    Functional,
}

/// Per-step risk grade, distinct from finding severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepRisk {
    Low,
    Medium,
    High,
}

/// Probe setup for a step that a bench instrument could run unattended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementSpec {
    pub kind: String, // voltage, resistance, frequency, waveform
    pub probes: serde_json::Value,
    pub expected_range: Option<(f64, f64)>,
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistStep {
    pub id: String,
    pub sequence: u32,
    pub category: StepCategory,
    pub title: String,
    pub instruction: String,
    pub expected: String,
    pub component: Option<String>,
    #[serde(default)]
    pub pins: Vec<String>,
    #[serde(default)]
    pub nets: Vec<String>,
    #[serde(default)]
    pub likely_faults: Vec<String>,
    #[serde(default)]
    pub fix_suggestions: Vec<String>,
    pub risk: StepRisk,
    pub prevents_bringup: bool,
    pub measurement: Option<MeasurementSpec>,
}

impl ChecklistStep {
    fn new(id: &str, sequence: u32, category: StepCategory, title: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            sequence,
            category,
            title: title.into(),
            instruction: String::new(),
            expected: String::new(),
            component: None,
            pins: Vec::new(),
            nets: Vec::new(),
            likely_faults: Vec::new(),
            fix_suggestions: Vec::new(),
            risk: StepRisk::Medium,
            prevents_bringup: false,
            measurement: None,
        }
    }
}

/// Build the bench checklist. A 555 timer gets its own pin-by-pin
/// sequence; everything else goes through the indicator-driven generator.
pub fn generate_checklist(doc: &SchematicDocument, detected: &Detected) -> Vec<ChecklistStep> {
    let timer = doc.annotated_symbols().find(|s| {
        s.lib_id.to_lowercase().contains("555") || s.value.to_lowercase().contains("555")
    });
    let steps = match timer {
        Some(ic) => timer_555_checklist(&ic.reference),
        None => indicator_checklist(detected),
    };
    tracing::debug!(steps = steps.len(), "checklist generated");
    steps
}

/// Fixed bring-up sequence for a 555 timer circuit.
fn timer_555_checklist(ic_ref: &str) -> Vec<ChecklistStep> {
    let mut steps = Vec::new();

    let mut step = ChecklistStep::new(
        "555-power-vdd",
        1,
        StepCategory::Power,
        "Verify VDD rail (pin 8)",
    );
    step.instruction = format!("Measure {ic_ref} pin 8 (VDD) relative to GND");
    step.expected = "4.5V to 16V DC (2V to 18V for a TLC555)".into();
    step.component = Some(ic_ref.to_string());
    step.pins = vec!["8".into()];
    step.nets = vec!["VDD".into(), "VCC".into()];
    step.likely_faults = vec![
        "no power source connected".into(),
        "reverse polarity on the supply".into(),
        "short circuit to ground".into(),
    ];
    step.fix_suggestions = vec![
        "check supply connector polarity".into(),
        format!("verify continuity from the source to {ic_ref} pin 8"),
    ];
    step.risk = StepRisk::High;
    step.prevents_bringup = true;
    step.measurement = Some(MeasurementSpec {
        kind: "voltage".into(),
        probes: json!({"positive": {"component": ic_ref, "pin": "8"}, "negative": {"net": "GND"}}),
        expected_range: Some((4.5, 16.0)),
        tolerance: 0.05,
    });
    steps.push(step);

    let mut step = ChecklistStep::new(
        "555-ground",
        2,
        StepCategory::Power,
        "Verify ground connection (pin 1)",
    );
    step.instruction = format!("Measure resistance between {ic_ref} pin 1 and the ground reference");
    step.expected = "under 1 ohm".into();
    step.component = Some(ic_ref.to_string());
    step.pins = vec!["1".into()];
    step.nets = vec!["GND".into()];
    step.likely_faults = vec![
        "cold solder joint".into(),
        "broken ground trace".into(),
    ];
    step.fix_suggestions = vec![format!("reflow solder on {ic_ref} pin 1 and recheck continuity")];
    step.risk = StepRisk::High;
    step.prevents_bringup = true;
    step.measurement = Some(MeasurementSpec {
        kind: "resistance".into(),
        probes: json!({"probe1": {"component": ic_ref, "pin": "1"}, "probe2": {"net": "GND"}}),
        expected_range: Some((0.0, 1.0)),
        tolerance: 0.05,
    });
    steps.push(step);

    let mut step = ChecklistStep::new(
        "555-reset-high",
        3,
        StepCategory::Reset,
        "Verify RESET pin is high (pin 4)",
    );
    step.instruction = format!("Measure {ic_ref} pin 4; it should sit at VDD or above 0.7*VDD");
    step.expected = "same voltage as VDD (or >70% of VDD)".into();
    step.component = Some(ic_ref.to_string());
    step.pins = vec!["4".into()];
    step.likely_faults = vec![
        "reset pin floating, unstable operation".into(),
        "reset tied to GND, IC disabled".into(),
    ];
    step.fix_suggestions = vec![
        "connect pin 4 directly to VDD if unused".into(),
        "add a 10k pull-up resistor if a reset button is used".into(),
    ];
    step.risk = StepRisk::High;
    step.prevents_bringup = true;
    step.measurement = Some(MeasurementSpec {
        kind: "voltage".into(),
        probes: json!({"positive": {"component": ic_ref, "pin": "4"}, "negative": {"net": "GND"}}),
        expected_range: Some((3.15, 16.0)),
        tolerance: 0.05,
    });
    steps.push(step);

    let mut step = ChecklistStep::new(
        "555-timing-network",
        4,
        StepCategory::Functional,
        "Verify RC timing components",
    );
    step.instruction =
        "Measure the timing resistor and capacitor values and check connections to pins 6, 7 and 2"
            .into();
    step.expected = "components match design values within tolerance".into();
    step.component = Some(ic_ref.to_string());
    step.pins = vec!["6".into(), "7".into(), "2".into()];
    step.likely_faults = vec![
        "wrong resistor values".into(),
        "capacitor polarity reversed".into(),
        "poor solder joint on the timing components".into(),
    ];
    step.fix_suggestions = vec![
        "verify resistor values out of circuit with a multimeter".into(),
        "ensure pin 2 connects to the timing capacitor".into(),
    ];
    steps.push(step);

    let mut step = ChecklistStep::new(
        "555-output-waveform",
        5,
        StepCategory::Functional,
        "Verify output waveform (pin 3)",
    );
    step.instruction = format!("Connect an oscilloscope to {ic_ref} pin 3 and check for a square wave");
    step.expected = "clean square wave swinging between ~0V and VDD".into();
    step.component = Some(ic_ref.to_string());
    step.pins = vec!["3".into()];
    step.likely_faults = vec![
        "no oscillation (timing components)".into(),
        "stuck high or low (IC damaged or power issue)".into(),
        "wrong frequency (incorrect R/C values)".into(),
    ];
    step.fix_suggestions = vec![
        "verify the timing network first".into(),
        "measure the trigger voltage at pin 2, it should toggle".into(),
    ];
    step.measurement = Some(MeasurementSpec {
        kind: "waveform".into(),
        probes: json!({"channel1": {"component": ic_ref, "pin": "3"}, "reference": {"net": "GND"}}),
        expected_range: None,
        tolerance: 0.05,
    });
    steps.push(step);

    let mut step = ChecklistStep::new(
        "555-ctrl-bypass",
        6,
        StepCategory::Functional,
        "Check control voltage bypass (pin 5)",
    );
    step.instruction = "Verify a 0.01uF capacitor from pin 5 to GND for noise filtering".into();
    step.expected = "capacitor present and properly connected".into();
    step.component = Some(ic_ref.to_string());
    step.pins = vec!["5".into()];
    step.likely_faults = vec!["missing bypass cap, noise susceptibility".into()];
    step.fix_suggestions = vec!["add a 0.01uF ceramic cap close to pin 5 if missing".into()];
    step.risk = StepRisk::Low;
    steps.push(step);

    steps
}

/// Indicator-driven checklist for circuits without a dedicated sequence.
fn indicator_checklist(detected: &Detected) -> Vec<ChecklistStep> {
    let mut steps: Vec<ChecklistStep> = Vec::new();
    let mut seq = 0u32;

    // Power rails first; nothing else matters until they read right.
    for rail in detected
        .power_nets
        .iter()
        .filter(|n| !is_ground_name(n))
    {
        seq += 1;
        let mut step = ChecklistStep::new(
            &format!("power-rail-{}", rail.to_lowercase()),
            seq,
            StepCategory::Power,
            format!("Verify {rail} rail voltage"),
        );
        step.instruction = format!("Measure {rail} relative to ground with no load attached");
        step.expected = format!("{rail} within its nominal range, stable (no sag or oscillation)");
        step.nets = vec![rail.clone()];
        step.likely_faults = vec![
            "no power source connected".into(),
            "reverse polarity on the supply".into(),
            "short circuit to ground".into(),
        ];
        step.fix_suggestions = vec![
            "check supply connector polarity".into(),
            format!("verify continuity from the source to the {rail} net"),
        ];
        step.risk = StepRisk::High;
        step.prevents_bringup = true;
        step.measurement = Some(MeasurementSpec {
            kind: "voltage".into(),
            probes: json!({"positive": {"net": rail}, "negative": {"net": "GND"}}),
            expected_range: None,
            tolerance: 0.05,
        });
        steps.push(step);
    }

    if detected.power_nets.iter().any(|n| is_ground_name(n)) {
        seq += 1;
        let mut step = ChecklistStep::new(
            "ground-continuity",
            seq,
            StepCategory::Power,
            "Verify ground continuity",
        );
        step.instruction =
            "Measure resistance between component ground pins and the supply ground".into();
        step.expected = "under 1 ohm everywhere".into();
        step.nets = vec!["GND".into()];
        step.likely_faults = vec![
            "cold solder joint".into(),
            "broken ground trace".into(),
        ];
        step.fix_suggestions = vec!["reflow suspect joints and recheck continuity".into()];
        step.risk = StepRisk::High;
        step.prevents_bringup = true;
        step.measurement = Some(MeasurementSpec {
            kind: "resistance".into(),
            probes: json!({"probe1": {"net": "GND"}, "probe2": {"net": "supply ground"}}),
            expected_range: Some((0.0, 1.0)),
            tolerance: 0.05,
        });
        steps.push(step);
    }

    for reset_net in &detected.reset_nets {
        seq += 1;
        let mut step = ChecklistStep::new(
            &format!("reset-{}", reset_net.to_lowercase()),
            seq,
            StepCategory::Reset,
            format!("Verify {reset_net} is released"),
        );
        step.instruction = format!("Measure {reset_net} after power-up");
        step.expected = "held high (near VDD) once the supply is stable".into();
        step.nets = vec![reset_net.clone()];
        step.likely_faults = vec![
            "reset pin floating".into(),
            "reset stuck low, device held in reset".into(),
        ];
        step.fix_suggestions = vec![format!("verify the pull-up resistor on {reset_net}")];
        step.risk = StepRisk::High;
        step.prevents_bringup = true;
        steps.push(step);
    }

    for source in &detected.clock_sources {
        seq += 1;
        let mut step = ChecklistStep::new(
            &format!("clock-{}", source.to_lowercase()),
            seq,
            StepCategory::Clock,
            format!("Verify oscillation at {source}"),
        );
        step.instruction = format!("Probe {source} with a scope (10x, low capacitance)");
        step.expected = "clean oscillation at the marked frequency".into();
        step.component = Some(source.clone());
        step.likely_faults = vec![
            "wrong or missing load capacitors".into(),
            "crystal not starting up".into(),
        ];
        step.fix_suggestions =
            vec!["check load capacitor values against the MCU datasheet".into()];
        step.risk = StepRisk::Medium;
        steps.push(step);
    }

    for iface in &detected.debug_interfaces {
        seq += 1;
        let mut step = ChecklistStep::new(
            &format!("programming-{}", iface.to_lowercase()),
            seq,
            StepCategory::Programming,
            format!("Connect over {iface}"),
        );
        step.instruction = format!("Attach the {iface} probe and attempt to identify the target");
        step.expected = "target responds with its device ID".into();
        step.likely_faults = vec![
            "swapped interface signals".into(),
            "target not powered during connect".into(),
        ];
        step.fix_suggestions = vec![format!("verify the {iface} pinout against the connector")];
        step.risk = StepRisk::Medium;
        steps.push(step);
    }

    if let Some(mcu) = detected.mcu_symbols.first() {
        seq += 1;
        let mut step = ChecklistStep::new(
            "functional-first-firmware",
            seq,
            StepCategory::Functional,
            "Run first firmware",
        );
        step.instruction = format!("Flash a minimal LED-blink firmware to {mcu} and observe");
        step.expected = "firmware runs, confirming power, clock, reset and programming all work".into();
        step.component = Some(mcu.clone());
        step.risk = StepRisk::Low;
        steps.push(step);
    }

    steps
}

fn is_ground_name(name: &str) -> bool {
    matches!(name.to_uppercase().as_str(), "GND" | "AGND" | "DGND" | "VSS")
}

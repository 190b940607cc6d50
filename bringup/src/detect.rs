//! Heuristic circuit-indicator detection.
//!
//! Scans net names and symbols for the signals a bring-up plan cares
//! about: power rails, reset and clock nets, microcontrollers, clock
//! sources, and debug interfaces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::netlist::NetBuildResult;
use crate::schema::SchematicDocument;

/// Exact power-rail names (after uppercasing).
const POWER_EXACT: &[&str] = &[
    "GND", "AGND", "DGND", "VSS", "VBAT", "VIN", "VCC", "PWR", "POWER", "AVDD", "DVDD",
];

/// Power-rail name prefixes (VDD, VDDA, VDD_3V3, VREF, VREFP, ...).
const POWER_PREFIXES: &[&str] = &["VDD", "VREF"];

const RESET_PATTERNS: &[&str] = &["NRST", "RESET", "RST"];

const CLOCK_NET_PATTERNS: &[&str] = &["HSE", "LSE", "XTAL", "OSC", "CLK", "MCO"];

/// Value / lib_id fragments identifying a clock source.
const CLOCK_SOURCE_PATTERNS: &[&str] = &["CRYSTAL", "XTAL", "OSCILLATOR"];

/// MCU family hints looked for in reference, value, lib_id and properties.
const MCU_HINTS: &[&str] = &[
    "stm32", "esp32", "nrf", "atmega", "attiny", "rp2040", "pic", "msp430", "samd", "imx",
    "kinetis", "gd32",
];

const SWD_PINS: &[&str] = &["SWDIO", "SWCLK", "SWO"];
const JTAG_PINS: &[&str] = &["TMS", "TCK", "TDI", "TDO", "TRST"];
const UART_PINS: &[&str] = &["TX", "RX", "UART"];

/// Everything the heuristics recognized in a schematic. All lists are
/// sorted and deduplicated; `notes` records each category that came up
/// empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detected {
    pub power_nets: Vec<String>,
    pub reset_nets: Vec<String>,
    pub clock_nets: Vec<String>,
    pub mcu_symbols: Vec<String>,
    pub clock_sources: Vec<String>,
    pub debug_interfaces: Vec<String>,
    pub notes: Vec<String>,
}

impl Detected {
    pub fn has_mcu(&self) -> bool {
        !self.mcu_symbols.is_empty()
    }

    pub fn has_clock_source(&self) -> bool {
        !self.clock_sources.is_empty()
    }
}

/// Does `name` look like a power or ground rail?
///
/// Matches the whole name: the exact rail vocabulary, VDD*/VREF* prefixes,
/// and numeric-voltage names (`+5V`, `3.3V`, `3V3`). Substrings do not
/// count, so `GND_SENSE_OUT` is not a power net.
pub fn is_power_net_name(name: &str) -> bool {
    let upper = name.trim().to_uppercase();
    if POWER_EXACT.contains(&upper.as_str()) {
        return true;
    }
    if POWER_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        return true;
    }
    is_voltage_name(&upper)
}

/// `+5V`, `-12V`, `3.3V`, `3V3`, `1V8`.
fn is_voltage_name(upper: &str) -> bool {
    let body = upper.strip_prefix(['+', '-']).unwrap_or(upper);
    if body.is_empty() {
        return false;
    }
    // digits[.digits]V
    if let Some(num) = body.strip_suffix('V') {
        if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return true;
        }
    }
    // digitsVdigits (3V3 style)
    if let Some(v_pos) = body.find('V') {
        let (left, right) = (&body[..v_pos], &body[v_pos + 1..]);
        if !left.is_empty()
            && !right.is_empty()
            && left.chars().all(|c| c.is_ascii_digit())
            && right.chars().all(|c| c.is_ascii_digit())
        {
            return true;
        }
    }
    false
}

pub fn is_reset_net_name(name: &str) -> bool {
    let upper = name.to_uppercase();
    RESET_PATTERNS.iter().any(|p| upper.contains(p))
}

pub fn is_clock_net_name(name: &str) -> bool {
    let upper = name.to_uppercase();
    CLOCK_NET_PATTERNS.iter().any(|p| upper.contains(p))
}

/// Substring match at word boundaries: `TX` matches `UART_TX` and `TX0`
/// is rejected only when the neighbor is alphabetic (`RTX` no, `TX3` yes).
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let at = start + pos;
        let before_ok = at == 0
            || !haystack[..at]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_alphabetic());
        let after = at + needle.len();
        let after_ok = after == haystack.len()
            || !haystack[after..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic());
        if before_ok && after_ok {
            return true;
        }
        start = at + 1;
    }
    false
}

/// Run all indicator heuristics over the document and its nets.
///
/// Unannotated symbols (`?` in the reference) are ignored throughout.
pub fn classify(doc: &SchematicDocument, nets: &NetBuildResult) -> Detected {
    let mut power: BTreeSet<String> = BTreeSet::new();
    let mut reset: BTreeSet<String> = BTreeSet::new();
    let mut clock: BTreeSet<String> = BTreeSet::new();

    // Label texts count even when the label never attached: a floating
    // "VCC" label is still evidence the design has a VCC rail.
    let names = nets
        .nets
        .iter()
        .map(|n| n.name.clone())
        .chain(doc.labels.iter().map(|l| l.text.clone()));
    for name in names {
        if is_power_net_name(&name) {
            power.insert(name.clone());
        }
        if is_reset_net_name(&name) {
            reset.insert(name.clone());
        }
        if is_clock_net_name(&name) {
            clock.insert(name);
        }
    }

    let mut mcus: BTreeSet<String> = BTreeSet::new();
    let mut sources: BTreeSet<String> = BTreeSet::new();
    for sym in doc.annotated_symbols() {
        let blob = format!(
            "{} {} {} {}",
            sym.reference,
            sym.value,
            sym.lib_id,
            sym.properties
                .values()
                .cloned()
                .collect::<Vec<_>>()
                .join(" ")
        )
        .to_lowercase();

        if sym.reference.to_uppercase().starts_with('U')
            && MCU_HINTS.iter().any(|h| blob.contains(h))
        {
            mcus.insert(sym.reference.clone());
        }

        let ref_upper = sym.reference.to_uppercase();
        let looks_like_crystal = ref_upper.starts_with('Y') || ref_upper.starts_with('X');
        let text = format!("{} {}", sym.value, sym.lib_id).to_uppercase();
        if looks_like_crystal || CLOCK_SOURCE_PATTERNS.iter().any(|p| text.contains(p)) {
            sources.insert(sym.reference.clone());
        }
    }

    let debug_interfaces = detect_debug_interface(doc, nets);

    let mut detected = Detected {
        power_nets: power.into_iter().collect(),
        reset_nets: reset.into_iter().collect(),
        clock_nets: clock.into_iter().collect(),
        mcu_symbols: mcus.into_iter().collect(),
        clock_sources: sources.into_iter().collect(),
        debug_interfaces,
        notes: Vec::new(),
    };

    let empties: &[(&str, bool)] = &[
        ("power nets", detected.power_nets.is_empty()),
        ("reset nets", detected.reset_nets.is_empty()),
        ("clock nets", detected.clock_nets.is_empty()),
        ("MCU symbols", detected.mcu_symbols.is_empty()),
        ("clock sources", detected.clock_sources.is_empty()),
        ("debug interfaces", detected.debug_interfaces.is_empty()),
    ];
    for (what, empty) in empties {
        if *empty {
            detected.notes.push(format!("no {what} detected"));
        }
    }

    tracing::debug!(
        power = detected.power_nets.len(),
        mcus = detected.mcu_symbols.len(),
        "indicator detection complete"
    );
    detected
}

/// At most one debug interface family is reported, checked in priority
/// order SWD, then JTAG, then UART.
fn detect_debug_interface(doc: &SchematicDocument, nets: &NetBuildResult) -> Vec<String> {
    let mut texts: Vec<String> = nets.nets.iter().map(|n| n.name.to_uppercase()).collect();
    texts.extend(doc.labels.iter().map(|l| l.text.to_uppercase()));
    for sym in doc.annotated_symbols() {
        texts.extend(sym.pins.iter().map(|p| p.name.to_uppercase()));
    }

    let families: &[(&str, &[&str])] = &[("SWD", SWD_PINS), ("JTAG", JTAG_PINS), ("UART", UART_PINS)];
    for (family, pins) in families {
        let hit = texts
            .iter()
            .any(|t| pins.iter().any(|p| contains_word(t, p)));
        if hit {
            return vec![family.to_string()];
        }
    }
    Vec::new()
}

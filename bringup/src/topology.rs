//! Spatial and component-value helpers.
//!
//! Proximity is schematic-sheet proximity, not board proximity: placing a
//! decoupling cap next to an IC on the sheet is a drawing convention the
//! heuristics lean on. Absolute pin positions are `symbol.position +
//! pin.position`; symbol rotation is not applied, a known limitation
//! shared with the floating-pin check.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::{Point, SchematicDocument, Symbol};

/// Default sheet radius within which a capacitor counts as decoupling.
pub const DECOUPLING_RADIUS: f64 = 50.0;

/// Symbols whose anchor lies within Euclidean `radius` of `position`.
pub fn symbols_near<'a>(
    doc: &'a SchematicDocument,
    position: &Point,
    radius: f64,
) -> Vec<&'a Symbol> {
    doc.annotated_symbols()
        .filter(|s| s.position.euclidean(position) <= radius)
        .collect()
}

pub fn capacitors_near<'a>(
    doc: &'a SchematicDocument,
    position: &Point,
    radius: f64,
) -> Vec<&'a Symbol> {
    symbols_near(doc, position, radius)
        .into_iter()
        .filter(|s| s.reference.to_uppercase().starts_with('C'))
        .collect()
}

pub fn resistors_near<'a>(
    doc: &'a SchematicDocument,
    position: &Point,
    radius: f64,
) -> Vec<&'a Symbol> {
    symbols_near(doc, position, radius)
        .into_iter()
        .filter(|s| s.reference.to_uppercase().starts_with('R'))
        .collect()
}

/// Parse a resistor value string ("10k", "4.7K", "1M", "470", "220R")
/// into ohms.
pub fn parse_resistance(value: &str) -> Option<f64> {
    let (num, unit) = split_value(value)?;
    let mult = match unit.as_str() {
        "" | "r" | "ohm" | "ω" => 1.0,
        "k" | "kohm" | "kω" => 1e3,
        "m" | "meg" | "mohm" | "mω" => 1e6,
        _ => return None,
    };
    Some(num * mult)
}

/// Parse a capacitor value string ("100nF", "1uF", "22p", "0.1u") into
/// farads.
pub fn parse_capacitance(value: &str) -> Option<f64> {
    let (num, unit) = split_value(value)?;
    let mult = match unit.as_str() {
        "f" => 1.0,
        "mf" => 1e-3,
        "uf" | "u" | "µf" | "µ" => 1e-6,
        "nf" | "n" => 1e-9,
        "pf" | "p" => 1e-12,
        _ => return None,
    };
    Some(num * mult)
}

/// Split "4.7uF" into (4.7, "uf"). Lowercases the unit.
fn split_value(value: &str) -> Option<(f64, String)> {
    let value = value.trim().to_lowercase();
    let mut num_str = String::new();
    let mut unit = String::new();
    let mut found_digit = false;
    for ch in value.chars() {
        if ch.is_ascii_digit() || ch == '.' || (ch == '-' && !found_digit) {
            num_str.push(ch);
            found_digit = true;
        } else if found_digit {
            unit.push(ch);
        }
    }
    if num_str.is_empty() {
        return None;
    }
    let num = num_str.parse::<f64>().ok()?;
    Some((num, unit))
}

/// Per-IC decoupling picture across the sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitTopology {
    /// IC reference -> references of capacitors within [`DECOUPLING_RADIUS`].
    pub decoupling: BTreeMap<String, Vec<String>>,
    /// ICs with no capacitor nearby.
    pub missing_decoupling: Vec<String>,
}

impl CircuitTopology {
    pub fn build(doc: &SchematicDocument, radius: f64) -> Self {
        let mut topology = CircuitTopology::default();
        for ic in doc
            .annotated_symbols()
            .filter(|s| s.reference.to_uppercase().starts_with('U'))
        {
            let caps: Vec<String> = capacitors_near(doc, &ic.position, radius)
                .iter()
                .map(|c| c.reference.clone())
                .collect();
            if caps.is_empty() {
                topology.missing_decoupling.push(ic.reference.clone());
            } else {
                topology.decoupling.insert(ic.reference.clone(), caps);
            }
        }
        topology.missing_decoupling.sort();
        topology
    }
}

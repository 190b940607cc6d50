//! Schematic document model.
//!
//! Documents arrive already parsed (typically as JSON); this module only
//! defines the shapes the rest of the pipeline consumes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A point on the schematic grid.
///
/// Coordinates are integer grid units. `Ord` is derived so points can key
/// ordered maps and all iteration over geometry stays deterministic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: max of the per-axis deltas.
    pub fn chebyshev(&self, other: &Point) -> i64 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Euclidean distance.
    pub fn euclidean(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

/// Electrical role of a pin, as declared by the symbol library.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PinKind {
    Input,
    Output,
    Bidirectional,
    PowerIn,
    PowerOut,
    Passive,
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pin {
    pub number: String,
    pub name: String,
    #[serde(default)]
    pub kind: PinKind,
    /// Position relative to the owning symbol's anchor.
    pub position: Point,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub reference: String, // R1, C3, U1
    pub value: String,     // 10k, 100nF, STM32F103
    pub lib_id: String,    // Device:R
    pub position: Point,
    #[serde(default)]
    pub pins: Vec<Pin>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl Symbol {
    /// A `?` in the reference means the symbol was never annotated.
    /// Such symbols are excluded from all electrical reasoning.
    pub fn is_annotated(&self) -> bool {
        !self.reference.contains('?')
    }

    /// Absolute position of a pin. Symbol rotation is not applied; see the
    /// note on [`crate::topology`].
    pub fn pin_position(&self, pin: &Pin) -> Point {
        self.position.offset(&pin.position)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Local,
    Global,
    Hierarchical,
}

impl LabelKind {
    /// Naming precedence: Global > Hierarchical > Local.
    pub fn precedence(&self) -> u8 {
        match self {
            LabelKind::Global => 2,
            LabelKind::Hierarchical => 1,
            LabelKind::Local => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    pub kind: LabelKind,
    pub position: Point,
}

/// A wire polyline. Fewer than two points carries no connectivity and is
/// reported as a diagnostic by the net builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wire {
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Junction {
    pub position: Point,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchematicDocument {
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub wires: Vec<Wire>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub junctions: Vec<Junction>,
}

impl SchematicDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbols with a complete reference designator.
    pub fn annotated_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.is_annotated())
    }

    pub fn symbol(&self, reference: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.reference == reference)
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.wires.is_empty() && self.labels.is_empty()
    }
}

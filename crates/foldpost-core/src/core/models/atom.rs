use crate::core::utils::identifiers::{is_backbone_atom, is_heavy_atom};
use nalgebra::Point3;
use std::str::FromStr;

/// Represents the role of an atom within its residue.
///
/// Movement masks grant backbone and side-chain freedom separately, so every atom
/// is classified once, from its name, when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomRole {
    /// Main-chain atom (N, CA, C, O and their hydrogens).
    Backbone,
    /// Side-chain atom.
    Sidechain,
    /// Anything that belongs to a non-polymer record.
    #[default]
    Other,
}

/// A single atom as read from a structure file.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The serial number from the source file.
    pub serial: usize,
    /// The atom name (e.g. "CA", "OG1").
    pub name: String,
    /// The element symbol, possibly empty if the source file omitted it.
    pub element: String,
    /// Backbone/side-chain classification.
    pub role: AtomRole,
    /// Cartesian position in Angstroms.
    pub position: Point3<f64>,
    pub occupancy: f64,
    /// Temperature-factor slot. Prediction pipelines store the per-residue
    /// confidence here.
    pub b_factor: f64,
}

impl Atom {
    /// Creates a polymer atom, classifying its role from the name.
    pub fn new(serial: usize, name: &str, position: Point3<f64>) -> Self {
        let role = if is_backbone_atom(name) {
            AtomRole::Backbone
        } else {
            AtomRole::Sidechain
        };
        Self {
            serial,
            name: name.trim().to_string(),
            element: String::new(),
            role,
            position,
            occupancy: 1.0,
            b_factor: 0.0,
        }
    }

    pub fn with_element(mut self, element: &str) -> Self {
        self.element = element.trim().to_string();
        self
    }

    pub fn with_b_factor(mut self, b_factor: f64) -> Self {
        self.b_factor = b_factor;
        self
    }

    /// Whether the atom is anything but a hydrogen (or deuterium).
    pub fn is_heavy(&self) -> bool {
        if self.element.is_empty() {
            is_heavy_atom(&self.name)
        } else {
            !matches!(self.element.to_ascii_uppercase().as_str(), "H" | "D")
        }
    }

    /// The element symbol, inferred from the atom name when the file left it blank.
    pub fn element_symbol(&self) -> String {
        if !self.element.is_empty() {
            return self.element.to_ascii_uppercase();
        }
        self.name
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase().to_string())
            .unwrap_or_default()
    }
}

impl FromStr for AtomRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "backbone" => Ok(AtomRole::Backbone),
            "sidechain" => Ok(AtomRole::Sidechain),
            "other" => Ok(AtomRole::Other),
            _ => Err(()),
        }
    }
}

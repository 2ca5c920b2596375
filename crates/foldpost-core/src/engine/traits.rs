use super::config::ConfigError;
use super::error::EngineError;
use crate::core::models::structure::Structure;
use crate::core::movemap::MoveMap;
use crate::core::scoring::scorefunction::ScoreFunction;
use std::fmt;
use std::str::FromStr;

/// Two groups of chains whose interface is analysed, written `LEFT_RIGHT`
/// (e.g. `A_B`, or `AB_C` for a dimer against a third chain).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    left: Vec<char>,
    right: Vec<char>,
}

impl InterfaceDescriptor {
    pub fn new(left: Vec<char>, right: Vec<char>) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &[char] {
        &self.left
    }

    pub fn right(&self) -> &[char] {
        &self.right
    }

    /// Which side a chain identifier belongs to; `None` for chains in neither.
    pub fn side_of(&self, chain_id: char) -> Option<InterfaceSide> {
        if self.left.contains(&chain_id) {
            Some(InterfaceSide::Left)
        } else if self.right.contains(&chain_id) {
            Some(InterfaceSide::Right)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceSide {
    Left,
    Right,
}

impl FromStr for InterfaceDescriptor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidDescriptor(s.to_string());
        let (left, right) = s.split_once('_').ok_or_else(invalid)?;
        let parse_side = |side: &str| {
            let chains: Vec<char> = side.chars().collect();
            if chains.is_empty() || !chains.iter().all(char::is_ascii_alphanumeric) {
                Err(invalid())
            } else {
                Ok(chains)
            }
        };
        let left = parse_side(left)?;
        let right = parse_side(right)?;
        if left.iter().any(|c| right.contains(c)) {
            return Err(invalid());
        }
        Ok(Self { left, right })
    }
}

impl fmt::Display for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let left: String = self.left.iter().collect();
        let right: String = self.right.iter().collect();
        write!(f, "{left}_{right}")
    }
}

/// The six interface quantities recorded per rank.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InterfaceEnergetics {
    /// Score of the bound complex.
    pub complex_energy: f64,
    /// Bound minus rigidly separated score.
    pub separated_interface_energy: f64,
    /// Solvent accessible surface area of the bound complex.
    pub complexed_sasa: f64,
    /// Pairwise energy between the two sides in the bound complex.
    pub crossterm_interface_energy: f64,
    /// Binding energy estimate: bound minus separated, restraints excluded.
    pub interface_dg: f64,
    /// Surface area buried by binding.
    pub interface_delta_sasa: f64,
}

impl InterfaceEnergetics {
    /// Catalog column names paired with their values, in recording order.
    pub fn columns(&self) -> [(&'static str, f64); 6] {
        [
            ("complex_energy", self.complex_energy),
            ("separated_interface_energy", self.separated_interface_energy),
            ("complexed_sasa", self.complexed_sasa),
            ("crossterm_interface_energy", self.crossterm_interface_energy),
            ("interface_dg", self.interface_dg),
            ("interface_delta_sasa", self.interface_delta_sasa),
        ]
    }
}

/// The physics collaborator: refinement, scoring, mutation and interface analysis.
///
/// Every call receives the weights it must use; implementations keep no
/// scoring state between calls, so one engine may serve any number of ranks in
/// sequence.
pub trait Engine {
    /// Refines `structure` in place for `cycles` rounds, moving only what `movemap` allows.
    fn refine(
        &self,
        structure: &mut Structure,
        movemap: &MoveMap,
        scorefxn: &ScoreFunction,
        cycles: usize,
    ) -> Result<(), EngineError>;

    fn score(&self, structure: &Structure, scorefxn: &ScoreFunction) -> Result<f64, EngineError>;

    /// Applies a named chemical patch to the residue at `index`.
    ///
    /// Callers must only request patches compatible with the residue.
    fn mutate_residue(
        &self,
        structure: &mut Structure,
        index: usize,
        patch: &str,
    ) -> Result<(), EngineError>;

    fn interface_energetics(
        &self,
        structure: &Structure,
        interface: &InterfaceDescriptor,
        scorefxn: &ScoreFunction,
    ) -> Result<InterfaceEnergetics, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_parses_both_sides() {
        let d: InterfaceDescriptor = "AB_C".parse().unwrap();
        assert_eq!(d.left(), &['A', 'B']);
        assert_eq!(d.right(), &['C']);
        assert_eq!(d.side_of('B'), Some(InterfaceSide::Left));
        assert_eq!(d.side_of('C'), Some(InterfaceSide::Right));
        assert_eq!(d.side_of('D'), None);
        assert_eq!(d.to_string(), "AB_C");
    }

    #[test]
    fn descriptor_rejects_malformed_text() {
        for bad in ["AB", "_B", "A_", "A_B_C", "A_A", "A-B_C"] {
            assert!(bad.parse::<InterfaceDescriptor>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn energetics_columns_are_named_in_order() {
        let names: Vec<&str> = InterfaceEnergetics::default()
            .columns()
            .iter()
            .map(|(n, _)| *n)
            .collect();
        assert_eq!(
            names,
            vec![
                "complex_energy",
                "separated_interface_energy",
                "complexed_sasa",
                "crossterm_interface_energy",
                "interface_dg",
                "interface_delta_sasa"
            ]
        );
    }
}

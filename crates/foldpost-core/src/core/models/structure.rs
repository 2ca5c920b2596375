use super::atom::Atom;
use super::chain::Chain;
use super::residue::Residue;
use crate::core::scoring::constraints::ConstraintSet;
use nalgebra::Vector3;

/// A multi-chain structure addressable by 1-based internal residue index.
///
/// Residues are stored in file order and chains are contiguous runs over them, so
/// the position-to-chain mapping is a range lookup. Distance-error constraints are
/// attached to the structure and travel with it when it is cloned into another
/// pose group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    chains: Vec<Chain>,
    residues: Vec<Residue>,
    constraints: ConstraintSet,
}

impl Structure {
    /// Creates a new, empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of residues across all chains.
    pub fn total_residue(&self) -> usize {
        self.residues.len()
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Retrieves a chain by its 1-based chain number.
    pub fn chain(&self, number: usize) -> Option<&Chain> {
        number.checked_sub(1).and_then(|i| self.chains.get(i))
    }

    /// 1-based number of the chain holding the residue at `index`.
    pub fn chain_of(&self, index: usize) -> Option<usize> {
        self.residue(index).map(|r| r.chain + 1)
    }

    /// Chain identifier of the residue at `index`.
    pub fn chain_id_of(&self, index: usize) -> Option<char> {
        self.residue(index).map(|r| self.chains[r.chain].id)
    }

    /// Internal index of the last residue of a chain.
    pub fn chain_end(&self, number: usize) -> Option<usize> {
        self.chain(number).map(Chain::end)
    }

    /// Internal index of the first residue of a chain.
    pub fn chain_begin(&self, number: usize) -> Option<usize> {
        self.chain(number).map(Chain::begin)
    }

    /// Retrieves a residue by its 1-based internal index.
    pub fn residue(&self, index: usize) -> Option<&Residue> {
        index.checked_sub(1).and_then(|i| self.residues.get(i))
    }

    pub fn residue_mut(&mut self, index: usize) -> Option<&mut Residue> {
        index.checked_sub(1).and_then(|i| self.residues.get_mut(i))
    }

    /// Iterates residues together with their 1-based internal index.
    pub fn residues(&self) -> impl Iterator<Item = (usize, &Residue)> {
        self.residues.iter().enumerate().map(|(i, r)| (i + 1, r))
    }

    pub fn residues_mut(&mut self) -> impl Iterator<Item = (usize, &mut Residue)> {
        self.residues.iter_mut().enumerate().map(|(i, r)| (i + 1, r))
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.residues.iter().flat_map(|r| r.atoms.iter())
    }

    /// Maps source numbering on a chain to the internal index.
    ///
    /// Returns `None` when no residue on that chain carries the number.
    pub fn pdb_to_internal(&self, number: isize, chain_id: char) -> Option<usize> {
        self.residues()
            .find(|(_, r)| r.number == number && self.chains[r.chain].id == chain_id)
            .map(|(index, _)| index)
    }

    /// Per-residue confidence (B-factor slot of the alpha carbon).
    pub fn confidence(&self, index: usize) -> Option<f64> {
        self.residue(index).and_then(Residue::confidence)
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut ConstraintSet {
        &mut self.constraints
    }

    /// Rigidly shifts every atom of a chain.
    pub fn translate_chain(&mut self, number: usize, shift: &Vector3<f64>) {
        let Some(range) = self.chain(number).map(|c| c.residues.clone()) else {
            return;
        };
        for residue in &mut self.residues[range] {
            for atom in &mut residue.atoms {
                atom.position += shift;
            }
        }
    }

    /// One-letter sequence of a chain; non-standard residues become `X`.
    pub fn sequence(&self, number: usize) -> String {
        self.chain(number)
            .map(|c| {
                self.residues[c.residues.clone()]
                    .iter()
                    .map(|r| crate::core::utils::identifiers::one_letter_code(&r.name).unwrap_or('X'))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Incrementally assembles a [`Structure`] from file-ordered records.
#[derive(Debug, Default)]
pub struct StructureBuilder {
    structure: Structure,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new chain; subsequent residues belong to it.
    pub fn start_chain(&mut self, id: char) {
        let start = self.structure.residues.len();
        self.structure.chains.push(Chain::new(id, start));
    }

    /// Opens a new residue on the current chain, opening a chain first if none exists.
    pub fn start_residue(&mut self, name: &str, number: isize, insertion_code: Option<char>) {
        if self.structure.chains.is_empty() {
            self.start_chain('A');
        }
        let chain_index = self.structure.chains.len() - 1;
        let mut residue = Residue::new(name, number, chain_index);
        residue.insertion_code = insertion_code;
        self.structure.residues.push(residue);
        self.structure.chains[chain_index].residues.end = self.structure.residues.len();
    }

    /// Adds an atom to the current residue. Returns `false` if no residue is open.
    pub fn add_atom(&mut self, atom: Atom) -> bool {
        match self.structure.residues.last_mut() {
            Some(residue) => {
                residue.add_atom(atom);
                true
            }
            None => false,
        }
    }

    /// Records a patch on the current residue.
    pub fn add_patch(&mut self, patch: &str) {
        if let Some(residue) = self.structure.residues.last_mut() {
            residue.patches.push(patch.to_string());
        }
    }

    pub fn build(mut self) -> Structure {
        let mut remap = Vec::with_capacity(self.structure.chains.len());
        let mut kept = 0;
        for chain in &self.structure.chains {
            remap.push(kept);
            if !chain.is_empty() {
                kept += 1;
            }
        }
        for residue in &mut self.structure.residues {
            residue.chain = remap[residue.chain];
        }
        self.structure.chains.retain(|c| !c.is_empty());
        self.structure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::two_chain_structure;
    use nalgebra::Point3;

    #[test]
    fn builder_creates_contiguous_chains() {
        let structure = two_chain_structure(3, 2);
        assert_eq!(structure.total_residue(), 5);
        assert_eq!(structure.num_chains(), 2);
        assert_eq!(structure.chain_begin(1), Some(1));
        assert_eq!(structure.chain_end(1), Some(3));
        assert_eq!(structure.chain_begin(2), Some(4));
        assert_eq!(structure.chain_end(2), Some(5));
    }

    #[test]
    fn chain_of_maps_position_to_chain_number() {
        let structure = two_chain_structure(3, 2);
        assert_eq!(structure.chain_of(1), Some(1));
        assert_eq!(structure.chain_of(4), Some(2));
        assert_eq!(structure.chain_of(0), None);
        assert_eq!(structure.chain_of(6), None);
        assert_eq!(structure.chain_id_of(5), Some('B'));
    }

    #[test]
    fn pdb_to_internal_respects_chain() {
        let structure = two_chain_structure(3, 2);
        // Chain B numbering restarts at 1 in the fixture.
        assert_eq!(structure.pdb_to_internal(1, 'A'), Some(1));
        assert_eq!(structure.pdb_to_internal(1, 'B'), Some(4));
        assert_eq!(structure.pdb_to_internal(9, 'A'), None);
        assert_eq!(structure.pdb_to_internal(1, 'C'), None);
    }

    #[test]
    fn translate_chain_moves_only_that_chain() {
        let mut structure = two_chain_structure(2, 2);
        let before_a = structure.residue(1).unwrap().atoms()[0].position;
        let before_b = structure.residue(3).unwrap().atoms()[0].position;
        structure.translate_chain(2, &Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(structure.residue(1).unwrap().atoms()[0].position, before_a);
        assert_eq!(
            structure.residue(3).unwrap().atoms()[0].position,
            before_b + Vector3::new(10.0, 0.0, 0.0)
        );
    }

    #[test]
    fn builder_drops_empty_chains_and_orphan_atoms() {
        let mut builder = StructureBuilder::new();
        assert!(!builder.add_atom(Atom::new(1, "CA", Point3::origin())));
        builder.start_chain('A');
        builder.start_chain('B');
        builder.start_residue("ALA", 1, None);
        assert!(builder.add_atom(Atom::new(1, "CA", Point3::origin())));
        let structure = builder.build();
        assert_eq!(structure.num_chains(), 1);
        assert_eq!(structure.chain_id_of(1), Some('B'));
    }

    #[test]
    fn sequence_uses_one_letter_codes() {
        let structure = two_chain_structure(3, 2);
        assert_eq!(structure.sequence(1).len(), 3);
        assert_eq!(structure.sequence(3), "");
    }
}

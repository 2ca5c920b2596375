use super::atom::Atom;

const ALPHA_CARBON: &str = "CA";
const BETA_CARBON: &str = "CB";

/// A residue of a [`Structure`](super::structure::Structure).
///
/// `number` and `insertion_code` are the source (file) numbering. The internal,
/// 1-based position of the residue is its place in the structure's residue vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub name: String,
    pub number: isize,
    pub insertion_code: Option<char>,
    /// 0-based index of the owning chain.
    pub chain: usize,
    pub(crate) atoms: Vec<Atom>,
    /// Chemical patches applied on top of the base residue type, in order.
    pub patches: Vec<String>,
}

impl Residue {
    pub fn new(name: &str, number: isize, chain: usize) -> Self {
        Self {
            name: name.trim().to_uppercase(),
            number,
            insertion_code: None,
            chain,
            atoms: Vec::new(),
            patches: Vec::new(),
        }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn add_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.name == name)
    }

    pub fn heavy_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(|a| a.is_heavy())
    }

    /// The residue's representative atom for neighbourhood queries: CB, or CA for
    /// glycine and truncated residues, or the first atom as a last resort.
    pub fn neighbour_atom(&self) -> Option<&Atom> {
        self.atom(BETA_CARBON)
            .or_else(|| self.atom(ALPHA_CARBON))
            .or_else(|| self.atoms.first())
    }

    /// The per-residue confidence stored in the B-factor slot of the alpha carbon.
    pub fn confidence(&self) -> Option<f64> {
        self.atom(ALPHA_CARBON)
            .or_else(|| self.atoms.first())
            .map(|a| a.b_factor)
    }

    pub fn has_patch(&self, patch: &str) -> bool {
        self.patches.iter().any(|p| p == patch)
    }

    /// Full variant name, e.g. `SER:phosphorylated`.
    pub fn variant_name(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.patches.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(":")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn serine() -> Residue {
        let mut residue = Residue::new("ser", 45, 0);
        residue.add_atom(Atom::new(1, "N", Point3::new(0.0, 0.0, 0.0)));
        residue.add_atom(Atom::new(2, "CA", Point3::new(1.5, 0.0, 0.0)).with_b_factor(87.5));
        residue.add_atom(Atom::new(3, "CB", Point3::new(2.0, 1.4, 0.0)));
        residue.add_atom(Atom::new(4, "OG", Point3::new(3.4, 1.4, 0.0)));
        residue.add_atom(Atom::new(5, "HG", Point3::new(3.8, 2.2, 0.0)).with_element("H"));
        residue
    }

    #[test]
    fn new_residue_normalizes_name() {
        let residue = Residue::new(" gly ", 1, 0);
        assert_eq!(residue.name, "GLY");
        assert!(residue.atoms().is_empty());
    }

    #[test]
    fn confidence_reads_alpha_carbon_b_factor() {
        assert_eq!(serine().confidence(), Some(87.5));
        assert_eq!(Residue::new("ALA", 1, 0).confidence(), None);
    }

    #[test]
    fn neighbour_atom_prefers_beta_carbon() {
        let residue = serine();
        assert_eq!(residue.neighbour_atom().map(|a| a.name.as_str()), Some("CB"));

        let mut glycine = Residue::new("GLY", 2, 0);
        glycine.add_atom(Atom::new(1, "CA", Point3::origin()));
        assert_eq!(glycine.neighbour_atom().map(|a| a.name.as_str()), Some("CA"));
    }

    #[test]
    fn heavy_atoms_skips_hydrogens() {
        assert_eq!(serine().heavy_atoms().count(), 4);
    }

    #[test]
    fn variant_name_appends_patches() {
        let mut residue = serine();
        assert_eq!(residue.variant_name(), "SER");
        residue.patches.push("phosphorylated".to_string());
        assert_eq!(residue.variant_name(), "SER:phosphorylated");
        assert!(residue.has_patch("phosphorylated"));
    }
}

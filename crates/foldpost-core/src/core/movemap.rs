use crate::core::models::atom::AtomRole;
use crate::core::models::structure::Structure;
use crate::core::selection::ResidueSet;

/// Degrees of freedom a refinement pass may move.
///
/// Flags are kept per residue (1-based internal index) for backbone and side-chain
/// atoms; the jump flag allows rigid-body motion between chains.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveMap {
    backbone: Vec<bool>,
    sidechain: Vec<bool>,
    jump: bool,
}

impl MoveMap {
    /// A fully frozen map over `size` residues.
    pub fn new(size: usize) -> Self {
        Self {
            backbone: vec![false; size],
            sidechain: vec![false; size],
            jump: false,
        }
    }

    /// Side chains free, backbone and jumps fixed.
    pub fn sidechains_only(structure: &Structure) -> Self {
        let size = structure.total_residue();
        Self {
            backbone: vec![false; size],
            sidechain: vec![true; size],
            jump: false,
        }
    }

    /// Backbone, side chains and jumps all free.
    pub fn everything(structure: &Structure) -> Self {
        let size = structure.total_residue();
        Self {
            backbone: vec![true; size],
            sidechain: vec![true; size],
            jump: true,
        }
    }

    /// Frees the chosen degrees of freedom for the selected residues only.
    pub fn from_selection(
        structure: &Structure,
        selection: &ResidueSet,
        backbone: bool,
        sidechain: bool,
    ) -> Self {
        let mut map = Self::new(structure.total_residue());
        for &index in selection {
            map.set_backbone(index, backbone);
            map.set_sidechain(index, sidechain);
        }
        map
    }

    pub fn len(&self) -> usize {
        self.backbone.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backbone.is_empty()
    }

    pub fn set_backbone(&mut self, index: usize, value: bool) {
        if let Some(flag) = index.checked_sub(1).and_then(|i| self.backbone.get_mut(i)) {
            *flag = value;
        }
    }

    pub fn set_sidechain(&mut self, index: usize, value: bool) {
        if let Some(flag) = index.checked_sub(1).and_then(|i| self.sidechain.get_mut(i)) {
            *flag = value;
        }
    }

    pub fn set_jump(&mut self, value: bool) {
        self.jump = value;
    }

    pub fn backbone(&self, index: usize) -> bool {
        index.checked_sub(1).and_then(|i| self.backbone.get(i)).copied().unwrap_or(false)
    }

    pub fn sidechain(&self, index: usize) -> bool {
        index.checked_sub(1).and_then(|i| self.sidechain.get(i)).copied().unwrap_or(false)
    }

    pub fn jump(&self) -> bool {
        self.jump
    }

    /// Whether an atom of the given role on residue `index` may move.
    pub fn allows(&self, index: usize, role: AtomRole) -> bool {
        match role {
            AtomRole::Backbone => self.backbone(index),
            AtomRole::Sidechain | AtomRole::Other => self.sidechain(index),
        }
    }

    /// Number of residues with at least one free degree of freedom.
    pub fn movable_residues(&self) -> usize {
        self.backbone
            .iter()
            .zip(&self.sidechain)
            .filter(|(bb, sc)| **bb || **sc)
            .count()
    }

    pub fn is_frozen(&self) -> bool {
        !self.jump && self.movable_residues() == 0
    }
}

use std::ops::Range;

/// A chain is a contiguous run of residues in a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub id: char,
    /// 0-based, half-open range into the structure's residue vector.
    pub(crate) residues: Range<usize>,
}

impl Chain {
    pub(crate) fn new(id: char, start: usize) -> Self {
        Self {
            id,
            residues: start..start,
        }
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// 1-based internal index of the first residue.
    pub fn begin(&self) -> usize {
        self.residues.start + 1
    }

    /// 1-based internal index of the last residue.
    pub fn end(&self) -> usize {
        self.residues.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.begin() && index <= self.end()
    }
}

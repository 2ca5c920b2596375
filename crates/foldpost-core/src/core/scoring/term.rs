use std::ops::{Add, AddAssign};

/// Unweighted energy components of a structure.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyTerm {
    pub vdw: f64,
    pub constraint: f64,
}

impl EnergyTerm {
    pub fn new(vdw: f64, constraint: f64) -> Self {
        Self { vdw, constraint }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.vdw + self.constraint
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            vdw: self.vdw + rhs.vdw,
            constraint: self.constraint + rhs.constraint,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        self.vdw += rhs.vdw;
        self.constraint += rhs.constraint;
    }
}

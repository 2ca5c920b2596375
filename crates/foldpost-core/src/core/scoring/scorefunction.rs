use super::term::EnergyTerm;
use std::fmt;
use std::str::FromStr;

/// Weighted energy components understood by the scoring engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreType {
    Vdw,
    AtomPairConstraint,
}

impl ScoreType {
    pub fn name(&self) -> &'static str {
        match self {
            ScoreType::Vdw => "vdw",
            ScoreType::AtomPairConstraint => "atom_pair_constraint",
        }
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoreType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vdw" => Ok(ScoreType::Vdw),
            "atom_pair_constraint" => Ok(ScoreType::AtomPairConstraint),
            other => Err(format!("unknown score type '{other}'")),
        }
    }
}

/// Weights applied to each [`EnergyTerm`] component.
///
/// Values are copied into each call; [`ScoreFunction::with_weight`] returns a new
/// function and leaves the receiver untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFunction {
    vdw: f64,
    atom_pair_constraint: f64,
}

impl Default for ScoreFunction {
    fn default() -> Self {
        Self {
            vdw: 1.0,
            atom_pair_constraint: 0.0,
        }
    }
}

impl ScoreFunction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weight(&self, score_type: ScoreType) -> f64 {
        match score_type {
            ScoreType::Vdw => self.vdw,
            ScoreType::AtomPairConstraint => self.atom_pair_constraint,
        }
    }

    pub fn set_weight(&mut self, score_type: ScoreType, weight: f64) {
        match score_type {
            ScoreType::Vdw => self.vdw = weight,
            ScoreType::AtomPairConstraint => self.atom_pair_constraint = weight,
        }
    }

    pub fn with_weight(mut self, score_type: ScoreType, weight: f64) -> Self {
        self.set_weight(score_type, weight);
        self
    }

    /// Combines unweighted components into a single score.
    pub fn weighted(&self, term: &EnergyTerm) -> f64 {
        self.vdw * term.vdw + self.atom_pair_constraint * term.constraint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_disables_constraints() {
        let sf = ScoreFunction::default();
        assert_eq!(sf.weight(ScoreType::Vdw), 1.0);
        assert_eq!(sf.weight(ScoreType::AtomPairConstraint), 0.0);
    }

    #[test]
    fn with_weight_leaves_original_untouched() {
        let base = ScoreFunction::default();
        let constrained = base.with_weight(ScoreType::AtomPairConstraint, 1.0);
        assert_eq!(base.weight(ScoreType::AtomPairConstraint), 0.0);
        assert_eq!(constrained.weight(ScoreType::AtomPairConstraint), 1.0);
    }

    #[test]
    fn weighted_applies_each_weight() {
        let sf = ScoreFunction::default().with_weight(ScoreType::AtomPairConstraint, 0.5);
        assert_eq!(sf.weighted(&EnergyTerm::new(-2.0, 4.0)), 0.0);
    }

    #[test]
    fn score_type_names_round_trip() {
        for ty in [ScoreType::Vdw, ScoreType::AtomPairConstraint] {
            assert_eq!(ty.to_string().parse::<ScoreType>().unwrap(), ty);
        }
        assert!("hbond".parse::<ScoreType>().is_err());
    }
}

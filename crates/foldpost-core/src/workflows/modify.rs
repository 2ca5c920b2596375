use super::analyser::Analyser;
use crate::core::catalog::Rank;
use crate::core::models::structure::Structure;
use crate::core::movemap::MoveMap;
use crate::core::ptm::{Annotation, ResolvedSites};
use crate::core::scoring::scorefunction::{ScoreFunction, ScoreType};
use crate::core::selection::{IndexSelector, NeighborhoodSelector, ResidueSelector};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::registry::PoseGroup;
use crate::engine::traits::Engine;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Applies the patch of every modification kind to its residues, then refines
/// the shell of residues within `radius` of the modified ones.
///
/// Kinds without a patch and residues whose type the patch does not accept are
/// skipped. Returns the modified residue indices; when nothing was modified the
/// structure is not refined.
pub fn apply_modifications<E: Engine + ?Sized>(
    engine: &E,
    structure: &mut Structure,
    sites: &ResolvedSites,
    scorefxn: &ScoreFunction,
    cycles: usize,
    radius: f64,
) -> Result<Vec<usize>, EngineError> {
    let mut modified = Vec::new();
    for (kind, residues) in sites {
        let Some(patch) = kind.patch() else {
            warn!(kind = %kind, "No chemical patch for this modification; sites skipped");
            continue;
        };
        for &index in residues {
            let Some(residue) = structure.residue(index) else {
                continue;
            };
            if !kind.accepts(&residue.name) {
                warn!(
                    kind = %kind,
                    residue = %residue.name,
                    number = residue.number,
                    "Residue type incompatible with modification; site skipped"
                );
                continue;
            }
            engine.mutate_residue(structure, index, patch)?;
            modified.push(index);
        }
    }

    if modified.is_empty() {
        return Ok(modified);
    }
    let shell = NeighborhoodSelector::new(IndexSelector::new(modified.iter().copied()), radius, true)
        .select(structure);
    debug!(modified = modified.len(), shell = shell.len(), "Refining around modified residues");
    let movemap = MoveMap::from_selection(structure, &shell, true, true);
    engine.refine(structure, &movemap, scorefxn, cycles)?;
    Ok(modified)
}

impl<E: Engine> Analyser<E> {
    /// Builds the modified group from the relaxed one.
    ///
    /// The annotation's source numbering on `chain` is resolved once, against
    /// the original structure of the first catalog rank. Every relaxed
    /// structure is then cloned afresh into the modified group and modified
    /// with restraints on. Returns the modified residue indices per rank.
    #[instrument(skip_all, name = "make_modified", fields(chain = %chain))]
    pub fn make_modified(
        &mut self,
        annotation: &Annotation,
        chain: char,
        cycles: usize,
        reporter: &ProgressReporter,
    ) -> Result<BTreeMap<Rank, Vec<usize>>, EngineError> {
        let first = self
            .catalog
            .ranks()
            .first()
            .copied()
            .ok_or_else(|| EngineError::State("the catalog is empty".to_string()))?;
        let sites = annotation.to_internal(self.registry.get(PoseGroup::Original, first)?, chain);
        let scorefxn = ScoreFunction::default().with_weight(ScoreType::AtomPairConstraint, 1.0);
        let radius = self.config.modification.neighbourhood_radius;

        let walk = self.registry.walk(PoseGroup::Relaxed, &self.errors)?;
        info!(ranks = walk.len(), sites = annotation.len(), "Modifying relaxed structures");
        reporter.begin("Modify", walk.len());

        let mut modified = BTreeMap::new();
        for rank in walk {
            self.registry.rederive(PoseGroup::Relaxed, PoseGroup::Phosphorylated, rank)?;
            let structure = self.registry.get_mut(PoseGroup::Phosphorylated, rank)?;
            let residues =
                apply_modifications(&self.engine, structure, &sites, &scorefxn, cycles, radius)?;
            debug!(rank, modified = residues.len(), "Structure modified");
            modified.insert(rank, residues);
            reporter.step(rank);
        }

        reporter.end();
        Ok(modified)
    }
}

use super::analyser::Analyser;
use crate::core::movemap::MoveMap;
use crate::core::scoring::constraints::{derive_constraints, derive_interchain_constraints};
use crate::core::scoring::scorefunction::{ScoreFunction, ScoreType};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::registry::PoseGroup;
use crate::engine::traits::Engine;
use tracing::{debug, info, instrument};

/// Catalog column holding the unrestrained score of each relaxed structure.
pub const ENERGY_COLUMN: &str = "energy";

impl<E: Engine> Analyser<E> {
    /// Relaxes side chains only, with restraints switched off.
    ///
    /// Each rank is cloned from the original group into the relaxed group the
    /// first time; later calls keep refining the existing relaxed structure.
    #[instrument(skip_all, name = "sidechain_relax")]
    pub fn sidechain_relax(
        &mut self,
        cycles: usize,
        reporter: &ProgressReporter,
    ) -> Result<(), EngineError> {
        let scorefxn = ScoreFunction::default().with_weight(ScoreType::AtomPairConstraint, 0.0);
        let walk = self.registry.walk(PoseGroup::Original, &self.errors)?;
        info!(ranks = walk.len(), cycles, "Relaxing side chains");
        reporter.begin("Side-chain relax", walk.len());

        for rank in walk {
            let cloned = self.registry.derive(PoseGroup::Original, PoseGroup::Relaxed, rank)?;
            let structure = self.registry.get_mut(PoseGroup::Relaxed, rank)?;
            let movemap = MoveMap::sidechains_only(structure);
            self.engine.refine(structure, &movemap, &scorefxn, cycles)?;
            debug!(rank, cloned, "Side chains relaxed");
            reporter.step(rank);
        }

        reporter.end();
        Ok(())
    }

    /// Attaches error-matrix restraints to every structure of `group`: the
    /// configured whole-structure restraints plus the inter-chain ones.
    ///
    /// Returns the number of restraints added across all ranks.
    #[instrument(skip_all, name = "constrain", fields(group = %group))]
    pub fn constrain(
        &mut self,
        group: PoseGroup,
        reporter: &ProgressReporter,
    ) -> Result<usize, EngineError> {
        if self.registry.is_empty(PoseGroup::Original) {
            return Err(EngineError::State(
                "no original structures are loaded; load structures first".to_string(),
            ));
        }
        let options = self.config.constraints.options();
        let interchain_cutoff = self.config.constraints.interchain_cutoff;
        let walk = self.registry.walk(group, &self.errors)?;
        reporter.begin("Constrain", walk.len());

        let mut total = 0;
        for rank in walk {
            let errors = self.errors.get(rank).ok_or_else(|| {
                EngineError::State(format!("no error matrix for rank {rank}"))
            })?;
            let structure = self.registry.get_mut(group, rank)?;
            let added = derive_constraints(structure, errors, &options)
                + derive_interchain_constraints(structure, errors, interchain_cutoff);
            debug!(rank, added, "Restraints attached");
            total += added;
            reporter.step(rank);
        }

        reporter.end();
        info!(total, "Restraints derived from error matrices");
        Ok(total)
    }

    /// Full relaxation with backbone, side chains and inter-chain jumps free and
    /// restraints on, followed by an unrestrained rescore recorded as the
    /// [`ENERGY_COLUMN`].
    #[instrument(skip_all, name = "relax")]
    pub fn relax(&mut self, cycles: usize, reporter: &ProgressReporter) -> Result<(), EngineError> {
        let scorefxn = ScoreFunction::default().with_weight(ScoreType::AtomPairConstraint, 1.0);
        let walk = self.registry.walk(PoseGroup::Original, &self.errors)?;
        info!(ranks = walk.len(), cycles, "Relaxing structures");
        reporter.begin("Relax", walk.len());

        for rank in walk {
            let cloned = self.registry.derive(PoseGroup::Original, PoseGroup::Relaxed, rank)?;
            let structure = self.registry.get_mut(PoseGroup::Relaxed, rank)?;
            let movemap = MoveMap::everything(structure);
            self.engine.refine(structure, &movemap, &scorefxn, cycles)?;
            debug!(rank, cloned, "Structure relaxed");
            reporter.step(rank);
        }
        reporter.end();

        let unrestrained = scorefxn.with_weight(ScoreType::AtomPairConstraint, 0.0);
        let registry = &self.registry;
        let engine = &self.engine;
        self.catalog.try_set_column_by_rank(ENERGY_COLUMN, |rank| {
            let structure = registry.get(PoseGroup::Relaxed, rank)?;
            engine.score(structure, &unrestrained).map(Some)
        })?;
        Ok(())
    }

    /// Side-chain relax with the configured cycles, restrain the relaxed group,
    /// then relax fully for `cycles`.
    pub fn constrain_and_relax(
        &mut self,
        cycles: usize,
        reporter: &ProgressReporter,
    ) -> Result<(), EngineError> {
        self.sidechain_relax(self.config.relax.sidechain_cycles, reporter)?;
        self.constrain(PoseGroup::Relaxed, reporter)?;
        self.relax(cycles, reporter)
    }
}

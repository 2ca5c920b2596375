use super::analyser::Analyser;
use super::refine::ENERGY_COLUMN;
use crate::core::catalog::Rank;
use crate::core::models::structure::Structure;
use crate::core::scoring::scorefunction::ScoreFunction;
use crate::core::selection::{ChainSelector, CloseContactSelector, ResidueSelector, ResidueSet};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::registry::PoseGroup;
use crate::engine::traits::{Engine, InterfaceEnergetics};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

pub const INTERFACE_RESIDUE_COLUMNS: [&str; 2] = ["interchain_residues_1", "interchain_residues_2"];
pub const INTERFACE_COUNT_COLUMNS: [&str; 2] = ["n_interchain_residues_1", "n_interchain_residues_2"];
pub const MEDIAN_CONFIDENCE_COLUMN: &str = "median_interface_confidence";

/// Residues of chain `chain_number` with a heavy atom within `threshold` of a
/// heavy atom on any other chain.
pub fn interface_residues(structure: &Structure, chain_number: usize, threshold: f64) -> ResidueSet {
    let chain = ChainSelector::new(chain_number);
    let others = ChainSelector::new(chain_number).invert();
    chain
        .and(CloseContactSelector::new(others, threshold))
        .select(structure)
}

/// Median of the values; NaN when there are none.
pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

impl<E: Engine> Analyser<E> {
    /// Records the interface residues of the two configured chains for every
    /// relaxed structure, with their counts.
    ///
    /// Does nothing when the counts are already in the catalog.
    #[instrument(skip_all, name = "find_interface_residues")]
    pub fn find_interface_residues(&mut self) -> Result<(), EngineError> {
        if self.catalog.has_column(INTERFACE_COUNT_COLUMNS[0]) {
            debug!("Interface residues already recorded");
            return Ok(());
        }
        if self.registry.is_empty(PoseGroup::Relaxed) {
            return Err(EngineError::State(
                "no relaxed structures; relax before looking for interfaces".to_string(),
            ));
        }

        let (first, second) = self.config.interface.chains;
        let threshold = self.config.interface.contact_threshold;
        let mut found: [BTreeMap<Rank, Vec<usize>>; 2] = Default::default();
        for rank in self.catalog.ranks() {
            let structure = self.registry.get(PoseGroup::Relaxed, rank)?;
            if structure.num_chains() < 2 {
                return Err(EngineError::State(format!(
                    "the structure of rank {rank} has a single chain"
                )));
            }
            for (slot, chain) in found.iter_mut().zip([first, second]) {
                let residues = interface_residues(structure, chain, threshold);
                slot.insert(rank, residues.into_iter().collect());
            }
        }

        for (k, residues) in found.iter().enumerate() {
            let counts: BTreeMap<Rank, usize> =
                residues.iter().map(|(rank, r)| (*rank, r.len())).collect();
            self.catalog.join_by_rank(INTERFACE_RESIDUE_COLUMNS[k], residues);
            self.catalog.join_by_rank(INTERFACE_COUNT_COLUMNS[k], &counts);
        }
        info!(ranks = self.catalog.len(), threshold, "Interface residues recorded");
        Ok(())
    }

    /// Median per-residue confidence over both chains' interface residues, per rank.
    pub fn median_interface_confidences(&mut self) -> Result<BTreeMap<Rank, f64>, EngineError> {
        self.find_interface_residues()?;
        self.catalog
            .ranks()
            .into_iter()
            .map(|rank| {
                let structure = self.registry.get(PoseGroup::Relaxed, rank)?;
                let mut values: Vec<f64> = INTERFACE_RESIDUE_COLUMNS
                    .iter()
                    .filter_map(|column| self.catalog.residues(column, rank))
                    .flatten()
                    .filter_map(|&index| structure.confidence(index))
                    .collect();
                Ok((rank, median(&mut values)))
            })
            .collect()
    }

    /// Interface energetics and median interface confidence of every relaxed
    /// structure, appended as catalog columns.
    ///
    /// Without the relaxation [`ENERGY_COLUMN`] this returns without touching
    /// the catalog.
    #[instrument(skip_all, name = "calculate_interface")]
    pub fn calculate_interface(&mut self, reporter: &ProgressReporter) -> Result<(), EngineError> {
        if !self.catalog.has_column(ENERGY_COLUMN) {
            debug!("No relaxation energies yet; interface analysis skipped");
            return Ok(());
        }
        let medians = self.median_interface_confidences()?;

        let descriptor = self.config.interface.descriptor.clone();
        let scorefxn = ScoreFunction::default();
        let ranks = self.catalog.ranks();
        info!(interface = %descriptor, ranks = ranks.len(), "Analysing interfaces");
        reporter.begin("Interface analysis", ranks.len());

        let mut results: BTreeMap<Rank, InterfaceEnergetics> = BTreeMap::new();
        for rank in ranks {
            let structure = self.registry.get(PoseGroup::Relaxed, rank)?;
            let energetics = self
                .engine
                .interface_energetics(structure, &descriptor, &scorefxn)?;
            debug!(rank, dg = energetics.interface_dg, "Interface analysed");
            results.insert(rank, energetics);
            reporter.step(rank);
        }
        reporter.end();

        self.catalog.join_by_rank(MEDIAN_CONFIDENCE_COLUMN, &medians);
        for (k, (name, _)) in InterfaceEnergetics::default().columns().iter().enumerate() {
            let values: BTreeMap<Rank, f64> = results
                .iter()
                .map(|(rank, e)| (*rank, e.columns()[k].1))
                .collect();
            self.catalog.join_by_rank(name, &values);
        }
        Ok(())
    }
}

use crate::core::catalog::Rank;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::structure::{Structure, StructureBuilder};
use crate::core::movemap::MoveMap;
use crate::core::scoring::scorefunction::{ScoreFunction, ScoreType};
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::traits::{Engine, InterfaceDescriptor, InterfaceEnergetics};
use crate::workflows::analyser::Analyser;
use nalgebra::{Point3, Vector3};
use serde_json::json;
use std::cell::RefCell;
use std::fs;
use std::path::Path;

const RESIDUE_CYCLE: [&str; 5] = ["SER", "LYS", "THR", "GLY", "ARG"];

/// Backbone atoms plus CB (absent for glycine), as offsets from CA; `flip`
/// mirrors the y axis so chain B faces chain A with its side chains.
fn add_residue(builder: &mut StructureBuilder, name: &str, number: isize, ca: Point3<f64>, flip: f64, b_factor: f64, serial: &mut usize) {
    builder.start_residue(name, number, None);
    let mut atoms = vec![
        ("N", "N", Vector3::new(-1.2, 0.6 * flip, 0.0)),
        ("CA", "C", Vector3::zeros()),
        ("C", "C", Vector3::new(1.2, 0.6 * flip, 0.0)),
        ("O", "O", Vector3::new(1.2, 1.8 * flip, 0.0)),
    ];
    if name != "GLY" {
        atoms.push(("CB", "C", Vector3::new(0.0, -1.5 * flip, 0.0)));
    }
    for (atom_name, element, offset) in atoms {
        *serial += 1;
        builder.add_atom(
            Atom::new(*serial, atom_name, ca + offset)
                .with_element(element)
                .with_b_factor(b_factor),
        );
    }
}

/// Two facing chains, A with `n_a` residues along y = 0 and B with `n_b`
/// residues along y = -5.5, both numbered from 1.
///
/// Side chains of residues in the same column are 2.5 Å apart; every other
/// inter-chain heavy-atom pair is at least 4.0 Å apart. Every atom of the
/// residue at internal index `k` carries B-factor `50 + 10 k`.
pub fn two_chain_structure(n_a: usize, n_b: usize) -> Structure {
    let mut builder = StructureBuilder::new();
    let mut serial = 0;
    let mut index = 0;

    builder.start_chain('A');
    for i in 0..n_a {
        index += 1;
        let ca = Point3::new(3.8 * i as f64, 0.0, 0.0);
        let name = RESIDUE_CYCLE[i % RESIDUE_CYCLE.len()];
        add_residue(&mut builder, name, i as isize + 1, ca, 1.0, 50.0 + 10.0 * index as f64, &mut serial);
    }

    builder.start_chain('B');
    for j in 0..n_b {
        index += 1;
        let ca = Point3::new(3.8 * j as f64, -5.5, 0.0);
        let name = RESIDUE_CYCLE[j % RESIDUE_CYCLE.len()];
        add_residue(&mut builder, name, j as isize + 1, ca, -1.0, 50.0 + 10.0 * index as f64, &mut serial);
    }

    builder.build()
}

/// Settings line for a rank in the format prediction runs write.
pub fn settings_line(rank: Rank, confidence: f64, ptm: f64) -> String {
    format!("rank_{rank}_model_{rank}_ptm_seed_0 pLDDT:{confidence:.2} pTMscore:{ptm:.4}\n")
}

/// Error matrix rows: 2.0 within a chain, 8.0 across chains, 0.0 on the diagonal.
pub fn error_rows(n_a: usize, n_b: usize) -> Vec<Vec<f64>> {
    let n = n_a + n_b;
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else if (i < n_a) == (j < n_a) {
                        2.0
                    } else {
                        8.0
                    }
                })
                .collect()
        })
        .collect()
}

/// Writes an unrelaxed model file and its `_scores.json` sibling for each rank.
///
/// Returns the written structure file names in rank order.
pub fn write_result_folder(folder: &Path, ranks: &[Rank], n_a: usize, n_b: usize) -> Vec<String> {
    let structure = two_chain_structure(n_a, n_b);
    ranks
        .iter()
        .map(|rank| {
            let name = format!("dimer_42_unrelaxed_rank_{rank}_model_{rank}.pdb");
            PdbFile::write_structure_to_path(&structure, folder.join(&name)).unwrap();
            let scores = json!({ "pae": error_rows(n_a, n_b), "plddt": [] });
            let sibling = name.replace(".pdb", "_scores.json");
            fs::write(folder.join(sibling), scores.to_string()).unwrap();
            name
        })
        .collect()
}

/// Writes a settings file with fixed scores for the given ranks.
pub fn write_settings(folder: &Path, ranks: &[Rank]) {
    let text: String = ranks
        .iter()
        .map(|&rank| settings_line(rank, 90.0 - rank as f64, 0.8))
        .collect();
    fs::write(folder.join("settings.txt"), text).unwrap();
}

/// A physics call observed by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Refine {
        movable: usize,
        backbone: bool,
        jump: bool,
        constraint_weight: f64,
        constraints: usize,
        cycles: usize,
    },
    Score {
        constraint_weight: f64,
    },
    Mutate {
        index: usize,
        patch: String,
    },
    Interface {
        descriptor: String,
    },
}

/// Engine double that records every call and leaves coordinates untouched.
///
/// Scores are minus the residue count; mutations append the patch.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub calls: RefCell<Vec<EngineCall>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }

    pub fn refines(&self) -> Vec<EngineCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, EngineCall::Refine { .. }))
            .collect()
    }
}

pub const RECORDED_ENERGETICS: InterfaceEnergetics = InterfaceEnergetics {
    complex_energy: -10.0,
    separated_interface_energy: -2.0,
    complexed_sasa: 500.0,
    crossterm_interface_energy: -1.0,
    interface_dg: -2.5,
    interface_delta_sasa: 120.0,
};

impl Engine for RecordingEngine {
    fn refine(
        &self,
        structure: &mut Structure,
        movemap: &MoveMap,
        scorefxn: &ScoreFunction,
        cycles: usize,
    ) -> Result<(), EngineError> {
        self.calls.borrow_mut().push(EngineCall::Refine {
            movable: movemap.movable_residues(),
            backbone: (1..=movemap.len()).any(|i| movemap.backbone(i)),
            jump: movemap.jump(),
            constraint_weight: scorefxn.weight(ScoreType::AtomPairConstraint),
            constraints: structure.constraints().len(),
            cycles,
        });
        Ok(())
    }

    fn score(&self, structure: &Structure, scorefxn: &ScoreFunction) -> Result<f64, EngineError> {
        self.calls.borrow_mut().push(EngineCall::Score {
            constraint_weight: scorefxn.weight(ScoreType::AtomPairConstraint),
        });
        Ok(-(structure.total_residue() as f64))
    }

    fn mutate_residue(
        &self,
        structure: &mut Structure,
        index: usize,
        patch: &str,
    ) -> Result<(), EngineError> {
        self.calls.borrow_mut().push(EngineCall::Mutate {
            index,
            patch: patch.to_string(),
        });
        let residue = structure
            .residue_mut(index)
            .ok_or_else(|| EngineError::Engine(format!("no residue {index}")))?;
        residue.patches.push(patch.to_string());
        Ok(())
    }

    fn interface_energetics(
        &self,
        _structure: &Structure,
        interface: &InterfaceDescriptor,
        _scorefxn: &ScoreFunction,
    ) -> Result<InterfaceEnergetics, EngineError> {
        self.calls.borrow_mut().push(EngineCall::Interface {
            descriptor: interface.to_string(),
        });
        Ok(RECORDED_ENERGETICS)
    }
}

/// Fixture folder for `ranks` with settings, loaded with a [`RecordingEngine`].
pub fn recording_analyser(folder: &Path, ranks: &[Rank]) -> Analyser<RecordingEngine> {
    write_result_folder(folder, ranks, 3, 2);
    write_settings(folder, ranks);
    Analyser::with_engine(folder, true, AnalysisConfig::default(), RecordingEngine::new()).unwrap()
}

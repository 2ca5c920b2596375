use super::error::EngineError;
use super::traits::{Engine, InterfaceDescriptor, InterfaceEnergetics, InterfaceSide};
use crate::core::models::atom::AtomRole;
use crate::core::models::structure::Structure;
use crate::core::movemap::MoveMap;
use crate::core::scoring::constraints::ConstraintFunction;
use crate::core::scoring::potentials::{lennard_jones_12_6, lennard_jones_12_6_derivative};
use crate::core::scoring::scorefunction::{ScoreFunction, ScoreType};
use crate::core::scoring::term::EnergyTerm;
use crate::core::utils::geometry::{PROBE_RADIUS, build_tree, to_array, total_sasa, vdw_radius};
use kiddo::SquaredEuclidean;
use nalgebra::{Point3, Vector3};
use phf::phf_map;
use std::collections::HashMap;
use tracing::{debug, trace};

const NONBONDED_CUTOFF: f64 = 8.0;
const SEPARATION_DISTANCE: f64 = 1000.0;
const MIN_STEP: f64 = 1e-6;

/// Residue types each patch can be applied to.
static PATCH_TARGETS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "phosphorylated" => &["SER", "THR", "TYR"],
    "acetylated" => &["LYS"],
    "monomethylated" => &["LYS"],
    "dimethylated" => &["LYS"],
    "trimethylated" => &["LYS"],
};

/// Bundled physics engine.
///
/// Energies are a 12-6 Lennard-Jones term over heavy-atom pairs (same-residue and
/// sequence-adjacent pairs excluded) plus the structure's distance restraints.
/// Refinement is a cartesian steepest descent with an adaptive step; the move map
/// masks which atoms may move, and its jump flag lets every chain after the first
/// translate as a rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEngine {
    /// Lennard-Jones well depth shared by all atom pairs.
    pub well_depth: f64,
    /// Descent steps per refinement cycle.
    pub steps_per_cycle: usize,
    /// Initial step length per unit gradient.
    pub initial_step: f64,
    /// Largest displacement of any atom in a single step, in Ångström.
    pub max_displacement: f64,
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        Self {
            well_depth: 0.1,
            steps_per_cycle: 50,
            initial_step: 0.01,
            max_displacement: 0.1,
        }
    }
}

impl ReferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn minimize(
        &self,
        system: &mut System,
        movemap: &MoveMap,
        scorefxn: &ScoreFunction,
        cycles: usize,
    ) -> f64 {
        let mobile: Vec<bool> = system
            .sites
            .iter()
            .map(|site| movemap.allows(site.residue, site.role))
            .collect();
        let mut gradient = vec![Vector3::zeros(); system.positions.len()];
        let mut current = system.score(&system.positions, scorefxn, self.well_depth);
        let mut step = self.initial_step;

        for cycle in 0..cycles {
            for _ in 0..self.steps_per_cycle {
                gradient.fill(Vector3::zeros());
                system.evaluate(&system.positions, scorefxn, self.well_depth, Some(gradient.as_mut_slice()));
                let trial = self.trial_positions(system, &gradient, &mobile, movemap.jump(), step);
                let energy = system.score(&trial, scorefxn, self.well_depth);
                if energy < current {
                    system.positions = trial;
                    current = energy;
                    step *= 1.2;
                } else {
                    step *= 0.5;
                    if step < MIN_STEP {
                        break;
                    }
                }
            }
            trace!(cycle, energy = current, "Refinement cycle finished");
            step = step.max(self.initial_step);
        }
        current
    }

    fn trial_positions(
        &self,
        system: &System,
        gradient: &[Vector3<f64>],
        mobile: &[bool],
        jump: bool,
        step: f64,
    ) -> Vec<Point3<f64>> {
        let mut trial = system.positions.clone();
        for (k, position) in trial.iter_mut().enumerate() {
            if mobile[k] {
                *position -= clamp(gradient[k] * step, self.max_displacement);
            }
        }
        if jump {
            for chain in 2..=system.num_chains {
                let net: Vector3<f64> = system
                    .sites
                    .iter()
                    .zip(gradient)
                    .filter(|(site, _)| site.chain == chain)
                    .map(|(_, g)| *g)
                    .sum();
                let shift = clamp(-net * step, self.max_displacement);
                for (site, position) in system.sites.iter().zip(trial.iter_mut()) {
                    if site.chain == chain {
                        *position += shift;
                    }
                }
            }
        }
        trial
    }
}

fn clamp(v: Vector3<f64>, max: f64) -> Vector3<f64> {
    let norm = v.norm();
    if norm > max { v * (max / norm) } else { v }
}

impl Engine for ReferenceEngine {
    fn refine(
        &self,
        structure: &mut Structure,
        movemap: &MoveMap,
        scorefxn: &ScoreFunction,
        cycles: usize,
    ) -> Result<(), EngineError> {
        if movemap.len() != structure.total_residue() {
            return Err(EngineError::Engine(format!(
                "move map covers {} residues but the structure has {}",
                movemap.len(),
                structure.total_residue()
            )));
        }
        if cycles == 0 || movemap.is_frozen() {
            return Ok(());
        }

        let mut system = System::new(structure);
        let before = system.score(&system.positions, scorefxn, self.well_depth);
        let after = self.minimize(&mut system, movemap, scorefxn, cycles);
        if !after.is_finite() {
            return Err(EngineError::Engine(format!(
                "refinement diverged (energy {after})"
            )));
        }
        debug!(before, after, cycles, "Refinement finished");
        system.write_back(structure);
        Ok(())
    }

    fn score(&self, structure: &Structure, scorefxn: &ScoreFunction) -> Result<f64, EngineError> {
        let system = System::new(structure);
        Ok(system.score(&system.positions, scorefxn, self.well_depth))
    }

    fn mutate_residue(
        &self,
        structure: &mut Structure,
        index: usize,
        patch: &str,
    ) -> Result<(), EngineError> {
        let residue = structure.residue_mut(index).ok_or_else(|| {
            EngineError::Engine(format!("no residue at internal index {index}"))
        })?;
        let targets = PATCH_TARGETS
            .get(patch)
            .ok_or_else(|| EngineError::Engine(format!("unknown patch '{patch}'")))?;
        if !targets.contains(&residue.name.as_str()) {
            return Err(EngineError::Engine(format!(
                "patch '{patch}' cannot be applied to {} {}",
                residue.name, residue.number
            )));
        }
        if residue.has_patch(patch) {
            return Ok(());
        }
        if let Some(existing) = residue.patches.first() {
            return Err(EngineError::Engine(format!(
                "residue {} {} already carries patch '{existing}'",
                residue.name, residue.number
            )));
        }
        residue.patches.push(patch.to_string());
        debug!(index, variant = %residue.variant_name(), "Patched residue");
        Ok(())
    }

    fn interface_energetics(
        &self,
        structure: &Structure,
        interface: &InterfaceDescriptor,
        scorefxn: &ScoreFunction,
    ) -> Result<InterfaceEnergetics, EngineError> {
        let sides: Vec<Option<InterfaceSide>> = structure
            .chains()
            .iter()
            .map(|chain| interface.side_of(chain.id))
            .collect();
        for (side, label) in [(InterfaceSide::Left, "left"), (InterfaceSide::Right, "right")] {
            if !sides.contains(&Some(side)) {
                return Err(EngineError::Engine(format!(
                    "no chain of the {label} side of interface '{interface}' is present"
                )));
            }
        }

        let system = System::new(structure);
        let side_of_site = |site: &Site| sides[site.chain - 1];

        let mut separated = system.positions.clone();
        let offset = Vector3::new(SEPARATION_DISTANCE, 0.0, 0.0);
        for (site, position) in system.sites.iter().zip(separated.iter_mut()) {
            if side_of_site(site) == Some(InterfaceSide::Right) {
                *position += offset;
            }
        }

        let complex_energy = system.score(&system.positions, scorefxn, self.well_depth);
        let separated_energy = system.score(&separated, scorefxn, self.well_depth);
        let unrestrained = scorefxn.with_weight(ScoreType::AtomPairConstraint, 0.0);
        let interface_dg = system.score(&system.positions, &unrestrained, self.well_depth)
            - system.score(&separated, &unrestrained, self.well_depth);

        let crossterm = system.cross_vdw(self.well_depth, |a, b| {
            let (sa, sb) = (side_of_site(a), side_of_site(b));
            sa.is_some() && sb.is_some() && sa != sb
        }) * scorefxn.weight(ScoreType::Vdw);

        let sasa_of = |keep: &dyn Fn(Option<InterfaceSide>) -> bool| {
            let (positions, radii): (Vec<Point3<f64>>, Vec<f64>) = system
                .sites
                .iter()
                .zip(&system.positions)
                .filter(|(site, _)| site.heavy && keep(side_of_site(site)))
                .map(|(site, position)| (*position, site.radius))
                .unzip();
            total_sasa(&positions, &radii, PROBE_RADIUS)
        };
        let complexed_sasa = sasa_of(&|side| side.is_some());
        let left_sasa = sasa_of(&|side| side == Some(InterfaceSide::Left));
        let right_sasa = sasa_of(&|side| side == Some(InterfaceSide::Right));

        Ok(InterfaceEnergetics {
            complex_energy,
            separated_interface_energy: complex_energy - separated_energy,
            complexed_sasa,
            crossterm_interface_energy: crossterm,
            interface_dg,
            interface_delta_sasa: left_sasa + right_sasa - complexed_sasa,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Site {
    residue: usize,
    /// Index of the atom within its residue.
    atom: usize,
    /// 1-based chain number.
    chain: usize,
    role: AtomRole,
    heavy: bool,
    radius: f64,
}

#[derive(Debug, Clone, Copy)]
struct Restraint {
    first: usize,
    second: usize,
    function: ConstraintFunction,
}

/// Flattened atoms of a structure with their restraints resolved to site indices.
struct System {
    sites: Vec<Site>,
    positions: Vec<Point3<f64>>,
    restraints: Vec<Restraint>,
    heavy: Vec<usize>,
    num_chains: usize,
}

impl System {
    fn new(structure: &Structure) -> Self {
        let mut sites = Vec::new();
        let mut positions = Vec::new();
        let mut lookup: HashMap<(usize, &str), usize> = HashMap::new();

        for (index, residue) in structure.residues() {
            for (k, atom) in residue.atoms().iter().enumerate() {
                lookup.insert((index, atom.name.as_str()), sites.len());
                sites.push(Site {
                    residue: index,
                    atom: k,
                    chain: residue.chain + 1,
                    role: atom.role,
                    heavy: atom.is_heavy(),
                    radius: vdw_radius(&atom.element_symbol()),
                });
                positions.push(atom.position);
            }
        }

        let restraints = structure
            .constraints()
            .iter()
            .filter_map(|c| {
                let first = *lookup.get(&(c.first.residue, c.first.atom.as_str()))?;
                let second = *lookup.get(&(c.second.residue, c.second.atom.as_str()))?;
                Some(Restraint {
                    first,
                    second,
                    function: c.function,
                })
            })
            .collect();
        let heavy = sites
            .iter()
            .enumerate()
            .filter(|(_, s)| s.heavy)
            .map(|(i, _)| i)
            .collect();

        Self {
            sites,
            positions,
            restraints,
            heavy,
            num_chains: structure.num_chains(),
        }
    }

    /// Bonded neighbours carry no non-bonded energy.
    fn excluded(&self, i: usize, j: usize) -> bool {
        let (a, b) = (&self.sites[i], &self.sites[j]);
        a.residue == b.residue || (a.chain == b.chain && a.residue.abs_diff(b.residue) == 1)
    }

    /// Heavy-atom pairs within the non-bonded cutoff, each reported once.
    fn pairs(&self, positions: &[Point3<f64>]) -> Vec<(usize, usize)> {
        if self.heavy.is_empty() {
            return Vec::new();
        }
        let heavy_positions: Vec<Point3<f64>> = self.heavy.iter().map(|&i| positions[i]).collect();
        let tree = build_tree(&heavy_positions);
        let mut pairs = Vec::new();
        for (a, &i) in self.heavy.iter().enumerate() {
            let found = tree.within_unsorted::<SquaredEuclidean>(
                &to_array(&positions[i]),
                NONBONDED_CUTOFF * NONBONDED_CUTOFF,
            );
            for neighbour in found {
                let b = neighbour.item as usize;
                if b <= a {
                    continue;
                }
                let j = self.heavy[b];
                if !self.excluded(i, j) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    /// Unweighted energy components; when `gradient` is given, the weighted
    /// gradient is accumulated into it.
    fn evaluate(
        &self,
        positions: &[Point3<f64>],
        scorefxn: &ScoreFunction,
        well_depth: f64,
        mut gradient: Option<&mut [Vector3<f64>]>,
    ) -> EnergyTerm {
        let mut term = EnergyTerm::default();
        let vdw_weight = scorefxn.weight(ScoreType::Vdw);
        let constraint_weight = scorefxn.weight(ScoreType::AtomPairConstraint);

        for (i, j) in self.pairs(positions) {
            let delta = positions[i] - positions[j];
            let dist = delta.norm();
            let r_min = self.sites[i].radius + self.sites[j].radius;
            term.vdw += lennard_jones_12_6(dist, r_min, well_depth);
            if let Some(g) = gradient.as_deref_mut() {
                if dist > 1e-6 {
                    let force = delta
                        * (vdw_weight * lennard_jones_12_6_derivative(dist, r_min, well_depth) / dist);
                    g[i] += force;
                    g[j] -= force;
                }
            }
        }

        for restraint in &self.restraints {
            let delta = positions[restraint.first] - positions[restraint.second];
            let dist = delta.norm();
            term.constraint += restraint.function.evaluate(dist);
            if let Some(g) = gradient.as_deref_mut() {
                if dist > 1e-6 {
                    let force = delta * (constraint_weight * restraint.function.derivative(dist) / dist);
                    g[restraint.first] += force;
                    g[restraint.second] -= force;
                }
            }
        }
        term
    }

    fn score(&self, positions: &[Point3<f64>], scorefxn: &ScoreFunction, well_depth: f64) -> f64 {
        scorefxn.weighted(&self.evaluate(positions, scorefxn, well_depth, None))
    }

    /// Unweighted Lennard-Jones energy over the pairs accepted by `across`.
    fn cross_vdw(&self, well_depth: f64, across: impl Fn(&Site, &Site) -> bool) -> f64 {
        self.pairs(&self.positions)
            .into_iter()
            .filter(|&(i, j)| across(&self.sites[i], &self.sites[j]))
            .map(|(i, j)| {
                let dist = (self.positions[i] - self.positions[j]).norm();
                lennard_jones_12_6(dist, self.sites[i].radius + self.sites[j].radius, well_depth)
            })
            .sum()
    }

    fn write_back(&self, structure: &mut Structure) {
        for (site, position) in self.sites.iter().zip(&self.positions) {
            if let Some(atom) = structure
                .residue_mut(site.residue)
                .and_then(|r| r.atoms_mut().get_mut(site.atom))
            {
                atom.position = *position;
            }
        }
    }
}

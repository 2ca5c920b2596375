use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Solvent probe radius in Ångström.
pub const PROBE_RADIUS: f64 = 1.4;
const SPHERE_POINTS: usize = 320;

#[inline]
pub fn to_array(point: &Point3<f64>) -> [f64; 3] {
    [point.x, point.y, point.z]
}

/// Builds a k-d tree over positions; items are the positions' indices.
pub fn build_tree(points: &[Point3<f64>]) -> KdTree<f64, 3> {
    let mut tree: KdTree<f64, 3> = KdTree::with_capacity(points.len().max(1));
    for (i, point) in points.iter().enumerate() {
        tree.add(&to_array(point), i as u64);
    }
    tree
}

/// Whether any point indexed by `tree` lies within `radius` of `query`.
pub fn any_within(tree: &KdTree<f64, 3>, query: &Point3<f64>, radius: f64) -> bool {
    if tree.size() == 0 {
        return false;
    }
    let nearest = tree.nearest_one::<SquaredEuclidean>(&to_array(query));
    nearest.distance <= radius * radius
}

/// Van der Waals radius by element symbol (Bondi), carbon as fallback.
pub fn vdw_radius(element: &str) -> f64 {
    match element.to_ascii_uppercase().as_str() {
        "H" => 1.20,
        "C" => 1.70,
        "N" => 1.55,
        "O" => 1.52,
        "S" => 1.80,
        "P" => 1.80,
        "SE" => 1.90,
        _ => 1.70,
    }
}

/// Evenly spread unit vectors on a sphere (golden-section spiral).
pub fn sphere_points(n: usize) -> Vec<Vector3<f64>> {
    let increment = PI * (3.0 - 5.0_f64.sqrt());
    let offset = 2.0 / n as f64;
    (0..n)
        .map(|k| {
            let y = k as f64 * offset - 1.0 + offset / 2.0;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let phi = k as f64 * increment;
            Vector3::new(phi.cos() * r, y, phi.sin() * r)
        })
        .collect()
}

/// Per-atom solvent accessible surface area (Shrake-Rupley).
///
/// `positions` and `radii` are parallel slices; the probe radius is added to
/// every atomic radius.
pub fn atomic_sasa(positions: &[Point3<f64>], radii: &[f64], probe: f64) -> Vec<f64> {
    debug_assert_eq!(positions.len(), radii.len());
    if positions.is_empty() {
        return Vec::new();
    }
    let tree = build_tree(positions);
    let sphere = sphere_points(SPHERE_POINTS);
    let max_radius = radii.iter().copied().fold(0.0, f64::max) + probe;

    positions
        .iter()
        .zip(radii)
        .enumerate()
        .map(|(i, (center, &radius))| {
            let expanded = radius + probe;
            let reach = expanded + max_radius;
            let neighbours: Vec<usize> = tree
                .within_unsorted::<SquaredEuclidean>(&to_array(center), reach * reach)
                .into_iter()
                .map(|n| n.item as usize)
                .filter(|&j| j != i)
                .collect();

            let accessible = sphere
                .iter()
                .filter(|direction| {
                    let point = center + *direction * expanded;
                    neighbours.iter().all(|&j| {
                        let other = radii[j] + probe;
                        (point - positions[j]).norm_squared() >= other * other
                    })
                })
                .count();

            4.0 * PI * expanded * expanded * accessible as f64 / SPHERE_POINTS as f64
        })
        .collect()
}

/// Total solvent accessible surface area of a set of atoms.
pub fn total_sasa(positions: &[Point3<f64>], radii: &[f64], probe: f64) -> f64 {
    atomic_sasa(positions, radii, probe).iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_atom_exposes_full_sphere() {
        let sasa = total_sasa(&[Point3::origin()], &[1.7], PROBE_RADIUS);
        let expected = 4.0 * PI * (1.7 + PROBE_RADIUS).powi(2);
        assert!((sasa - expected).abs() < 1e-6);
    }

    #[test]
    fn touching_atoms_bury_surface() {
        let single = total_sasa(&[Point3::origin()], &[1.7], PROBE_RADIUS);
        let pair = total_sasa(
            &[Point3::origin(), Point3::new(2.0, 0.0, 0.0)],
            &[1.7, 1.7],
            PROBE_RADIUS,
        );
        assert!(pair < 2.0 * single);
        assert!(pair > single);
    }

    #[test]
    fn distant_atoms_do_not_interact() {
        let single = total_sasa(&[Point3::origin()], &[1.7], PROBE_RADIUS);
        let pair = total_sasa(
            &[Point3::origin(), Point3::new(50.0, 0.0, 0.0)],
            &[1.7, 1.7],
            PROBE_RADIUS,
        );
        assert!((pair - 2.0 * single).abs() < 1e-6);
    }

    #[test]
    fn sphere_points_are_unit_vectors() {
        for v in sphere_points(50) {
            assert!((v.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn any_within_uses_radius_inclusively() {
        let tree = build_tree(&[Point3::new(3.0, 0.0, 0.0)]);
        assert!(any_within(&tree, &Point3::origin(), 3.0));
        assert!(!any_within(&tree, &Point3::origin(), 2.9));
        assert!(!any_within(&build_tree(&[]), &Point3::origin(), 100.0));
    }

    #[test]
    fn vdw_radius_falls_back_to_carbon() {
        assert_eq!(vdw_radius("n"), 1.55);
        assert_eq!(vdw_radius("Xx"), 1.70);
    }
}

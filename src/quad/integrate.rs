use crate::geometry::Tetrahedron;
use crate::quad::expr::CompiledExpr;
use crate::quad::rules::QuadNode;

/// Integrates a compiled expression over a tetrahedron with a node/weight
/// table.
///
/// Each node is mapped to a physical point through the barycentric formula,
/// the expression is sampled there, and the weighted values are accumulated.
/// Catalog weights are normalized to the reference tetrahedron (volume 1/6),
/// so the sum is rescaled by `volume * 6`: a rule whose weights sum to 1/6
/// returns exactly `volume` for the constant function 1.
///
/// A NaN sample is accumulated like any other value and poisons the total;
/// nodes are never skipped or clamped.
pub fn integrate(expr: &CompiledExpr, nodes: &[QuadNode], tet: &Tetrahedron) -> f64 {
    let volume = tet.volume();

    let mut sum = 0.0;
    for node in nodes {
        let [a, b, c] = node.xi;
        let [x, y, z] = tet.point_at(a, b, c);
        sum += expr.eval(x, y, z) * node.weight * volume * 6.0;
    }

    sum
}

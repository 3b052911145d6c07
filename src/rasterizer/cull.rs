//! Screen-space winding test
//!
//! Runs after projection: eye-space orientation does not predict the 2D
//! winding once perspective division has happened.

use super::math::Vec3;
use super::types::CullFace;

/// Twice the signed area of a screen-space polygon (shoelace formula)
pub fn signed_area2(points: &[Vec3]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

/// Whether a triangle survives culling. Zero area never does.
pub fn is_visible(p1: Vec3, p2: Vec3, p3: Vec3, cull: CullFace) -> bool {
    passes(signed_area2(&[p1, p2, p3]), cull)
}

/// Culling decision for a precomputed doubled area
pub fn passes(area2: f32, cull: CullFace) -> bool {
    match cull {
        CullFace::Back => area2 > 0.0,
        CullFace::Front => area2 < 0.0,
    }
}

//! Viewport polygon clipping (Sutherland–Hodgman)
//!
//! The four clip edges form a closed set, iterated in the fixed order
//! right, left, bottom, top. Each edge works on bare screen points (flat
//! fill) and on full vertices, where texture coordinates are interpolated
//! perspective-correctly with the same formula the scan converter uses.

use smallvec::SmallVec;
use super::math::{Vec2, Vec3};
use super::types::Vertex;
use super::viewport::Viewport;

/// Clip working set: 3 input vertices plus at most one per clip plane
pub type ClipPolygon<T> = SmallVec<[T; 8]>;

/// Something the viewport clipper can cut: a screen-space position plus
/// attributes that follow it.
pub trait ClipVertex: Copy {
    fn position(&self) -> Vec3;

    fn set_position(&mut self, p: Vec3);

    /// Point on segment `self -> other` at parameter `t`: x/y linear in `t`,
    /// 1/z (and every attribute divided by z) linear in `t`.
    fn screen_lerp(&self, other: &Self, t: f32) -> Self;
}

/// Reciprocal depth interpolated at `t`, inverted back to depth
#[inline]
fn lerp_depth(z1: f32, z2: f32, t: f32) -> f32 {
    let w1 = 1.0 / z1;
    let w2 = 1.0 / z2;
    1.0 / (w1 + (w2 - w1) * t)
}

impl ClipVertex for Vec3 {
    fn position(&self) -> Vec3 {
        *self
    }

    fn set_position(&mut self, p: Vec3) {
        *self = p;
    }

    fn screen_lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            lerp_depth(self.z, other.z, t),
        )
    }
}

impl ClipVertex for Vertex {
    fn position(&self) -> Vec3 {
        self.pos
    }

    fn set_position(&mut self, p: Vec3) {
        self.pos = p;
    }

    fn screen_lerp(&self, other: &Self, t: f32) -> Self {
        let pos = self.pos.screen_lerp(&other.pos, t);
        let (a, b) = (self, other);
        let u = a.uv.x / a.pos.z + (b.uv.x / b.pos.z - a.uv.x / a.pos.z) * t;
        let v = a.uv.y / a.pos.z + (b.uv.y / b.pos.z - a.uv.y / a.pos.z) * t;
        Vertex {
            pos,
            uv: Vec2::new(u * pos.z, v * pos.z),
        }
    }
}

/// One boundary of the viewport rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipEdge {
    /// Inside when x < max_x + 1
    Right,
    /// Inside when x >= min_x
    Left,
    /// Inside when y >= min_y
    Bottom,
    /// Inside when y < max_y + 1
    Top,
}

impl ClipEdge {
    /// Order the polygon clipper applies the edges in
    pub const ORDER: [ClipEdge; 4] = [ClipEdge::Right, ClipEdge::Left, ClipEdge::Bottom, ClipEdge::Top];

    /// The boundary coordinate this edge clips to
    pub fn boundary(self, vp: &Viewport) -> f32 {
        match self {
            ClipEdge::Right => (vp.max_x + 1) as f32,
            ClipEdge::Left => vp.min_x as f32,
            ClipEdge::Bottom => vp.min_y as f32,
            ClipEdge::Top => (vp.max_y + 1) as f32,
        }
    }

    pub fn is_inside(self, p: Vec3, vp: &Viewport) -> bool {
        let bound = self.boundary(vp);
        match self {
            ClipEdge::Right => p.x < bound,
            ClipEdge::Left => p.x >= bound,
            ClipEdge::Bottom => p.y >= bound,
            ClipEdge::Top => p.y < bound,
        }
    }

    pub fn is_vertex_inside<V: ClipVertex>(self, v: &V, vp: &Viewport) -> bool {
        self.is_inside(v.position(), vp)
    }

    /// Intersection of segment `a -> b` with this boundary.
    ///
    /// Only called when exactly one endpoint is inside, so the denominator is
    /// non-zero. The clipped coordinate lands exactly on the boundary; nothing
    /// is rounded.
    pub fn intersect<V: ClipVertex>(self, a: &V, b: &V, vp: &Viewport) -> V {
        let bound = self.boundary(vp);
        let (pa, pb) = (a.position(), b.position());
        let t = match self {
            ClipEdge::Right | ClipEdge::Left => (bound - pa.x) / (pb.x - pa.x),
            ClipEdge::Bottom | ClipEdge::Top => (bound - pa.y) / (pb.y - pa.y),
        };

        let mut out = a.screen_lerp(b, t);
        let mut p = out.position();
        match self {
            ClipEdge::Right | ClipEdge::Left => p.x = bound,
            ClipEdge::Bottom | ClipEdge::Top => p.y = bound,
        }
        out.set_position(p);
        out
    }
}

/// Clip a convex polygon against a single edge
fn clip_against<V: ClipVertex>(input: &[V], edge: ClipEdge, vp: &Viewport) -> ClipPolygon<V> {
    let mut output = ClipPolygon::new();
    let Some(&last) = input.last() else {
        return output;
    };

    let mut s = last;
    for &p in input {
        let p_in = edge.is_vertex_inside(&p, vp);
        let s_in = edge.is_vertex_inside(&s, vp);
        if p_in {
            if !s_in {
                output.push(edge.intersect(&s, &p, vp));
            }
            output.push(p);
        } else if s_in {
            output.push(edge.intersect(&s, &p, vp));
        }
        s = p;
    }
    output
}

/// Intersect a convex polygon with the viewport rectangle.
///
/// Returns an empty polygon when fewer than 3 vertices survive. Non-convex
/// input is not checked.
pub fn clip_polygon<V: ClipVertex>(subject: &[V], vp: &Viewport) -> ClipPolygon<V> {
    let mut output: ClipPolygon<V> = subject.iter().copied().collect();
    for edge in ClipEdge::ORDER {
        if output.is_empty() {
            break;
        }
        output = clip_against(&output, edge, vp);
    }
    if output.len() < 3 {
        output.clear();
    }
    output
}

/// Fan triangulation from vertex 0
pub fn fan<V: Copy>(polygon: &[V]) -> impl Iterator<Item = [V; 3]> + '_ {
    let count = polygon.len().saturating_sub(2);
    (0..count).map(move |i| [polygon[0], polygon[i + 1], polygon[i + 2]])
}

//! Near-plane clipping in camera space, before perspective division
//!
//! The camera looks down -Z: a point is in front of the near plane when
//! `z < near_z`. Intersections interpolate linearly in camera space, so
//! texture coordinates stay linear too.

use super::clip::ClipPolygon;
use super::math::Vec3;
use super::types::Vertex;

/// Single-plane clipper at a fixed camera-space depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearPlane {
    pub z: f32,
}

/// Where a segment or triangle sits relative to the near plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Behind,
    Straddling,
}

/// Camera-space geometry the near clipper can cut
pub trait NearVertex: Copy {
    fn depth(&self) -> f32;

    /// Linear interpolation of every component at `t`
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl NearVertex for Vec3 {
    fn depth(&self) -> f32 {
        self.z
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::lerp(*self, *other, t)
    }
}

impl NearVertex for Vertex {
    fn depth(&self) -> f32 {
        self.pos.z
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vertex::new(self.pos.lerp(other.pos, t), self.uv.lerp(other.uv, t))
    }
}

impl NearPlane {
    pub fn new(z: f32) -> Self {
        Self { z }
    }

    pub fn is_in_front<V: NearVertex>(&self, v: &V) -> bool {
        v.depth() < self.z
    }

    pub fn classify<V: NearVertex>(&self, points: &[V]) -> Side {
        let in_front = points.iter().filter(|p| self.is_in_front(*p)).count();
        if in_front == points.len() {
            Side::Front
        } else if in_front == 0 {
            Side::Behind
        } else {
            Side::Straddling
        }
    }

    /// Point where segment `a -> b` crosses the plane. Exactly one endpoint
    /// must be in front, so the depths differ.
    pub fn intersect<V: NearVertex>(&self, a: &V, b: &V) -> V {
        let t = (self.z - a.depth()) / (b.depth() - a.depth());
        a.lerp(b, t)
    }

    /// Part of a segment in front of the plane, or `None` if it is all behind
    pub fn clip_segment<V: NearVertex>(&self, a: V, b: V) -> Option<(V, V)> {
        match (self.is_in_front(&a), self.is_in_front(&b)) {
            (true, true) => Some((a, b)),
            (false, false) => None,
            (true, false) => Some((a, self.intersect(&a, &b))),
            (false, true) => Some((self.intersect(&b, &a), b)),
        }
    }

    /// Sutherland–Hodgman against the near plane. A triangle becomes 3 or 4
    /// vertices, or nothing when it is entirely behind.
    pub fn clip_polygon<V: NearVertex>(&self, subject: &[V]) -> ClipPolygon<V> {
        let mut output = ClipPolygon::new();
        let Some(&last) = subject.last() else {
            return output;
        };

        let mut s = last;
        for &p in subject {
            if self.is_in_front(&p) {
                if !self.is_in_front(&s) {
                    output.push(self.intersect(&s, &p));
                }
                output.push(p);
            } else if self.is_in_front(&s) {
                output.push(self.intersect(&s, &p));
            }
            s = p;
        }

        if output.len() < 3 {
            output.clear();
        }
        output
    }
}

impl Default for NearPlane {
    fn default() -> Self {
        Self::new(-1.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::math::Vec2;

    #[test]
    fn test_classify() {
        let near = NearPlane::default();
        let front = [Vec3::new(0.0, 0.0, -5.0), Vec3::new(1.0, 0.0, -3.0)];
        let behind = [Vec3::new(0.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 2.0)];
        let mixed = [Vec3::new(0.0, 0.0, -5.0), Vec3::new(1.0, 0.0, 2.0)];
        assert_eq!(near.classify(&front), Side::Front);
        assert_eq!(near.classify(&behind), Side::Behind);
        assert_eq!(near.classify(&mixed), Side::Straddling);
    }

    #[test]
    fn test_segment_keeps_front_endpoint_and_lands_on_plane() {
        let near = NearPlane::new(-2.0);
        let a = Vec3::new(0.0, 0.0, -4.0);
        let b = Vec3::new(4.0, 2.0, 0.0);
        let (c, d) = near.clip_segment(b, a).unwrap();
        assert_eq!(d, a);
        assert_eq!(c.z, -2.0);
        assert!((c.x - 2.0).abs() < 1e-6);
        assert!((c.y - 1.0).abs() < 1e-6);
        assert!(near.clip_segment(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0)).is_none());
    }

    #[test]
    fn test_one_vertex_behind_gives_quad() {
        let near = NearPlane::new(-1.0);
        let tri = [
            Vec3::new(-1.0, 0.0, -3.0),
            Vec3::new(1.0, 0.0, -3.0),
            Vec3::new(0.0, 1.0, 1.0),
        ];
        let out = near.clip_polygon(&tri);
        assert_eq!(out.len(), 4);
        assert_eq!(out.iter().filter(|p| p.z == -1.0).count(), 2);
        assert!(out.iter().all(|p| p.z <= -1.0));
    }

    #[test]
    fn test_two_vertices_behind_gives_triangle() {
        let near = NearPlane::new(-1.0);
        let tri = [
            Vec3::new(-1.0, 0.0, -3.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        ];
        assert_eq!(near.clip_polygon(&tri).len(), 3);
    }

    #[test]
    fn test_vertex_uv_follows_position() {
        let near = NearPlane::new(-2.0);
        let a = Vertex::new(Vec3::new(0.0, 0.0, -3.0), Vec2::new(0.0, 0.0));
        let b = Vertex::new(Vec3::new(0.0, 0.0, -1.0), Vec2::new(1.0, 0.5));
        let hit = near.intersect(&a, &b);
        assert!((hit.uv.x - 0.5).abs() < 1e-6);
        assert!((hit.uv.y - 0.25).abs() < 1e-6);
    }
}

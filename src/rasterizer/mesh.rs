//! Indexed triangle meshes

use super::math::{Vec2, Vec3};

/// Indexed triangle list in model space.
///
/// Triangles wind so that their outward side projects with positive
/// signed screen area (what `CullFace::Back` keeps).
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    /// Three indices per triangle
    pub indices: Vec<[usize; 3]>,
    /// Per-position texture coordinates, if any
    pub tex_coords: Option<Vec<Vec2>>,
    /// One normal per triangle; computed from the winding when absent
    pub face_normals: Option<Vec<Vec3>>,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<[usize; 3]>) -> Self {
        Self { positions, indices, tex_coords: None, face_normals: None }
    }

    /// Build from a flat index buffer, three indices per triangle. A trailing
    /// incomplete triangle is dropped.
    pub fn from_flat_indices(positions: Vec<Vec3>, indices: &[usize]) -> Self {
        let chunks = indices.chunks_exact(3);
        if !chunks.remainder().is_empty() {
            log::trace!("dropping {} trailing indices", chunks.remainder().len());
        }
        let triangles = chunks.map(|t| [t[0], t[1], t[2]]).collect();
        Self::new(positions, triangles)
    }

    pub fn with_tex_coords(mut self, tex_coords: Vec<Vec2>) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Positions of one triangle, or `None` if an index is out of range
    pub fn triangle(&self, i: usize) -> Option<[Vec3; 3]> {
        let [a, b, c] = *self.indices.get(i)?;
        Some([*self.positions.get(a)?, *self.positions.get(b)?, *self.positions.get(c)?])
    }

    /// Texture coordinates of one triangle (zero when the mesh has none)
    pub fn triangle_uvs(&self, i: usize) -> [Vec2; 3] {
        let lookup = |idx: usize| {
            self.tex_coords
                .as_ref()
                .and_then(|uvs| uvs.get(idx).copied())
                .unwrap_or_default()
        };
        match self.indices.get(i) {
            Some(&[a, b, c]) => [lookup(a), lookup(b), lookup(c)],
            None => [Vec2::default(); 3],
        }
    }

    /// Normal of one triangle: the stored one, or computed from its winding
    pub fn face_normal(&self, i: usize) -> Option<Vec3> {
        if let Some(normal) = self.face_normals.as_ref().and_then(|n| n.get(i)) {
            return Some(*normal);
        }
        let [v0, v1, v2] = self.triangle(i)?;
        Some((v2 - v0).cross(v1 - v0).normalize())
    }

    /// Fill `face_normals` from the winding of every triangle
    pub fn compute_face_normals(&mut self) {
        self.face_normals = None;
        let normals = (0..self.indices.len())
            .map(|i| self.face_normal(i).unwrap_or(Vec3::ZERO))
            .collect();
        self.face_normals = Some(normals);
    }

    /// Every distinct triangle edge, for wireframe drawing
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .indices
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
            .map(|(a, b)| if a < b { (a, b) } else { (b, a) })
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }
}

/// A 2x2x2 cube centered on the origin, four vertices per face so every
/// face gets the full texture.
pub fn create_test_cube() -> Mesh {
    let positions = vec![
        // Front face
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        // Back face
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        // Top face
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, -1.0),
        // Bottom face
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        // Right face
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        // Left face
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, -1.0),
    ];

    let uvs = [
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 0.0),
    ];

    let mut tex_coords = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(12);
    for face in 0..6 {
        let base = face * 4;
        tex_coords.extend_from_slice(&uvs);
        // Face corners are counter-clockwise seen from outside; the
        // projection flips y, so the triangles are listed the other way
        indices.push([base, base + 2, base + 1]);
        indices.push([base, base + 3, base + 2]);
    }

    let mut mesh = Mesh::new(positions, indices).with_tex_coords(tex_coords);
    mesh.compute_face_normals();
    mesh
}

//! Draw-call orchestration
//!
//! Every draw call runs the same pipeline: model-view transform, near-plane
//! test and clip in camera space, projection, winding cull, viewport clip
//! (only when a vertex falls outside), fan triangulation, scan conversion.

use super::clip::{self, ClipPolygon, ClipVertex};
use super::cull;
use super::framebuffer::Framebuffer;
use super::line;
use super::line_clip;
use super::math::{Mat4, Vec3};
use super::mesh::Mesh;
use super::near::{NearPlane, NearVertex, Side};
use super::project::Projector;
use super::scan;
use super::types::{Color, CullFace, RenderConfig, Texture, Vertex};
use super::viewport::Viewport;

/// Ambient term of the Lambert shading used by `Material::Lit`
const AMBIENT: f32 = 0.15;

/// Errors raised when building a render context
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    EmptyFramebuffer { width: usize, height: usize },
    ViewportOutOfBounds { viewport: Viewport, width: usize, height: usize },
    InvalidNearPlane(f32),
    InvalidFocalLength { x: f32, y: f32 },
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::EmptyFramebuffer { width, height } => {
                write!(f, "Framebuffer size {}x{} is empty", width, height)
            }
            RenderError::ViewportOutOfBounds { viewport, width, height } => write!(
                f,
                "Viewport ({}, {})-({}, {}) does not fit a {}x{} framebuffer",
                viewport.min_x, viewport.min_y, viewport.max_x, viewport.max_y, width, height
            ),
            RenderError::InvalidNearPlane(z) => {
                write!(f, "Near plane z must be negative and finite, got {}", z)
            }
            RenderError::InvalidFocalLength { x, y } => {
                write!(f, "Focal lengths must be positive and finite, got ({}, {})", x, y)
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// How `draw_mesh` colors triangles
#[derive(Debug, Clone, Copy)]
pub enum Material<'a> {
    Solid(Color),
    /// Per-face Lambert shading; `light_dir` points towards the light in camera space
    Lit { color: Color, light_dir: Vec3 },
    Textured(&'a Texture),
}

/// Calculate shading intensity for a normal
fn shade_intensity(normal: Vec3, light_dir: Vec3) -> f32 {
    let diffuse = normal.dot(light_dir).max(0.0);
    (AMBIENT + (1.0 - AMBIENT) * diffuse).clamp(0.0, 1.0)
}

/// Geometry that can go through the whole triangle pipeline
trait PipelineVertex: NearVertex + ClipVertex {
    fn project(&self, projector: &Projector) -> Self;
}

impl PipelineVertex for Vec3 {
    fn project(&self, projector: &Projector) -> Self {
        projector.project(*self)
    }
}

impl PipelineVertex for Vertex {
    fn project(&self, projector: &Projector) -> Self {
        projector.project_vertex(*self)
    }
}

/// Owns the buffers and the configuration every draw call reads
pub struct RenderContext {
    pub framebuffer: Framebuffer,
    config: RenderConfig,
    projector: Projector,
    near: NearPlane,
}

impl RenderContext {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        let (width, height) = (config.width, config.height);
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyFramebuffer { width, height });
        }
        if !config.viewport.fits(width, height) {
            return Err(RenderError::ViewportOutOfBounds { viewport: config.viewport, width, height });
        }
        if !(config.near_plane_z < 0.0) || !config.near_plane_z.is_finite() {
            return Err(RenderError::InvalidNearPlane(config.near_plane_z));
        }
        let p = &config.projection;
        let focal_ok = |f: f32| f > 0.0 && f.is_finite();
        if !focal_ok(p.focal_x) || !focal_ok(p.focal_y) {
            return Err(RenderError::InvalidFocalLength { x: p.focal_x, y: p.focal_y });
        }

        log::info!(
            "Render context {}x{}, viewport ({}, {})-({}, {}), near z {}",
            width,
            height,
            config.viewport.min_x,
            config.viewport.min_y,
            config.viewport.max_x,
            config.viewport.max_y,
            config.near_plane_z,
        );
        log::debug!("Render config: {:?}", config);

        Ok(Self {
            framebuffer: Framebuffer::new(width, height),
            projector: Projector::new(config.projection, config.vertex_snap),
            near: NearPlane::new(config.near_plane_z),
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.config.viewport
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn cull_face(&self) -> CullFace {
        self.config.cull_face
    }

    pub fn set_cull_face(&mut self, cull_face: CullFace) {
        if cull_face != self.config.cull_face {
            log::debug!("Cull face {:?} -> {:?}", self.config.cull_face, cull_face);
        }
        self.config.cull_face = cull_face;
    }

    /// Fill the color buffer
    pub fn clear(&mut self, color: Color) {
        self.framebuffer.clear(color);
    }

    /// Reset every depth value to far
    pub fn clear_depth(&mut self) {
        self.framebuffer.clear_depth();
    }

    /// Flat-colored triangle in camera space
    pub fn draw_triangle(&mut self, p1: Vec3, p2: Vec3, p3: Vec3, color: Color) {
        let color = color.to_u32();
        self.camera_triangle([p1, p2, p3], &mut |fb: &mut Framebuffer, vp: &Viewport, [a, b, c]: [Vec3; 3]| {
            scan::fill_triangle(fb, vp, a, b, c, color)
        });
    }

    /// Perspective-correct textured triangle in camera space
    pub fn draw_textured_triangle(&mut self, v1: Vertex, v2: Vertex, v3: Vertex, texture: &Texture) {
        let sampling = self.config.sampling;
        self.camera_triangle([v1, v2, v3], &mut |fb: &mut Framebuffer, vp: &Viewport, [a, b, c]: [Vertex; 3]| {
            scan::fill_textured_triangle(fb, vp, a, b, c, texture, sampling)
        });
    }

    /// Depth-tested line between two camera-space points
    pub fn draw_line(&mut self, start: Vec3, end: Vec3, color: Color) {
        if !start.is_finite() || !end.is_finite() {
            log::trace!("skipping non-finite line {:?} -> {:?}", start, end);
            return;
        }
        let Some((a, b)) = self.near.clip_segment(start, end) else {
            return;
        };
        let a = self.projector.project(a);
        let b = self.projector.project(b);
        self.draw_screen_line(a, b, color);
    }

    /// Flat triangle already in screen space (`z` = camera depth). Still
    /// culled, viewport clipped and depth tested.
    pub fn fill_triangle(&mut self, p1: Vec3, p2: Vec3, p3: Vec3, color: Color) {
        if ![p1, p2, p3].iter().all(|p| p.is_finite()) {
            log::trace!("skipping non-finite screen triangle");
            return;
        }
        let color = color.to_u32();
        self.screen_triangle([p1, p2, p3], &mut |fb: &mut Framebuffer, vp: &Viewport, [a, b, c]: [Vec3; 3]| {
            scan::fill_triangle(fb, vp, a, b, c, color)
        });
    }

    /// Depth-tested line already in screen space
    pub fn draw_screen_line(&mut self, start: Vec3, end: Vec3, color: Color) {
        if let Some((a, b)) = line_clip::clip_line(start, end, &self.config.viewport) {
            line::draw_line(&mut self.framebuffer, a, b, color.to_u32());
        }
    }

    /// Screen-space line drawn over everything, depth untouched
    pub fn draw_overlay_line(&mut self, start: Vec3, end: Vec3, color: Color) {
        if let Some((a, b)) = line_clip::clip_line(start, end, &self.config.viewport) {
            line::draw_line_overlay(&mut self.framebuffer, a, b, color.to_u32());
        }
    }

    /// Draw every triangle of a mesh, transformed into camera space by `model_view`
    pub fn draw_mesh(&mut self, mesh: &Mesh, model_view: &Mat4, material: Material) {
        let normal_matrix = model_view.normal_matrix();

        for i in 0..mesh.triangle_count() {
            let Some(tri) = mesh.triangle(i) else {
                log::trace!("triangle {} has an index out of range", i);
                continue;
            };
            let [p1, p2, p3] = tri.map(|p| model_view.transform_point(p));

            match material {
                Material::Solid(color) => self.draw_triangle(p1, p2, p3, color),
                Material::Lit { color, light_dir } => {
                    let normal = mesh
                        .face_normal(i)
                        .map(|n| normal_matrix.transform_direction(n).normalize())
                        .unwrap_or(Vec3::ZERO);
                    let intensity = shade_intensity(normal, light_dir.normalize());
                    self.draw_triangle(p1, p2, p3, color.shade(intensity));
                }
                Material::Textured(texture) => {
                    let [uv1, uv2, uv3] = mesh.triangle_uvs(i);
                    self.draw_textured_triangle(
                        Vertex::new(p1, uv1),
                        Vertex::new(p2, uv2),
                        Vertex::new(p3, uv3),
                        texture,
                    );
                }
            }
        }
    }

    /// Wireframe: every distinct edge of the mesh as a depth-tested line
    pub fn draw_mesh_edges(&mut self, mesh: &Mesh, model_view: &Mat4, color: Color) {
        for (a, b) in mesh.edges() {
            if let (Some(&pa), Some(&pb)) = (mesh.positions.get(a), mesh.positions.get(b)) {
                self.draw_line(model_view.transform_point(pa), model_view.transform_point(pb), color);
            }
        }
    }

    fn camera_triangle<V, F>(&mut self, tri: [V; 3], raster: &mut F)
    where
        V: PipelineVertex,
        F: FnMut(&mut Framebuffer, &Viewport, [V; 3]),
    {
        if !tri.iter().all(|v| v.position().is_finite()) {
            log::trace!("skipping non-finite triangle");
            return;
        }

        let projector = self.projector;
        match self.near.classify(&tri) {
            Side::Behind => {}
            Side::Front => {
                self.screen_triangle(tri.map(|v| v.project(&projector)), raster);
            }
            Side::Straddling => {
                let clipped: ClipPolygon<V> = self
                    .near
                    .clip_polygon(&tri)
                    .iter()
                    .map(|v| v.project(&projector))
                    .collect();
                for part in clip::fan(&clipped) {
                    self.screen_triangle(part, raster);
                }
            }
        }
    }

    fn screen_triangle<V, F>(&mut self, tri: [V; 3], raster: &mut F)
    where
        V: ClipVertex,
        F: FnMut(&mut Framebuffer, &Viewport, [V; 3]),
    {
        let [p1, p2, p3] = tri.map(|v| v.position());
        if !cull::is_visible(p1, p2, p3, self.config.cull_face) {
            return;
        }

        let vp = self.config.viewport;
        if [p1, p2, p3].iter().all(|p| vp.contains(*p)) {
            raster(&mut self.framebuffer, &vp, tri);
            return;
        }

        let clipped = clip::clip_polygon(&tri, &vp);
        for part in clip::fan(&clipped) {
            raster(&mut self.framebuffer, &vp, part);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::mesh::create_test_cube;
    use crate::rasterizer::types::ProjectionSettings;

    fn context() -> RenderContext {
        RenderContext::new(RenderConfig::default()).unwrap()
    }

    fn count(ctx: &RenderContext, color: Color) -> usize {
        let c = color.to_u32();
        ctx.framebuffer.pixels.iter().filter(|&&p| p == c).count()
    }

    #[test]
    fn test_new_validates_config() {
        let bad_viewport = RenderConfig { viewport: Viewport::new(0, 0, 320, 199), ..Default::default() };
        assert!(matches!(RenderContext::new(bad_viewport), Err(RenderError::ViewportOutOfBounds { .. })));

        let bad_near = RenderConfig { near_plane_z: 0.5, ..Default::default() };
        assert_eq!(RenderContext::new(bad_near).err(), Some(RenderError::InvalidNearPlane(0.5)));

        let empty = RenderConfig { width: 0, ..Default::default() };
        assert!(matches!(RenderContext::new(empty), Err(RenderError::EmptyFramebuffer { .. })));

        let bad_focal = RenderConfig {
            projection: ProjectionSettings { focal_x: 0.0, ..Default::default() },
            ..Default::default()
        };
        let err = RenderContext::new(bad_focal).err().unwrap();
        assert!(err.to_string().contains("Focal"));
    }

    #[test]
    fn test_triangle_in_front_is_drawn_and_behind_is_not() {
        let mut ctx = context();
        // Clockwise in camera space (y up) projects to positive area
        ctx.draw_triangle(Vec3::new(-1.0, -1.0, -5.0), Vec3::new(0.0, 1.0, -5.0), Vec3::new(1.0, -1.0, -5.0), Color::RED);
        assert!(count(&ctx, Color::RED) > 0);

        let mut ctx = context();
        ctx.draw_triangle(Vec3::new(-1.0, -1.0, 5.0), Vec3::new(0.0, 1.0, 5.0), Vec3::new(1.0, -1.0, 5.0), Color::RED);
        assert_eq!(count(&ctx, Color::RED), 0);
    }

    #[test]
    fn test_non_finite_triangle_is_skipped() {
        let mut ctx = context();
        ctx.draw_triangle(Vec3::new(f32::NAN, -1.0, -5.0), Vec3::new(0.0, 1.0, -5.0), Vec3::new(1.0, -1.0, -5.0), Color::RED);
        ctx.fill_triangle(Vec3::new(0.0, 0.0, -1.0), Vec3::new(f32::INFINITY, 0.0, -1.0), Vec3::new(0.0, 10.0, -1.0), Color::RED);
        assert_eq!(count(&ctx, Color::RED), 0);
        assert!(ctx.framebuffer.depth.iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_cube_shows_front_or_back_faces_by_cull_mode() {
        let cube = create_test_cube();
        let model_view = Mat4::translation(0.0, 0.0, -6.0);
        let light_dir = Vec3::new(0.0, 0.0, 1.0);
        let material = Material::Lit { color: Color::WHITE, light_dir };

        let mut ctx = context();
        ctx.draw_mesh(&cube, &model_view, material);
        // Front face at z = -5 faces the light
        assert_eq!(ctx.framebuffer.get_pixel(160, 100), Some(Color::WHITE.to_u32()));
        assert_eq!(ctx.framebuffer.depth_at(160, 100), Some(1.0 / -5.0));

        let mut ctx = context();
        ctx.set_cull_face(CullFace::Front);
        ctx.draw_mesh(&cube, &model_view, material);
        // Inside of the back face at z = -7, lit by ambient only
        let ambient = Color::WHITE.shade(shade_intensity(Vec3::new(0.0, 0.0, -1.0), light_dir));
        assert_eq!(ctx.framebuffer.get_pixel(160, 100), Some(ambient.to_u32()));
        assert!((ctx.framebuffer.depth_at(160, 100).unwrap() - 1.0 / -7.0).abs() < 1e-6);
    }

    #[test]
    fn test_textured_cube_samples_texture() {
        let cube = create_test_cube();
        let texture = Texture::checkerboard(8, 8, Color::RED, Color::BLUE);
        let mut ctx = context();
        ctx.draw_mesh(&cube, &Mat4::translation(0.0, 0.0, -6.0), Material::Textured(&texture));
        let drawn = count(&ctx, Color::RED) + count(&ctx, Color::BLUE);
        assert!(drawn > 1000);
        assert_eq!(drawn, ctx.framebuffer.depth.iter().filter(|d| d.is_finite()).count());
    }

    #[test]
    fn test_near_clipped_silhouette_follows_clipped_polygon() {
        let config = RenderConfig { vertex_snap: false, ..Default::default() };
        let mut ctx = RenderContext::new(config).unwrap();

        let a = Vec3::new(-2.0, -1.0, -3.0);
        let b = Vec3::new(2.0, -1.0, -3.0);
        let c = Vec3::new(0.0, 1.5, 0.5);
        ctx.draw_triangle(a, c, b, Color::GREEN);

        let near = NearPlane::new(ctx.config().near_plane_z);
        let polygon: Vec<Vec3> = near.clip_polygon(&[a, c, b]).iter().map(|p| ctx.projector().project(*p)).collect();
        assert_eq!(polygon.len(), 4);
        assert!(cull::signed_area2(&polygon) > 0.0);

        // Signed distance to each edge, positive inside
        let inside_by = |x: f32, y: f32| {
            (0..polygon.len())
                .map(|i| {
                    let p = polygon[i];
                    let q = polygon[(i + 1) % polygon.len()];
                    let (ex, ey) = (q.x - p.x, q.y - p.y);
                    (ex * (y - p.y) - ey * (x - p.x)) / (ex * ex + ey * ey).sqrt()
                })
                .fold(f32::INFINITY, f32::min)
        };

        let green = Color::GREEN.to_u32();
        let mut drawn = 0;
        for y in 0..200 {
            for x in 0..320 {
                let d = inside_by(x as f32, y as f32);
                let lit = ctx.framebuffer.get_pixel(x, y) == Some(green);
                if lit {
                    drawn += 1;
                    assert!(d >= -0.5 - 1e-3, "pixel ({}, {}) is {} outside", x, y, -d);
                } else {
                    assert!(d <= 0.5 + 1e-3, "pixel ({}, {}) is {} inside but empty", x, y, d);
                }
            }
        }
        assert!(drawn > 0);
    }

    #[test]
    fn test_line_crossing_near_plane_and_viewport() {
        let mut ctx = context();
        // Starts off the left edge, crosses the near plane at x = 0.3
        ctx.draw_line(Vec3::new(-20.0, 0.0, -10.0), Vec3::new(4.36, 0.0, -0.04), Color::WHITE);
        let drawn = count(&ctx, Color::WHITE);
        assert!(drawn > 150);
        assert_eq!(ctx.framebuffer.get_pixel(0, 100), Some(Color::WHITE.to_u32()));
        // All on the center row
        let row = (0..320).filter(|&x| ctx.framebuffer.get_pixel(x, 100) == Some(Color::WHITE.to_u32())).count();
        assert_eq!(row, drawn);
        assert!(ctx.framebuffer.depth.iter().all(|d| !d.is_nan()));
    }

    #[test]
    fn test_overlay_line_ignores_depth() {
        let mut ctx = context();
        ctx.fill_triangle(Vec3::new(0.0, 0.0, -1.0), Vec3::new(100.0, 0.0, -1.0), Vec3::new(0.0, 100.0, -1.0), Color::RED);
        ctx.draw_screen_line(Vec3::new(0.0, 10.0, -9.0), Vec3::new(40.0, 10.0, -9.0), Color::BLUE);
        assert_eq!(count(&ctx, Color::BLUE), 0);
        ctx.draw_overlay_line(Vec3::new(0.0, 10.0, -9.0), Vec3::new(40.0, 10.0, -9.0), Color::BLUE);
        assert_eq!(count(&ctx, Color::BLUE), 41);
    }

    #[test]
    fn test_wireframe_cube_draws_lines() {
        let cube = create_test_cube();
        let mut ctx = context();
        ctx.draw_mesh_edges(&cube, &Mat4::translation(0.0, 0.0, -6.0), Color::WHITE);
        assert!(count(&ctx, Color::WHITE) > 100);
    }

    #[test]
    fn test_clear_keeps_depth_until_cleared() {
        let mut ctx = context();
        ctx.fill_triangle(Vec3::new(0.0, 0.0, -1.0), Vec3::new(10.0, 0.0, -1.0), Vec3::new(0.0, 10.0, -1.0), Color::RED);
        ctx.clear(Color::BLACK);
        ctx.fill_triangle(Vec3::new(0.0, 0.0, -3.0), Vec3::new(10.0, 0.0, -3.0), Vec3::new(0.0, 10.0, -3.0), Color::BLUE);
        assert_eq!(count(&ctx, Color::BLUE), 0);
        ctx.clear_depth();
        ctx.fill_triangle(Vec3::new(0.0, 0.0, -3.0), Vec3::new(10.0, 0.0, -3.0), Vec3::new(0.0, 10.0, -3.0), Color::BLUE);
        assert!(count(&ctx, Color::BLUE) > 0);
    }
}

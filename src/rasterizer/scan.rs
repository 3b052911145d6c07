//! Triangle scan conversion with a reciprocal-depth buffer
//!
//! Edge walking: vertices are sorted by y and the triangle is filled as a
//! flat-bottom half, a flat-top half, or both (split at the middle vertex).
//! Along each edge x, 1/z, u/z and v/z vary linearly in y; along each span
//! they vary linearly in x. Textured pixels recover (u, v) by multiplying
//! with the re-interpolated z.
//!
//! Fill rule: rows `ceil(y_top) .. ceil(y_bottom)`, pixels
//! `round(x_left) .. round(x_right)`. Edge x is evaluated from the edge's own
//! endpoints at each row, so two triangles sharing an edge agree on where
//! it is and neither leaves a gap nor overdraws.

use std::ops::{Add, Mul, Sub};
use super::framebuffer::Framebuffer;
use super::math::{round_half_up, Vec2, Vec3};
use super::types::{Sampling, Texture, Vertex};
use super::viewport::Viewport;

/// What a covered pixel gets
#[derive(Clone, Copy)]
pub enum Shade<'a> {
    Flat(u32),
    Textured { texture: &'a Texture, sampling: Sampling },
}

/// Quantities interpolated linearly in screen space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Varying {
    x: f32,
    /// 1/z
    w: f32,
    /// u/z
    uw: f32,
    /// v/z
    vw: f32,
}

impl Varying {
    fn new(pos: Vec3, uv: Vec2) -> Self {
        let w = 1.0 / pos.z;
        Self { x: pos.x, w, uw: uv.x * w, vw: uv.y * w }
    }
}

impl Add for Varying {
    type Output = Varying;
    fn add(self, o: Varying) -> Varying {
        Varying { x: self.x + o.x, w: self.w + o.w, uw: self.uw + o.uw, vw: self.vw + o.vw }
    }
}

impl Sub for Varying {
    type Output = Varying;
    fn sub(self, o: Varying) -> Varying {
        Varying { x: self.x - o.x, w: self.w - o.w, uw: self.uw - o.uw, vw: self.vw - o.vw }
    }
}

impl Mul<f32> for Varying {
    type Output = Varying;
    fn mul(self, s: f32) -> Varying {
        Varying { x: self.x * s, w: self.w * s, uw: self.uw * s, vw: self.vw * s }
    }
}

/// Screen-space corner with its varyings
#[derive(Debug, Clone, Copy)]
struct Corner {
    y: f32,
    v: Varying,
}

impl Corner {
    fn new(pos: Vec3, uv: Vec2) -> Self {
        Self { y: pos.y, v: Varying::new(pos, uv) }
    }
}

/// A non-horizontal edge, top to bottom
struct Edge {
    top_y: f32,
    top: Varying,
    step: Varying,
}

impl Edge {
    /// `top.y < bottom.y` is guaranteed by the callers
    fn new(top: Corner, bottom: Corner) -> Self {
        let step = (bottom.v - top.v) * (1.0 / (bottom.y - top.y));
        Self { top_y: top.y, top: top.v, step }
    }

    #[inline]
    fn at(&self, row: f32) -> Varying {
        self.top + self.step * (row - self.top_y)
    }
}

struct Rasterizer<'a, 'b> {
    fb: &'a mut Framebuffer,
    vp: Viewport,
    shade: Shade<'b>,
}

impl Rasterizer<'_, '_> {
    /// Fill the rows of `[y_top, y_bottom)` between two edges
    fn fill_half(&mut self, left: &Edge, right: &Edge, y_top: f32, y_bottom: f32) {
        let first = (y_top.ceil() as i32).max(self.vp.min_y);
        let end = (y_bottom.ceil() as i32).min(self.vp.max_y + 1);

        for row in first..end {
            let y = row as f32;
            let l = left.at(y);
            let r = right.at(y);
            self.span(row, l, r);
        }
    }

    fn span(&mut self, row: i32, l: Varying, r: Varying) {
        let width = r.x - l.x;
        if !(width > 0.0) {
            return;
        }
        let step = (r - l) * (1.0 / width);

        let start = (round_half_up(l.x) as i32).max(self.vp.min_x);
        let end = (round_half_up(r.x) as i32).min(self.vp.max_x + 1);
        if start >= end {
            return;
        }

        let row_base = row as usize * self.fb.width;
        for px in start..end {
            let v = l + step * (px as f32 - l.x);
            let idx = row_base + px as usize;
            if v.w < self.fb.depth[idx] {
                let color = match self.shade {
                    Shade::Flat(color) => color,
                    Shade::Textured { texture, sampling } => {
                        let z = 1.0 / v.w;
                        texture.sample(v.uw * z, v.vw * z, sampling)
                    }
                };
                self.fb.test_and_write(idx, v.w, color);
            }
        }
    }

    /// Sorted corners `a.y <= b.y <= c.y`
    fn triangle(&mut self, a: Corner, b: Corner, c: Corner) {
        if a.y == c.y {
            // Zero height
            return;
        }

        if b.y == c.y {
            // Flat bottom, apex on top
            let (l, r) = if b.v.x <= c.v.x { (b, c) } else { (c, b) };
            self.fill_half(&Edge::new(a, l), &Edge::new(a, r), a.y, c.y);
        } else if a.y == b.y {
            // Flat top
            let (l, r) = if a.v.x <= b.v.x { (a, b) } else { (b, a) };
            self.fill_half(&Edge::new(l, c), &Edge::new(r, c), a.y, c.y);
        } else {
            let long = Edge::new(a, c);
            let upper = Edge::new(a, b);
            let lower = Edge::new(b, c);
            let split_x = long.at(b.y).x;
            if split_x > b.v.x {
                // Long edge on the right
                self.fill_half(&upper, &long, a.y, b.y);
                self.fill_half(&lower, &long, b.y, c.y);
            } else {
                // Long edge on the left
                self.fill_half(&long, &upper, a.y, b.y);
                self.fill_half(&long, &lower, b.y, c.y);
            }
        }
    }
}

/// Viewport bounds the rasterizer may touch: the viewport cut to the buffer
fn effective_viewport(fb: &Framebuffer, vp: &Viewport) -> Option<Viewport> {
    let clamped = Viewport::new(
        vp.min_x.max(0),
        vp.min_y.max(0),
        vp.max_x.min(fb.width as i32 - 1),
        vp.max_y.min(fb.height as i32 - 1),
    );
    (!clamped.is_empty()).then_some(clamped)
}

fn is_drawable(pos: Vec3) -> bool {
    pos.is_finite() && pos.z != 0.0
}

fn sort_by_y(mut corners: [Corner; 3]) -> [Corner; 3] {
    if corners[0].y > corners[2].y {
        corners.swap(0, 2);
    }
    if corners[0].y > corners[1].y {
        corners.swap(0, 1);
    }
    if corners[1].y > corners[2].y {
        corners.swap(1, 2);
    }
    corners
}

fn rasterize(fb: &mut Framebuffer, vp: &Viewport, corners: [Corner; 3], shade: Shade) {
    let Some(vp) = effective_viewport(fb, vp) else {
        return;
    };
    let [a, b, c] = sort_by_y(corners);
    let mut raster = Rasterizer { fb, vp, shade };
    raster.triangle(a, b, c);
}

/// Fill a screen-space triangle with one color.
///
/// `z` of each point is the camera-space depth; its reciprocal is what gets
/// interpolated and depth tested. Degenerate or non-finite input writes
/// nothing.
pub fn fill_triangle(fb: &mut Framebuffer, vp: &Viewport, p1: Vec3, p2: Vec3, p3: Vec3, color: u32) {
    if ![p1, p2, p3].into_iter().all(is_drawable) {
        log::trace!("skipping non-finite triangle {:?} {:?} {:?}", p1, p2, p3);
        return;
    }
    let uv = Vec2::default();
    let corners = [Corner::new(p1, uv), Corner::new(p2, uv), Corner::new(p3, uv)];
    rasterize(fb, vp, corners, Shade::Flat(color));
}

/// Fill a screen-space triangle with perspective-correct texture mapping
pub fn fill_textured_triangle(
    fb: &mut Framebuffer,
    vp: &Viewport,
    v1: Vertex,
    v2: Vertex,
    v3: Vertex,
    texture: &Texture,
    sampling: Sampling,
) {
    let finite_uv = [v1, v2, v3].iter().all(|v| v.uv.x.is_finite() && v.uv.y.is_finite());
    if ![v1.pos, v2.pos, v3.pos].into_iter().all(is_drawable) || !finite_uv {
        log::trace!("skipping non-finite textured triangle");
        return;
    }
    let corners = [
        Corner::new(v1.pos, v1.uv),
        Corner::new(v2.pos, v2.uv),
        Corner::new(v3.pos, v3.uv),
    ];
    rasterize(fb, vp, corners, Shade::Textured { texture, sampling });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::clip::{clip_polygon, fan};
    use crate::rasterizer::types::Color;

    fn setup() -> (Framebuffer, Viewport) {
        (Framebuffer::new(320, 200), Viewport::full(320, 200))
    }

    fn covered(fb: &Framebuffer, color: u32) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..fb.height {
            for x in 0..fb.width {
                if fb.get_pixel(x, y) == Some(color) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_flat_top_triangle_pixels() {
        let (mut fb, vp) = setup();
        let c = Color::RED.to_u32();
        fill_triangle(
            &mut fb,
            &vp,
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(10.0, 0.0, 1.0),
            Vec3::new(5.0, 10.0, 1.0),
            c,
        );

        let mut expected = Vec::new();
        for y in 0..10 {
            let yf = y as f32;
            let start = round_half_up(0.5 * yf) as usize;
            let end = round_half_up(10.0 - 0.5 * yf) as usize;
            for x in start..end {
                expected.push((x, y));
            }
        }
        let mut got = covered(&fb, c);
        got.sort_by_key(|&(x, y)| (y, x));
        assert_eq!(got, expected);
        assert_eq!(got.len(), 55);

        for &(x, y) in &got {
            assert_eq!(fb.depth_at(x, y), Some(1.0));
        }
        // Bottom vertex row is exclusive, right edge too
        assert_eq!(fb.get_pixel(5, 10), Some(Color::BLACK.to_u32()));
        assert_eq!(fb.get_pixel(10, 0), Some(Color::BLACK.to_u32()));
    }

    #[test]
    fn test_zero_height_writes_nothing() {
        let (mut fb, vp) = setup();
        let c = Color::RED.to_u32();
        fill_triangle(&mut fb, &vp, Vec3::new(0.0, 5.0, -1.0), Vec3::new(10.0, 5.0, -1.0), Vec3::new(20.0, 5.0, -1.0), c);
        assert!(covered(&fb, c).is_empty());
    }

    #[test]
    fn test_nan_and_zero_depth_write_nothing() {
        let (mut fb, vp) = setup();
        let c = Color::RED.to_u32();
        fill_triangle(&mut fb, &vp, Vec3::new(f32::NAN, 0.0, -1.0), Vec3::new(10.0, 0.0, -1.0), Vec3::new(5.0, 10.0, -1.0), c);
        fill_triangle(&mut fb, &vp, Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, -1.0), Vec3::new(5.0, 10.0, -1.0), c);
        assert!(covered(&fb, c).is_empty());
        assert!(fb.depth.iter().all(|d| *d == f32::INFINITY));
    }

    #[test]
    fn test_nearer_triangle_wins_in_any_order() {
        let near = Color::RED.to_u32();
        let far = Color::BLUE.to_u32();
        let tri = |z: f32| [Vec3::new(20.0, 20.0, z), Vec3::new(80.0, 20.0, z), Vec3::new(50.0, 70.0, z)];

        for order in [[(-2.0, near), (-5.0, far)], [(-5.0, far), (-2.0, near)]] {
            let (mut fb, vp) = setup();
            for (z, color) in order {
                let [a, b, c] = tri(z);
                fill_triangle(&mut fb, &vp, a, b, c, color);
            }
            assert_eq!(fb.get_pixel(50, 30), Some(near));
            assert_eq!(fb.depth_at(50, 30), Some(-0.5));
            assert!(covered(&fb, far).is_empty());
        }
    }

    /// `[start, end)` of the single run of `color` on row `y`
    fn row_span(fb: &Framebuffer, y: usize, color: u32) -> Option<(usize, usize)> {
        let xs: Vec<usize> = (0..fb.width).filter(|&x| fb.get_pixel(x, y) == Some(color)).collect();
        let (&first, &last) = (xs.first()?, xs.last()?);
        assert_eq!(xs.len(), last - first + 1, "row {} is not contiguous", y);
        Some((first, last + 1))
    }

    #[test]
    fn test_long_left_and_long_right_are_mirror_images() {
        // Mirror images around x = 100: the first has its long edge on the
        // left, the second on the right
        let (mut long_left, vp) = setup();
        let c = Color::GREEN.to_u32();
        fill_triangle(&mut long_left, &vp, Vec3::new(50.0, 10.0, -1.0), Vec3::new(90.0, 40.0, -1.0), Vec3::new(60.0, 90.0, -1.0), c);

        let (mut long_right, vp) = setup();
        fill_triangle(&mut long_right, &vp, Vec3::new(150.0, 10.0, -1.0), Vec3::new(110.0, 40.0, -1.0), Vec3::new(140.0, 90.0, -1.0), c);

        for y in 0..200 {
            let a = row_span(&long_left, y, c);
            let b = row_span(&long_right, y, c);
            assert_eq!(a.is_some(), b.is_some(), "row {} covered by only one triangle", y);
            if let (Some((s1, e1)), Some((s2, e2))) = (a, b) {
                // Each end may move by one pixel where it sits on a half pixel
                assert!((200 - e1 as i64 - s2 as i64).abs() <= 1, "row {}: {:?} vs {:?}", y, a, b);
                assert!((200 - s1 as i64 - e2 as i64).abs() <= 1, "row {}: {:?} vs {:?}", y, a, b);
            }
        }
        // Apex row has zero width, bottom row is exclusive
        assert!(row_span(&long_left, 10, c).is_none());
        assert_eq!(row_span(&long_left, 11, c), Some((50, 51)));
        assert_eq!(row_span(&long_right, 11, c), Some((149, 150)));
        assert!(row_span(&long_left, 90, c).is_none());
    }

    #[test]
    fn test_shared_edge_has_no_gaps_or_overlap() {
        let (mut fb, vp) = setup();
        let a = Vec3::new(10.3, 5.7, -1.0);
        let b = Vec3::new(130.6, 20.2, -1.0);
        let c = Vec3::new(40.1, 150.9, -1.0);
        let d = Vec3::new(170.4, 160.3, -1.0);
        let first = Color::RED.to_u32();
        let second = Color::BLUE.to_u32();
        fill_triangle(&mut fb, &vp, a, b, c, first);
        let first_count = covered(&fb, first).len();

        // Nearer, so any overlap would overwrite the first triangle
        let nearer = |p: Vec3| Vec3::new(p.x, p.y, -0.9);
        fill_triangle(&mut fb, &vp, nearer(b), nearer(d), nearer(c), second);
        assert_eq!(covered(&fb, first).len(), first_count, "second triangle overdrew the first");

        // Every row between the shared edge endpoints is continuous
        for y in 21..150 {
            let row: Vec<usize> = (0..320).filter(|&x| fb.get_pixel(x, y) != Some(Color::BLACK.to_u32())).collect();
            let (min, max) = (row[0], row[row.len() - 1]);
            assert_eq!(row.len(), max - min + 1, "gap in row {}", y);
        }
    }

    #[test]
    fn test_clipped_and_unclipped_match_inside_viewport() {
        let tri = [Vec3::new(30.2, 12.8, -3.0), Vec3::new(250.7, 60.1, -6.0), Vec3::new(90.4, 180.6, -2.0)];
        let c = Color::RED.to_u32();

        let (mut direct, vp) = setup();
        fill_triangle(&mut direct, &vp, tri[0], tri[1], tri[2], c);

        let (mut clipped, _) = setup();
        let polygon = clip_polygon(&tri, &vp);
        for [a, b, d] in fan(&polygon) {
            fill_triangle(&mut clipped, &vp, a, b, d, c);
        }

        assert_eq!(direct.pixels, clipped.pixels);
        assert_eq!(direct.depth, clipped.depth);
    }

    #[test]
    fn test_clipped_triangle_stays_in_viewport() {
        let mut fb = Framebuffer::new(320, 200);
        let vp = Viewport::new(100, 50, 199, 149);
        let c = Color::RED.to_u32();
        let tri = [Vec3::new(-500.0, -300.0, -2.0), Vec3::new(900.0, 0.0, -2.0), Vec3::new(150.0, 700.0, -2.0)];
        let polygon = clip_polygon(&tri, &vp);
        assert!(polygon.len() >= 3);
        for [a, b, d] in fan(&polygon) {
            fill_triangle(&mut fb, &vp, a, b, d, c);
        }
        let pixels = covered(&fb, c);
        assert_eq!(pixels.len(), 100 * 100);
        assert!(pixels.iter().all(|&(x, y)| (100..200).contains(&x) && (50..150).contains(&y)));
    }

    #[test]
    fn test_textured_affine_plane_samples_expected_texels() {
        // Constant depth: perspective-correct equals affine
        let (mut fb, vp) = setup();
        let mut tex = Texture::new(2, 1);
        tex.pixels = vec![Color::RED.to_u32(), Color::BLUE.to_u32()];

        let v = |x: f32, y: f32, u: f32| Vertex::new(Vec3::new(x, y, -2.0), Vec2::new(u, 0.0));
        fill_textured_triangle(&mut fb, &vp, v(0.0, 0.0, 0.0), v(100.0, 0.0, 1.0), v(0.0, 100.0, 0.0), &tex, Sampling::Nearest);

        assert_eq!(fb.get_pixel(10, 5), Some(Color::RED.to_u32()));
        assert_eq!(fb.get_pixel(80, 5), Some(Color::BLUE.to_u32()));
    }

    #[test]
    fn test_textured_is_perspective_correct() {
        // The right end is twice as far, so the screen midpoint maps to u = 1/3
        let (mut fb, vp) = setup();
        let mut tex = Texture::new(3, 1);
        tex.pixels = vec![Color::RED.to_u32(), Color::GREEN.to_u32(), Color::BLUE.to_u32()];

        let a = Vertex::new(Vec3::new(0.0, 0.0, -1.0), Vec2::new(0.0, 0.0));
        let b = Vertex::new(Vec3::new(120.0, 0.0, -2.0), Vec2::new(1.0, 0.0));
        let c = Vertex::new(Vec3::new(0.0, 60.0, -1.0), Vec2::new(0.0, 0.0));
        fill_textured_triangle(&mut fb, &vp, a, b, c, &tex, Sampling::Nearest);

        // x = 50 on row 0: u = (50/120 * -0.5) / (-1 + 50/120 * 0.5) ≈ 0.263 → texel 0
        assert_eq!(fb.get_pixel(50, 0), Some(Color::RED.to_u32()));
        // x = 70: u ≈ 0.41 → texel 1
        assert_eq!(fb.get_pixel(70, 0), Some(Color::GREEN.to_u32()));
    }
}

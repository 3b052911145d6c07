//! Screen-space line drawing (DDA)
//!
//! Segments are expected to be clipped already; every plotted pixel is
//! still bounds checked against the buffer.

use super::framebuffer::Framebuffer;
use super::math::{round_half_up, Vec3};

/// Step count and per-step increments for a segment
fn steps(start: Vec3, end: Vec3) -> (usize, f32, f32) {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = dx.abs().max(dy.abs());
    if length < 1.0 {
        return (0, 0.0, 0.0);
    }
    let n = length.ceil() as usize;
    (n, dx / n as f32, dy / n as f32)
}

fn plot_coords(fb: &Framebuffer, x: f32, y: f32) -> Option<usize> {
    let px = round_half_up(x);
    let py = round_half_up(y);
    if px < 0.0 || py < 0.0 {
        return None;
    }
    let (px, py) = (px as usize, py as usize);
    (px < fb.width && py < fb.height).then(|| fb.index(px, py))
}

/// Draw a depth-tested line. `z` of each endpoint is camera-space depth;
/// 1/z is interpolated along the segment like the triangle rasterizer does.
pub fn draw_line(fb: &mut Framebuffer, start: Vec3, end: Vec3, color: u32) {
    if !start.is_finite() || !end.is_finite() || start.z == 0.0 || end.z == 0.0 {
        return;
    }
    let (n, sx, sy) = steps(start, end);
    let w0 = 1.0 / start.z;
    let w1 = 1.0 / end.z;

    for i in 0..=n {
        let t = if n == 0 { 0.0 } else { i as f32 / n as f32 };
        let x = start.x + sx * i as f32;
        let y = start.y + sy * i as f32;
        if let Some(idx) = plot_coords(fb, x, y) {
            fb.test_and_write(idx, w0 + (w1 - w0) * t, color);
        }
    }
}

/// Draw a line over everything, leaving the depth buffer untouched
pub fn draw_line_overlay(fb: &mut Framebuffer, start: Vec3, end: Vec3, color: u32) {
    if !start.is_finite() || !end.is_finite() {
        return;
    }
    let (n, sx, sy) = steps(start, end);
    for i in 0..=n {
        let x = start.x + sx * i as f32;
        let y = start.y + sy * i as f32;
        if let Some(idx) = plot_coords(fb, x, y) {
            fb.pixels[idx] = color;
        }
    }
}

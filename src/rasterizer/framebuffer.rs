//! Color and depth buffers

use std::path::Path;
use super::types::Color;

/// Depth value of an empty pixel; every finite reciprocal depth is nearer
pub const DEPTH_FAR: f32 = f32::INFINITY;

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u32>,  // packed, see Color::to_u32
    pub depth: Vec<f32>,   // reciprocal depth, smaller is nearer
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![Color::BLACK.to_u32(); width * height],
            depth: vec![DEPTH_FAR; width * height],
            width,
            height,
        }
    }

    /// Fill the color buffer. Depth is left alone, see `clear_depth`.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.to_u32());
    }

    pub fn clear_depth(&mut self) {
        self.depth.fill(DEPTH_FAR);
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.pixels[idx] = color;
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[self.index(x, y)])
        } else {
            None
        }
    }

    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.depth[self.index(x, y)])
        } else {
            None
        }
    }

    /// Depth-tested write of reciprocal depth `w`. Returns true if the pixel was written.
    pub fn set_pixel_with_depth(&mut self, x: usize, y: usize, w: f32, color: u32) -> bool {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            return self.test_and_write(idx, w, color);
        }
        false
    }

    /// Depth test and write at a precomputed index. The caller has bounds-checked `idx`.
    #[inline]
    pub(crate) fn test_and_write(&mut self, idx: usize, w: f32, color: u32) -> bool {
        if w < self.depth[idx] {
            self.depth[idx] = w;
            self.pixels[idx] = color;
            return true;
        }
        false
    }

    /// Color buffer as RGBA bytes, ready for `Texture2D::from_rgba8`
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }

    /// Write the color buffer to an image file (format from the extension)
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
        image::save_buffer(
            path,
            &self.to_rgba_bytes(),
            self.width as u32,
            self.height as u32,
            image::ColorType::Rgba8,
        )
    }
}

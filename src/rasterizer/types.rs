//! Core types for the rasterizer

use serde::{Serialize, Deserialize};
use super::math::{Vec2, Vec3};
use super::viewport::Viewport;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Apply shading (multiply by intensity 0.0-1.0)
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * i) as u8,
            g: (self.g as f32 * i) as u8,
            b: (self.b as f32 * i) as u8,
            a: self.a,
        }
    }

    /// Pack as `a<<24 | b<<16 | g<<8 | r`, i.e. RGBA bytes in little-endian memory
    pub fn to_u32(self) -> u32 {
        ((self.a as u32) << 24) | ((self.b as u32) << 16) | ((self.g as u32) << 8) | (self.r as u32)
    }

    pub fn from_u32(packed: u32) -> Self {
        let [r, g, b, a] = packed.to_le_bytes();
        Self { r, g, b, a }
    }
}

/// A vertex: position plus texture coordinate, clipped in lockstep
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub pos: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(pos: Vec3, uv: Vec2) -> Self {
        Self { pos, uv }
    }
}

/// Texture filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sampling {
    #[default]
    Nearest,
    Bilinear,
}

/// Simple texture: row-major packed pixels addressed by `x + y * width`
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
    pub name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::WHITE.to_u32(); width * height],
            name: String::new(),
        }
    }

    /// Decode a texture from encoded image bytes (PNG, JPEG, BMP)
    pub fn from_bytes(bytes: &[u8], name: String) -> Result<Self, String> {
        use image::GenericImageView;

        let img = image::load_from_memory(bytes)
            .map_err(|e| format!("Failed to decode image: {}", e))?;

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(format!("Texture {} is empty", name));
        }
        let rgba = img.to_rgba8();

        let pixels: Vec<u32> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]).to_u32())
            .collect();

        Ok(Self {
            width: width as usize,
            height: height as usize,
            pixels,
            name,
        })
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 }.to_u32());
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    pub fn sample(&self, u: f32, v: f32, sampling: Sampling) -> u32 {
        match sampling {
            Sampling::Nearest => self.sample_nearest(u, v),
            Sampling::Bilinear => self.sample_bilinear(u, v),
        }
    }

    /// Nearest texel, coordinates clamped to the texture edge
    pub fn sample_nearest(&self, u: f32, v: f32) -> u32 {
        if self.pixels.is_empty() {
            return Color::BLACK.to_u32();
        }
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        // NaN casts to 0
        let tx = (u * self.width as f32).clamp(0.0, max_x) as usize;
        let ty = (v * self.height as f32).clamp(0.0, max_y) as usize;
        self.pixels[tx + ty * self.width]
    }

    /// Blend of the four neighbouring texels, clamped to the texture edge
    pub fn sample_bilinear(&self, u: f32, v: f32) -> u32 {
        if self.pixels.is_empty() {
            return Color::BLACK.to_u32();
        }
        let x = (u * self.width as f32).clamp(0.0, (self.width - 1) as f32);
        let y = (v * self.height as f32).clamp(0.0, (self.height - 1) as f32);

        let x0 = x as usize;
        let y0 = y as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let c00 = Color::from_u32(self.pixels[x0 + y0 * self.width]);
        let c10 = Color::from_u32(self.pixels[x1 + y0 * self.width]);
        let c01 = Color::from_u32(self.pixels[x0 + y1 * self.width]);
        let c11 = Color::from_u32(self.pixels[x1 + y1 * self.width]);

        let blend = |a: u8, b: u8, c: u8, d: u8| -> u8 {
            let top = a as f32 * (1.0 - fx) + b as f32 * fx;
            let bottom = c as f32 * (1.0 - fx) + d as f32 * fx;
            (top * (1.0 - fy) + bottom * fy) as u8
        };

        Color::with_alpha(
            blend(c00.r, c10.r, c01.r, c11.r),
            blend(c00.g, c10.g, c01.g, c11.g),
            blend(c00.b, c10.b, c01.b, c11.b),
            blend(c00.a, c10.a, c01.a, c11.a),
        )
        .to_u32()
    }
}

/// Which screen-space winding gets discarded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CullFace {
    /// Keep triangles with positive signed area
    #[default]
    Back,
    /// Keep triangles with negative signed area
    Front,
}

/// Pinhole projection parameters (screen = center + focal * xy / -z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSettings {
    pub focal_x: f32,
    pub focal_y: f32,
    pub center_x: f32,
    pub center_y: f32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            focal_x: 192.0,
            focal_y: 1.5 / 0.0078,
            center_x: 160.0,
            center_y: 100.0,
        }
    }
}

/// Rendering context configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Framebuffer width in pixels
    pub width: usize,
    /// Framebuffer height in pixels
    pub height: usize,
    /// Inclusive pixel rectangle everything is clipped to
    pub viewport: Viewport,
    /// Camera-space z of the near plane (camera looks down -Z, must be negative)
    pub near_plane_z: f32,
    pub projection: ProjectionSettings,
    pub cull_face: CullFace,
    pub sampling: Sampling,
    /// Round projected vertices to whole pixels
    pub vertex_snap: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: super::WIDTH,
            height: super::HEIGHT,
            viewport: Viewport::new(0, 0, super::WIDTH as i32 - 1, super::HEIGHT as i32 - 1),
            near_plane_z: -1.7,
            projection: ProjectionSettings::default(),
            cull_face: CullFace::Back,
            sampling: Sampling::Nearest,
            vertex_snap: true,
        }
    }
}

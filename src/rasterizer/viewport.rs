//! Viewport bounds
//!
//! An inclusive pixel rectangle. Passed explicitly to the clippers and the
//! scan converter so that every bound check reads the same configuration.

use serde::{Serialize, Deserialize};
use super::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Viewport {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Viewport covering a whole `width` x `height` surface
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width as i32 - 1, height as i32 - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    /// True when the rectangle lies inside a `width` x `height` buffer
    pub fn fits(&self, width: usize, height: usize) -> bool {
        !self.is_empty()
            && self.min_x >= 0
            && self.min_y >= 0
            && (self.max_x as i64) < width as i64
            && (self.max_y as i64) < height as i64
    }

    /// Whether a screen-space point needs no viewport clipping.
    /// Uses the same half-open bounds as the clip edges.
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min_x as f32
            && p.x < (self.max_x + 1) as f32
            && p.y >= self.min_y as f32
            && p.y < (self.max_y + 1) as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::full(super::WIDTH, super::HEIGHT)
    }
}

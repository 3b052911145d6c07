//! Software 3D rasterizer
//!
//! Pipeline per draw call:
//! - Near-plane clipping in camera space (Sutherland–Hodgman, one plane)
//! - Pinhole projection with optional vertex snapping
//! - Screen-space winding cull
//! - Viewport clipping (Sutherland–Hodgman for polygons, Cohen–Sutherland for lines)
//! - Scan conversion with a 1/z depth buffer and perspective-correct texturing

mod math;
mod types;
mod viewport;
mod framebuffer;
mod project;
mod cull;
mod clip;
mod line_clip;
mod near;
mod scan;
mod line;
mod mesh;
mod render;

pub use math::*;
pub use types::*;
pub use viewport::Viewport;
pub use framebuffer::{Framebuffer, DEPTH_FAR};
pub use project::Projector;
pub use cull::{is_visible, signed_area2};
pub use clip::{clip_polygon, fan, ClipEdge, ClipPolygon, ClipVertex};
pub use line_clip::{clip_line, region_code, Trivial};
pub use near::{NearPlane, NearVertex, Side};
pub use scan::{fill_textured_triangle, fill_triangle};
pub use line::{draw_line, draw_line_overlay};
pub use mesh::{create_test_cube, Mesh};
pub use render::*;

/// Default framebuffer size
pub const WIDTH: usize = 320;
pub const HEIGHT: usize = 200;

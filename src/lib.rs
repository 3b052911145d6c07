//! darkmatter: a software 3D rendering pipeline
//!
//! Clipping, projection, culling and scan conversion into an in-memory
//! color buffer with a reciprocal-depth buffer. See `rasterizer` for the
//! pipeline, `config` for RON configuration files.

pub mod config;
pub mod logging;
pub mod rasterizer;

//! GPU-free building blocks of the deferred renderer: the light array and its
//! motion law, the orbit camera, static geometry, the per-frame pass schedule,
//! runtime settings and a CPU reference of the lighting model.

pub mod camera;
pub mod frame;
pub mod geometry;
pub mod light;
pub mod settings;
pub mod shading;

//! Cubist engine crate.
//!
//! A small 3D engine for box-heavy scenes: pooled geometry (shapes and
//! colors packed into shared flat buffers), a registry of drawable
//! entities, and a renderer that replays the scene through a pluggable
//! GPU backend each frame. The platform pieces (window, device, timing)
//! live alongside so a viewer binary only wires a scene to the runtime.

pub mod core;
pub mod device;
pub mod logging;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;

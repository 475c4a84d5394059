//! Platform window + event loop.
//!
//! Hosts a single window with a continuously redrawn surface and drives the
//! [`App`](crate::core::App) callbacks from winit events. The surface borrow
//! (`Gpu<'w>` borrows its `Window`) is kept sound with a self-referencing
//! entry, so callers never juggle the window/GPU lifetimes themselves.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};

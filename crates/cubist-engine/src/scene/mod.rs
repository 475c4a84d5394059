//! Scene aggregation: pooled geometry and color data.
//!
//! Responsibilities:
//! - pack independently-authored shapes and colors into flat buffers with
//!   recorded sub-ranges ([`ShapeList`], [`ColorList`])
//! - describe renderable instances ([`Entity`]) by shape id + color id +
//!   transform
//! - generate primitive geometry ([`factory`])
//!
//! Lists are built during a single-threaded setup phase, handed to the
//! renderer at initialization, and read-only from then on.

mod color_list;
mod entity;
mod error;
mod shape;
mod shape_list;

pub mod factory;

pub use color_list::{ColorList, ColorRange, ColorVariant};
pub use entity::{Entity, EntityId};
pub use error::SceneError;
pub use shape::{ColorId, IndexRange, Rgba, Shape, ShapeId};
pub use shape_list::ShapeList;

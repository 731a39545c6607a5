//! Spherical photo menu: a grid of images wrapped around a sphere that the
//! user spins by dragging and that snaps the nearest image to the front.

pub use image;

pub mod atlas;
mod camera;
pub mod control;
mod engine;
mod geometry;
mod gfx;
pub mod headless;
mod item;
pub mod placement;
mod renderer;
mod scheduler;
mod tuning;

pub use camera::*;
pub use control::PointerEvent;
pub use engine::*;
pub use geometry::*;
pub use gfx::*;
pub use item::*;
pub use renderer::*;
pub use scheduler::*;
pub use tuning::*;

#[cfg(test)]
mod tests;

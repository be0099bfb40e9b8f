//! Software compositing engine and effects library for small LED pixel
//! matrices.
//!
//! Effects draw into a shared [`display::MatrixPixels`] with straight-alpha
//! source-over blending. An [`effects::EffectManager`] owns the stack and
//! drives it with a caller-supplied millisecond clock; the
//! [`effects::MatrixSfxSystem`] bundles a matrix, a manager and a random
//! source. Scenes can be described in JSON through [`config::SceneConfig`].

pub mod color;
pub mod config;
pub mod display;
pub mod effects;
pub mod error;
pub mod fixed;
pub mod geometry;
pub mod util;

pub use error::{Error, Result};

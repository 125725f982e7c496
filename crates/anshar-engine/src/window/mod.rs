//! Platform window + event loop.
//!
//! Owns the winit event loop, the window, and the GPU context bound to it,
//! and drives the application's per-frame callback.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};

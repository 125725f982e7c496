//! Anshar engine crate.
//!
//! Platform + GPU runtime for the scene viewer: window/event loop, device
//! and surface management, input tracking, first-person camera, frustum
//! culling, and the scene renderer.

pub mod camera;
pub mod console;
pub mod core;
pub mod device;
pub mod frustum;
pub mod input;
pub mod logging;
pub mod render;
pub mod shader;
pub mod time;
pub mod window;

//! Asset data for the anshar engine.
//!
//! Three pieces live here:
//! - the scene data model ([`scene`])
//! - the binary / compressed-binary scene file codec ([`codec`])
//! - the SQLite scene and shader database loader ([`db`])

pub mod codec;
pub mod db;
pub mod scene;

pub use codec::CodecError;
pub use db::{SceneDb, SceneDbError};
pub use scene::{ImageBlob, Material, Mesh, Scene, Vertex};

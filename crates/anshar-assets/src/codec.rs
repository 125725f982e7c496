//! Binary and compressed-binary scene files.
//!
//! The plain format is bincode over the [`Scene`](crate::Scene) structure;
//! the compressed format wraps the same bytes in a zlib stream. Conventional
//! extensions are `.bin` and `.bin.gz`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use thiserror::Error;

use crate::scene::Scene;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("scene file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("scene encode/decode: {0}")]
    Serde(#[from] bincode::Error),
}

impl Scene {
    /// Writes the scene as uncompressed bincode.
    pub fn to_binary_file(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)?;
        Ok(())
    }

    /// Reads a scene written by [`Scene::to_binary_file`].
    pub fn from_binary_file(path: impl AsRef<Path>) -> Result<Scene, CodecError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(bincode::deserialize_from(reader)?)
    }

    /// Writes the scene as zlib-compressed bincode.
    pub fn to_compressed_binary_file(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        let mut encoder = ZlibEncoder::new(writer, Compression::best());
        bincode::serialize_into(&mut encoder, self)?;
        encoder.finish()?;
        Ok(())
    }

    /// Reads a scene written by [`Scene::to_compressed_binary_file`].
    pub fn from_compressed_binary_file(path: impl AsRef<Path>) -> Result<Scene, CodecError> {
        let file = File::open(path)?;
        let decoder = ZlibDecoder::new(BufReader::new(file));
        Ok(bincode::deserialize_from(decoder)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{IDENTITY, Material, Mesh, Vertex};

    fn sample_scene() -> Scene {
        Scene {
            materials: vec![Material {
                name: "brushed".into(),
                diffuse: [0.6, 0.6, 0.7],
                diffuse_texture: Some("hull.png".into()),
            }],
            meshes: vec![Mesh {
                name: "Hull".into(),
                material_index: 0,
                vertices: vec![
                    Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
                    Vertex::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0]),
                    Vertex::new([0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 1.0]),
                ],
                center: [0.33, 0.0, 0.33],
                radius: 0.9,
                transform: IDENTITY,
            }],
            images: vec![crate::ImageBlob {
                name: "hull.png".into(),
                bytes: vec![1, 2, 3, 4],
            }],
        }
    }

    #[test]
    fn binary_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.bin");

        let scene = sample_scene();
        scene.to_binary_file(&path).unwrap();
        let loaded = Scene::from_binary_file(&path).unwrap();
        assert_eq!(scene, loaded);
    }

    #[test]
    fn compressed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.bin.gz");

        let scene = sample_scene();
        scene.to_compressed_binary_file(&path).unwrap();
        let loaded = Scene::from_compressed_binary_file(&path).unwrap();
        assert_eq!(scene, loaded);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Scene::from_binary_file("/nonexistent/scene.bin").unwrap_err();
        assert!(matches!(err, CodecError::Io(_)));
    }

    #[test]
    fn corrupt_compressed_file_is_serde_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin.gz");
        std::fs::write(&path, b"not a zlib stream at all").unwrap();

        let err = Scene::from_compressed_binary_file(&path).unwrap_err();
        assert!(matches!(err, CodecError::Serde(_)));
    }
}

use serde::{Deserialize, Serialize};

/// Interleaved vertex: position, normal, texture coordinate.
///
/// Field order and layout match the GPU vertex buffer layout used by the
/// renderer, so a mesh's vertex slice can be uploaded without repacking.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }
}

/// Surface appearance shared by meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Diffuse reflectance, linear RGB.
    pub diffuse: [f32; 3],
    /// Name of an [`ImageBlob`] in the owning scene; `None` renders with the
    /// generated white fallback texture.
    pub diffuse_texture: Option<String>,
}

/// An encoded image file (PNG/JPEG bytes) carried inside a scene.
///
/// Decoding happens on the engine side at upload time; the asset layer treats
/// the contents as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlob {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A named run of triangles with one material and a local transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    /// Index into [`Scene::materials`]. Validated by the loaders.
    pub material_index: usize,
    /// Unindexed triangle list.
    pub vertices: Vec<Vertex>,
    /// Bounding sphere center in mesh-local coordinates.
    pub center: [f32; 3],
    /// Bounding sphere radius, used for frustum culling.
    pub radius: f32,
    /// Column-major local transform applied at draw time.
    pub transform: [[f32; 4]; 4],
}

pub const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Geometry, materials, and texture images for one renderable scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub images: Vec<ImageBlob>,
}

impl Scene {
    /// Looks up a mesh by name.
    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.name == name)
    }

    /// Looks up a mesh by name for mutation (e.g. to update its transform).
    pub fn mesh_mut(&mut self, name: &str) -> Option<&mut Mesh> {
        self.meshes.iter_mut().find(|m| m.name == name)
    }

    /// Total vertex count across all meshes.
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    /// Checks that every mesh references an in-bounds material.
    ///
    /// Returns the name of the first offending mesh.
    pub fn validate_material_indices(&self) -> Result<(), &str> {
        for mesh in &self.meshes {
            if mesh.material_index >= self.materials.len() {
                return Err(&mesh.name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_scene() -> Scene {
        Scene {
            materials: vec![Material {
                name: "flat".into(),
                diffuse: [0.8, 0.2, 0.2],
                diffuse_texture: None,
            }],
            meshes: vec![Mesh {
                name: "Torus".into(),
                material_index: 0,
                vertices: vec![Vertex::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]); 3],
                center: [0.0; 3],
                radius: 1.0,
                transform: IDENTITY,
            }],
            images: vec![],
        }
    }

    #[test]
    fn mesh_lookup_by_name() {
        let scene = test_scene();
        assert!(scene.mesh("Torus").is_some());
        assert!(scene.mesh("torus").is_none());
    }

    #[test]
    fn mesh_mut_updates_transform() {
        let mut scene = test_scene();
        let mut m = IDENTITY;
        m[3][0] = 2.5;
        scene.mesh_mut("Torus").unwrap().transform = m;
        assert_eq!(scene.mesh("Torus").unwrap().transform[3][0], 2.5);
    }

    #[test]
    fn vertex_count_sums_meshes() {
        assert_eq!(test_scene().vertex_count(), 3);
    }

    #[test]
    fn validate_catches_bad_material_index() {
        let mut scene = test_scene();
        scene.meshes[0].material_index = 7;
        assert_eq!(scene.validate_material_indices(), Err("Torus"));
    }
}

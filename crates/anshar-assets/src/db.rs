//! SQLite asset databases.
//!
//! Two database layouts are understood:
//!
//! Scene databases:
//! - `vertex(px, py, pz, nx, ny, nz, tu, tv)` — the shared vertex pool
//! - `material(name, diffuse_r, diffuse_g, diffuse_b, diffuse_texname)`
//! - `scene_node(name, material_id, start_position, end_position, radius,
//!   center_x, center_y, center_z)` — one mesh per row, slicing the vertex
//!   pool by `[start_position, end_position)`; `material_id` is 1-based
//! - `texture(name, image)` — encoded image blobs
//!
//! Shader databases:
//! - `shader(id, name)` + `shader_source(shader_id, source)` — one WGSL
//!   module per shader name, both entry points in the same module

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use thiserror::Error;

use crate::scene::{IDENTITY, ImageBlob, Material, Mesh, Scene, Vertex};

#[derive(Debug, Error)]
pub enum SceneDbError {
    #[error("asset database not found: {0}")]
    NotFound(PathBuf),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database contains no vertices")]
    NoVertices,
    #[error("scene node {name:?}: material id {id} out of bounds ({materials} materials)")]
    MaterialOutOfBounds {
        name: String,
        id: i64,
        materials: usize,
    },
    #[error("scene node {name:?}: vertex range {start}..{end} out of bounds ({vertices} vertices)")]
    VertexRangeOutOfBounds {
        name: String,
        start: i64,
        end: i64,
        vertices: usize,
    },
    #[error("no shader named {0:?} in database")]
    UnknownShader(String),
}

/// One `scene_node` table row, before resolution against the vertex pool.
struct SceneNodeRow {
    name: String,
    material_id: i64,
    start_position: i64,
    end_position: i64,
    radius: f64,
    center: [f64; 3],
}

/// Read-only handle on a SQLite asset database.
#[derive(Debug)]
pub struct SceneDb {
    conn: Connection,
    path: PathBuf,
}

impl SceneDb {
    /// Opens an existing database, failing fast when the file is absent.
    ///
    /// SQLite would happily create an empty database at a mistyped path; the
    /// existence check turns that into a usable error instead.
    pub fn open(path: impl AsRef<Path>) -> Result<SceneDb, SceneDbError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SceneDbError::NotFound(path.to_path_buf()));
        }
        let conn = Connection::open(path)?;
        Ok(SceneDb {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full scene: vertex pool, materials, meshes, and textures.
    pub fn load_scene(&self) -> Result<Scene, SceneDbError> {
        let vertices = self.load_vertices()?;
        if vertices.is_empty() {
            return Err(SceneDbError::NoVertices);
        }

        let materials = self.load_materials()?;
        let meshes = self.load_meshes(&vertices, materials.len())?;
        let images = self.load_images()?;

        Ok(Scene {
            materials,
            meshes,
            images,
        })
    }

    /// Loads the WGSL module source for a named shader.
    pub fn load_shader(&self, name: &str) -> Result<String, SceneDbError> {
        let shader_id: i64 = self
            .conn
            .query_row(
                "SELECT id FROM shader WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    SceneDbError::UnknownShader(name.to_string())
                }
                other => SceneDbError::Sqlite(other),
            })?;

        let source: String = self.conn.query_row(
            "SELECT source FROM shader_source WHERE shader_id = ?1",
            params![shader_id],
            |row| row.get(0),
        )?;
        Ok(source)
    }

    fn load_vertices(&self) -> Result<Vec<Vertex>, SceneDbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT px, py, pz, nx, ny, nz, tu, tv FROM vertex")?;
        let rows = stmt.query_map([], |row| {
            let f = |i: usize| -> rusqlite::Result<f32> { Ok(row.get::<_, f64>(i)? as f32) };
            Ok(Vertex {
                position: [f(0)?, f(1)?, f(2)?],
                normal: [f(3)?, f(4)?, f(5)?],
                texcoord: [f(6)?, f(7)?],
            })
        })?;

        let mut vertices = Vec::new();
        for v in rows {
            vertices.push(v?);
        }
        Ok(vertices)
    }

    fn load_materials(&self) -> Result<Vec<Material>, SceneDbError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, diffuse_r, diffuse_g, diffuse_b, diffuse_texname FROM material",
        )?;
        let rows = stmt.query_map([], |row| {
            let texname: String = row.get(4)?;
            Ok(Material {
                name: row.get(0)?,
                diffuse: [
                    row.get::<_, f64>(1)? as f32,
                    row.get::<_, f64>(2)? as f32,
                    row.get::<_, f64>(3)? as f32,
                ],
                // The converter writes an empty string for untextured materials.
                diffuse_texture: (!texname.is_empty()).then_some(texname),
            })
        })?;

        let mut materials = Vec::new();
        for m in rows {
            materials.push(m?);
        }
        Ok(materials)
    }

    fn load_meshes(
        &self,
        vertices: &[Vertex],
        material_count: usize,
    ) -> Result<Vec<Mesh>, SceneDbError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, material_id, start_position, end_position, \
             radius, center_x, center_y, center_z FROM scene_node",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SceneNodeRow {
                name: row.get(0)?,
                material_id: row.get(1)?,
                start_position: row.get(2)?,
                end_position: row.get(3)?,
                radius: row.get(4)?,
                center: [row.get(5)?, row.get(6)?, row.get(7)?],
            })
        })?;

        let mut meshes = Vec::new();
        for node in rows {
            let node = node?;

            // material_id starts at 1 in the database.
            if node.material_id < 1 || node.material_id as usize > material_count {
                return Err(SceneDbError::MaterialOutOfBounds {
                    name: node.name,
                    id: node.material_id,
                    materials: material_count,
                });
            }

            let (start, end) = (node.start_position, node.end_position);
            if start < 0 || end < start || end as usize > vertices.len() {
                return Err(SceneDbError::VertexRangeOutOfBounds {
                    name: node.name,
                    start,
                    end,
                    vertices: vertices.len(),
                });
            }

            meshes.push(Mesh {
                name: node.name,
                material_index: node.material_id as usize - 1,
                vertices: vertices[start as usize..end as usize].to_vec(),
                center: [
                    node.center[0] as f32,
                    node.center[1] as f32,
                    node.center[2] as f32,
                ],
                radius: node.radius as f32,
                transform: IDENTITY,
            });
        }
        Ok(meshes)
    }

    fn load_images(&self) -> Result<Vec<ImageBlob>, SceneDbError> {
        let mut stmt = self.conn.prepare("SELECT name, image FROM texture")?;
        let rows = stmt.query_map([], |row| {
            Ok(ImageBlob {
                name: row.get(0)?,
                bytes: row.get(1)?,
            })
        })?;

        let mut images = Vec::new();
        for img in rows {
            images.push(img?);
        }
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates a scene database on disk with the standard layout.
    fn write_scene_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE vertex (px REAL, py REAL, pz REAL, nx REAL, ny REAL, nz REAL, tu REAL, tv REAL);
             CREATE TABLE material (name TEXT, diffuse_r REAL, diffuse_g REAL, diffuse_b REAL, diffuse_texname TEXT);
             CREATE TABLE scene_node (name TEXT, material_id INTEGER, start_position INTEGER, end_position INTEGER,
                                      radius REAL, center_x REAL, center_y REAL, center_z REAL);
             CREATE TABLE texture (name TEXT, image BLOB);",
        )
        .unwrap();

        for i in 0..6 {
            conn.execute(
                "INSERT INTO vertex VALUES (?1, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0)",
                params![i as f64],
            )
            .unwrap();
        }
        conn.execute(
            "INSERT INTO material VALUES ('stone', 0.5, 0.5, 0.5, '')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO material VALUES ('moss', 0.1, 0.7, 0.2, 'moss.png')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO scene_node VALUES ('Floor', 1, 0, 3, 2.0, 1.0, 0.0, 0.0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO scene_node VALUES ('Rock', 2, 3, 6, 0.5, 4.0, 0.0, 0.0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO texture VALUES ('moss.png', x'89504E47')",
            [],
        )
        .unwrap();
    }

    fn write_shader_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE shader (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE shader_source (shader_id INTEGER, source TEXT);",
        )
        .unwrap();
        conn.execute("INSERT INTO shader VALUES (1, 'default')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO shader_source VALUES (1, '@vertex fn vs_main() {}')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn open_missing_database_fails() {
        let err = SceneDb::open("/nonexistent/assets.db").unwrap_err();
        assert!(matches!(err, SceneDbError::NotFound(_)));
    }

    #[test]
    fn loads_scene_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.db");
        write_scene_db(&path);

        let scene = SceneDb::open(&path).unwrap().load_scene().unwrap();
        assert_eq!(scene.materials.len(), 2);
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.images.len(), 1);

        // material_id 1 maps to materials[0].
        let floor = scene.mesh("Floor").unwrap();
        assert_eq!(floor.material_index, 0);
        assert_eq!(floor.vertices.len(), 3);
        assert_eq!(floor.vertices[1].position[0], 1.0);
        assert_eq!(floor.radius, 2.0);

        // Untextured material maps to None.
        assert_eq!(scene.materials[0].diffuse_texture, None);
        assert_eq!(
            scene.materials[1].diffuse_texture.as_deref(),
            Some("moss.png")
        );
    }

    #[test]
    fn empty_vertex_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE vertex (px REAL, py REAL, pz REAL, nx REAL, ny REAL, nz REAL, tu REAL, tv REAL);
             CREATE TABLE material (name TEXT, diffuse_r REAL, diffuse_g REAL, diffuse_b REAL, diffuse_texname TEXT);
             CREATE TABLE scene_node (name TEXT, material_id INTEGER, start_position INTEGER, end_position INTEGER,
                                      radius REAL, center_x REAL, center_y REAL, center_z REAL);
             CREATE TABLE texture (name TEXT, image BLOB);",
        )
        .unwrap();
        drop(conn);

        let err = SceneDb::open(&path).unwrap().load_scene().unwrap_err();
        assert!(matches!(err, SceneDbError::NoVertices));
    }

    #[test]
    fn out_of_range_material_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badmat.db");
        write_scene_db(&path);
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO scene_node VALUES ('Ghost', 9, 0, 3, 1.0, 0.0, 0.0, 0.0)",
            [],
        )
        .unwrap();
        drop(conn);

        let err = SceneDb::open(&path).unwrap().load_scene().unwrap_err();
        assert!(matches!(
            err,
            SceneDbError::MaterialOutOfBounds { id: 9, .. }
        ));
    }

    #[test]
    fn out_of_range_vertex_slice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badrange.db");
        write_scene_db(&path);
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO scene_node VALUES ('Overflow', 1, 4, 99, 1.0, 0.0, 0.0, 0.0)",
            [],
        )
        .unwrap();
        drop(conn);

        let err = SceneDb::open(&path).unwrap().load_scene().unwrap_err();
        assert!(matches!(
            err,
            SceneDbError::VertexRangeOutOfBounds { end: 99, .. }
        ));
    }

    #[test]
    fn shader_lookup_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shaders.db");
        write_shader_db(&path);

        let db = SceneDb::open(&path).unwrap();
        let source = db.load_shader("default").unwrap();
        assert!(source.contains("vs_main"));

        let err = db.load_shader("phong").unwrap_err();
        assert!(matches!(err, SceneDbError::UnknownShader(name) if name == "phong"));
    }
}

//! Scene shader loading and validation.
//!
//! The engine ships a builtin WGSL module; alternatives can be loaded by name
//! from a shader database at runtime. Sources that fail validation fall back
//! to the builtin so a bad database never takes the viewer down.

use anyhow::{Context, Result};
use anshar_assets::SceneDb;

const BUILTIN_NAME: &str = "default";
const BUILTIN_SOURCE: &str = include_str!("render/shaders/scene.wgsl");

/// A validated shader module for the scene pipeline.
///
/// Any module stored here defines `vs_main`/`fs_main` against the pipeline's
/// bind group layout, so swapping shaders only requires a pipeline rebuild.
pub struct SceneShader {
    name: String,
    module: wgpu::ShaderModule,
}

impl SceneShader {
    /// The builtin forward-shading module compiled into the binary.
    pub fn builtin(device: &wgpu::Device) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("anshar builtin scene shader"),
            source: wgpu::ShaderSource::Wgsl(BUILTIN_SOURCE.into()),
        });

        Self {
            name: BUILTIN_NAME.to_string(),
            module,
        }
    }

    /// Compiles WGSL source, failing if the module does not validate.
    ///
    /// Validation errors are captured with a device error scope rather than
    /// surfacing through the global uncaptured-error handler.
    pub fn from_source(device: &wgpu::Device, name: &str, source: &str) -> Result<Self> {
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            anyhow::bail!("shader {name:?} failed validation: {err}");
        }

        Ok(Self {
            name: name.to_string(),
            module,
        })
    }

    /// Loads a named shader from a database, falling back to the builtin if
    /// the name is unknown or the source does not validate.
    pub fn from_db(device: &wgpu::Device, db: &SceneDb, name: &str) -> Self {
        let loaded = db
            .load_shader(name)
            .map_err(anyhow::Error::from)
            .and_then(|source| {
                Self::from_source(device, name, &source)
                    .with_context(|| format!("compiling shader {name:?}"))
            });

        match loaded {
            Ok(shader) => shader,
            Err(e) => {
                log::warn!("falling back to builtin shader: {e:#}");
                Self::builtin(device)
            }
        }
    }

    /// Reports whether `source` compiles as a shader module on this device.
    pub fn validate(device: &wgpu::Device, source: &str) -> bool {
        Self::from_source(device, "validation probe", source).is_ok()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }
}

//! Interactive scene viewer.
//!
//! Loads a scene from a SQLite database or a binary snapshot, then walks it
//! with WASD + mouse-look. A stdin console accepts typed commands (`help`
//! lists them); the IJKL keys slide the "Torus" mesh around if the scene has
//! one.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use winit::dpi::LogicalSize;

use anshar_assets::{Scene, SceneDb};
use anshar_engine::camera::Camera;
use anshar_engine::console::{self, Console, ConsoleCommand};
use anshar_engine::core::{App, AppControl, FrameCtx};
use anshar_engine::device::GpuInit;
use anshar_engine::input::{Key, MouseButton};
use anshar_engine::logging::{LoggingConfig, init_logging};
use anshar_engine::render::{RenderCtx, SceneRenderer};
use anshar_engine::shader::SceneShader;
use anshar_engine::window::{Runtime, RuntimeConfig};

const DEFAULT_SCENE: &str = "scene.bin.gz";
const SHADER_DB: &str = "shaders.db";

/// Camera speed, world units per second.
const MOVE_SPEED: f32 = 5.0;
/// Mesh nudge speed for the IJKL keys, world units per second.
const NUDGE_SPEED: f32 = 2.0;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

/// The mesh the IJKL keys move, when the scene contains it.
const MOVABLE_MESH: &str = "Torus";

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = env::args().skip(1);
    let scene_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENE));
    let shader_db_path = args.next().map(PathBuf::from);

    let scene = load_scene(&scene_path)
        .with_context(|| format!("loading scene from {}", scene_path.display()))?;

    log::info!(
        "loaded {}: {} meshes, {} materials, {} images, {} vertices",
        scene_path.display(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.images.len(),
        scene.vertex_count()
    );

    // An explicit shader db argument must exist; the implicit default is
    // optional.
    let shader_db = match shader_db_path {
        Some(path) => {
            if !path.exists() {
                bail!("shader database not found: {}", path.display());
            }
            Some(path)
        }
        None => Path::new(SHADER_DB).exists().then(|| PathBuf::from(SHADER_DB)),
    };
    if shader_db.is_none() {
        log::debug!("no {SHADER_DB} found, shader switching disabled");
    }

    println!("console ready; type `help` for commands");

    let app = ViewerApp::new(scene, shader_db);
    let config = RuntimeConfig {
        title: format!("anshar - {}", scene_path.display()),
        initial_size: LogicalSize::new(1024.0, 768.0),
    };

    Runtime::run(config, GpuInit::default(), app)
}

fn load_scene(path: &Path) -> Result<Scene> {
    let name = path.to_string_lossy();

    if name.ends_with(".bin.gz") {
        Ok(Scene::from_compressed_binary_file(path)?)
    } else if name.ends_with(".bin") {
        Ok(Scene::from_binary_file(path)?)
    } else if name.ends_with(".db") {
        Ok(SceneDb::open(path)?.load_scene()?)
    } else {
        bail!("unsupported scene extension: {name} (expected .db, .bin or .bin.gz)");
    }
}

struct ViewerApp {
    scene: Scene,
    shader_db: Option<PathBuf>,
    console: Console,

    // Built on the first frame, once the GPU surface exists.
    renderer: Option<SceneRenderer>,
    camera: Option<Camera>,
    last_size: (f32, f32),

    warned_no_movable: bool,
}

impl ViewerApp {
    fn new(scene: Scene, shader_db: Option<PathBuf>) -> Self {
        Self {
            scene,
            shader_db,
            console: Console::spawn(),
            renderer: None,
            camera: None,
            last_size: (0.0, 0.0),
            warned_no_movable: false,
        }
    }

    fn apply_console_commands(&mut self, device: &wgpu::Device) -> AppControl {
        for cmd in self.console.poll() {
            let (Some(camera), Some(renderer)) = (self.camera.as_mut(), self.renderer.as_mut())
            else {
                break;
            };

            match cmd {
                ConsoleCommand::MoveForward(a) => camera.move_forward(a),
                ConsoleCommand::MoveBackward(a) => camera.move_backward(a),
                ConsoleCommand::MoveLeft(a) => camera.move_left(a),
                ConsoleCommand::MoveRight(a) => camera.move_right(a),
                ConsoleCommand::Aim { dx, dy } => camera.aim(dx, dy),
                ConsoleCommand::Goto { x, y, z } => camera.set_position(x, y, z),

                ConsoleCommand::Shader(name) => match &self.shader_db {
                    Some(path) => match SceneDb::open(path) {
                        Ok(db) => renderer.set_shader(SceneShader::from_db(device, &db, &name)),
                        Err(e) => log::error!("cannot open shader database: {e}"),
                    },
                    None => log::warn!("no shader database available"),
                },

                ConsoleCommand::Help => console::print_help(),
                ConsoleCommand::Quit => return AppControl::Exit,
            }
        }

        AppControl::Continue
    }

    fn nudge_movable_mesh(&mut self, ctx: &FrameCtx<'_, '_>) {
        let dx = axis(ctx, Key::L, Key::J) * NUDGE_SPEED * ctx.time.dt;
        let dz = axis(ctx, Key::K, Key::I) * NUDGE_SPEED * ctx.time.dt;
        if dx == 0.0 && dz == 0.0 {
            return;
        }

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        match renderer.mesh_transform(MOVABLE_MESH) {
            Some(mut m) => {
                m[3][0] += dx;
                m[3][2] += dz;
                renderer.set_mesh_transform(MOVABLE_MESH, m);
            }
            None => {
                if !self.warned_no_movable {
                    log::warn!("scene has no {MOVABLE_MESH:?} mesh to move");
                    self.warned_no_movable = true;
                }
            }
        }
    }
}

/// Returns +1, -1 or 0 from a pair of held keys.
fn axis(ctx: &FrameCtx<'_, '_>, positive: Key, negative: Key) -> f32 {
    let mut v = 0.0;
    if ctx.input.key_down(positive) {
        v += 1.0;
    }
    if ctx.input.key_down(negative) {
        v -= 1.0;
    }
    v
}

impl App for ViewerApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let (width, height) = ctx.window.physical_size();

        if self.renderer.is_none() {
            let rctx = RenderCtx::new(ctx.gpu.device(), ctx.gpu.queue(), ctx.gpu.surface_format());
            match SceneRenderer::new(&rctx, &self.scene) {
                Ok(renderer) => self.renderer = Some(renderer),
                Err(e) => {
                    log::error!("failed to upload scene: {e:#}");
                    return AppControl::Exit;
                }
            }
            self.camera = Some(Camera::new(width, height));
            self.last_size = (width, height);
        }

        if (width, height) != self.last_size && width > 0.0 && height > 0.0 {
            if let Some(camera) = self.camera.as_mut() {
                camera.resize(width, height);
            }
            self.last_size = (width, height);
        }

        if ctx.input_frame.pressed(Key::Escape) {
            return AppControl::Exit;
        }

        // WASD movement, scaled by frame time so speed is framerate-independent.
        if let Some(camera) = self.camera.as_mut() {
            let step = MOVE_SPEED * ctx.time.dt;
            camera.move_forward(axis(ctx, Key::W, Key::S) * step);
            camera.move_right(axis(ctx, Key::D, Key::A) * step);

            // Drag with the left button to look around.
            if ctx.input.button_down(MouseButton::Left) {
                let (dx, dy) = ctx.input_frame.pointer_delta;
                if dx != 0.0 || dy != 0.0 {
                    camera.aim(dx as f64, -dy as f64);
                }
            }
        }

        self.nudge_movable_mesh(ctx);

        if self.apply_console_commands(ctx.gpu.device()) == AppControl::Exit {
            return AppControl::Exit;
        }

        let (renderer, camera) = match (self.renderer.as_mut(), self.camera.as_ref()) {
            (Some(r), Some(c)) => (r, c),
            _ => return AppControl::Continue,
        };

        ctx.render(CLEAR_COLOR, |rctx, target| {
            renderer.draw(rctx, target, camera);
        })
    }
}

//! Scene packing tool.
//!
//! Converts a SQLite scene database into a binary snapshot so the viewer can
//! load it without a SQLite dependency at startup. The output format follows
//! the file extension: `.bin` for plain bincode, `.bin.gz` for
//! zlib-compressed bincode.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use clap::Parser;

use anshar_assets::{Scene, SceneDb};

#[derive(Debug, Parser)]
#[command(name = "anshar-pack", about = "Pack a scene database into a binary snapshot")]
struct Args {
    /// Scene database to read (.db).
    database: PathBuf,

    /// Snapshot to write (.bin or .bin.gz).
    output: PathBuf,

    /// Read the snapshot back and compare it against the source scene.
    #[arg(long)]
    verify: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum OutputFormat {
    Binary,
    CompressedBinary,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let name = path.to_string_lossy();
        if name.ends_with(".bin.gz") {
            Some(Self::CompressedBinary)
        } else if name.ends_with(".bin") {
            Some(Self::Binary)
        } else {
            None
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let Some(format) = OutputFormat::from_path(&args.output) else {
        bail!(
            "cannot infer output format from {}: expected a .bin or .bin.gz extension",
            args.output.display()
        );
    };

    let scene = SceneDb::open(&args.database)?
        .load_scene()
        .with_context(|| format!("loading scene from {}", args.database.display()))?;

    log::info!(
        "loaded {}: {} meshes, {} materials, {} images, {} vertices",
        args.database.display(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.images.len(),
        scene.vertex_count()
    );

    match format {
        OutputFormat::Binary => scene.to_binary_file(&args.output)?,
        OutputFormat::CompressedBinary => scene.to_compressed_binary_file(&args.output)?,
    }

    log::info!("wrote {}", args.output.display());

    if args.verify {
        let reloaded = match format {
            OutputFormat::Binary => Scene::from_binary_file(&args.output)?,
            OutputFormat::CompressedBinary => Scene::from_compressed_binary_file(&args.output)?,
        };

        ensure!(
            reloaded == scene,
            "verification failed: {} does not round-trip to the source scene",
            args.output.display()
        );

        log::info!("verified {}", args.output.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        let f = |p: &str| OutputFormat::from_path(Path::new(p));

        assert_eq!(f("scene.bin"), Some(OutputFormat::Binary));
        assert_eq!(f("scene.bin.gz"), Some(OutputFormat::CompressedBinary));
        assert_eq!(f("dir.bin/scene.db"), None);
        assert_eq!(f("scene.gz"), None);
        assert_eq!(f("scene"), None);
    }
}

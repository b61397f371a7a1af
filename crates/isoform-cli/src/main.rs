//! Isoform CLI - build, sample and mesh the built-in scenes

mod scenes;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use isoform_core::prelude::*;
use scenes::Scene;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "isoform")]
#[command(about = "Signed distance field modeling from the command line", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in scenes
    Scenes,

    /// Mesh a scene and export it (format detected from the extension)
    Mesh {
        scene: Scene,

        /// Output file (.stl or .obj)
        #[arg(short, long)]
        output: PathBuf,

        /// Grid resolution (cells per axis)
        #[arg(short, long, default_value = "64")]
        resolution: u32,

        /// Voxel grid memory budget in megabytes
        #[arg(long, default_value = "512")]
        max_memory_mb: f32,

        /// Print mesh statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sample a scene's distance at one point
    Sample {
        scene: Scene,
        #[arg(allow_negative_numbers = true)]
        x: f32,
        #[arg(allow_negative_numbers = true)]
        y: f32,
        #[arg(allow_negative_numbers = true)]
        z: f32,

        /// Also compute the surface normal near the surface
        #[arg(long)]
        normal: bool,
    },

    /// Print a scene's metadata and bounds
    Info { scene: Scene },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scenes => list_scenes(),
        Commands::Mesh {
            scene,
            output,
            resolution,
            max_memory_mb,
            json,
        } => run_mesh(scene, &output, resolution, max_memory_mb, json)?,
        Commands::Sample {
            scene,
            x,
            y,
            z,
            normal,
        } => run_sample(scene, Vec3::new(x, y, z), normal)?,
        Commands::Info { scene } => run_info(scene)?,
    }

    Ok(())
}

fn list_scenes() {
    for scene in Scene::value_variants() {
        println!("{:<16} {}", scene.name(), scene.description());
    }
}

/// Build a scene, logging any warnings it carries
fn load(scene: Scene) -> Result<Field> {
    let built = scene
        .build()
        .with_context(|| format!("Failed to build scene '{}'", scene.name()))?;
    for diagnostic in &built.diagnostics {
        tracing::warn!(scene = %scene.name(), "{diagnostic}");
    }
    Ok(built.into_inner())
}

fn run_mesh(
    scene: Scene,
    output: &Path,
    resolution: u32,
    max_memory_mb: f32,
    json: bool,
) -> Result<()> {
    let format = ExportFormat::from_extension(output)
        .with_context(|| format!("Unsupported output format: {}", output.display()))?;
    let field = load(scene)?;

    let options = MeshOptions::default()
        .with_resolution(resolution)
        .with_max_memory_mb(max_memory_mb);

    let mut stage = String::new();
    let mesh = marching_cubes_with_progress(&field, &options, |percent, message| {
        if message != stage {
            tracing::info!("{message} ({percent:.0}%)");
            stage = message.to_string();
        }
    })?;

    mesh.export(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let stats = analyze(&mesh);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Wrote {} ({})", output.display(), format.name());
        println!("  vertices:  {}", stats.vertex_count);
        println!("  triangles: {}", stats.triangle_count);
        println!(
            "  size:      {:.2} x {:.2} x {:.2}",
            stats.size.x, stats.size.y, stats.size.z
        );
        println!("  memory:    {} bytes", stats.memory.total_bytes);
    }

    Ok(())
}

fn run_sample(scene: Scene, point: Vec3, normal: bool) -> Result<()> {
    let field = load(scene)?;
    let mut options = SampleOptions::default().with_material();
    if normal {
        options = options.with_normal(options.normal_epsilon);
    }
    let sample = field.sample(point, &options);
    println!("{}", serde_json::to_string_pretty(&sample)?);
    Ok(())
}

#[derive(Serialize)]
struct SceneInfo {
    scene: String,
    metadata: Metadata,
    bounds: Option<Aabb>,
}

fn run_info(scene: Scene) -> Result<()> {
    let field = load(scene)?;
    let info = SceneInfo {
        scene: scene.name(),
        metadata: field.metadata(),
        bounds: field.bounds(),
    };
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

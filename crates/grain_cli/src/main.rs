//! Grain CLI - render TOML scene descriptions to PNG

mod scene;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grain_render::RendererConfig;
use std::path::PathBuf;

use crate::scene::Scene;

/// Render 2D scenes with the Grain rendering core
#[derive(Parser, Debug)]
#[command(name = "grain")]
#[command(about = "Render TOML scene descriptions to PNG")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a scene file to a PNG image
    Render {
        /// Scene description (TOML)
        scene: PathBuf,

        /// Output image, defaults to the scene path with a .png extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default renderer configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match cli.command {
        Commands::Render { scene, output } => cmd_render(scene, output),
        Commands::Config => cmd_config(),
    }
}

fn cmd_render(scene_path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| scene_path.with_extension("png"));
    tracing::info!("Rendering {}", scene_path.display());

    let scene = Scene::load(&scene_path)?;
    let renderer = scene.render()?;

    let image = image::RgbaImage::from_raw(
        renderer.width(),
        renderer.height(),
        renderer.as_bytes().to_vec(),
    )
    .context("pixel buffer does not match the canvas size")?;
    image
        .save_with_format(&output, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!("Wrote {}", output.display());
    Ok(())
}

fn cmd_config() -> Result<()> {
    let toml = RendererConfig::default()
        .to_toml()
        .context("Failed to serialize config")?;
    print!("{}", toml);
    Ok(())
}

//! egg-export - EGG asset export tool
//!
//! Converts EGG models and animations to compact binary formats
//! (.eggmesh, .eggskel, .egganim)

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use egg_import::ParseOptions;

use egg_export::formats::{ANIMATION_EXT, MESH_EXT, SKELETON_EXT};
use egg_export::{animation, manifest, mesh, skeleton};

#[derive(Parser)]
#[command(name = "egg-export")]
#[command(about = "EGG asset export tool")]
#[command(version)]
struct Cli {
    /// Directory EGG input paths are resolved against
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Convert Z-up geometry and joint transforms to Y-up
    #[arg(long, global = true)]
    convert_geometry: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build assets from a manifest file
    Build {
        /// Path to assets.toml manifest
        #[arg(default_value = "assets.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without building
    Check {
        /// Path to assets.toml manifest
        #[arg(default_value = "assets.toml")]
        manifest: PathBuf,
    },

    /// Export the mesh of an EGG model
    Mesh {
        /// Input EGG model
        input: PathBuf,

        /// Output .eggmesh file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the skeleton (hierarchy and inverse bind matrices) of an EGG model
    Skeleton {
        /// Input EGG model
        input: PathBuf,

        /// Output .eggskel file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the joint tree instead of exporting
        #[arg(long)]
        list: bool,
    },

    /// Export an EGG animation baked against a model's skeleton
    Animation {
        /// EGG model providing the skeleton
        model: PathBuf,

        /// Input EGG animation
        input: PathBuf,

        /// Output .egganim file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print frame and joint counts instead of exporting
        #[arg(long)]
        list: bool,
    },
}

/// Default output next to the resolved input
fn default_output(options: &ParseOptions, input: &Path, extension: &str) -> PathBuf {
    options.resolve(input).with_extension(extension)
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let options = ParseOptions::new(&cli.root).with_geometry_conversion(cli.convert_geometry);

    match cli.command {
        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building assets from {:?}", manifest);
            }
            let config = manifest::AssetManifest::load(&manifest)?;
            let base_dir = manifest.parent().unwrap_or(Path::new("."));
            let report = manifest::build_all(&config, base_dir, output.as_deref())?;
            if verbose {
                for path in &report.written {
                    tracing::info!("  {:?}", path);
                }
            }
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::AssetManifest::load(&manifest)?;
            config.validate()?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Mesh { input, output } => {
            let output = output.unwrap_or_else(|| default_output(&options, &input, MESH_EXT));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            mesh::convert_egg_mesh(&input, &output, &options)?;
            tracing::info!("Done!");
        }

        Commands::Skeleton {
            input,
            output,
            list,
        } => {
            if list {
                skeleton::list_joints(&input, &options)?;
            } else {
                let output =
                    output.unwrap_or_else(|| default_output(&options, &input, SKELETON_EXT));
                tracing::info!("Exporting skeleton {:?} -> {:?}", input, output);
                skeleton::convert_egg_skeleton(&input, &output, &options)?;
                tracing::info!("Done!");
            }
        }

        Commands::Animation {
            model,
            input,
            output,
            list,
        } => {
            if list {
                animation::list_animation(&model, &input, &options)?;
            } else {
                let output =
                    output.unwrap_or_else(|| default_output(&options, &input, ANIMATION_EXT));
                tracing::info!("Exporting animation {:?} -> {:?}", input, output);
                animation::convert_egg_animation(&model, &input, &output, &options)?;
                tracing::info!("Done!");
            }
        }
    }

    Ok(())
}

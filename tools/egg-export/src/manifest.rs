//! assets.toml manifest parsing and batch export
//!
//! ```toml
//! [build]
//! root = "raw"          # EGG sources, relative to the manifest
//! output = "build"      # exported files, relative to the manifest
//! convert_geometry = false
//!
//! [[models]]
//! id = "bar"
//! path = "models/bar.egg"
//!
//! [[animations]]
//! id = "bar_bend"
//! path = "animations/bar_bend.egg"
//! model = "bar"
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use egg_import::{Model, ParseOptions, parse_animation, parse_model};
use hashbrown::{HashMap, HashSet};
use serde::Deserialize;

use crate::animation::convert_animation_to_memory;
use crate::formats::{
    ANIMATION_EXT, MESH_EXT, SKELETON_EXT, write_egg_animation, write_egg_mesh, write_egg_skeleton,
};
use crate::mesh::convert_mesh_to_memory;
use crate::skeleton::convert_skeleton_to_memory;

/// assets.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
    #[serde(default)]
    pub animations: Vec<AnimationEntry>,
}

/// Build configuration section
#[derive(Debug, Deserialize)]
pub struct BuildSection {
    /// Directory EGG paths are resolved against.
    /// Default: the manifest's directory
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Output directory.
    /// Default: "build"
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Convert Z-up geometry and joint transforms to Y-up.
    /// Default: false
    #[serde(default)]
    pub convert_geometry: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            output: default_output(),
            convert_geometry: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_output() -> PathBuf {
    PathBuf::from("build")
}

/// A model to export as mesh (and skeleton, when it has joints)
#[derive(Debug, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub path: PathBuf,
}

/// An animation and the model whose skeleton it drives
#[derive(Debug, Deserialize)]
pub struct AnimationEntry {
    pub id: String,
    pub path: PathBuf,
    /// Id of a `[[models]]` entry
    pub model: String,
}

/// Files written by [`build_all`]
#[derive(Debug, Default)]
pub struct BuildReport {
    pub written: Vec<PathBuf>,
}

impl AssetManifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse assets.toml")
    }

    /// Validate manifest fields
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for id in self
            .models
            .iter()
            .map(|m| &m.id)
            .chain(self.animations.iter().map(|a| &a.id))
        {
            if id.is_empty() {
                bail!("Asset id must not be empty in assets.toml");
            }
            if !ids.insert(id.as_str()) {
                bail!("Duplicate asset id '{}' in assets.toml", id);
            }
        }

        for animation in &self.animations {
            if !self.models.iter().any(|m| m.id == animation.model) {
                bail!(
                    "Animation '{}' refers to unknown model '{}'",
                    animation.id,
                    animation.model
                );
            }
        }
        Ok(())
    }

    /// Parse options for a manifest located in `base_dir`
    pub fn parse_options(&self, base_dir: &Path) -> ParseOptions {
        ParseOptions::new(base_dir.join(&self.build.root))
            .with_geometry_conversion(self.build.convert_geometry)
    }
}

/// Export every model and animation of a manifest
///
/// Relative paths in the manifest are resolved against `base_dir`, the
/// directory containing the manifest. `output_override` replaces
/// `[build] output`.
pub fn build_all(
    manifest: &AssetManifest,
    base_dir: &Path,
    output_override: Option<&Path>,
) -> Result<BuildReport> {
    manifest.validate()?;

    let options = manifest.parse_options(base_dir);
    let output_dir = output_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| base_dir.join(&manifest.build.output));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut report = BuildReport::default();
    let mut models: HashMap<&str, Model> = HashMap::with_capacity(manifest.models.len());

    for entry in &manifest.models {
        tracing::info!("Model '{}': {:?}", entry.id, entry.path);
        let model = parse_model(&entry.path, &options)
            .with_context(|| format!("Failed to parse model '{}'", entry.id))?;

        let mesh = convert_mesh_to_memory(&model)
            .with_context(|| format!("Failed to convert mesh '{}'", entry.id))?;
        let path = output_dir.join(format!("{}.{}", entry.id, MESH_EXT));
        let mut writer = create(&path)?;
        write_egg_mesh(&mut writer, mesh.format, &mesh.vertex_data, &mesh.indices)?;
        report.written.push(path);

        if model.skeleton.is_some() {
            let skeleton = convert_skeleton_to_memory(&model)?;
            let path = output_dir.join(format!("{}.{}", entry.id, SKELETON_EXT));
            let mut writer = create(&path)?;
            write_egg_skeleton(&mut writer, &skeleton.parents, &skeleton.inverse_bind_matrices)?;
            report.written.push(path);
        }

        models.insert(entry.id.as_str(), model);
    }

    for entry in &manifest.animations {
        tracing::info!("Animation '{}': {:?}", entry.id, entry.path);
        let model = models
            .get(entry.model.as_str())
            .with_context(|| format!("Model '{}' was not built", entry.model))?;
        let animation = parse_animation(&entry.path, model, &options)
            .with_context(|| format!("Failed to parse animation '{}'", entry.id))?;

        let converted = convert_animation_to_memory(&animation)
            .with_context(|| format!("Failed to convert animation '{}'", entry.id))?;
        let path = output_dir.join(format!("{}.{}", entry.id, ANIMATION_EXT));
        let mut writer = create(&path)?;
        write_egg_animation(&mut writer, converted.joint_count, converted.rate, &converted.frames)?;
        report.written.push(path);
    }

    tracing::info!(
        "Wrote {} files to {:?}",
        report.written.len(),
        output_dir
    );
    Ok(report)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create output: {:?}", path))?;
    Ok(BufWriter::new(file))
}

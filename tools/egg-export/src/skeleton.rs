//! Skeleton converter (EGG -> .eggskel)
//!
//! Exports the joint hierarchy and inverse bind matrices of a model's
//! `<Joint>` data.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use egg_import::{Model, ParseOptions, Skeleton, parse_model};

use crate::formats::{ROOT_PARENT, matrix_to_3x4, write_egg_skeleton};

/// Result of in-memory skeleton conversion
#[derive(Debug, Clone)]
pub struct ConvertedSkeleton {
    /// Parent index per joint, `ROOT_PARENT` for roots
    pub parents: Vec<u32>,
    /// Inverse bind matrices in column-major 3x4 format (12 floats per joint)
    pub inverse_bind_matrices: Vec<[f32; 12]>,
}

impl ConvertedSkeleton {
    pub fn joint_count(&self) -> usize {
        self.parents.len()
    }
}

/// Flatten a model's skeleton
pub fn convert_skeleton_to_memory(model: &Model) -> Result<ConvertedSkeleton> {
    let skeleton = model
        .skeleton
        .as_deref()
        .context("Model has no skeleton (no <Joint> data)")?;

    let parents = skeleton
        .joints()
        .iter()
        .map(|joint| joint.parent.map(|p| p as u32).unwrap_or(ROOT_PARENT))
        .collect();
    let inverse_bind_matrices = skeleton
        .joints()
        .iter()
        .map(|joint| matrix_to_3x4(&joint.inverse_bind))
        .collect();

    Ok(ConvertedSkeleton {
        parents,
        inverse_bind_matrices,
    })
}

/// Convert the skeleton of an EGG model file to an EggSkeleton file
pub fn convert_egg_skeleton(input: &Path, output: &Path, options: &ParseOptions) -> Result<()> {
    let model = parse_model(input, options)
        .with_context(|| format!("Failed to parse EGG model: {:?}", input))?;
    let skeleton = convert_skeleton_to_memory(&model)?;

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_egg_skeleton(&mut writer, &skeleton.parents, &skeleton.inverse_bind_matrices)?;

    tracing::info!("Exported skeleton: {} joints", skeleton.joint_count());
    Ok(())
}

/// Log the joint tree of an EGG model file
pub fn list_joints(input: &Path, options: &ParseOptions) -> Result<()> {
    let model = parse_model(input, options)
        .with_context(|| format!("Failed to parse EGG model: {:?}", input))?;

    let Some(skeleton) = model.skeleton.as_deref() else {
        tracing::info!("No joints found in {:?}", input);
        return Ok(());
    };

    tracing::info!("Joints in {:?}:", input);
    for line in joint_tree(skeleton) {
        tracing::info!("{}", line);
    }
    Ok(())
}

/// One indented line per joint, depth-first from each root
pub fn joint_tree(skeleton: &Skeleton) -> Vec<String> {
    fn visit(skeleton: &Skeleton, index: usize, depth: usize, lines: &mut Vec<String>) {
        let joint = &skeleton.joints()[index];
        lines.push(format!("{}[{}] '{}'", "  ".repeat(depth + 1), index, joint.name));
        for child in skeleton.children(index) {
            visit(skeleton, child, depth + 1, lines);
        }
    }

    let mut lines = Vec::with_capacity(skeleton.len());
    for (index, joint) in skeleton.joints().iter().enumerate() {
        if joint.is_root() {
            visit(skeleton, index, 0, &mut lines);
        }
    }
    lines
}

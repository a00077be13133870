//! Animation converter (EGG -> .egganim)
//!
//! Bakes every frame's per-joint pose matrices into a flat frame-major list.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result, bail};
use egg_import::{Animation, ParseOptions, parse_animation, parse_model};

use crate::formats::{matrix_to_3x4, write_egg_animation};

/// Result of in-memory animation conversion
#[derive(Debug, Clone)]
pub struct ConvertedAnimation {
    pub joint_count: u16,
    pub frame_count: u16,
    pub rate: u16,
    /// Pose matrices (frame_count × joint_count), frame-major, 3x4 column-major
    pub frames: Vec<[f32; 12]>,
}

/// Summary printed by `animation --list`
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationInfo {
    pub frame_count: usize,
    pub joint_count: usize,
    pub rate: u32,
    pub length: f32,
    pub warnings: usize,
}

impl AnimationInfo {
    pub fn from_animation(animation: &Animation) -> Self {
        Self {
            frame_count: animation.frame_count(),
            joint_count: animation.joint_count(),
            rate: animation.rate,
            length: animation.length,
            warnings: animation.warnings.len(),
        }
    }
}

/// Flatten a parsed animation
pub fn convert_animation_to_memory(animation: &Animation) -> Result<ConvertedAnimation> {
    if animation.poses.is_empty() {
        bail!("Animation has no frames (no fps declared)");
    }
    let joint_count = u16::try_from(animation.joint_count())
        .context("Animation has more joints than the format supports")?;
    if joint_count == 0 {
        bail!("Animation has no joints");
    }
    let frame_count = u16::try_from(animation.frame_count()).with_context(|| {
        format!(
            "Animation has {} frames, maximum is {}",
            animation.frame_count(),
            u16::MAX
        )
    })?;
    let rate = u16::try_from(animation.rate)
        .with_context(|| format!("Frame rate {} does not fit in 16 bits", animation.rate))?;

    let frames = animation
        .poses
        .iter()
        .flat_map(|pose| pose.transforms.iter().map(matrix_to_3x4))
        .collect();

    Ok(ConvertedAnimation {
        joint_count,
        frame_count,
        rate,
        frames,
    })
}

/// Convert an EGG animation file to an EggAnimation file
///
/// `model` is the EGG model whose skeleton the animation drives.
pub fn convert_egg_animation(
    model: &Path,
    input: &Path,
    output: &Path,
    options: &ParseOptions,
) -> Result<()> {
    let model = parse_model(model, options)
        .with_context(|| format!("Failed to parse EGG model: {:?}", model))?;
    let animation = parse_animation(input, &model, options)
        .with_context(|| format!("Failed to parse EGG animation: {:?}", input))?;
    let converted = convert_animation_to_memory(&animation)?;

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_egg_animation(&mut writer, converted.joint_count, converted.rate, &converted.frames)?;

    tracing::info!(
        "Exported animation: {} joints, {} frames at rate {}",
        converted.joint_count,
        converted.frame_count,
        converted.rate
    );
    Ok(())
}

/// Log frame/joint counts and the rate of an EGG animation file
pub fn list_animation(model: &Path, input: &Path, options: &ParseOptions) -> Result<AnimationInfo> {
    let model = parse_model(model, options)
        .with_context(|| format!("Failed to parse EGG model: {:?}", model))?;
    let animation = parse_animation(input, &model, options)
        .with_context(|| format!("Failed to parse EGG animation: {:?}", input))?;

    let info = AnimationInfo::from_animation(&animation);
    tracing::info!(
        "Animation {:?}: {} frames, {} joints, rate {}, {:.2}s, {} warnings",
        input,
        info.frame_count,
        info.joint_count,
        info.rate,
        info.length,
        info.warnings
    );
    Ok(info)
}

//! egg-import: EGG scene-description parser
//!
//! Reads the brace-scoped, tag-prefixed EGG text format and produces two
//! in-memory artifacts:
//!
//! - a [`Model`]: triangulated mesh, vertex format flags, optional texture
//!   reference and an optional [`Skeleton`] with bind-pose, inverse-bind and
//!   skinning matrices per joint
//! - an [`Animation`]: one [`SkeletonPose`] per sampled frame, each pose
//!   positionally parallel to the skeleton's joint list
//!
//! # Usage
//!
//! ```ignore
//! use egg_import::{ParseOptions, parse_animation, parse_model};
//!
//! let options = ParseOptions::new("data");
//! let model = parse_model("models/bar.egg", &options)?;
//! let animation = parse_animation("animations/bar_bend.egg", &model, &options)?;
//!
//! println!("{} vertices, {} frames", model.vertices.len(), animation.poses.len());
//! ```
//!
//! # Matrix convention
//!
//! EGG files store row-major matrices written for row vectors (translation in
//! the last row). All matrices here are `glam` column-vector matrices, so the
//! 16 values of a `<Matrix4>` are read with [`glam::Mat4::from_cols_array`]
//! and every composition appears in reverse order relative to the file
//! format's own notation.

mod animation;
mod coords;
mod error;
mod mesh;
mod parser;
mod skeleton;
mod tokenizer;

pub use animation::{Animation, JointChannels, SkeletonPose, TransformOp, TransformOrder};
pub use coords::CoordinateSystem;
pub use error::{EggError, ParseWarning, Result};
pub use mesh::{Model, Vertex};
pub use parser::{
    ParseOptions, parse_animation, parse_animation_str, parse_model, parse_model_str,
};
pub use skeleton::{Joint, Skeleton};
pub use tokenizer::{Token, Tokenizer};

// =============================================================================
// Vertex format flags
// =============================================================================

/// Vertex format flag: has a normal (3 floats)
pub const FORMAT_NORMAL: u8 = 1;
/// Vertex format flag: has UV coordinates (2 floats)
pub const FORMAT_UV: u8 = 2;
/// Vertex format flag: has per-vertex color (RGBA, 4 floats)
pub const FORMAT_COLOR: u8 = 4;
/// Vertex format flag: has joint indices/weights for skinning
pub const FORMAT_SKINNED: u8 = 8;

// =============================================================================
// Limits
// =============================================================================

/// Maximum number of joints in one skeleton
pub const MAX_JOINTS: usize = 75;

/// Maximum number of joint influences stored per vertex
pub const MAX_JOINT_WEIGHTS: usize = 4;

/// Maximum joint name length in bytes
pub const MAX_JOINT_NAME_LEN: usize = 31;

/// Maximum `<Table>` nesting inside an animation's skeleton table
pub const MAX_TABLE_DEPTH: usize = 128;

/// Largest accepted `fps`, which is also the number of frames allocated
pub const MAX_FRAMES: u32 = u16::MAX as u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_flags_are_distinct_bits() {
        let flags = [FORMAT_NORMAL, FORMAT_UV, FORMAT_COLOR, FORMAT_SKINNED];
        for (i, a) in flags.iter().enumerate() {
            assert_eq!(a.count_ones(), 1);
            for b in &flags[i + 1..] {
                assert_eq!(a & b, 0);
            }
        }
    }

    #[test]
    fn test_limits() {
        assert_eq!(MAX_JOINTS, 75);
        assert_eq!(MAX_JOINT_WEIGHTS, 4);
        assert!(MAX_JOINTS <= u8::MAX as usize);
        assert!(MAX_FRAMES <= u16::MAX as u32);
    }
}

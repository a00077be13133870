//! egg-export library
//!
//! Converts parsed EGG assets into compact binary files. Used by the
//! `egg-export` binary and available to other tools that want the packed
//! data in memory.

pub mod animation;
pub mod formats;
pub mod manifest;
pub mod mesh;
pub mod skeleton;

pub use animation::{AnimationInfo, ConvertedAnimation, convert_animation_to_memory};
pub use formats::{ANIMATION_EXT, MESH_EXT, SKELETON_EXT};
pub use manifest::{AssetManifest, BuildReport, build_all};
pub use mesh::{ConvertedMesh, convert_mesh_to_memory};
pub use skeleton::{ConvertedSkeleton, convert_skeleton_to_memory};

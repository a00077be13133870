//! Mesh data produced by the model parser

use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};

use crate::coords::CoordinateSystem;
use crate::error::ParseWarning;
use crate::skeleton::Skeleton;
use crate::{FORMAT_SKINNED, MAX_JOINT_WEIGHTS};

/// A single mesh vertex
///
/// Joint influences live in fixed slots; a slot is unused exactly when its
/// weight is zero (its joint index is then zero as well).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub color: Vec4,
    pub joints: [u32; MAX_JOINT_WEIGHTS],
    pub weights: [f32; MAX_JOINT_WEIGHTS],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            uv: Vec2::ZERO,
            color: Vec4::ONE,
            joints: [0; MAX_JOINT_WEIGHTS],
            weights: [0.0; MAX_JOINT_WEIGHTS],
        }
    }
}

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Store a joint influence in the first free slot
    ///
    /// Returns `false` when all slots are taken; the influence is dropped and
    /// the existing weights are left as they are.
    pub fn add_influence(&mut self, joint: u32, weight: f32) -> bool {
        debug_assert!(weight > 0.0, "zero weights mark free slots");
        match self.weights.iter().position(|&w| w == 0.0) {
            Some(slot) => {
                self.joints[slot] = joint;
                self.weights[slot] = weight;
                true
            }
            None => false,
        }
    }

    /// Number of occupied influence slots
    pub fn influence_count(&self) -> usize {
        self.weights.iter().filter(|&&w| w != 0.0).count()
    }

    /// Occupied (joint, weight) slots in slot order
    pub fn influences(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.joints
            .iter()
            .zip(&self.weights)
            .filter(|(_, w)| **w != 0.0)
            .map(|(&j, &w)| (j, w))
    }
}

/// A parsed EGG model
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub vertices: Vec<Vertex>,
    /// Triangle list, already normalized against the file's first vertex index
    pub indices: Vec<u32>,
    /// `FORMAT_*` flags accumulated while parsing
    pub format: u8,
    /// Present when the file contains `<Joint>` data
    pub skeleton: Option<Arc<Skeleton>>,
    /// Texture file name from `<Texture>`
    pub texture: Option<String>,
    pub coordinate_system: CoordinateSystem,
    pub warnings: Vec<ParseWarning>,
}

impl Model {
    pub fn has_format(&self, flag: u8) -> bool {
        self.format & flag != 0
    }

    pub fn is_skinned(&self) -> bool {
        self.has_format(FORMAT_SKINNED)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

//! Joint hierarchy with bind-pose matrices

use glam::Mat4;
use hashbrown::HashMap;

use crate::MAX_JOINTS;
use crate::error::{EggError, Result};

/// A single joint
///
/// All matrices are model space except `local`, which is relative to the
/// parent's bind pose.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    /// Index of the parent joint, `None` for a root
    pub parent: Option<usize>,
    /// Bind transform relative to the parent
    pub local: Mat4,
    /// Bind transform in model space
    pub world: Mat4,
    /// Inverse of `world`; maps bind-pose geometry into joint space
    pub inverse_bind: Mat4,
    /// Skinning matrix: `inverse_bind` followed by the joint's current world
    /// transform. Identity (within rounding) in the bind pose.
    pub skin: Mat4,
}

impl Joint {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Skinning matrix for the joint posed at `world`
    pub fn skinning_matrix(&self, world: Mat4) -> Mat4 {
        world * self.inverse_bind
    }
}

/// Ordered joint list; every parent precedes its children
///
/// Immutable once built. Models hand it out behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    joints: Vec<Joint>,
}

impl Skeleton {
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    /// Index of the first joint with this exact name
    pub fn find_joint(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// Indices of the direct children of `index`
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(move |(_, j)| j.parent == Some(index))
            .map(|(i, _)| i)
    }

    /// Name -> index map; duplicate names resolve to their first joint
    pub fn name_map(&self) -> HashMap<&str, usize> {
        let mut map = HashMap::with_capacity(self.joints.len());
        for (i, joint) in self.joints.iter().enumerate() {
            map.entry(joint.name.as_str()).or_insert(i);
        }
        map
    }
}

/// Joint awaiting bind-pose resolution
#[derive(Debug)]
struct PendingJoint {
    name: String,
    parent: Option<usize>,
    local: Mat4,
}

/// Collects joints in parse order and resolves their bind pose on `build`
#[derive(Debug, Default)]
pub(crate) struct SkeletonBuilder {
    joints: Vec<PendingJoint>,
}

impl SkeletonBuilder {
    /// Append a joint and return its index
    pub(crate) fn push(&mut self, name: &str, parent: Option<usize>, line: usize) -> Result<usize> {
        if self.joints.len() >= MAX_JOINTS {
            return Err(EggError::TooManyJoints {
                line,
                max: MAX_JOINTS,
            });
        }
        let index = self.joints.len();
        if let Some(p) = parent {
            debug_assert!(p < index, "parent joint {} must precede joint {}", p, index);
        }
        self.joints.push(PendingJoint {
            name: name.to_string(),
            parent,
            local: Mat4::IDENTITY,
        });
        Ok(index)
    }

    pub(crate) fn set_local(&mut self, index: usize, local: Mat4) {
        self.joints[index].local = local;
    }

    pub(crate) fn len(&self) -> usize {
        self.joints.len()
    }

    /// Resolve world, inverse-bind and skinning matrices in index order
    pub(crate) fn build(self) -> Skeleton {
        let mut joints: Vec<Joint> = Vec::with_capacity(self.joints.len());
        for pending in self.joints {
            let parent_world = pending
                .parent
                .and_then(|p| joints.get(p))
                .map_or(Mat4::IDENTITY, |parent| parent.world);
            let world = parent_world * pending.local;
            let inverse_bind = world.inverse();
            joints.push(Joint {
                name: pending.name,
                parent: pending.parent,
                local: pending.local,
                world,
                inverse_bind,
                skin: world * inverse_bind,
            });
        }
        Skeleton { joints }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn chain() -> Skeleton {
        let mut builder = SkeletonBuilder::default();
        let root = builder.push("root", None, 1).unwrap();
        builder.set_local(root, Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        let mid = builder.push("mid", Some(root), 2).unwrap();
        builder.set_local(
            mid,
            Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2)
                * Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
        );
        let tip = builder.push("tip", Some(mid), 3).unwrap();
        builder.set_local(tip, Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)));
        builder.push("other", Some(root), 4).unwrap();
        builder.build()
    }

    #[test]
    fn test_world_composes_parent_then_local() {
        let skeleton = chain();
        let joints = skeleton.joints();
        assert_eq!(joints[0].world, joints[0].local);
        assert_eq!(joints[1].world, joints[0].world * joints[1].local);
        assert_eq!(joints[2].world, joints[1].world * joints[2].local);

        // The tip sits 3 units along the mid joint's rotated Y axis.
        let tip = joints[2].world.transform_point3(Vec3::ZERO);
        assert!(tip.abs_diff_eq(Vec3::new(-5.0, 1.0, 0.0), 1e-5), "{tip}");
    }

    #[test]
    fn test_inverse_bind_round_trip() {
        let skeleton = chain();
        for joint in skeleton.joints() {
            assert!(
                (joint.inverse_bind * joint.world).abs_diff_eq(Mat4::IDENTITY, 1e-5),
                "joint {}",
                joint.name
            );
            assert!(joint.skin.abs_diff_eq(Mat4::IDENTITY, 1e-5));
        }
    }

    #[test]
    fn test_parent_precedes_child() {
        let skeleton = chain();
        assert!(skeleton.joints()[0].is_root());
        for (i, joint) in skeleton.joints().iter().enumerate().skip(1) {
            assert!(joint.parent.unwrap() < i);
        }
    }

    #[test]
    fn test_queries() {
        let skeleton = chain();
        assert_eq!(skeleton.len(), 4);
        assert_eq!(skeleton.find_joint("tip"), Some(2));
        assert_eq!(skeleton.find_joint("missing"), None);
        assert_eq!(skeleton.children(0).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(skeleton.name_map().get("other"), Some(&3));
    }

    #[test]
    fn test_skinning_matrix_follows_posed_world() {
        let skeleton = chain();
        let joint = &skeleton.joints()[1];
        let posed = Mat4::from_translation(Vec3::X) * joint.world;
        let skin = joint.skinning_matrix(posed);
        let bind_point = joint.world.transform_point3(Vec3::ZERO);
        assert!(
            skin.transform_point3(bind_point)
                .abs_diff_eq(bind_point + Vec3::X, 1e-5)
        );
    }

    #[test]
    fn test_capacity_is_a_hard_error() {
        let mut builder = SkeletonBuilder::default();
        for i in 0..MAX_JOINTS {
            builder.push(&format!("j{i}"), None, i + 1).unwrap();
        }
        let err = builder.push("overflow", None, 99).unwrap_err();
        assert!(matches!(err, EggError::TooManyJoints { line: 99, max: 75 }));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "must precede")]
    fn test_forward_parent_is_rejected() {
        let mut builder = SkeletonBuilder::default();
        builder.push("root", None, 1).unwrap();
        let _ = builder.push("orphan", Some(1), 2);
    }
}

//! Baked skeletal animation and the per-joint channel data it is built from

use glam::{Mat4, Quat, Vec3};

use crate::coords::CoordinateSystem;
use crate::error::ParseWarning;

/// One operation of a transform order string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOp {
    /// `s`: uniform scale
    Scale,
    /// `r`: rotation about Z
    Roll,
    /// `p`: rotation about X
    Pitch,
    /// `h`: rotation about Y
    Heading,
    /// `t`: translation
    Translate,
}

impl TransformOp {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            's' => Some(Self::Scale),
            'r' => Some(Self::Roll),
            'p' => Some(Self::Pitch),
            'h' => Some(Self::Heading),
            't' => Some(Self::Translate),
            _ => None,
        }
    }
}

/// Sequence in which channel operations are composed, first applied first
///
/// The default order is empty: a table without an `order` string applies no
/// operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOrder(Vec<TransformOp>);

impl TransformOrder {
    /// Parse an order string, returning the unknown codes alongside
    pub fn parse(order: &str) -> (Self, Vec<char>) {
        let mut ops = Vec::with_capacity(order.len());
        let mut unknown = Vec::new();
        for code in order.chars() {
            match TransformOp::from_code(code) {
                Some(op) => ops.push(op),
                None => unknown.push(code),
            }
        }
        (Self(ops), unknown)
    }

    pub fn ops(&self) -> &[TransformOp] {
        &self.0
    }
}

/// Raw sampled channels of one `<Xfm$Anim_S$>` table
///
/// Channels are independent and may differ in length; frame `f` reads
/// `channel[f % channel.len()]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointChannels {
    pub scale_x: Vec<f32>,
    pub scale_y: Vec<f32>,
    pub scale_z: Vec<f32>,
    /// Degrees
    pub roll: Vec<f32>,
    /// Degrees
    pub pitch: Vec<f32>,
    /// Degrees
    pub heading: Vec<f32>,
    pub translate_x: Vec<f32>,
    pub translate_y: Vec<f32>,
    pub translate_z: Vec<f32>,
}

impl JointChannels {
    /// Channel addressed by its `<S$Anim>` name
    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Vec<f32>> {
        match name {
            "i" => Some(&mut self.scale_x),
            "j" => Some(&mut self.scale_y),
            "k" => Some(&mut self.scale_z),
            "r" => Some(&mut self.roll),
            "p" => Some(&mut self.pitch),
            "h" => Some(&mut self.heading),
            "x" => Some(&mut self.translate_x),
            "y" => Some(&mut self.translate_y),
            "z" => Some(&mut self.translate_z),
            _ => None,
        }
    }

    /// Value of a looping channel at `frame`, `None` for an empty channel
    pub fn sample(channel: &[f32], frame: usize) -> Option<f32> {
        if channel.is_empty() {
            None
        } else {
            Some(channel[frame % channel.len()])
        }
    }

    /// Compose this frame's joint transform
    ///
    /// Operations with an empty channel are skipped. Scale is uniform and
    /// uses the `i` channel. Rotation axes are converted through `coords`
    /// before the axis-angle rotation is built. Translation reads each axis
    /// independently, missing axes contributing zero.
    pub fn pose_matrix(&self, order: &TransformOrder, frame: usize, coords: CoordinateSystem) -> Mat4 {
        let rotate = |channel: &[f32], axis: Vec3| {
            Self::sample(channel, frame).map(|degrees| {
                let axis = coords.convert_vec3(axis).normalize();
                Mat4::from_quat(Quat::from_axis_angle(axis, degrees.to_radians()))
            })
        };

        let mut pose = Mat4::IDENTITY;
        for op in order.ops() {
            let step = match op {
                TransformOp::Scale => Self::sample(&self.scale_x, frame)
                    .map(|s| Mat4::from_scale(Vec3::splat(s))),
                TransformOp::Roll => rotate(&self.roll, Vec3::Z),
                TransformOp::Pitch => rotate(&self.pitch, Vec3::X),
                TransformOp::Heading => rotate(&self.heading, Vec3::Y),
                TransformOp::Translate => Some(Mat4::from_translation(Vec3::new(
                    Self::sample(&self.translate_x, frame).unwrap_or(0.0),
                    Self::sample(&self.translate_y, frame).unwrap_or(0.0),
                    Self::sample(&self.translate_z, frame).unwrap_or(0.0),
                ))),
            };
            if let Some(step) = step {
                pose = step * pose;
            }
        }
        pose
    }
}

/// Per-joint transforms for one frame, parallel to the skeleton's joints
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonPose {
    pub transforms: Vec<Mat4>,
}

impl SkeletonPose {
    pub fn identity(joint_count: usize) -> Self {
        Self {
            transforms: vec![Mat4::IDENTITY; joint_count],
        }
    }
}

/// A baked animation: one pose per sampled frame
#[derive(Debug, Clone, Default)]
pub struct Animation {
    /// Seconds (`frames / rate`)
    pub length: f32,
    /// The `fps` scalar. EGG data read here uses it as the frame count too.
    pub rate: u32,
    pub poses: Vec<SkeletonPose>,
    pub warnings: Vec<ParseWarning>,
}

impl Animation {
    pub fn frame_count(&self) -> usize {
        self.poses.len()
    }

    pub fn pose(&self, frame: usize) -> Option<&SkeletonPose> {
        self.poses.get(frame)
    }

    pub fn joint_count(&self) -> usize {
        self.poses.first().map(|p| p.transforms.len()).unwrap_or(0)
    }
}

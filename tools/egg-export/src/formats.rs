//! Binary output formats (.eggmesh, .eggskel, .egganim)
//!
//! POD formats, little-endian, no magic bytes. Every file is a fixed-size
//! header followed by its payload.
//!
//! # Mesh layout
//! ```text
//! 0x00: vertex_count u32
//! 0x04: index_count u32
//! 0x08: format u8 (FORMAT_* flags)
//! 0x09: padding (3 bytes)
//! 0x0C: vertex_data (vertex_count * stride)
//! var:  index_data (index_count * 4 bytes, u32)
//! ```
//!
//! Per vertex, in order: position f32×3, normal f32×3 (FORMAT_NORMAL),
//! uv f32×2 (FORMAT_UV), color f32×4 (FORMAT_COLOR), joints u8×4 +
//! weights f32×4 (FORMAT_SKINNED).
//!
//! # Skeleton layout
//! ```text
//! 0x00: joint_count u32
//! 0x04: reserved u32
//! 0x08: joints (joint_count × 52 bytes)
//!       parent u32 (u32::MAX for a root)
//!       inverse bind matrix, 12 × f32, 3×4 column-major
//! ```
//!
//! # Animation layout
//! ```text
//! 0x00: joint_count u16
//! 0x02: frame_count u16
//! 0x04: rate u16
//! 0x06: reserved u16
//! 0x08: frame data (frame_count × joint_count × 48 bytes)
//! ```
//!
//! Frame data is stored frame-major: [frame0_joint0, frame0_joint1, ..., frame1_joint0, ...],
//! each a 3×4 column-major matrix.

use std::io::Write;

use anyhow::Result;
use egg_import::{FORMAT_COLOR, FORMAT_NORMAL, FORMAT_SKINNED, FORMAT_UV};
use glam::Mat4;

/// Mesh file extension
pub const MESH_EXT: &str = "eggmesh";
/// Skeleton file extension
pub const SKELETON_EXT: &str = "eggskel";
/// Animation file extension
pub const ANIMATION_EXT: &str = "egganim";

/// Size of one 3×4 matrix in bytes (12 floats × 4 bytes)
pub const MATRIX_3X4_SIZE: usize = 48;

/// Parent value of a root joint
pub const ROOT_PARENT: u32 = u32::MAX;

/// Vertex stride in bytes for a format
pub fn vertex_stride(format: u8) -> usize {
    let mut stride = 12;
    if format & FORMAT_NORMAL != 0 {
        stride += 12;
    }
    if format & FORMAT_UV != 0 {
        stride += 8;
    }
    if format & FORMAT_COLOR != 0 {
        stride += 16;
    }
    if format & FORMAT_SKINNED != 0 {
        stride += 4 + 16;
    }
    stride
}

/// Drop the last row of an affine matrix
///
/// Layout: [col0.x, col0.y, col0.z, col1.x, col1.y, col1.z, col2.x, col2.y, col2.z, tx, ty, tz]
pub fn matrix_to_3x4(m: &Mat4) -> [f32; 12] {
    let mut out = [0.0; 12];
    out[0..3].copy_from_slice(&m.x_axis.truncate().to_array());
    out[3..6].copy_from_slice(&m.y_axis.truncate().to_array());
    out[6..9].copy_from_slice(&m.z_axis.truncate().to_array());
    out[9..12].copy_from_slice(&m.w_axis.truncate().to_array());
    out
}

/// EggMesh header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct EggMeshHeader {
    pub vertex_count: u32,
    pub index_count: u32,
    pub format: u8,
    pub _padding: [u8; 3],
}

impl EggMeshHeader {
    pub const SIZE: usize = 12;

    pub fn new(vertex_count: u32, index_count: u32, format: u8) -> Self {
        Self {
            vertex_count,
            index_count,
            format,
            _padding: [0; 3],
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.index_count.to_le_bytes());
        bytes[8] = self.format;
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            vertex_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            index_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            format: bytes[8],
            _padding: [0; 3],
        })
    }

    /// Header plus vertex and index data
    pub fn file_size(&self) -> usize {
        Self::SIZE
            + self.vertex_count as usize * vertex_stride(self.format)
            + self.index_count as usize * 4
    }
}

/// EggSkeleton header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct EggSkeletonHeader {
    pub joint_count: u32,
    pub reserved: u32,
}

impl EggSkeletonHeader {
    pub const SIZE: usize = 8;

    /// Bytes per joint record: parent + inverse bind matrix
    pub const JOINT_SIZE: usize = 4 + MATRIX_3X4_SIZE;

    pub fn new(joint_count: u32) -> Self {
        Self {
            joint_count,
            reserved: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.joint_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.reserved.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            joint_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            reserved: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

/// EggAnimation header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct EggAnimationHeader {
    pub joint_count: u16,
    pub frame_count: u16,
    /// The animation's `fps` scalar
    pub rate: u16,
    pub reserved: u16,
}

impl EggAnimationHeader {
    pub const SIZE: usize = 8;

    pub fn new(joint_count: u16, frame_count: u16, rate: u16) -> Self {
        Self {
            joint_count,
            frame_count,
            rate,
            reserved: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.joint_count.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.frame_count.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.rate.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.reserved.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            joint_count: u16::from_le_bytes([bytes[0], bytes[1]]),
            frame_count: u16::from_le_bytes([bytes[2], bytes[3]]),
            rate: u16::from_le_bytes([bytes[4], bytes[5]]),
            reserved: u16::from_le_bytes([bytes[6], bytes[7]]),
        })
    }

    /// Expected frame data size (excluding header)
    pub fn data_size(&self) -> usize {
        self.frame_count as usize * self.joint_count as usize * MATRIX_3X4_SIZE
    }
}

fn write_matrix<W: Write>(w: &mut W, matrix: &[f32; 12]) -> Result<()> {
    for f in matrix {
        w.write_all(&f.to_le_bytes())?;
    }
    Ok(())
}

/// Write a complete EggMesh file
pub fn write_egg_mesh<W: Write>(
    w: &mut W,
    format: u8,
    vertex_data: &[u8],
    indices: &[u32],
) -> Result<()> {
    let stride = vertex_stride(format);
    if vertex_data.len() % stride != 0 {
        anyhow::bail!(
            "Vertex data length {} is not a multiple of the stride {}",
            vertex_data.len(),
            stride
        );
    }
    let vertex_count = (vertex_data.len() / stride) as u32;

    let header = EggMeshHeader::new(vertex_count, indices.len() as u32, format);
    w.write_all(&header.to_bytes())?;
    w.write_all(vertex_data)?;
    for i in indices {
        w.write_all(&i.to_le_bytes())?;
    }
    Ok(())
}

/// Write a complete EggSkeleton file
///
/// `parents` and `inverse_bind_matrices` are parallel, one entry per joint.
pub fn write_egg_skeleton<W: Write>(
    w: &mut W,
    parents: &[u32],
    inverse_bind_matrices: &[[f32; 12]],
) -> Result<()> {
    if parents.len() != inverse_bind_matrices.len() {
        anyhow::bail!(
            "Skeleton has {} parents but {} inverse bind matrices",
            parents.len(),
            inverse_bind_matrices.len()
        );
    }

    let header = EggSkeletonHeader::new(parents.len() as u32);
    w.write_all(&header.to_bytes())?;
    for (parent, matrix) in parents.iter().zip(inverse_bind_matrices) {
        w.write_all(&parent.to_le_bytes())?;
        write_matrix(w, matrix)?;
    }
    Ok(())
}

/// Write a complete EggAnimation file
///
/// `frames` holds `frame_count × joint_count` matrices, frame-major.
pub fn write_egg_animation<W: Write>(
    w: &mut W,
    joint_count: u16,
    rate: u16,
    frames: &[[f32; 12]],
) -> Result<()> {
    if joint_count == 0 {
        anyhow::bail!("Animation has no joints");
    }
    if frames.len() % joint_count as usize != 0 {
        anyhow::bail!(
            "Animation data holds {} matrices, not a multiple of {} joints",
            frames.len(),
            joint_count
        );
    }
    let frame_count = frames.len() / joint_count as usize;
    let frame_count = u16::try_from(frame_count)
        .map_err(|_| anyhow::anyhow!("Animation has {} frames, maximum is {}", frame_count, u16::MAX))?;

    let header = EggAnimationHeader::new(joint_count, frame_count, rate);
    w.write_all(&header.to_bytes())?;
    for matrix in frames {
        write_matrix(w, matrix)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_header_sizes() {
        assert_eq!(EggMeshHeader::new(1, 2, 3).to_bytes().len(), EggMeshHeader::SIZE);
        assert_eq!(EggSkeletonHeader::JOINT_SIZE, 52);
        assert_eq!(EggAnimationHeader::SIZE, 8);
    }

    #[test]
    fn test_mesh_header_layout() {
        let bytes = EggMeshHeader::new(4, 6, FORMAT_UV).to_bytes();
        assert_eq!(&bytes[0..4], &4u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &6u32.to_le_bytes());
        assert_eq!(bytes[8], FORMAT_UV);
        assert_eq!(&bytes[9..12], &[0, 0, 0]);
        assert!(EggMeshHeader::from_bytes(&bytes[..11]).is_none());
    }

    #[test]
    fn test_animation_header_fields() {
        let header = EggAnimationHeader::from_bytes(&EggAnimationHeader::new(3, 24, 24).to_bytes()).unwrap();
        assert_eq!(header.joint_count, 3);
        assert_eq!(header.frame_count, 24);
        assert_eq!(header.rate, 24);
        assert_eq!(header.data_size(), 3 * 24 * 48);
    }

    #[test]
    fn test_vertex_stride() {
        assert_eq!(vertex_stride(0), 12);
        assert_eq!(vertex_stride(FORMAT_NORMAL | FORMAT_UV), 32);
        assert_eq!(
            vertex_stride(FORMAT_NORMAL | FORMAT_UV | FORMAT_COLOR | FORMAT_SKINNED),
            68
        );
    }

    #[test]
    fn test_matrix_to_3x4() {
        let m = Mat4::from_rotation_translation(
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let packed = matrix_to_3x4(&m);
        assert_eq!(&packed[9..12], &[1.0, 2.0, 3.0]);
        // Column 0 is where X ends up
        assert!((packed[1] - 1.0).abs() < 1e-6);
        assert!(packed[0].abs() < 1e-6);
    }

    #[test]
    fn test_write_mesh_rejects_partial_vertex() {
        let mut out = Vec::new();
        assert!(write_egg_mesh(&mut out, 0, &[0u8; 13], &[]).is_err());
    }

    #[test]
    fn test_write_skeleton() {
        let mut out = Vec::new();
        let identity = matrix_to_3x4(&Mat4::IDENTITY);
        write_egg_skeleton(&mut out, &[ROOT_PARENT, 0], &[identity, identity]).unwrap();
        assert_eq!(out.len(), EggSkeletonHeader::SIZE + 2 * EggSkeletonHeader::JOINT_SIZE);
        assert_eq!(&out[8..12], &u32::MAX.to_le_bytes());
        assert_eq!(&out[60..64], &0u32.to_le_bytes());
    }

    #[test]
    fn test_write_animation_frame_count() {
        let mut out = Vec::new();
        let identity = matrix_to_3x4(&Mat4::IDENTITY);
        write_egg_animation(&mut out, 2, 30, &[identity; 6]).unwrap();
        let header = EggAnimationHeader::from_bytes(&out).unwrap();
        assert_eq!(header.frame_count, 3);
        assert_eq!(out.len(), EggAnimationHeader::SIZE + header.data_size());

        assert!(write_egg_animation(&mut Vec::new(), 4, 30, &[identity; 6]).is_err());
    }
}
